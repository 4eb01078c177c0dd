//! Side channel port - fire-and-forget work that follows a committed change.

use async_trait::async_trait;

use super::EmailMessage;
use crate::domain::foundation::EventEnvelope;

/// A unit of best-effort work.
#[derive(Debug, Clone)]
pub enum SideEffect {
    Notify(EmailMessage),
    Audit(EventEnvelope),
}

/// Port for submitting side effects.
///
/// `submit` never fails and never waits for delivery. Failures are the
/// channel's own business.
#[async_trait]
pub trait SideChannel: Send + Sync {
    fn submit(&self, effect: SideEffect);

    /// Waits until everything submitted so far has been attempted.
    async fn flush(&self);
}
