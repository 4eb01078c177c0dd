//! Audit log port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Port for recording audit events.
///
/// Callers treat recording as best-effort: errors are logged, never
/// surfaced to the user.
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record(&self, event: EventEnvelope) -> Result<(), DomainError>;
}
