//! Audit log that writes events to the tracing pipeline.

use async_trait::async_trait;
use tracing::info;

use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::ports::AuditLog;

/// Emits one structured `audit` log line per event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditLog;

#[async_trait]
impl AuditLog for TracingAuditLog {
    async fn record(&self, event: EventEnvelope) -> Result<(), DomainError> {
        info!(
            target: "audit",
            event_id = %event.event_id,
            event_type = %event.event_type,
            aggregate_id = %event.aggregate_id,
            correlation_id = event.metadata.correlation_id.as_deref().unwrap_or("-"),
            user_id = event.metadata.user_id.as_deref().unwrap_or("-"),
            payload = %event.payload,
            "Audit event"
        );
        Ok(())
    }
}
