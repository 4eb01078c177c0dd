//! In-memory audit log.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::ports::AuditLog;

/// Keeps recorded events in memory (testing/development).
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuditLog {
    events: Arc<RwLock<Vec<EventEnvelope>>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded event, oldest first.
    pub async fn events(&self) -> Vec<EventEnvelope> {
        self.events.read().await.clone()
    }

    /// Recorded events of one type.
    pub async fn events_of_type(&self, event_type: &str) -> Vec<EventEnvelope> {
        self.events
            .read()
            .await
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    pub async fn clear(&self) {
        self.events.write().await.clear();
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn record(&self, event: EventEnvelope) -> Result<(), DomainError> {
        self.events.write().await.push(event);
        Ok(())
    }
}
