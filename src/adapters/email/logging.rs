//! Email client that logs instead of sending.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::ports::{EmailClient, EmailError, EmailMessage};

/// Logs every message and keeps a copy for inspection.
///
/// Used when no provider key is configured, and in tests.
#[derive(Debug, Clone, Default)]
pub struct LoggingEmailClient {
    sent: Arc<RwLock<Vec<EmailMessage>>>,
}

impl LoggingEmailClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages "sent" so far, oldest first.
    pub async fn sent(&self) -> Vec<EmailMessage> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl EmailClient for LoggingEmailClient {
    async fn send_email(&self, message: &EmailMessage) -> Result<(), EmailError> {
        info!(to = %message.to, subject = %message.subject, "Email (not sent: no provider configured)");
        self.sent.write().await.push(message.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_messages() {
        let client = LoggingEmailClient::new();
        client
            .send_email(&EmailMessage::new("ada@example.com", "Hello", "<p>Hi</p>"))
            .await
            .unwrap();
        let sent = client.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Hello");
    }
}
