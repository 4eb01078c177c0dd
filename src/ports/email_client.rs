//! Email client port.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A rendered email ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

impl EmailMessage {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            html: html.into(),
        }
    }
}

/// Email delivery failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EmailError {
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Email provider rejected the message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Email transport failed: {0}")]
    Transport(String),
}

impl EmailError {
    /// Transport failures and provider-side errors are worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            EmailError::InvalidRecipient(_) => false,
            EmailError::Rejected { status, .. } => *status == 429 || *status >= 500,
            EmailError::Transport(_) => true,
        }
    }
}

/// Port for sending email.
#[async_trait]
pub trait EmailClient: Send + Sync {
    async fn send_email(&self, message: &EmailMessage) -> Result<(), EmailError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryability_follows_status() {
        assert!(EmailError::Transport("reset".into()).is_retryable());
        assert!(EmailError::Rejected { status: 503, body: String::new() }.is_retryable());
        assert!(EmailError::Rejected { status: 429, body: String::new() }.is_retryable());
        assert!(!EmailError::Rejected { status: 422, body: String::new() }.is_retryable());
        assert!(!EmailError::InvalidRecipient("nobody".into()).is_retryable());
    }

    #[test]
    fn email_client_is_object_safe() {
        fn _accepts_dyn(_client: &dyn EmailClient) {}
    }
}
