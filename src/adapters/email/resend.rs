//! Resend-compatible HTTP email client.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use crate::ports::{EmailClient, EmailError, EmailMessage};

/// Configuration for the HTTP email client.
#[derive(Debug, Clone)]
pub struct ResendConfig {
    /// API key for authentication.
    api_key: Secret<String>,
    /// Base URL for the API (default: https://api.resend.com).
    pub base_url: String,
    /// Formatted `From` header, e.g. `Lessons <noreply@example.com>`.
    pub from: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl ResendConfig {
    pub fn new(api_key: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            base_url: "https://api.resend.com".to_string(),
            from: from.into(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }
}

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

/// Email client posting to a Resend-compatible `/emails` endpoint.
pub struct HttpEmailClient {
    config: ResendConfig,
    client: Client,
}

impl HttpEmailClient {
    /// # Errors
    ///
    /// - `Transport` if the HTTP client cannot be built
    pub fn new(config: ResendConfig) -> Result<Self, EmailError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EmailError::Transport(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn emails_url(&self) -> String {
        format!("{}/emails", self.config.base_url.trim_end_matches('/'))
    }

    fn to_request<'a>(&'a self, message: &'a EmailMessage) -> SendEmailRequest<'a> {
        SendEmailRequest {
            from: &self.config.from,
            to: [&message.to],
            subject: &message.subject,
            html: &message.html,
        }
    }
}

#[async_trait]
impl EmailClient for HttpEmailClient {
    async fn send_email(&self, message: &EmailMessage) -> Result<(), EmailError> {
        if !message.to.contains('@') {
            return Err(EmailError::InvalidRecipient(message.to.clone()));
        }

        let response = self
            .client
            .post(self.emails_url())
            .bearer_auth(self.config.api_key())
            .json(&self.to_request(message))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmailError::Transport(format!(
                        "Timed out after {}s",
                        self.config.timeout.as_secs()
                    ))
                } else {
                    EmailError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(to = %message.to, subject = %message.subject, "Email accepted by provider");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        Err(EmailError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HttpEmailClient {
        HttpEmailClient::new(
            ResendConfig::new("re_test", "Lessons <noreply@example.com>")
                .with_base_url("http://localhost:9/")
                .with_timeout(Duration::from_millis(200)),
        )
        .unwrap()
    }

    #[test]
    fn request_body_matches_provider_shape() {
        let client = client();
        let message = EmailMessage::new("ada@example.com", "Confirmed", "<p>Hi</p>");
        let body = serde_json::to_value(client.to_request(&message)).unwrap();

        assert_eq!(body["from"], "Lessons <noreply@example.com>");
        assert_eq!(body["to"][0], "ada@example.com");
        assert_eq!(body["subject"], "Confirmed");
        assert_eq!(client.emails_url(), "http://localhost:9/emails");
    }

    #[test]
    fn api_key_is_not_debug_printed() {
        let config = ResendConfig::new("re_super_secret", "noreply@example.com");
        assert!(!format!("{:?}", config).contains("re_super_secret"));
    }

    #[tokio::test]
    async fn invalid_recipient_fails_without_request() {
        let err = client()
            .send_email(&EmailMessage::new("not-an-address", "s", "b"))
            .await
            .unwrap_err();
        assert_eq!(err, EmailError::InvalidRecipient("not-an-address".into()));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn unreachable_provider_is_a_retryable_transport_error() {
        let err = client()
            .send_email(&EmailMessage::new("ada@example.com", "s", "b"))
            .await
            .unwrap_err();
        assert!(matches!(err, EmailError::Transport(_)));
        assert!(err.is_retryable());
    }
}
