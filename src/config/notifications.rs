//! Notification configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::email::ResendConfig;
use crate::adapters::side_channel::SideChannelConfig;

/// Notification delivery configuration (Resend)
///
/// Without an API key, emails are logged instead of sent.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// When false, notification emails are dropped; audit events still flow
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Resend API key
    pub resend_api_key: Option<String>,

    /// Override for the Resend API base URL
    pub resend_base_url: Option<String>,

    /// From email address
    #[serde(default = "default_from_email")]
    pub from_email: String,

    /// From name
    #[serde(default = "default_from_name")]
    pub from_name: String,

    /// Delivery attempts per email
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay between attempts
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl NotificationConfig {
    /// Get formatted "From" header value
    pub fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }

    /// Resend client settings, when an API key is configured.
    pub fn resend(&self) -> Option<ResendConfig> {
        let key = self.resend_api_key.as_deref().filter(|k| !k.is_empty())?;
        let config = ResendConfig::new(key, self.from_header());
        Some(match &self.resend_base_url {
            Some(url) => config.with_base_url(url),
            None => config,
        })
    }

    pub fn side_channel(&self) -> SideChannelConfig {
        SideChannelConfig::default()
            .with_max_attempts(self.max_attempts)
            .with_backoff(Duration::from_millis(self.retry_backoff_ms))
            .with_notifications_enabled(self.enabled)
    }

    /// Validate notification configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(key) = &self.resend_api_key {
            if !key.starts_with("re_") {
                return Err(ValidationError::InvalidResendKey);
            }
        }
        if !self.from_email.contains('@') {
            return Err(ValidationError::InvalidFromEmail);
        }
        if self.max_attempts == 0 {
            return Err(ValidationError::InvalidMaxAttempts);
        }
        Ok(())
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            resend_api_key: None,
            resend_base_url: None,
            from_email: default_from_email(),
            from_name: default_from_name(),
            max_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_from_email() -> String {
    "noreply@lesson-registry.org".to_string()
}

fn default_from_name() -> String {
    "Lesson Registry".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff_ms() -> u64 {
    250
}
