//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Refund window must not be shorter than the no-cancel window")]
    InvalidCancellationWindows,

    #[error("Refund window of {0} hours can never be met by a weekly lesson")]
    UnreachableRefundWindow(u32),

    #[error("Minimum student age exceeds maximum student age")]
    InvalidAgeRange,

    #[error("Cache TTL must be at least one second")]
    InvalidCacheTtl,

    #[error("Notification attempts must be at least 1")]
    InvalidMaxAttempts,

    #[error("Invalid Resend API key format")]
    InvalidResendKey,

    #[error("Invalid from email address")]
    InvalidFromEmail,

    #[error("Unsupported seed file format: {0}")]
    UnsupportedSeedFormat(String),
}
