//! Application configuration module
//!
//! Configuration is loaded from environment variables with the
//! `LESSON_REGISTRY` prefix; nested values are separated by `__`.
//!
//! # Example
//!
//! ```no_run
//! use lesson_registry::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Cancellation mode: {:?}", config.scheduling.cancellation_mode);
//! ```

mod cache;
mod error;
mod logging;
mod notifications;
mod scheduling;
mod storage;

pub use cache::CacheConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::{LogFormat, LoggingConfig};
pub use notifications::NotificationConfig;
pub use scheduling::SchedulingConfig;
pub use storage::StorageConfig;

use serde::Deserialize;

use crate::application::RegistrationSettings;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a usable
/// configuration backed by empty in-memory tables and logged emails.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Registration, eligibility and cancellation rules
    #[serde(default)]
    pub scheduling: SchedulingConfig,

    /// Per-unit-of-work entity cache
    #[serde(default)]
    pub cache: CacheConfig,

    /// Email delivery (Resend)
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Seed data for the in-memory tables
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `LESSON_REGISTRY` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    ///
    /// # Environment Variable Format
    ///
    /// - `LESSON_REGISTRY__SCHEDULING__AUTO_APPROVE=false` -> `scheduling.auto_approve = false`
    /// - `LESSON_REGISTRY__STORAGE__SEED_PATH=seed.yaml` -> `storage.seed_path = seed.yaml`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("LESSON_REGISTRY")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.scheduling.validate()?;
        self.cache.validate()?;
        self.notifications.validate()?;
        self.storage.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Settings consumed by the registration service.
    pub fn registration_settings(&self) -> RegistrationSettings {
        RegistrationSettings {
            eligibility: self.scheduling.eligibility_policy(),
            cancellation: self.scheduling.cancellation_policy(),
            cancellation_mode: self.scheduling.cancellation_mode,
            auto_approve: self.scheduling.auto_approve,
            cache_ttl: self.cache.ttl(),
        }
    }
}
