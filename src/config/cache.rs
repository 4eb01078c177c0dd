//! Repository cache configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Repository cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    /// How long a loaded table is served before reloading
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Validate cache configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ttl_secs == 0 {
            return Err(ValidationError::InvalidCacheTtl);
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    300
}
