//! Storage configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Where the in-memory tables are seeded from
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// JSON or YAML table snapshot; tables start empty when unset
    pub seed_path: Option<PathBuf>,
}

impl StorageConfig {
    /// Validate storage configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let Some(path) = &self.seed_path else {
            return Ok(());
        };
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "json" | "yaml" | "yml" => Ok(()),
            other => Err(ValidationError::UnsupportedSeedFormat(other.to_string())),
        }
    }
}
