//! Command metadata that flows through registration workflows.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserId;

/// Metadata context for command handlers.
///
/// Carries the acting user plus correlation context. Handlers copy it onto
/// every audit event they emit so one request can be followed end to end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandMetadata {
    /// The user executing this command.
    pub user_id: UserId,

    /// Links related operations across a single request.
    correlation_id: String,

    /// Source of this command (e.g., "api", "import", "cli").
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<String>,
}

impl CommandMetadata {
    /// Creates metadata for a user, generating a fresh correlation ID.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            correlation_id: Uuid::new_v4().to_string(),
            source: None,
        }
    }

    /// Builder: use a caller-supplied correlation ID.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = id.into();
        self
    }

    /// Builder: add source identifier.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn correlation_id(&self) -> &str {
        &self.correlation_id
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_generates_stable_correlation_id() {
        let metadata = CommandMetadata::new(UserId::new("admin-1").unwrap());
        let first = metadata.correlation_id().to_string();
        assert!(!first.is_empty());
        assert_eq!(metadata.correlation_id(), first);
    }

    #[test]
    fn builder_overrides_correlation_and_source() {
        let metadata = CommandMetadata::new(UserId::new("admin-1").unwrap())
            .with_correlation_id("req-42")
            .with_source("api");

        assert_eq!(metadata.correlation_id(), "req-42");
        assert_eq!(metadata.source(), Some("api"));
    }
}
