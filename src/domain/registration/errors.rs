//! Registration workflow errors.

use thiserror::Error;

use super::conflict::Conflict;
use super::status::RegistrationStatus;
use crate::domain::foundation::{DomainError, EntityKind, ErrorCode};

/// Errors raised by the registration engine.
///
/// Validation, eligibility and conflict errors are detected before any
/// write and carry the full list of problems so a caller can correct
/// everything at once.
#[derive(Debug, Clone, Error)]
pub enum RegistrationError {
    #[error("Validation failed: {}", join_messages(.errors))]
    Validation { errors: Vec<String> },

    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: String },

    #[error("Student is not eligible: {}", join_messages(.reasons))]
    Ineligible { reasons: Vec<String> },

    #[error("Scheduling conflict: {}", join_conflicts(.conflicts))]
    Conflict { conflicts: Vec<Conflict> },

    #[error("Registration cannot be cancelled: {reason}")]
    CannotCancel { reason: String },

    #[error("Cannot move registration from {from} to {to}")]
    InvalidTransition {
        from: RegistrationStatus,
        to: RegistrationStatus,
    },

    #[error("Storage failure: {0}")]
    Storage(String),

    #[error("Unavailable: {0}")]
    Unavailable(String),
}

fn join_messages(messages: &[String]) -> String {
    messages.join("; ")
}

fn join_conflicts(conflicts: &[Conflict]) -> String {
    conflicts
        .iter()
        .map(|c| c.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl RegistrationError {
    pub fn validation(errors: Vec<String>) -> Self {
        RegistrationError::Validation { errors }
    }

    pub fn not_found(entity: EntityKind, id: impl ToString) -> Self {
        RegistrationError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            RegistrationError::Validation { .. } => ErrorCode::ValidationFailed,
            RegistrationError::NotFound { entity, .. } => entity.not_found_code(),
            RegistrationError::Ineligible { .. } => ErrorCode::Ineligible,
            RegistrationError::Conflict { conflicts } => {
                if conflicts.iter().all(|c| c.kind.is_duplicate()) {
                    ErrorCode::DuplicateRegistration
                } else {
                    ErrorCode::SlotConflict
                }
            }
            RegistrationError::CannotCancel { .. } => ErrorCode::CancellationBlocked,
            RegistrationError::InvalidTransition { .. } => ErrorCode::InvalidStateTransition,
            RegistrationError::Storage(_) => ErrorCode::StorageError,
            RegistrationError::Unavailable(_) => ErrorCode::UnitOfWorkDisposed,
        }
    }

    /// True for rejections detected before any write; retrying after
    /// correcting the input is safe.
    pub fn is_retryable_after_correction(&self) -> bool {
        matches!(
            self,
            RegistrationError::Validation { .. }
                | RegistrationError::Ineligible { .. }
                | RegistrationError::Conflict { .. }
        )
    }

    /// Every individual problem carried by the error, for display.
    pub fn messages(&self) -> Vec<String> {
        match self {
            RegistrationError::Validation { errors } => errors.clone(),
            RegistrationError::Ineligible { reasons } => reasons.clone(),
            RegistrationError::Conflict { conflicts } => {
                conflicts.iter().map(|c| c.message.clone()).collect()
            }
            other => vec![other.to_string()],
        }
    }
}

impl From<DomainError> for RegistrationError {
    fn from(err: DomainError) -> Self {
        if let Some(entity) = EntityKind::from_not_found_code(err.code) {
            let id = err
                .details
                .get("id")
                .cloned()
                .unwrap_or_else(|| err.message.clone());
            return RegistrationError::NotFound { entity, id };
        }
        match err.code {
            ErrorCode::UnitOfWorkDisposed => RegistrationError::Unavailable(err.message),
            ErrorCode::ValidationFailed => RegistrationError::Validation {
                errors: vec![err.message],
            },
            _ => RegistrationError::Storage(err.to_string()),
        }
    }
}
