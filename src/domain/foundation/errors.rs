//! Error types for the domain layer.

use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use thiserror::Error;

/// Errors that occur during value object construction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Field '{field}' cannot be empty")]
    EmptyField { field: String },

    #[error("Field '{field}' must be between {min} and {max}, got {actual}")]
    OutOfRange {
        field: String,
        min: i32,
        max: i32,
        actual: i32,
    },

    #[error("Field '{field}' has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Creates an empty field validation error.
    pub fn empty_field(field: impl Into<String>) -> Self {
        ValidationError::EmptyField { field: field.into() }
    }

    /// Creates an out of range validation error.
    pub fn out_of_range(field: impl Into<String>, min: i32, max: i32, actual: i32) -> Self {
        ValidationError::OutOfRange {
            field: field.into(),
            min,
            max,
            actual,
        }
    }

    /// Creates an invalid format validation error.
    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    EmptyField,
    OutOfRange,
    InvalidFormat,

    // Not found errors
    StudentNotFound,
    ParentNotFound,
    InstructorNotFound,
    AdminNotFound,
    ClassNotFound,
    RoomNotFound,
    RegistrationNotFound,

    // Business rule errors
    Ineligible,
    SlotConflict,
    DuplicateRegistration,
    InvalidStateTransition,
    CancellationBlocked,

    // Infrastructure errors
    StorageError,
    UnitOfWorkDisposed,
    NotificationFailed,
    InternalError,
}

impl ErrorCode {
    /// Returns true for the "entity does not exist" family of codes.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ErrorCode::StudentNotFound
                | ErrorCode::ParentNotFound
                | ErrorCode::InstructorNotFound
                | ErrorCode::AdminNotFound
                | ErrorCode::ClassNotFound
                | ErrorCode::RoomNotFound
                | ErrorCode::RegistrationNotFound
        )
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::EmptyField => "EMPTY_FIELD",
            ErrorCode::OutOfRange => "OUT_OF_RANGE",
            ErrorCode::InvalidFormat => "INVALID_FORMAT",
            ErrorCode::StudentNotFound => "STUDENT_NOT_FOUND",
            ErrorCode::ParentNotFound => "PARENT_NOT_FOUND",
            ErrorCode::InstructorNotFound => "INSTRUCTOR_NOT_FOUND",
            ErrorCode::AdminNotFound => "ADMIN_NOT_FOUND",
            ErrorCode::ClassNotFound => "CLASS_NOT_FOUND",
            ErrorCode::RoomNotFound => "ROOM_NOT_FOUND",
            ErrorCode::RegistrationNotFound => "REGISTRATION_NOT_FOUND",
            ErrorCode::Ineligible => "INELIGIBLE",
            ErrorCode::SlotConflict => "SLOT_CONFLICT",
            ErrorCode::DuplicateRegistration => "DUPLICATE_REGISTRATION",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::CancellationBlocked => "CANCELLATION_BLOCKED",
            ErrorCode::StorageError => "STORAGE_ERROR",
            ErrorCode::UnitOfWorkDisposed => "UNIT_OF_WORK_DISPOSED",
            ErrorCode::NotificationFailed => "NOTIFICATION_FAILED",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Standard domain error with code, message, and optional details.
#[derive(Debug, Clone)]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: HashMap<String, String>,
}

impl DomainError {
    /// Creates a new domain error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: HashMap::new(),
        }
    }

    /// Creates a validation error for a specific field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::ValidationFailed,
            message: message.into(),
            details: HashMap::new(),
        }
        .with_detail("field", field.into())
    }

    /// Creates a storage error wrapping a lower-layer failure.
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }

    /// Adds a detail to the error.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for DomainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl Error for DomainError {}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        let field = match &err {
            ValidationError::EmptyField { field }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::InvalidFormat { field, .. } => field.clone(),
        };
        DomainError::validation(field, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_empty_field_displays_correctly() {
        let err = ValidationError::empty_field("studentId");
        assert_eq!(format!("{}", err), "Field 'studentId' cannot be empty");
    }

    #[test]
    fn validation_error_out_of_range_displays_correctly() {
        let err = ValidationError::out_of_range("grade", 0, 12, 14);
        assert_eq!(
            format!("{}", err),
            "Field 'grade' must be between 0 and 12, got 14"
        );
    }

    #[test]
    fn domain_error_displays_code_and_message() {
        let err = DomainError::new(ErrorCode::RegistrationNotFound, "Registration not found");
        assert_eq!(
            format!("{}", err),
            "[REGISTRATION_NOT_FOUND] Registration not found"
        );
    }

    #[test]
    fn domain_error_with_detail_adds_detail() {
        let err = DomainError::storage("write rejected")
            .with_detail("table", "registrations")
            .with_detail("row", "12");

        assert_eq!(err.code, ErrorCode::StorageError);
        assert_eq!(err.details.get("table"), Some(&"registrations".to_string()));
        assert_eq!(err.details.get("row"), Some(&"12".to_string()));
    }

    #[test]
    fn validation_error_converts_with_field_detail() {
        let err: DomainError = ValidationError::invalid_format("day", "not a weekday").into();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
        assert_eq!(err.details.get("field"), Some(&"day".to_string()));
    }

    #[test]
    fn not_found_codes_are_grouped() {
        assert!(ErrorCode::StudentNotFound.is_not_found());
        assert!(ErrorCode::RegistrationNotFound.is_not_found());
        assert!(!ErrorCode::StorageError.is_not_found());
    }
}
