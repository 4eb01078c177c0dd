//! Strongly-typed identifier value objects.
//!
//! Identifiers come from the tabular store as opaque strings, so every id
//! wraps a non-empty `String` rather than a UUID.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Declares a string-backed identifier with validation on construction.
macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident, $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new id, returning error if empty or blank.
            pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
                let id = id.into();
                let trimmed = id.trim();
                if trimmed.is_empty() {
                    return Err(ValidationError::empty_field($field));
                }
                Ok(Self(trimmed.to_string()))
            }

            /// Returns the inner string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

string_id!(
    /// Identifier of an enrolled student.
    StudentId,
    "studentId"
);

string_id!(
    /// Identifier of a parent or guardian.
    ParentId,
    "parentId"
);

string_id!(
    /// Identifier of an instructor.
    InstructorId,
    "instructorId"
);

string_id!(
    /// Identifier of an administrator.
    AdminId,
    "adminId"
);

string_id!(
    /// Identifier of a roster-based group class.
    ClassId,
    "classId"
);

string_id!(
    /// Identifier of a teaching room.
    RoomId,
    "roomId"
);

string_id!(
    /// Identifier of a registration; derived from the registration's natural key.
    RegistrationId,
    "registrationId"
);

string_id!(
    /// Identifier of the user (admin, instructor, or system) performing an action.
    UserId,
    "userId"
);
