//! Entity kinds and the contract every stored entity satisfies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;

use super::{ErrorCode, StorageRow, ValidationError};

/// The entity tables managed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Student,
    Parent,
    Instructor,
    Admin,
    Class,
    Room,
    Registration,
}

impl EntityKind {
    /// All kinds, in the order reports list them.
    pub const ALL: [EntityKind; 7] = [
        EntityKind::Student,
        EntityKind::Parent,
        EntityKind::Instructor,
        EntityKind::Admin,
        EntityKind::Class,
        EntityKind::Room,
        EntityKind::Registration,
    ];

    /// Name of the backing table.
    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::Student => "students",
            EntityKind::Parent => "parents",
            EntityKind::Instructor => "instructors",
            EntityKind::Admin => "admins",
            EntityKind::Class => "classes",
            EntityKind::Room => "rooms",
            EntityKind::Registration => "registrations",
        }
    }

    /// Error code used when an entity of this kind is missing.
    pub fn not_found_code(&self) -> ErrorCode {
        match self {
            EntityKind::Student => ErrorCode::StudentNotFound,
            EntityKind::Parent => ErrorCode::ParentNotFound,
            EntityKind::Instructor => ErrorCode::InstructorNotFound,
            EntityKind::Admin => ErrorCode::AdminNotFound,
            EntityKind::Class => ErrorCode::ClassNotFound,
            EntityKind::Room => ErrorCode::RoomNotFound,
            EntityKind::Registration => ErrorCode::RegistrationNotFound,
        }
    }

    /// Inverse of `not_found_code`.
    pub fn from_not_found_code(code: ErrorCode) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.not_found_code() == code)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Student => "student",
            EntityKind::Parent => "parent",
            EntityKind::Instructor => "instructor",
            EntityKind::Admin => "admin",
            EntityKind::Class => "class",
            EntityKind::Room => "room",
            EntityKind::Registration => "registration",
        };
        write!(f, "{}", s)
    }
}

/// An entity persisted as a row in one of the store's tables.
pub trait StoredEntity: Clone + Send + Sync + 'static {
    /// Unique key of a row within its table. Its `Display` form is the
    /// string the row is stored under.
    type Key: Clone + Eq + Hash + fmt::Display + fmt::Debug + Send + Sync + 'static;

    /// Table the entity lives in.
    const KIND: EntityKind;

    fn key(&self) -> Self::Key;

    /// Storage key of a raw row, read without parsing the whole entity.
    /// Must agree with `key().to_string()` for rows the entity writes.
    fn row_key(row: &StorageRow) -> Result<String, ValidationError> {
        Ok(row.required("id")?.to_string())
    }

    /// Whether the entity counts as active for dashboards and lookups.
    fn is_active(&self) -> bool;

    /// Builds the entity from a raw storage row.
    fn from_storage_row(row: &StorageRow) -> Result<Self, ValidationError>;

    /// Serializes the entity into a storage row.
    fn to_storage_row(&self) -> StorageRow;
}
