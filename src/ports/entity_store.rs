//! Entity store port - the physical tabular storage boundary.
//!
//! Each entity kind lives in its own table. Adapters read and write
//! `StorageRow`s and convert through the entity's row factories, so the
//! engine never sees storage mechanics.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::{DomainError, StoredEntity};
use crate::domain::people::{Admin, Instructor, LessonClass, Parent, Room, Student};
use crate::domain::registration::Registration;

/// Storage port for one entity table.
///
/// Implementations must ensure:
/// - rows are unique by `T::Key`, which for registrations includes the partition
/// - `find_by_id` returns `None` rather than an error for a missing row
/// - `insert` rejects a row whose key already exists
/// - `update` fails with the entity's not-found code for a missing row
#[async_trait]
pub trait EntityStore<T: StoredEntity>: Send + Sync {
    /// Every row in the table.
    async fn find_all(&self) -> Result<Vec<T>, DomainError>;

    /// Find a row by key.
    async fn find_by_id(&self, key: &T::Key) -> Result<Option<T>, DomainError>;

    /// Append a new row.
    ///
    /// # Errors
    ///
    /// - `StorageError` if a row with the same key exists
    async fn insert(&self, entity: &T) -> Result<(), DomainError>;

    /// Overwrite an existing row.
    ///
    /// # Errors
    ///
    /// - `*NotFound` for the entity kind if the row doesn't exist
    async fn update(&self, entity: &T) -> Result<(), DomainError>;

    /// Remove a row. Returns whether a row was removed.
    async fn delete(&self, key: &T::Key) -> Result<bool, DomainError>;

    /// Number of rows in the table.
    async fn count(&self) -> Result<usize, DomainError>;
}

/// One store per table, as handed to a unit of work.
#[derive(Clone)]
pub struct EntityStores {
    pub students: Arc<dyn EntityStore<Student>>,
    pub parents: Arc<dyn EntityStore<Parent>>,
    pub instructors: Arc<dyn EntityStore<Instructor>>,
    pub admins: Arc<dyn EntityStore<Admin>>,
    pub classes: Arc<dyn EntityStore<LessonClass>>,
    pub rooms: Arc<dyn EntityStore<Room>>,
    pub registrations: Arc<dyn EntityStore<Registration>>,
}
