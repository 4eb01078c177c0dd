//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps, errors, storage rows, and the event
//! infrastructure that the registration engine is built from.

mod command;
mod entity;
mod errors;
mod events;
mod ids;
mod state_machine;
mod storage_row;
mod timestamp;

pub use command::CommandMetadata;
pub use entity::{EntityKind, StoredEntity};
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{
    domain_event, DomainEvent, EventEnvelope, EventId, EventMetadata, SerializableDomainEvent,
};
pub use ids::{
    AdminId, ClassId, InstructorId, ParentId, RegistrationId, RoomId, StudentId, UserId,
};
pub use state_machine::StateMachine;
pub use storage_row::StorageRow;
pub use timestamp::Timestamp;
