//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (ids, timestamps, errors, events, storage rows)
//! - `people` - Students, parents, instructors, admins, classes, rooms
//! - `registration` - Registration aggregate, validation, conflicts, and policies

pub mod foundation;
pub mod people;
pub mod registration;
