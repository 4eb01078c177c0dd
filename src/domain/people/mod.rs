//! People and places the registration engine reads but never writes.
//!
//! Students, parents, instructors, admins, classes, and rooms are owned by
//! other parts of the program. The engine fetches them by id to resolve
//! references and evaluate eligibility.

mod admin;
mod class;
mod instructor;
mod parent;
mod room;
mod student;

pub use admin::Admin;
pub use class::LessonClass;
pub use instructor::Instructor;
pub use parent::Parent;
pub use room::Room;
pub use student::{Grade, Student};
