//! Registration module - the lesson booking engine.
//!
//! # Module Organization
//!
//! - `values` - Slot, partition, and enum value objects
//! - `request` / `validation` - Raw payload and field-level validation
//! - `aggregate` - `Registration` aggregate and `NewRegistration` proposal
//! - `key` - Partition-qualified storage key
//! - `conflict` / `slot_index` - Identity derivation and overlap detection
//! - `eligibility` / `program_rules` - Business checks against resolved entities
//! - `cancellation` / `schedule` - Cancellation policy, schedule and cost views
//! - `events` - Audit events

mod aggregate;
mod cancellation;
pub(crate) mod conflict;
mod eligibility;
mod errors;
mod events;
mod key;
mod program_rules;
mod request;
mod schedule;
mod slot_index;
mod status;
mod validation;
mod values;

pub use aggregate::{NewRegistration, Registration};
pub use cancellation::{
    next_occurrence, CancellationDecision, CancellationMode, CancellationPolicy,
    MAX_LEAD_TIME_HOURS,
};
pub use conflict::{
    check_conflicts, conflicts_between, derive_registration_id, Conflict, ConflictKind,
    ConflictReport,
};
pub use eligibility::{EligibilityPolicy, EnrollmentInfo};
pub use errors::RegistrationError;
pub use events::{RegistrationCancelled, RegistrationCreated, RegistrationFailed};
pub use key::RegistrationKey;
pub use program_rules::{check_program_rules, ProgramContext};
pub use request::RegistrationRequest;
pub use schedule::{CostBasis, LessonCost, LessonSchedule};
pub use slot_index::SlotIndex;
pub use status::RegistrationStatus;
pub use validation::{validate, ValidationReport};
pub use values::{
    LessonLength, Partition, RegistrationType, SchoolYear, Slot, SlotTime, TransportationType,
    Trimester, Weekday,
};
