//! Registration handlers - Command and query handlers for lesson registrations.
//!
//! ## Commands
//! - `ProcessRegistrationHandler` - Validate, check, and persist a registration
//! - `CancelRegistrationHandler` - Cancel a registration or route it to approval
//!
//! ## Queries
//! - `GetRegistrationDetailsHandler` - One registration with related entities
//! - `GetStudentRegistrationsHandler` - Every registration of a student

mod cancel_registration;
mod get_registration_details;
mod get_student_registrations;
mod process_registration;

#[cfg(test)]
pub(crate) mod test_support;

// Commands
pub use cancel_registration::{
    CancelRegistrationCommand, CancelRegistrationHandler, CancelRegistrationResult,
    CancellationInfo,
};
pub use process_registration::{
    ProcessRegistrationCommand, ProcessRegistrationHandler, ProcessRegistrationResult,
};

// Queries
pub use get_registration_details::{
    GetRegistrationDetailsHandler, GetRegistrationDetailsQuery, RegistrationDetails,
};
pub use get_student_registrations::{
    GetStudentRegistrationsHandler, GetStudentRegistrationsQuery, StudentRegistrations,
};

use crate::domain::foundation::{CommandMetadata, EventEnvelope, SerializableDomainEvent};

/// Wraps an event for the audit log, stamped with the command's context.
fn audit_envelope<E: SerializableDomainEvent>(event: &E, metadata: &CommandMetadata) -> EventEnvelope {
    let envelope = event
        .to_envelope()
        .with_correlation_id(metadata.correlation_id())
        .with_user_id(metadata.user_id.to_string());
    match metadata.source() {
        Some(source) => envelope.with_source(source),
        None => envelope,
    }
}
