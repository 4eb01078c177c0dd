//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod registration;

pub use registration::{
    // Commands
    CancelRegistrationCommand,
    CancelRegistrationHandler,
    CancelRegistrationResult,
    CancellationInfo,
    ProcessRegistrationCommand,
    ProcessRegistrationHandler,
    ProcessRegistrationResult,
    // Queries
    GetRegistrationDetailsHandler,
    GetRegistrationDetailsQuery,
    GetStudentRegistrationsHandler,
    GetStudentRegistrationsQuery,
    RegistrationDetails,
    StudentRegistrations,
};
