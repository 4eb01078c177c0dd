//! Application layer - Repositories, units of work, and handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Following CQRS, it separates command handlers (write) from query handlers (read).

pub mod cache;
pub mod handlers;
pub mod notifications;
pub mod registration_repository;
pub mod repository;
pub mod service;
pub mod slot_ledger;
pub mod unit_of_work;

pub use cache::EntityCache;
pub use handlers::{
    CancelRegistrationCommand, CancelRegistrationHandler, CancelRegistrationResult,
    CancellationInfo, GetRegistrationDetailsHandler, GetRegistrationDetailsQuery,
    GetStudentRegistrationsHandler, GetStudentRegistrationsQuery, ProcessRegistrationCommand,
    ProcessRegistrationHandler, ProcessRegistrationResult, RegistrationDetails,
    StudentRegistrations,
};
pub use registration_repository::{RegistrationRepository, StatusCounts};
pub use repository::EntityRepository;
pub use service::{RegistrationService, RegistrationSettings};
pub use slot_ledger::SlotLedger;
pub use unit_of_work::{
    DashboardData, EntityCounts, FamilyInfo, HealthStatus, RepositoryHealth, UnitOfWork,
    UserMatch,
};
