//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `EntityStore` - Tabular storage for one entity kind
//! - `EmailClient` - Email delivery
//! - `AuditLog` - Audit event recording
//! - `SideChannel` - Fire-and-forget notification and audit queue
//! - `Clock` - Current time

mod audit_log;
mod clock;
mod email_client;
mod entity_store;
mod side_channel;

pub use audit_log::AuditLog;
pub use clock::Clock;
pub use email_client::{EmailClient, EmailError, EmailMessage};
pub use entity_store::{EntityStore, EntityStores};
pub use side_channel::{SideChannel, SideEffect};
