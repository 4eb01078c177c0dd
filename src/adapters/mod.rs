//! Adapters - Implementations of the port interfaces.
//!
//! - `storage` - In-memory entity tables and seed snapshots
//! - `email` - HTTP and logging email clients
//! - `audit` - Audit log sinks
//! - `side_channel` - Fire-and-forget notification/audit worker
//! - `clock` - System and fixed clocks

pub mod audit;
pub mod clock;
pub mod email;
pub mod side_channel;
pub mod storage;

pub use clock::{FixedClock, SystemClock};
