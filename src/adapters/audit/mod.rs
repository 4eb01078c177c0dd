//! Audit Adapters
//!
//! - **InMemoryAuditLog** - Keeps events in memory (testing/development)
//! - **TracingAuditLog** - Writes events as structured log lines

mod in_memory;
mod tracing_log;

pub use in_memory::InMemoryAuditLog;
pub use tracing_log::TracingAuditLog;
