//! Email Adapters
//!
//! - **HttpEmailClient** - Posts to a Resend-compatible HTTP API
//! - **LoggingEmailClient** - Logs and records messages (no provider configured)

mod logging;
mod resend;

pub use logging::LoggingEmailClient;
pub use resend::{HttpEmailClient, ResendConfig};
