//! Side Channel Adapters
//!
//! - **QueuedSideChannel** - Background worker with email retries

mod queued;

pub use queued::{QueuedSideChannel, SideChannelConfig, SideChannelStats};
