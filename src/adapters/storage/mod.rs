//! Storage Adapters
//!
//! Implementations of the `EntityStore` port.
//!
//! ## Available Adapters
//!
//! - **InMemoryStore** - One table of rows in memory (testing/development)
//! - **SeedData** - Loads JSON/YAML table snapshots into in-memory stores
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{in_memory_stores, SeedData};
//!
//! // From a snapshot on disk
//! let stores = SeedData::load("./data/seed.yaml")?.into_stores()?;
//!
//! // Empty tables
//! let stores = in_memory_stores();
//! ```

mod in_memory_store;
mod seed;

pub use in_memory_store::InMemoryStore;
pub use seed::{in_memory_stores, SeedData, SeedError};
