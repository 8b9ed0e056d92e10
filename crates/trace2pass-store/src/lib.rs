//! Trace2Pass-Core Report Store: SurrealDB-backed persistence for
//! `BugRecord`s, with an in-memory fake for tests and offline runs.
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: dedup by fingerprint (I1), monotonic status lifecycle (I2), and
//! recomputed-not-stored priority ordering (I3).
//!
//! ## Key Components
//!
//! - [`BugStore`]: the storage trait the rest of the workspace depends on.
//! - [`SurrealBugStore`]: production implementation.
//! - [`fakes::MemoryBugStore`]: in-memory fake for tests.

mod bug_store;
mod error;
pub mod fakes;
mod handle;
mod schema;

pub use bug_store::{BugStore, QueuedRecord, StoreStats};
pub use error::StoreError;
pub use handle::SurrealBugStore;
pub use schema::BugRecordRow;

/// Result type for report-store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
