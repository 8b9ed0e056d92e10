//! The `BugStore` trait: the single storage seam the diagnosis pipeline
//! depends on, with an in-memory fake and a SurrealDB-backed implementation.

use async_trait::async_trait;
use trace2pass_domain::{AnomalyEvent, BugRecord, BugStatus, Diagnosis, Fingerprint};

use crate::error::Result;

/// Summary statistics for the `stats` query surface (spec §6).
#[derive(Debug, Clone, PartialEq)]
pub struct StoreStats {
    pub total_records: u64,
    pub by_status: Vec<(BugStatus, u64)>,
}

/// A queued record ready for diagnosis, ordered by recomputed priority
/// (highest first).
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedRecord {
    pub record: BugRecord,
    pub priority: f64,
}

/// Report-store abstraction used by the CLI, daemon, and diagnosis pipeline.
///
/// Implementations must uphold:
/// - I1: `submit` dedupes by fingerprint, folding repeats into
///   `occurrence_count`/`last_seen` rather than creating a second record.
/// - I2: `update_status` rejects transitions not allowed by
///   [`BugStatus::can_advance_to`], leaving the stored record untouched.
/// - I3: priority is never persisted; `queue` recomputes it from the stored
///   `occurrence_count`/`last_seen`/check kind on every call.
#[async_trait]
pub trait BugStore: Send + Sync {
    /// Submit a new anomaly observation, creating or updating a `BugRecord`.
    /// Returns the resulting record after fold-in.
    async fn submit(&self, event: AnomalyEvent) -> Result<BugRecord>;

    /// Fetch a single record by fingerprint.
    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<BugRecord>>;

    /// List records pending diagnosis (status `New` or `Triaged`), ordered by
    /// recomputed priority, descending.
    async fn queue(&self) -> Result<Vec<QueuedRecord>>;

    /// Advance a record's status, optionally attaching a diagnosis when
    /// transitioning into `Diagnosed`.
    async fn update_status(
        &self,
        fingerprint: &Fingerprint,
        next: BugStatus,
        diagnosis: Option<Diagnosis>,
    ) -> Result<BugRecord>;

    /// Aggregate counts across all stored records.
    async fn stats(&self) -> Result<StoreStats>;
}

#[cfg(test)]
pub(crate) fn assert_send_sync<T: Send + Sync>() {}
