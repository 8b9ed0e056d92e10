//! In-memory `BugStore` fake for unit tests and local CLI runs without a
//! SurrealDB instance.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use trace2pass_domain::{
    priority_score, AnomalyEvent, BugRecord, BugStatus, Config, Diagnosis, Fingerprint,
};

use crate::bug_store::{BugStore, QueuedRecord, StoreStats};
use crate::error::{Result, StoreError};

/// `Mutex<HashMap<_>>`-backed `BugStore`. Not persisted across process
/// restarts; intended for tests and `--no-db` CLI invocations.
#[derive(Debug)]
pub struct MemoryBugStore {
    records: Mutex<HashMap<Fingerprint, BugRecord>>,
    config: Config,
}

impl MemoryBugStore {
    pub fn new(config: Config) -> Self {
        MemoryBugStore {
            records: Mutex::new(HashMap::new()),
            config,
        }
    }
}

#[async_trait]
impl BugStore for MemoryBugStore {
    async fn submit(&self, event: AnomalyEvent) -> Result<BugRecord> {
        let fingerprint = event.fingerprint();
        let mut records = self.records.lock().unwrap();

        let record = match records.get_mut(&fingerprint) {
            Some(existing) => {
                existing.record_occurrence(event.timestamp);
                existing.clone()
            }
            None => {
                let record = BugRecord::new(event);
                records.insert(fingerprint, record.clone());
                record
            }
        };
        Ok(record)
    }

    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<BugRecord>> {
        let records = self.records.lock().unwrap();
        Ok(records.get(fingerprint).cloned())
    }

    async fn queue(&self) -> Result<Vec<QueuedRecord>> {
        let records = self.records.lock().unwrap();
        let now = Utc::now();

        let mut queued: Vec<QueuedRecord> = records
            .values()
            .filter(|r| matches!(r.status, BugStatus::New | BugStatus::Triaged))
            .map(|r| {
                let kind = r.canonical_event.check_type;
                let weight = self.config.severity_weight(kind);
                let priority =
                    priority_score(r.occurrence_count, kind, r.last_seen, now, weight);
                QueuedRecord {
                    record: r.clone(),
                    priority,
                }
            })
            .collect();

        queued.sort_by(|a, b| b.priority.partial_cmp(&a.priority).unwrap());
        Ok(queued)
    }

    async fn update_status(
        &self,
        fingerprint: &Fingerprint,
        next: BugStatus,
        diagnosis: Option<Diagnosis>,
    ) -> Result<BugRecord> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(fingerprint)
            .ok_or_else(|| StoreError::NotFound {
                fingerprint: fingerprint.as_str().to_string(),
            })?;

        let from = record.status;
        record
            .transition(next, diagnosis)
            .map_err(|_| StoreError::InvalidTransition {
                fingerprint: fingerprint.as_str().to_string(),
                reason: format!("{from:?} -> {next:?} not allowed"),
            })?;
        Ok(record.clone())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let records = self.records.lock().unwrap();
        let mut by_status: HashMap<BugStatus, u64> = HashMap::new();
        for record in records.values() {
            *by_status.entry(record.status).or_insert(0) += 1;
        }
        Ok(StoreStats {
            total_records: records.len() as u64,
            by_status: by_status.into_iter().collect(),
        })
    }
}
