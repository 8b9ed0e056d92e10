//! SurrealDB-backed `BugStore`.
//!
//! Manages connection setup and CRUD for the `bug_records` table.

use async_trait::async_trait;
use chrono::Utc;
use surrealdb::engine::local::{Db, Mem};
use surrealdb::Surreal;
use tracing::{debug, info, instrument};

use trace2pass_domain::{
    priority_score, AnomalyEvent, BugRecord, BugStatus, Config, Diagnosis, Fingerprint,
};

use crate::bug_store::{BugStore, QueuedRecord, StoreStats};
use crate::error::{Result, StoreError};
use crate::schema::{status_to_str, BugRecordRow};

/// SurrealDB connection handle backing the report store.
pub struct SurrealBugStore {
    db: Surreal<Db>,
    config: Config,
}

impl SurrealBugStore {
    /// Connect to an in-memory SurrealDB instance and initialize schema.
    #[instrument(skip_all)]
    pub async fn setup_db(config: Config) -> Result<Self> {
        info!("connecting to SurrealDB (in-memory)");

        let db = Surreal::new::<Mem>(())
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        db.use_ns("trace2pass")
            .use_db("main")
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let handle = SurrealBugStore { db, config };
        handle.init_schema().await?;

        info!("SurrealDB connected and schema initialized");
        Ok(handle)
    }

    async fn init_schema(&self) -> Result<()> {
        debug!("initializing bug_records schema");

        let schema = r#"
            DEFINE TABLE bug_records SCHEMAFULL;
            DEFINE FIELD fingerprint ON bug_records TYPE string;
            DEFINE FIELD canonical_event ON bug_records FLEXIBLE TYPE object;
            DEFINE FIELD occurrence_count ON bug_records TYPE int;
            DEFINE FIELD first_seen ON bug_records TYPE datetime;
            DEFINE FIELD last_seen ON bug_records TYPE datetime;
            DEFINE FIELD status ON bug_records TYPE string;
            DEFINE FIELD check_kind ON bug_records TYPE string;
            DEFINE FIELD diagnosis ON bug_records FLEXIBLE TYPE option<object>;
            DEFINE INDEX idx_bug_fingerprint ON bug_records FIELDS fingerprint UNIQUE;
        "#;

        self.db
            .query(schema)
            .await
            .map_err(|e| StoreError::SchemaSetup(e.to_string()))?;

        debug!("schema initialized");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn fetch_row(&self, fingerprint: &str) -> Result<Option<BugRecordRow>> {
        let fp = fingerprint.to_string();
        let mut result = self
            .db
            .query("SELECT * FROM bug_records WHERE fingerprint = $fp")
            .bind(("fp", fp))
            .await?;
        let rows: Vec<BugRecordRow> = result.take(0)?;
        Ok(rows.into_iter().next())
    }
}

#[async_trait]
impl BugStore for SurrealBugStore {
    #[instrument(skip(self, event))]
    async fn submit(&self, event: AnomalyEvent) -> Result<BugRecord> {
        let fingerprint = event.fingerprint();

        if let Some(row) = self.fetch_row(fingerprint.as_str()).await? {
            let mut record = row.into_domain()?;
            record.record_occurrence(event.timestamp);
            let updated_row = BugRecordRow::from_domain(&record)?;
            let fp = fingerprint.as_str().to_string();

            let mut result = self
                .db
                .query(
                    "UPDATE bug_records SET occurrence_count = $count, last_seen = $last \
                     WHERE fingerprint = $fp",
                )
                .bind(("count", updated_row.occurrence_count))
                .bind(("last", updated_row.last_seen))
                .bind(("fp", fp))
                .await?;
            let _: Vec<BugRecordRow> = result.take(0)?;
            return Ok(record);
        }

        let record = BugRecord::new(event);
        let row = BugRecordRow::from_domain(&record)?;

        let created: Option<BugRecordRow> = self.db.create("bug_records").content(row).await?;
        created.ok_or_else(|| StoreError::Transaction("failed to create bug record".to_string()))?;
        Ok(record)
    }

    #[instrument(skip(self))]
    async fn get(&self, fingerprint: &Fingerprint) -> Result<Option<BugRecord>> {
        match self.fetch_row(fingerprint.as_str()).await? {
            Some(row) => Ok(Some(row.into_domain()?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    async fn queue(&self) -> Result<Vec<QueuedRecord>> {
        let mut result = self
            .db
            .query("SELECT * FROM bug_records WHERE status = 'new' OR status = 'triaged'")
            .await?;
        let rows: Vec<BugRecordRow> = result.take(0)?;
        let now = Utc::now();

        let mut queued = Vec::with_capacity(rows.len());
        for row in rows {
            let record = row.into_domain()?;
            let kind = record.canonical_event.check_type;
            let weight = self.config.severity_weight(kind);
            let priority = priority_score(record.occurrence_count, kind, record.last_seen, now, weight);
            queued.push(QueuedRecord { record, priority });
        }
        queued.sort_by(|a, b| b.priority.partial_cmp(&a.priority).unwrap());
        Ok(queued)
    }

    #[instrument(skip(self, diagnosis))]
    async fn update_status(
        &self,
        fingerprint: &Fingerprint,
        next: BugStatus,
        diagnosis: Option<Diagnosis>,
    ) -> Result<BugRecord> {
        let row = self
            .fetch_row(fingerprint.as_str())
            .await?
            .ok_or_else(|| StoreError::NotFound {
                fingerprint: fingerprint.as_str().to_string(),
            })?;
        let mut record = row.into_domain()?;
        let from = record.status;

        record
            .transition(next, diagnosis)
            .map_err(|_| StoreError::InvalidTransition {
                fingerprint: fingerprint.as_str().to_string(),
                reason: format!("{from:?} -> {next:?} not allowed"),
            })?;

        let updated_row = BugRecordRow::from_domain(&record)?;
        let fp = fingerprint.as_str().to_string();

        let mut result = self
            .db
            .query(
                "UPDATE bug_records SET status = $status, diagnosis = $diagnosis \
                 WHERE fingerprint = $fp",
            )
            .bind(("status", status_to_str(record.status).to_string()))
            .bind(("diagnosis", updated_row.diagnosis))
            .bind(("fp", fp))
            .await?;
        let _: Vec<BugRecordRow> = result.take(0)?;

        Ok(record)
    }

    #[instrument(skip(self))]
    async fn stats(&self) -> Result<StoreStats> {
        let mut result = self.db.query("SELECT * FROM bug_records").await?;
        let rows: Vec<BugRecordRow> = result.take(0)?;

        let mut by_status: std::collections::HashMap<BugStatus, u64> =
            std::collections::HashMap::new();
        for row in &rows {
            let status = crate::schema::status_from_str(&row.status)?;
            *by_status.entry(status).or_insert(0) += 1;
        }

        Ok(StoreStats {
            total_records: rows.len() as u64,
            by_status: by_status.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trace2pass_domain::event::{BuildInfo, CheckKind, CompilerIdentity, Location, SystemInfo};

    fn sample_event() -> AnomalyEvent {
        AnomalyEvent {
            report_id: "r1".to_string(),
            timestamp: Utc::now(),
            check_type: CheckKind::BoundsViolation,
            location: Location {
                file: "b.c".to_string(),
                line: 22,
                function: "g".to_string(),
            },
            pc: None,
            stacktrace: vec![],
            compiler: CompilerIdentity {
                name: "gcc".to_string(),
                version: "13".to_string(),
                target: "x86_64".to_string(),
            },
            build_info: BuildInfo {
                optimization_level: "-O1".to_string(),
                flags: vec![],
                source_hash: "h2".to_string(),
                binary_checksum: "c2".to_string(),
            },
            check_details: serde_json::json!({}),
            system_info: SystemInfo::default(),
        }
    }

    #[tokio::test]
    async fn connects_and_initializes_schema() {
        let store = SurrealBugStore::setup_db(Config::default()).await;
        assert!(store.is_ok(), "failed to connect: {:?}", store.err());
    }

    #[tokio::test]
    async fn submit_then_get_roundtrips() {
        let store = SurrealBugStore::setup_db(Config::default()).await.unwrap();
        let event = sample_event();
        let record = store.submit(event).await.unwrap();

        let fetched = store.get(&record.fingerprint).await.unwrap();
        assert!(fetched.is_some());
        assert_eq!(fetched.unwrap().occurrence_count, 1);
    }

    #[tokio::test]
    async fn duplicate_submit_increments_occurrence_count() {
        let store = SurrealBugStore::setup_db(Config::default()).await.unwrap();
        let event = sample_event();

        store.submit(event.clone()).await.unwrap();
        let second = store.submit(event).await.unwrap();
        assert_eq!(second.occurrence_count, 2);

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_records, 1);
    }

    #[tokio::test]
    async fn update_status_persists_across_get() {
        let store = SurrealBugStore::setup_db(Config::default()).await.unwrap();
        let record = store.submit(sample_event()).await.unwrap();

        store
            .update_status(&record.fingerprint, BugStatus::Triaged, None)
            .await
            .unwrap();

        let fetched = store.get(&record.fingerprint).await.unwrap().unwrap();
        assert_eq!(fetched.status, BugStatus::Triaged);
    }
}
