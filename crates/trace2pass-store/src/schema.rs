//! SurrealDB row schema for the `bug_records` table (Layer 0 — persistence).
//!
//! Layer 0 deliberately uses plain string/JSON-typed fields rather than the
//! richer `trace2pass-domain` enums directly, so the storage schema stays
//! decoupled from domain-type changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

use trace2pass_domain::{BugRecord, BugStatus};

/// Serialize/deserialize `chrono::DateTime<Utc>` via `surrealdb::sql::Datetime`.
pub mod surreal_dt {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sd = SurrealDatetime::from(*date);
        serde::Serialize::serialize(&sd, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = SurrealDatetime::deserialize(deserializer)?;
        Ok(DateTime::from(sd))
    }
}

/// Same as [`surreal_dt`] but for `Option<DateTime<Utc>>`.
pub mod surreal_dt_opt {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => {
                let sd = SurrealDatetime::from(*d);
                serde::Serialize::serialize(&Some(sd), serializer)
            }
            None => serde::Serialize::serialize(&None::<SurrealDatetime>, serializer),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = Option::<SurrealDatetime>::deserialize(deserializer)?;
        Ok(sd.map(DateTime::from))
    }
}

/// Row stored in the `bug_records` table.
///
/// `status` and `check_kind` are plain strings at this layer; conversion to
/// the domain's closed enums happens at the `BugStore` trait boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BugRecordRow {
    pub id: Option<Thing>,
    pub fingerprint: String,
    pub canonical_event: serde_json::Value,
    pub occurrence_count: u64,
    #[serde(with = "surreal_dt")]
    pub first_seen: DateTime<Utc>,
    #[serde(with = "surreal_dt")]
    pub last_seen: DateTime<Utc>,
    pub status: String,
    pub check_kind: String,
    pub diagnosis: Option<serde_json::Value>,
}

impl BugRecordRow {
    pub fn from_domain(record: &BugRecord) -> Result<Self, serde_json::Error> {
        Ok(BugRecordRow {
            id: None,
            fingerprint: record.fingerprint.as_str().to_string(),
            canonical_event: serde_json::to_value(&record.canonical_event)?,
            occurrence_count: record.occurrence_count,
            first_seen: record.first_seen,
            last_seen: record.last_seen,
            status: status_to_str(record.status).to_string(),
            check_kind: record.canonical_event.check_type.as_str().to_string(),
            diagnosis: record
                .diagnosis
                .as_ref()
                .map(serde_json::to_value)
                .transpose()?,
        })
    }

    pub fn into_domain(self) -> Result<BugRecord, crate::error::StoreError> {
        Ok(BugRecord {
            fingerprint: trace2pass_domain::Fingerprint::try_from(self.fingerprint)?,
            canonical_event: serde_json::from_value(self.canonical_event)?,
            occurrence_count: self.occurrence_count,
            first_seen: self.first_seen,
            last_seen: self.last_seen,
            status: status_from_str(&self.status)?,
            diagnosis: self
                .diagnosis
                .map(serde_json::from_value)
                .transpose()?,
        })
    }
}

pub fn status_to_str(status: BugStatus) -> &'static str {
    match status {
        BugStatus::New => "new",
        BugStatus::Triaged => "triaged",
        BugStatus::Diagnosing => "diagnosing",
        BugStatus::Diagnosed => "diagnosed",
        BugStatus::UserUb => "user_ub",
        BugStatus::FalsePositive => "false_positive",
        BugStatus::Inconclusive => "inconclusive",
    }
}

pub fn status_from_str(s: &str) -> Result<BugStatus, crate::error::StoreError> {
    Ok(match s {
        "new" => BugStatus::New,
        "triaged" => BugStatus::Triaged,
        "diagnosing" => BugStatus::Diagnosing,
        "diagnosed" => BugStatus::Diagnosed,
        "user_ub" => BugStatus::UserUb,
        "false_positive" => BugStatus::FalsePositive,
        "inconclusive" => BugStatus::Inconclusive,
        other => {
            return Err(crate::error::StoreError::Transaction(format!(
                "unknown status in storage row: {other}"
            )))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use trace2pass_domain::event::{BuildInfo, CheckKind, CompilerIdentity, Location, SystemInfo};
    use trace2pass_domain::AnomalyEvent;

    fn sample_record() -> BugRecord {
        let event = AnomalyEvent {
            report_id: "r1".to_string(),
            timestamp: Utc::now(),
            check_type: CheckKind::Unreachable,
            location: Location {
                file: "a.c".to_string(),
                line: 1,
                function: "f".to_string(),
            },
            pc: None,
            stacktrace: vec![],
            compiler: CompilerIdentity {
                name: "clang".to_string(),
                version: "17".to_string(),
                target: "x86_64".to_string(),
            },
            build_info: BuildInfo {
                optimization_level: "-O2".to_string(),
                flags: vec![],
                source_hash: "h".to_string(),
                binary_checksum: "c".to_string(),
            },
            check_details: serde_json::json!({}),
            system_info: SystemInfo::default(),
        };
        BugRecord::new(event)
    }

    #[test]
    fn row_roundtrips_through_domain_and_back() {
        let record = sample_record();
        let row = BugRecordRow::from_domain(&record).unwrap();
        assert_eq!(row.status, "new");
        assert_eq!(row.check_kind, "unreachable");

        let back = row.into_domain().unwrap();
        assert_eq!(back.fingerprint, record.fingerprint);
        assert_eq!(back.occurrence_count, record.occurrence_count);
    }

    #[test]
    fn unknown_status_string_rejected() {
        assert!(status_from_str("not_a_status").is_err());
    }
}
