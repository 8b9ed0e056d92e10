//! `BugRecord`: one per fingerprint, the unit of work the store tracks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::digest::Fingerprint;
use crate::diagnosis::Diagnosis;
use crate::error::Trace2PassError;
use crate::event::AnomalyEvent;

/// Lifecycle status of a `BugRecord`.
///
/// Advances monotonically through `New -> Triaged -> Diagnosing ->
/// {Diagnosed, UserUb, Inconclusive}` (I2). Once terminal, a record is not
/// reopened by new events — only explicit operator action may do so.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BugStatus {
    New,
    Triaged,
    Diagnosing,
    Diagnosed,
    UserUb,
    FalsePositive,
    Inconclusive,
}

impl BugStatus {
    /// Terminal statuses are not advanced further except by explicit
    /// operator action.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BugStatus::Diagnosed
                | BugStatus::UserUb
                | BugStatus::FalsePositive
                | BugStatus::Inconclusive
        )
    }

    /// Whether `self -> next` is a legal forward transition per I2. Operator
    /// overrides (terminal -> anything) are handled by the caller, not here.
    pub fn can_advance_to(self, next: BugStatus) -> bool {
        use BugStatus::*;
        matches!(
            (self, next),
            (New, Triaged)
                | (New, Diagnosing)
                | (Triaged, Diagnosing)
                | (Diagnosing, Diagnosed)
                | (Diagnosing, UserUb)
                | (Diagnosing, Inconclusive)
                | (Diagnosing, FalsePositive)
        )
    }
}

/// One record per fingerprint; never destroyed automatically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BugRecord {
    pub fingerprint: Fingerprint,
    /// First observation, frozen at creation time.
    pub canonical_event: AnomalyEvent,
    pub occurrence_count: u64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub status: BugStatus,
    pub diagnosis: Option<Diagnosis>,
}

impl BugRecord {
    /// Create a new record from the first observed event of a fingerprint.
    pub fn new(event: AnomalyEvent) -> Self {
        let now = event.timestamp;
        BugRecord {
            fingerprint: event.fingerprint(),
            canonical_event: event,
            occurrence_count: 1,
            first_seen: now,
            last_seen: now,
            status: BugStatus::New,
            diagnosis: None,
        }
    }

    /// Fold in a subsequent event of the same fingerprint: increments count
    /// and advances `last_seen`, never touches `status` or `canonical_event`.
    pub fn record_occurrence(&mut self, observed_at: DateTime<Utc>) {
        self.occurrence_count += 1;
        if observed_at > self.last_seen {
            self.last_seen = observed_at;
        }
    }

    /// Transition status, enforcing I2. `diagnosis` is attached whenever the
    /// target status is terminal (`Diagnosed`, `UserUb`, `Inconclusive`,
    /// `FalsePositive`) — every terminal exit carries its full signal trace.
    pub fn transition(
        &mut self,
        next: BugStatus,
        diagnosis: Option<Diagnosis>,
    ) -> Result<(), Trace2PassError> {
        if !self.status.can_advance_to(next) {
            return Err(Trace2PassError::InvalidStatusTransition {
                from: format!("{:?}", self.status),
                to: format!("{:?}", next),
            });
        }
        self.status = next;
        if next.is_terminal() {
            self.diagnosis = diagnosis;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{BuildInfo, CheckKind, CompilerIdentity, Location, SystemInfo};

    fn sample_event() -> AnomalyEvent {
        AnomalyEvent {
            report_id: "r-1".to_string(),
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
        }
    }

    #[test]
    fn new_record_starts_at_count_one_status_new() {
        let record = BugRecord::new(sample_event());
        assert_eq!(record.occurrence_count, 1);
        assert_eq!(record.status, BugStatus::New);
        assert!(record.diagnosis.is_none());
    }

    #[test]
    fn record_occurrence_increments_count_and_last_seen() {
        let mut record = BugRecord::new(sample_event());
        let later = record.last_seen + chrono::Duration::seconds(5);
        record.record_occurrence(later);
        assert_eq!(record.occurrence_count, 2);
        assert_eq!(record.last_seen, later);
    }

    #[test]
    fn status_transitions_follow_lifecycle() {
        let mut record = BugRecord::new(sample_event());
        record.transition(BugStatus::Triaged, None).unwrap();
        record.transition(BugStatus::Diagnosing, None).unwrap();
        record.transition(BugStatus::UserUb, None).unwrap();
        assert_eq!(record.status, BugStatus::UserUb);
        assert!(record.status.is_terminal());
    }

    #[test]
    fn illegal_transition_rejected() {
        let mut record = BugRecord::new(sample_event());
        // New -> Diagnosed is not a legal direct transition.
        assert!(record.transition(BugStatus::Diagnosed, None).is_err());
    }

    #[test]
    fn terminal_status_not_silently_reopened() {
        let mut record = BugRecord::new(sample_event());
        record.transition(BugStatus::Diagnosing, None).unwrap();
        record.transition(BugStatus::Inconclusive, None).unwrap();
        assert!(record.status.is_terminal());
        assert!(!record.status.can_advance_to(BugStatus::Diagnosing));
    }

    fn sample_diagnosis(fingerprint: Fingerprint) -> Diagnosis {
        Diagnosis {
            fingerprint,
            verdict: crate::diagnosis::Verdict::UserUb,
            confidence: 0.9,
            signals: crate::diagnosis::UbSignals {
                ubsan_clean: crate::diagnosis::TriState::True,
                optimization_sensitive: crate::diagnosis::TriState::Unknown,
                multi_compiler_differs: crate::diagnosis::TriState::Unknown,
            },
            version_bisection: None,
            pass_bisection: None,
            workaround: None,
            timestamp: Utc::now(),
        }
    }

    /// Every terminal exit — not just `Diagnosed` — carries its full signal
    /// trace; nothing downgrades a `UserUb`/`Inconclusive`/`FalsePositive`
    /// verdict to a bare status with no diagnosis attached.
    #[test]
    fn every_terminal_status_attaches_its_diagnosis() {
        for terminal in [
            BugStatus::UserUb,
            BugStatus::Inconclusive,
            BugStatus::FalsePositive,
        ] {
            let mut record = BugRecord::new(sample_event());
            let diagnosis = sample_diagnosis(record.fingerprint.clone());
            record.transition(BugStatus::Diagnosing, None).unwrap();
            record
                .transition(terminal, Some(diagnosis))
                .unwrap();
            assert!(
                record.diagnosis.is_some(),
                "{terminal:?} must carry its diagnosis"
            );
        }
    }
}
