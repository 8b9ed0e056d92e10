//! Priority scoring: a pure function of (count, severity weight, recency).
//!
//! Per I3, priority is never stored — it is recomputed on query.

use chrono::{DateTime, Utc};

use crate::event::CheckKind;

/// Default severity weight table from spec §4.1.
pub fn default_severity_weight(kind: CheckKind) -> f64 {
    match kind {
        CheckKind::ArithmeticOverflow => 1.0,
        CheckKind::Unreachable => 0.9,
        CheckKind::BoundsViolation => 1.0,
        CheckKind::DivisionByZero => 0.8,
        CheckKind::PureInconsistency => 0.7,
        CheckKind::SignConversion => 0.5,
        CheckKind::LoopBoundExceeded => 0.6,
    }
}

/// `1.0` within 7 days, `0.5` within 30, `0.2` otherwise.
pub fn recency_factor(last_seen: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let age = now.signed_duration_since(last_seen);
    if age <= chrono::Duration::days(7) {
        1.0
    } else if age <= chrono::Duration::days(30) {
        0.5
    } else {
        0.2
    }
}

/// `priority = count * severity_weight[check_kind] * recency_factor(last_seen)`.
pub fn priority_score(
    occurrence_count: u64,
    check_kind: CheckKind,
    last_seen: DateTime<Utc>,
    now: DateTime<Utc>,
    severity_weight: f64,
) -> f64 {
    let _ = check_kind; // weight is passed explicitly so callers may override the table
    occurrence_count as f64 * severity_weight * recency_factor(last_seen, now)
}
