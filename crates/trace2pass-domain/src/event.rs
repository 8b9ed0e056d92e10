//! Ingested anomaly events: the raw input to the Report Store.

use serde::{Deserialize, Serialize};

use chrono::{DateTime, Utc};

/// The runtime check that fired, producing this event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    ArithmeticOverflow,
    Unreachable,
    BoundsViolation,
    DivisionByZero,
    SignConversion,
    PureInconsistency,
    LoopBoundExceeded,
}

impl CheckKind {
    /// Stable string form used as the fingerprint tuple element and in
    /// storage rows (never the `Debug` form, which is not a stable wire
    /// format).
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::ArithmeticOverflow => "arithmetic_overflow",
            CheckKind::Unreachable => "unreachable",
            CheckKind::BoundsViolation => "bounds_violation",
            CheckKind::DivisionByZero => "division_by_zero",
            CheckKind::SignConversion => "sign_conversion",
            CheckKind::PureInconsistency => "pure_inconsistency",
            CheckKind::LoopBoundExceeded => "loop_bound_exceeded",
        }
    }
}

impl std::str::FromStr for CheckKind {
    type Err = crate::error::Trace2PassError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "arithmetic_overflow" => CheckKind::ArithmeticOverflow,
            "unreachable" => CheckKind::Unreachable,
            "bounds_violation" => CheckKind::BoundsViolation,
            "division_by_zero" => CheckKind::DivisionByZero,
            "sign_conversion" => CheckKind::SignConversion,
            "pure_inconsistency" => CheckKind::PureInconsistency,
            "loop_bound_exceeded" => CheckKind::LoopBoundExceeded,
            other => {
                return Err(crate::error::Trace2PassError::MalformedEvent {
                    reason: format!("unknown check_kind: {other}"),
                })
            }
        })
    }
}

/// Source location of the fired check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub function: String,
}

/// Compiler identity at the time the binary was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerIdentity {
    pub name: String,
    pub version: String,
    pub target: String,
}

/// Build flags and optimization level used to produce the instrumented
/// binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildInfo {
    pub optimization_level: String,
    pub flags: Vec<String>,
    pub source_hash: String,
    pub binary_checksum: String,
}

/// Host/system metadata, carried for audit purposes only.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: Option<String>,
    pub arch: Option<String>,
    pub hostname: Option<String>,
}

/// Kind-specific payload: operands and computed/expected values. Left as a
/// JSON value since its shape depends on `check_kind` and is not otherwise
/// interpreted by the core.
pub type CheckDetails = serde_json::Value;

/// One immutable runtime detection emitted by an instrumented binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnomalyEvent {
    pub report_id: String,
    pub timestamp: DateTime<Utc>,
    pub check_type: CheckKind,
    pub location: Location,
    pub pc: Option<u64>,
    pub stacktrace: Vec<String>,
    pub compiler: CompilerIdentity,
    pub build_info: BuildInfo,
    pub check_details: CheckDetails,
    pub system_info: SystemInfo,
}

impl AnomalyEvent {
    /// Derive this event's `Fingerprint` per spec: hash over
    /// (file:line:function, check-kind, compiler-version, normalized flags).
    pub fn fingerprint(&self) -> crate::digest::Fingerprint {
        crate::digest::Fingerprint::compute(
            &self.location.file,
            self.location.line,
            &self.location.function,
            self.check_type.as_str(),
            &self.compiler.version,
            &self.build_info.flags,
        )
    }
}
