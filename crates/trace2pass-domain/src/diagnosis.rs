//! `Diagnosis`: the terminal record produced by the Pipeline Orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::digest::Fingerprint;

/// A three-valued observation: known-true, known-false, or unknown (the
/// toolchain required to decide was unavailable, or both sides failed to
/// compile/run).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriState {
    True,
    False,
    Unknown,
}

/// Overall verdict of the UB Detector (C3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    CompilerBug,
    UserUb,
    Inconclusive,
}

/// The three signals C3 fuses into a confidence score, each with its raw
/// tri-state observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UbSignals {
    /// S1: UBSan-clean recompilation at -O0.
    pub ubsan_clean: TriState,
    /// S2: output diverges across optimization levels.
    pub optimization_sensitive: TriState,
    /// S3: clang and gcc disagree at -O2.
    pub multi_compiler_differs: TriState,
}

/// Closed disposition of a Version Bisector (C4) run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionDisposition {
    /// The bug was localized to a single `first_bad`/`last_good` pair.
    Bisected,
    /// Every version tested passes: no regression to localize.
    AllPass,
    /// Every version tested fails: regression predates the oldest version
    /// supplied.
    AllFail,
    /// The predicate disagreed with monotonicity (oldest fails, newest
    /// passes).
    NonMonotonic,
    /// The skip budget for indeterminate probes was exhausted.
    Unbisectable,
}

/// One version probed during a Version Bisector (C4) run, with its verdict
/// and wall-clock time, for the auditable decision log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionProbe {
    pub version: String,
    pub verdict: crate::outcome::Verdict3,
    pub wall_time_ms: u64,
}

/// Result of running the Version Bisector (C4).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionBisectionResult {
    pub disposition: VersionDisposition,
    pub first_bad: Option<String>,
    pub last_good: Option<String>,
    pub versions_tested: Vec<VersionProbe>,
    pub wall_time_ms: u64,
}

/// Closed disposition of a Pass Bisector (C5) run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassDisposition {
    /// A single suspected pass (or suspect group) was identified.
    Bisected,
    /// The empty-pass-list sanity run already failed, or the full-pass-list
    /// sanity run already passed.
    Unbisectable,
}

/// Result of running the Pass Bisector (C5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassBisectionResult {
    pub disposition: PassDisposition,
    pub suspected_pass: Option<String>,
    /// When the bisection straddled a group of passes applied atomically,
    /// every pass in the group; otherwise just `suspected_pass`.
    pub suspect_group: Vec<String>,
    pub pass_index: Option<usize>,
    pub total_passes: usize,
    pub candidates_tested: u32,
    pub wall_time_ms: u64,
}

/// A structured workaround recommendation. Prefers a pass-specific disable
/// flag over downgrading the optimization level; carries an explicit caveat
/// whenever the pass-specific form is not known to exist (spec §9 Open
/// Question 2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workaround {
    /// e.g. `-mllvm -disable-instcombine` or `-fno-tree-ccp`, when known.
    pub pass_flag: Option<String>,
    /// e.g. `-O1` — always populated as a fallback.
    pub optimization_level_downgrade: String,
    pub caveat: Option<String>,
}

/// The final record synthesized by the Pipeline Orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnosis {
    pub fingerprint: Fingerprint,
    pub verdict: Verdict,
    pub confidence: f64,
    pub signals: UbSignals,
    pub version_bisection: Option<VersionBisectionResult>,
    pub pass_bisection: Option<PassBisectionResult>,
    pub workaround: Option<Workaround>,
    pub timestamp: DateTime<Utc>,
}
