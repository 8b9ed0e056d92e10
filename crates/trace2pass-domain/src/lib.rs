//! Trace2Pass-Core shared domain types.
//!
//! Zero-I/O crate: every type named in the data model lives here so that
//! the report store, toolchain driver, and diagnosis pipeline share one
//! vocabulary instead of each owning a private copy.

pub mod bug_record;
pub mod config;
pub mod diagnosis;
pub mod digest;
pub mod error;
pub mod event;
pub mod priority;
pub mod outcome;

pub use bug_record::{BugRecord, BugStatus};
pub use config::{CompilerFamily, Config, OutputSink};
pub use diagnosis::{
    Diagnosis, PassBisectionResult, PassDisposition, TriState, UbSignals, Verdict,
    VersionBisectionResult, VersionDisposition, VersionProbe, Workaround,
};
pub use digest::{ContentDigest, Fingerprint};
pub use error::{Result, Trace2PassError};
pub use event::{
    AnomalyEvent, BuildInfo, CheckDetails, CheckKind, CompilerIdentity, Location, SystemInfo,
};
pub use outcome::{classify_outcome, CompileStatus, RunStatus, TestOutcome, Verdict3};
pub use priority::{default_severity_weight, priority_score, recency_factor};
