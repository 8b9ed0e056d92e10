//! Trace2Pass-Core diagnosis pipeline: UB Detection, Compiler Version
//! Bisection, and Optimization Pass Bisection, sequenced by the Pipeline
//! Orchestrator.

pub mod bisect;
pub mod obs;
pub mod orchestrator;
pub mod pass_bisector;
pub mod telemetry;
pub mod ub_detector;
pub mod version_bisector;

pub use bisect::{run_bisection, BisectionOutcome, BisectionResult, ProbeRecord};
pub use obs::{
    emit_bisection_probe, emit_diagnosis_finished, emit_diagnosis_started, emit_stage_skipped,
    RunSpan,
};
pub use orchestrator::{run_diagnosis, DiagnosisRequest};
pub use pass_bisector::bisect_passes;
pub use telemetry::init_tracing;
pub use ub_detector::{detect, UbDetectionResult};
pub use version_bisector::bisect_versions;

/// Trace2Pass-Core version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
