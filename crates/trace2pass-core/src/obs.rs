//! Structured observability hooks for the diagnosis pipeline's lifecycle.
//!
//! Provides a run-scoped tracing span (`RunSpan`) and emission functions for
//! the key lifecycle events a diagnosis run produces: start, each bisection
//! probe, and finish. Events are emitted at `info!` level; set `RUST_LOG` or
//! pass `json = true` to [`crate::telemetry::init_tracing`] for aggregation.

use tracing::info;

/// RAII guard that enters a diagnosis-scoped tracing span for the duration
/// of one fingerprint's run through the pipeline.
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    /// Create and enter a span tagged with the bug's fingerprint.
    pub fn enter(fingerprint: &str) -> Self {
        let span = tracing::info_span!("trace2pass.diagnosis", fingerprint = %fingerprint);
        Self {
            _span: span.entered(),
        }
    }
}

/// Emit event: diagnosis pipeline started for a fingerprint.
pub fn emit_diagnosis_started(fingerprint: &str) {
    info!(event = "diagnosis.started", fingerprint = %fingerprint);
}

/// Emit event: diagnosis pipeline finished with a terminal verdict.
pub fn emit_diagnosis_finished(fingerprint: &str, verdict: &str, duration_ms: u64) {
    info!(
        event = "diagnosis.finished",
        fingerprint = %fingerprint,
        verdict = %verdict,
        duration_ms = duration_ms,
    );
}

/// Emit event: one bisection probe (version or pass) was run.
///
/// `label` is the thing probed (a version string or a pass name); `verdict`
/// is its pass/fail/indeterminate outcome — the two must never be
/// conflated, since a version label is not itself a verdict.
pub fn emit_bisection_probe(
    fingerprint: &str,
    stage: &str,
    index: usize,
    label: &str,
    verdict: &str,
    wall_time_ms: u64,
) {
    info!(
        event = "bisection.probe",
        fingerprint = %fingerprint,
        stage = %stage,
        index = index,
        label = %label,
        verdict = %verdict,
        wall_time_ms = wall_time_ms,
    );
}

/// Emit event: a stage of the pipeline was skipped due to a gating verdict.
pub fn emit_stage_skipped(fingerprint: &str, stage: &str, reason: &str) {
    info!(
        event = "diagnosis.stage_skipped",
        fingerprint = %fingerprint,
        stage = %stage,
        reason = %reason,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_span_enter_does_not_panic() {
        let _span = RunSpan::enter("fp-test");
    }
}
