//! Pipeline Orchestrator: sequences C3 → C4 → C5 subject to confidence
//! gates, synthesizes the terminal `Diagnosis`, and is the sole writer of a
//! `BugRecord`'s terminal status.
//!
//! Source acquisition and test-case minimization are out of scope for this
//! pipeline (spec Non-goals) — the orchestrator is handed a ready-to-run
//! reproducer and an ordered version list by its caller, not derived from
//! the stored `AnomalyEvent` (which carries only a `source_hash`, not the
//! source text itself).

use std::time::Instant;

use trace2pass_domain::{
    CompilerFamily, Config, Diagnosis, Fingerprint, PassDisposition, TestOutcome, Verdict,
    VersionDisposition, Workaround,
};
use trace2pass_store::BugStore;
use trace2pass_toolchain::{ToolchainDriver, ToolchainRegistry};

use crate::obs::{emit_bisection_probe, emit_diagnosis_finished, emit_diagnosis_started, emit_stage_skipped, RunSpan};
use crate::pass_bisector::bisect_passes;
use crate::ub_detector::detect;
use crate::version_bisector::bisect_versions;

/// Everything the orchestrator needs to run one fingerprint through the
/// pipeline, supplied by the caller (the store's `BugRecord` itself is not
/// enough: it carries no reproducer source).
pub struct DiagnosisRequest<'a> {
    pub fingerprint: Fingerprint,
    pub source: &'a str,
    pub family: CompilerFamily,
    /// Ordered oldest → newest; must include the version at which the bug
    /// currently reproduces.
    pub versions: &'a [String],
    pub optimization_level: &'a str,
    pub skip_budget: u32,
    pub passes: &'a (dyn Fn(&TestOutcome) -> bool + Sync),
}

/// Run the full C3 → C4 → C5 pipeline for one fingerprint and persist the
/// terminal outcome via `store.update_status`. Returns the `Diagnosis` that
/// was written (or attempted to be written, for the user_ub/inconclusive
/// early-exit paths, where `Diagnosis.verdict` is the only meaningful
/// field).
pub async fn run_diagnosis(
    store: &dyn BugStore,
    driver: &ToolchainDriver,
    registry: &ToolchainRegistry,
    request: DiagnosisRequest<'_>,
) -> anyhow::Result<Diagnosis> {
    let start = Instant::now();
    let fp_str = request.fingerprint.as_str().to_string();
    let _span = RunSpan::enter(&fp_str);
    emit_diagnosis_started(&fp_str);

    // BugStatus only allows a direct New/Triaged -> Diagnosing -> terminal
    // path; every exit below lands on a terminal status, so claim the
    // record for diagnosis up front. A retried run after a crash may find
    // the record already Diagnosing (self-transitions aren't a legal
    // advance), in which case this is a no-op.
    let current = store
        .get(&request.fingerprint)
        .await?
        .ok_or_else(|| anyhow::anyhow!("no record for fingerprint {fp_str}"))?;
    if current.status != trace2pass_domain::BugStatus::Diagnosing {
        store
            .update_status(&request.fingerprint, trace2pass_domain::BugStatus::Diagnosing, None)
            .await?;
    }

    // An empty version list has no reproducing version to run C3 against;
    // this is the same vacuous-truth boundary C4 resolves on its own, so
    // short-circuit straight to it rather than probing with nothing.
    let Some(reproducing_version) = request.versions.last() else {
        let version_result = bisect_versions(
            driver,
            request.source,
            request.family,
            request.versions,
            request.optimization_level,
            request.skip_budget,
            request.passes,
        )
        .await?;
        let diagnosis = Diagnosis {
            fingerprint: request.fingerprint.clone(),
            verdict: Verdict::Inconclusive,
            confidence: 0.5,
            signals: trace2pass_domain::UbSignals {
                ubsan_clean: trace2pass_domain::TriState::Unknown,
                optimization_sensitive: trace2pass_domain::TriState::Unknown,
                multi_compiler_differs: trace2pass_domain::TriState::Unknown,
            },
            version_bisection: Some(version_result),
            pass_bisection: None,
            workaround: None,
            timestamp: chrono::Utc::now(),
        };
        store
            .update_status(
                &request.fingerprint,
                trace2pass_domain::BugStatus::Inconclusive,
                Some(diagnosis.clone()),
            )
            .await?;
        emit_diagnosis_finished(&fp_str, "inconclusive", start.elapsed().as_millis() as u64);
        return Ok(diagnosis);
    };

    let ub_result = detect(driver, request.source, request.family, reproducing_version).await?;

    if ub_result.verdict == Verdict::UserUb {
        emit_stage_skipped(&fp_str, "version_bisector", "verdict=user_ub");
        let diagnosis = terminal_diagnosis(request.fingerprint.clone(), &ub_result, None, None, None);
        store
            .update_status(
                &request.fingerprint,
                trace2pass_domain::BugStatus::UserUb,
                Some(diagnosis.clone()),
            )
            .await?;
        emit_diagnosis_finished(&fp_str, "user_ub", start.elapsed().as_millis() as u64);
        return Ok(diagnosis);
    }

    if ub_result.verdict == Verdict::Inconclusive {
        emit_stage_skipped(&fp_str, "version_bisector", "verdict=inconclusive");
        let diagnosis = terminal_diagnosis(request.fingerprint.clone(), &ub_result, None, None, None);
        store
            .update_status(
                &request.fingerprint,
                trace2pass_domain::BugStatus::Inconclusive,
                Some(diagnosis.clone()),
            )
            .await?;
        emit_diagnosis_finished(&fp_str, "inconclusive", start.elapsed().as_millis() as u64);
        return Ok(diagnosis);
    }

    // verdict == CompilerBug: run C4.
    let version_result = bisect_versions(
        driver,
        request.source,
        request.family,
        request.versions,
        request.optimization_level,
        request.skip_budget,
        request.passes,
    )
    .await?;
    for (i, probe) in version_result.versions_tested.iter().enumerate() {
        emit_bisection_probe(
            &fp_str,
            "version",
            i,
            &probe.version,
            &format!("{:?}", probe.verdict),
            probe.wall_time_ms,
        );
    }

    let unresolved_version_disposition = matches!(
        version_result.disposition,
        VersionDisposition::AllPass
            | VersionDisposition::AllFail
            | VersionDisposition::NonMonotonic
            | VersionDisposition::Unbisectable
    );

    if unresolved_version_disposition {
        emit_stage_skipped(&fp_str, "pass_bisector", "version disposition unresolved");
        let diagnosis =
            terminal_diagnosis(request.fingerprint.clone(), &ub_result, Some(version_result), None, None);
        store
            .update_status(
                &request.fingerprint,
                trace2pass_domain::BugStatus::Inconclusive,
                Some(diagnosis.clone()),
            )
            .await?;
        emit_diagnosis_finished(&fp_str, "inconclusive", start.elapsed().as_millis() as u64);
        return Ok(diagnosis);
    }

    let first_bad = version_result
        .first_bad
        .clone()
        .expect("Bisected disposition always carries first_bad");

    // run C5 at first_bad.
    let pass_result = bisect_passes(
        driver,
        registry,
        request.source,
        request.family,
        &first_bad,
        request.optimization_level,
        request.skip_budget,
        request.passes,
    )
    .await?;

    let workaround = synthesize_workaround(&pass_result);
    let diagnosis = terminal_diagnosis(
        request.fingerprint.clone(),
        &ub_result,
        Some(version_result),
        Some(pass_result),
        workaround,
    );

    store
        .update_status(
            &request.fingerprint,
            trace2pass_domain::BugStatus::Diagnosed,
            Some(diagnosis.clone()),
        )
        .await?;
    emit_diagnosis_finished(&fp_str, "diagnosed", start.elapsed().as_millis() as u64);

    Ok(diagnosis)
}

fn terminal_diagnosis(
    fingerprint: Fingerprint,
    ub_result: &crate::ub_detector::UbDetectionResult,
    version_bisection: Option<trace2pass_domain::VersionBisectionResult>,
    pass_bisection: Option<trace2pass_domain::PassBisectionResult>,
    workaround: Option<Workaround>,
) -> Diagnosis {
    Diagnosis {
        fingerprint,
        verdict: ub_result.verdict,
        confidence: ub_result.confidence,
        signals: ub_result.signals,
        version_bisection,
        pass_bisection,
        workaround,
        timestamp: chrono::Utc::now(),
    }
}

/// Prefer a pass-specific disable flag over an opt-level downgrade, with a
/// caveat when the pass-specific form isn't known to exist for the
/// suspected pass.
fn synthesize_workaround(pass_result: &trace2pass_domain::PassBisectionResult) -> Option<Workaround> {
    if pass_result.disposition != PassDisposition::Bisected {
        return None;
    }
    let suspected = pass_result.suspected_pass.as_ref()?;

    let (pass_flag, caveat) = match known_disable_flag(suspected) {
        Some(flag) => (Some(flag), None),
        None => (
            None,
            Some(format!(
                "no known disable flag for pass '{suspected}'; fall back to the opt-level downgrade"
            )),
        ),
    };

    Some(Workaround {
        pass_flag,
        optimization_level_downgrade: "-O1".to_string(),
        caveat,
    })
}

/// A small table of passes with a known, stable disable flag. Anything not
/// listed here falls back to the opt-level downgrade with a caveat.
fn known_disable_flag(pass: &str) -> Option<String> {
    match pass {
        "instcombine" => Some("-mllvm -disable-instcombine".to_string()),
        "mem2reg" => Some("-mllvm -disable-mem2reg".to_string()),
        "gvn" => Some("-mllvm -disable-gvn".to_string()),
        "licm" => Some("-mllvm -disable-licm".to_string()),
        "ccp" => Some("-fno-tree-ccp".to_string()),
        "dce" => Some("-fno-tree-dce".to_string()),
        "vect" => Some("-fno-tree-vectorize".to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trace2pass_domain::{
        AnomalyEvent, BuildInfo, CheckKind, CompilerIdentity, Location, SystemInfo,
    };
    use trace2pass_store::fakes::MemoryBugStore;

    fn sample_event() -> AnomalyEvent {
        AnomalyEvent {
            report_id: "r-1".to_string(),
            timestamp: chrono::Utc::now(),
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

    #[tokio::test]
    async fn unmapped_toolchain_run_ends_inconclusive_not_diagnosed() {
        let store = MemoryBugStore::new(Config::default());
        let event = sample_event();
        let fingerprint = event.fingerprint();
        store.submit(event).await.unwrap();

        let driver = ToolchainDriver::new(ToolchainRegistry::new(), Config::default());
        let registry = ToolchainRegistry::new();
        let versions = vec!["16".to_string(), "17".to_string()];

        let request = DiagnosisRequest {
            fingerprint: fingerprint.clone(),
            source: "int main(){return 0;}",
            family: CompilerFamily::Clang,
            versions: &versions,
            optimization_level: "-O2",
            skip_budget: 2,
            passes: &|_outcome| true,
        };

        let diagnosis = run_diagnosis(&store, &driver, &registry, request)
            .await
            .unwrap();

        // Every signal is Unknown with no resolvable toolchain, which fuses
        // to baseline confidence 0.5 -> Inconclusive, short-circuiting
        // before C4/C5 ever run.
        assert_eq!(diagnosis.verdict, Verdict::Inconclusive);
        assert!(diagnosis.version_bisection.is_none());
        assert!(diagnosis.pass_bisection.is_none());

        let record = store.get(&fingerprint).await.unwrap().unwrap();
        assert_eq!(record.status, trace2pass_domain::BugStatus::Inconclusive);
    }

    #[test]
    fn known_pass_gets_specific_disable_flag_without_caveat() {
        let result = trace2pass_domain::PassBisectionResult {
            disposition: PassDisposition::Bisected,
            suspected_pass: Some("instcombine".to_string()),
            suspect_group: vec!["instcombine".to_string()],
            pass_index: Some(3),
            total_passes: 6,
            candidates_tested: 3,
            wall_time_ms: 10,
        };
        let workaround = synthesize_workaround(&result).unwrap();
        assert_eq!(
            workaround.pass_flag,
            Some("-mllvm -disable-instcombine".to_string())
        );
        assert!(workaround.caveat.is_none());
    }

    #[test]
    fn unknown_pass_falls_back_to_opt_level_with_caveat() {
        let result = trace2pass_domain::PassBisectionResult {
            disposition: PassDisposition::Bisected,
            suspected_pass: Some("some-exotic-pass".to_string()),
            suspect_group: vec!["some-exotic-pass".to_string()],
            pass_index: Some(3),
            total_passes: 6,
            candidates_tested: 3,
            wall_time_ms: 10,
        };
        let workaround = synthesize_workaround(&result).unwrap();
        assert!(workaround.pass_flag.is_none());
        assert_eq!(workaround.optimization_level_downgrade, "-O1");
        assert!(workaround.caveat.is_some());
    }

    #[test]
    fn unbisectable_pass_result_has_no_workaround() {
        let result = trace2pass_domain::PassBisectionResult {
            disposition: PassDisposition::Unbisectable,
            suspected_pass: None,
            suspect_group: vec![],
            pass_index: None,
            total_passes: 6,
            candidates_tested: 2,
            wall_time_ms: 10,
        };
        assert!(synthesize_workaround(&result).is_none());
    }

    /// An empty version list has no `last()` to hand C3 — the orchestrator
    /// must short-circuit to C4's vacuous `AllPass` rather than panic.
    #[tokio::test]
    async fn empty_version_list_ends_inconclusive_without_panicking() {
        let store = MemoryBugStore::new(Config::default());
        let event = sample_event();
        let fingerprint = event.fingerprint();
        store.submit(event).await.unwrap();

        let driver = ToolchainDriver::new(ToolchainRegistry::new(), Config::default());
        let registry = ToolchainRegistry::new();
        let versions: Vec<String> = Vec::new();

        let request = DiagnosisRequest {
            fingerprint: fingerprint.clone(),
            source: "int main(){return 0;}",
            family: CompilerFamily::Clang,
            versions: &versions,
            optimization_level: "-O2",
            skip_budget: 2,
            passes: &|_outcome| true,
        };

        let diagnosis = run_diagnosis(&store, &driver, &registry, request)
            .await
            .unwrap();

        assert_eq!(diagnosis.verdict, Verdict::Inconclusive);
        assert_eq!(
            diagnosis.version_bisection.unwrap().disposition,
            VersionDisposition::AllPass
        );

        let record = store.get(&fingerprint).await.unwrap().unwrap();
        assert_eq!(record.status, trace2pass_domain::BugStatus::Inconclusive);
    }
}
