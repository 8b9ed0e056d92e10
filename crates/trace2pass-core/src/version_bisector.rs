//! Version Bisector (C4): binary search over a totally ordered list of
//! compiler versions for the oldest version at which a regression appears.

use std::time::Instant;

use trace2pass_domain::{
    classify_outcome, CompilerFamily, Config, Verdict3, VersionBisectionResult,
    VersionDisposition, VersionProbe,
};
use trace2pass_toolchain::{Recipe, ToolchainDriver};

use crate::bisect::{run_bisection, BisectionOutcome};

/// Bisect `versions` (oldest → newest) for the boundary at which `passes`
/// starts returning `false`.
///
/// An empty `versions` list is a vacuous truth — there is nothing to
/// disagree with, so it resolves as `AllPass` without probing anything.
pub async fn bisect_versions(
    driver: &ToolchainDriver,
    source: &str,
    family: CompilerFamily,
    versions: &[String],
    optimization_level: &str,
    skip_budget: u32,
    passes: impl Fn(&trace2pass_domain::TestOutcome) -> bool + Copy,
) -> anyhow::Result<VersionBisectionResult> {
    let start = Instant::now();

    if versions.is_empty() {
        return Ok(VersionBisectionResult {
            disposition: VersionDisposition::AllPass,
            first_bad: None,
            last_good: None,
            versions_tested: Vec::new(),
            wall_time_ms: start.elapsed().as_millis() as u64,
        });
    }

    let last = versions.len() - 1;

    let probe_verdict = |idx: usize| {
        let versions = versions.to_vec();
        let driver = driver;
        let family = family;
        let optimization_level = optimization_level.to_string();
        let source = source.to_string();
        async move {
            let probe_start = Instant::now();
            let recipe = Recipe::new(family, &versions[idx], &optimization_level);
            let outcome = driver.run(&source, &recipe).await.unwrap_or_else(|_| {
                trace2pass_domain::TestOutcome::toolchain_missing()
            });
            let verdict = classify_outcome(&outcome, passes);
            (verdict, probe_start.elapsed().as_millis() as u64)
        }
    };

    let (first_verdict, first_ms) = probe_verdict(0).await;
    let (last_verdict, last_ms) = probe_verdict(last).await;
    let mut tested = vec![
        VersionProbe {
            version: versions[0].clone(),
            verdict: first_verdict,
            wall_time_ms: first_ms,
        },
        VersionProbe {
            version: versions[last].clone(),
            verdict: last_verdict,
            wall_time_ms: last_ms,
        },
    ];

    let disposition = match (first_verdict, last_verdict) {
        (Verdict3::Pass, Verdict3::Pass) => Some(VersionDisposition::AllPass),
        (Verdict3::Fail, Verdict3::Fail) => Some(VersionDisposition::AllFail),
        (Verdict3::Fail, Verdict3::Pass) => Some(VersionDisposition::NonMonotonic),
        // An indeterminate endpoint means the sanity check itself couldn't
        // be answered; there is no regression interval to search.
        (Verdict3::Indeterminate, _) | (_, Verdict3::Indeterminate) => {
            Some(VersionDisposition::Unbisectable)
        }
        (Verdict3::Pass, Verdict3::Fail) => None,
    };

    if let Some(disposition) = disposition {
        return Ok(VersionBisectionResult {
            disposition,
            first_bad: None,
            last_good: None,
            versions_tested: tested,
            wall_time_ms: start.elapsed().as_millis() as u64,
        });
    }

    // Remaining case: V[0] passes, V[last] fails — proceed to binary search.
    let result = run_bisection(0, last, skip_budget, probe_verdict).await;
    tested.extend(result.log.iter().map(|probe| VersionProbe {
        version: versions[probe.index].clone(),
        verdict: probe.verdict,
        wall_time_ms: probe.wall_time_ms,
    }));

    let resolved = match result.outcome {
        BisectionOutcome::Bounded { boundary } => VersionBisectionResult {
            disposition: VersionDisposition::Bisected,
            first_bad: Some(versions[boundary].clone()),
            last_good: Some(versions[boundary - 1].clone()),
            versions_tested: tested,
            wall_time_ms: start.elapsed().as_millis() as u64,
        },
        BisectionOutcome::Unbisectable => VersionBisectionResult {
            disposition: VersionDisposition::Unbisectable,
            first_bad: None,
            last_good: None,
            versions_tested: tested,
            wall_time_ms: start.elapsed().as_millis() as u64,
        },
    };

    Ok(resolved)
}
