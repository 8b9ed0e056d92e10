//! Pass Bisector (C5): delta-debugging-style prefix search over an ordered
//! optimization pass list, run once the Version Bisector has localized a
//! regression to a single `first_bad` compiler version.

use std::time::Instant;

use trace2pass_domain::{
    classify_outcome, CompilerFamily, Config, PassBisectionResult, PassDisposition, Verdict3,
};
use trace2pass_toolchain::{list_passes, Recipe, ToolchainDriver, ToolchainRegistry};

use crate::bisect::{run_bisection, BisectionOutcome};

/// Bisect the ordered pass list for `version` at `optimization_level` for the
/// prefix length at which `passes` starts returning `false`.
///
/// Two sanity checks bound the search: compiling with zero passes applied
/// must pass, and compiling with the full pass list applied (i.e. plain
/// `optimization_level`, with no `pass_list` override) must fail. Either
/// violation means the regression isn't attributable to a single pass in
/// this list, and bisection is abandoned.
pub async fn bisect_passes(
    driver: &ToolchainDriver,
    registry: &ToolchainRegistry,
    source: &str,
    family: CompilerFamily,
    version: &str,
    optimization_level: &str,
    skip_budget: u32,
    passes: impl Fn(&trace2pass_domain::TestOutcome) -> bool + Copy,
) -> anyhow::Result<PassBisectionResult> {
    let start = Instant::now();
    let pass_list = list_passes(registry, family, version, optimization_level).await?;
    let total_passes = pass_list.len();

    let probe_prefix = |n: usize| {
        let pass_list = pass_list.clone();
        let driver = driver;
        let family = family;
        let version = version.to_string();
        let optimization_level = optimization_level.to_string();
        let source = source.to_string();
        async move {
            let probe_start = Instant::now();
            let recipe = Recipe::new(family, &version, &optimization_level)
                .with_pass_list(pass_list[..n].to_vec());
            let outcome = driver.run(&source, &recipe).await.unwrap_or_else(|_| {
                trace2pass_domain::TestOutcome::toolchain_missing()
            });
            let verdict = classify_outcome(&outcome, passes);
            (verdict, probe_start.elapsed().as_millis() as u64)
        }
    };

    let (empty_verdict, _) = probe_prefix(0).await;
    let (full_verdict, _) = probe_prefix(total_passes).await;
    let mut candidates_tested = 2u32;

    if empty_verdict != Verdict3::Pass || full_verdict != Verdict3::Fail {
        return Ok(PassBisectionResult {
            disposition: PassDisposition::Unbisectable,
            suspected_pass: None,
            suspect_group: Vec::new(),
            pass_index: None,
            total_passes,
            candidates_tested,
            wall_time_ms: start.elapsed().as_millis() as u64,
        });
    }

    let result = run_bisection(0, total_passes, skip_budget, probe_prefix).await;
    candidates_tested += result.log.len() as u32;

    let resolved = match result.outcome {
        BisectionOutcome::Bounded { boundary } => {
            let suspected = pass_list[boundary - 1].clone();
            PassBisectionResult {
                disposition: PassDisposition::Bisected,
                suspected_pass: Some(suspected.clone()),
                suspect_group: vec![suspected],
                pass_index: Some(boundary - 1),
                total_passes,
                candidates_tested,
                wall_time_ms: start.elapsed().as_millis() as u64,
            }
        }
        BisectionOutcome::Unbisectable => PassBisectionResult {
            disposition: PassDisposition::Unbisectable,
            suspected_pass: None,
            suspect_group: Vec::new(),
            pass_index: None,
            total_passes,
            candidates_tested,
            wall_time_ms: start.elapsed().as_millis() as u64,
        },
    };

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unmapped_toolchain_errors_before_any_probe() {
        let driver = ToolchainDriver::new(ToolchainRegistry::new(), Config::default());
        let registry = ToolchainRegistry::new();
        // list_passes requires a resolvable compiler to introspect the pass
        // list and errors hard on an unmapped toolchain, before
        // bisect_passes ever probes.
        let result = bisect_passes(
            &driver,
            &registry,
            "int main(){return 0;}",
            CompilerFamily::Clang,
            "17",
            "-O2",
            2,
            |_outcome| true,
        )
        .await;

        assert!(result.is_err());
    }
}
