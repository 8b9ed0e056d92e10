//! UB Detector (C3): three-signal confidence fusion distinguishing a real
//! compiler bug from user-triggered undefined behavior.

use trace2pass_domain::{CompilerFamily, TriState, UbSignals, Verdict};
use trace2pass_toolchain::{Recipe, ToolchainDriver};

/// Everything produced by one UB-detection run, independent of the
/// `Diagnosis` envelope the orchestrator eventually wraps it in.
#[derive(Debug, Clone, PartialEq)]
pub struct UbDetectionResult {
    pub verdict: Verdict,
    pub confidence: f64,
    pub signals: UbSignals,
}

/// A caller-supplied predicate over stdout+exit-code that decides pass/fail
/// for the program under study, independent of UB-ness.
pub type ExpectedOutputPredicate<'a> = &'a dyn Fn(&str, Option<i32>) -> bool;

pub async fn detect(
    driver: &ToolchainDriver,
    source: &str,
    family: CompilerFamily,
    version: &str,
) -> anyhow::Result<UbDetectionResult> {
    let s1 = signal_ubsan_clean(driver, source, family, &version.to_string()).await?;
    let s2 = signal_optimization_sensitive(driver, source, family, &version.to_string()).await?;
    let s3 = signal_multi_compiler_differs(driver, source, version).await?;

    let confidence = fuse_confidence(s1, s2, s3);
    let verdict = classify_confidence(confidence);

    Ok(UbDetectionResult {
        verdict,
        confidence,
        signals: UbSignals {
            ubsan_clean: s1,
            optimization_sensitive: s2,
            multi_compiler_differs: s3,
        },
    })
}

/// `S1`: recompile with the UB sanitizer at `-O0`. Clean exit + no sanitizer
/// diagnostic on stderr is `true`; a sanitizer hit is `false`.
async fn signal_ubsan_clean(
    driver: &ToolchainDriver,
    source: &str,
    family: CompilerFamily,
    version: &str,
) -> anyhow::Result<TriState> {
    let recipe = Recipe::new(family, version, "-O0").with_flags(vec!["-fsanitize=undefined".to_string()]);
    let outcome = driver.run(source, &recipe).await?;

    if outcome.compile_status != trace2pass_domain::CompileStatus::Ok {
        return Ok(TriState::Unknown);
    }
    if outcome.run_status == trace2pass_domain::RunStatus::Timeout {
        return Ok(TriState::Unknown);
    }

    let sanitizer_fired = outcome.stderr.to_lowercase().contains("runtime error")
        || outcome.stderr.to_lowercase().contains("sanitizer");
    Ok(if sanitizer_fired {
        TriState::False
    } else {
        TriState::True
    })
}

/// `S2`: compile at `-O0..-O3` with the same compiler; disagreement between
/// levels is `true`, full agreement is `false`.
async fn signal_optimization_sensitive(
    driver: &ToolchainDriver,
    source: &str,
    family: CompilerFamily,
    version: &str,
) -> anyhow::Result<TriState> {
    let levels = ["-O0", "-O1", "-O2", "-O3"];
    let mut runnable = Vec::new();

    for level in levels {
        let recipe = Recipe::new(family, version, level);
        let outcome = driver.run(source, &recipe).await?;
        if outcome.compile_status == trace2pass_domain::CompileStatus::Ok
            && outcome.run_status != trace2pass_domain::RunStatus::Timeout
        {
            runnable.push((outcome.stdout.clone(), outcome.exit_code));
        }
    }

    if runnable.len() < 2 {
        return Ok(TriState::Unknown);
    }

    let first = &runnable[0];
    let all_agree = runnable.iter().all(|r| r == first);
    Ok(if all_agree { TriState::False } else { TriState::True })
}

/// `S3`: compile with both clang and gcc at `-O2`; disagreement is `true`.
async fn signal_multi_compiler_differs(
    driver: &ToolchainDriver,
    source: &str,
    version: &str,
) -> anyhow::Result<TriState> {
    let clang_recipe = Recipe::new(CompilerFamily::Clang, version, "-O2");
    let gcc_recipe = Recipe::new(CompilerFamily::Gcc, version, "-O2");

    let clang_outcome = driver.run(source, &clang_recipe).await?;
    let gcc_outcome = driver.run(source, &gcc_recipe).await?;

    let both_ran = |o: &trace2pass_domain::TestOutcome| {
        o.compile_status == trace2pass_domain::CompileStatus::Ok
            && o.run_status != trace2pass_domain::RunStatus::Timeout
    };
    if !both_ran(&clang_outcome) || !both_ran(&gcc_outcome) {
        return Ok(TriState::Unknown);
    }

    let differ = clang_outcome.stdout != gcc_outcome.stdout
        || clang_outcome.exit_code != gcc_outcome.exit_code;
    Ok(if differ { TriState::True } else { TriState::False })
}

fn fuse_confidence(s1: TriState, s2: TriState, s3: TriState) -> f64 {
    let mut confidence = 0.5;
    confidence += match s1 {
        TriState::True => 0.30,
        TriState::False => -0.40,
        TriState::Unknown => 0.0,
    };
    confidence += match s2 {
        TriState::True => 0.20,
        TriState::False => 0.0,
        TriState::Unknown => 0.0,
    };
    confidence += match s3 {
        TriState::True => 0.15,
        TriState::False => 0.0,
        TriState::Unknown => 0.0,
    };
    confidence.clamp(0.0, 1.0)
}

fn classify_confidence(confidence: f64) -> Verdict {
    if confidence < 0.3 {
        Verdict::UserUb
    } else if confidence < 0.6 {
        Verdict::Inconclusive
    } else {
        Verdict::CompilerBug
    }
}
