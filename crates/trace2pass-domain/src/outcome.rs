//! `TestOutcome`: the atomic result of a single Toolchain Driver invocation.

use serde::{Deserialize, Serialize};

/// Outcome of the compile stage of a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompileStatus {
    Ok,
    ToolchainMissing,
    /// The compiler ran and rejected the program with a non-crash
    /// diagnostic.
    CompileErrorDiagnostic,
    /// The compiler exited abnormally (internal compiler error).
    CompileIce,
    Timeout,
}

/// Outcome of the run stage of a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    ExitOk,
    ExitNonzero,
    Signal,
    Timeout,
    NotRun,
}

/// Atomic result of compiling and (optionally) running one (source,
/// build-recipe) pair. Never interprets pass/fail itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestOutcome {
    pub compile_status: CompileStatus,
    pub run_status: RunStatus,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub wall_time_ms: u64,
}

impl TestOutcome {
    /// An outcome representing a missing toolchain: never attempted
    /// compilation, let alone execution.
    pub fn toolchain_missing() -> Self {
        TestOutcome {
            compile_status: CompileStatus::ToolchainMissing,
            run_status: RunStatus::NotRun,
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
            wall_time_ms: 0,
        }
    }
}

/// Three-valued verdict a caller-supplied predicate derives from a
/// `TestOutcome`: pass, fail, or indeterminate (the toolchain could not
/// produce a meaningful answer one way or the other).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict3 {
    Pass,
    Fail,
    Indeterminate,
}

/// Fold a `TestOutcome` into the tri-state the bisectors consume. A probe is
/// indeterminate whenever the toolchain itself failed to give a real
/// answer (missing, ICE unrelated to the bug under study, or timeout);
/// `passes` decides pass/fail for everything else.
pub fn classify_outcome(outcome: &TestOutcome, passes: impl Fn(&TestOutcome) -> bool) -> Verdict3 {
    match outcome.compile_status {
        CompileStatus::ToolchainMissing | CompileStatus::CompileIce | CompileStatus::Timeout => {
            return Verdict3::Indeterminate
        }
        CompileStatus::CompileErrorDiagnostic => return Verdict3::Fail,
        CompileStatus::Ok => {}
    }
    if outcome.run_status == RunStatus::Timeout {
        return Verdict3::Indeterminate;
    }
    if passes(outcome) {
        Verdict3::Pass
    } else {
        Verdict3::Fail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_outcome(exit_code: i32) -> TestOutcome {
        TestOutcome {
            compile_status: CompileStatus::Ok,
            run_status: if exit_code == 0 {
                RunStatus::ExitOk
            } else {
                RunStatus::ExitNonzero
            },
            stdout: String::new(),
            stderr: String::new(),
            exit_code: Some(exit_code),
            wall_time_ms: 10,
        }
    }

    #[test]
    fn toolchain_missing_is_indeterminate() {
        let outcome = TestOutcome::toolchain_missing();
        let verdict = classify_outcome(&outcome, |o| o.exit_code == Some(0));
        assert_eq!(verdict, Verdict3::Indeterminate);
    }

    #[test]
    fn compile_error_is_fail_not_indeterminate() {
        let outcome = TestOutcome {
            compile_status: CompileStatus::CompileErrorDiagnostic,
            run_status: RunStatus::NotRun,
            stdout: String::new(),
            stderr: "error: ...".to_string(),
            exit_code: None,
            wall_time_ms: 5,
        };
        assert_eq!(
            classify_outcome(&outcome, |_| true),
            Verdict3::Fail
        );
    }

    #[test]
    fn predicate_decides_pass_fail_on_clean_compile() {
        let pass = ok_outcome(0);
        let fail = ok_outcome(1);
        assert_eq!(
            classify_outcome(&pass, |o| o.exit_code == Some(0)),
            Verdict3::Pass
        );
        assert_eq!(
            classify_outcome(&fail, |o| o.exit_code == Some(0)),
            Verdict3::Fail
        );
    }
}
