//! `ToolchainDriver`: stateless façade over external compilers.

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::Mutex;
use std::time::Instant;

use sha2::{Digest, Sha256};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use trace2pass_domain::{CompileStatus, Config, RunStatus, TestOutcome};

use crate::recipe::Recipe;
use crate::registry::ToolchainRegistry;

/// Compile/run a source file per a [`Recipe`] and report the raw outcome.
///
/// Never interprets pass/fail itself: `run` always returns a `TestOutcome`,
/// never an `Err`, for expected-shape external failures (missing toolchain,
/// compile diagnostic, ICE, timeout). `Err` is reserved for process-spawn
/// failures that indicate a broken host environment.
pub struct ToolchainDriver {
    registry: ToolchainRegistry,
    config: Config,
    cache: Mutex<HashMap<String, TestOutcome>>,
}

impl ToolchainDriver {
    pub fn new(registry: ToolchainRegistry, config: Config) -> Self {
        ToolchainDriver {
            registry,
            config,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub async fn run(&self, source: &str, recipe: &Recipe) -> anyhow::Result<TestOutcome> {
        let cache_key = cache_key(source, recipe);
        if let Some(cached) = self.cache.lock().unwrap().get(&cache_key).cloned() {
            return Ok(cached);
        }

        let outcome = self.run_uncached(source, recipe).await?;
        self.cache
            .lock()
            .unwrap()
            .insert(cache_key, outcome.clone());
        Ok(outcome)
    }

    async fn run_uncached(&self, source: &str, recipe: &Recipe) -> anyhow::Result<TestOutcome> {
        let Some(compiler) = self.registry.resolve(recipe.family, &recipe.version) else {
            return Ok(TestOutcome::toolchain_missing());
        };

        let scratch = tempfile::tempdir()?;
        let source_path = scratch.path().join("probe.c");
        tokio::fs::write(&source_path, source).await?;
        let binary_path = scratch.path().join("probe.out");

        let start = Instant::now();
        let mut compile_args = vec![
            recipe.optimization_level.clone(),
            source_path.display().to_string(),
            "-o".to_string(),
            binary_path.display().to_string(),
        ];
        compile_args.extend(recipe.flags.iter().cloned());
        if let Some(passes) = &recipe.pass_list {
            for pass in passes {
                compile_args.push(format!("-mllvm"));
                compile_args.push(format!("-{pass}"));
            }
        }

        let compile_child = Command::new(&compiler)
            .args(&compile_args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let compile_output = match tokio::time::timeout(
            std::time::Duration::from_secs(self.config.compile_timeout_s),
            compile_child.wait_with_output(),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Ok(TestOutcome {
                    compile_status: CompileStatus::Timeout,
                    run_status: RunStatus::NotRun,
                    stdout: String::new(),
                    stderr: String::new(),
                    exit_code: None,
                    wall_time_ms: start.elapsed().as_millis() as u64,
                });
            }
        };

        let compile_stderr = String::from_utf8_lossy(&compile_output.stderr).to_string();
        if !compile_output.status.success() {
            let status = if looks_like_ice(&compile_stderr) {
                CompileStatus::CompileIce
            } else {
                CompileStatus::CompileErrorDiagnostic
            };
            return Ok(TestOutcome {
                compile_status: status,
                run_status: RunStatus::NotRun,
                stdout: String::new(),
                stderr: compile_stderr,
                exit_code: compile_output.status.code(),
                wall_time_ms: start.elapsed().as_millis() as u64,
            });
        }

        let run_start = Instant::now();
        let mut run_child = Command::new(&binary_path)
            .args(&recipe.argv)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(stdin) = &recipe.stdin {
            if let Some(mut child_stdin) = run_child.stdin.take() {
                child_stdin.write_all(stdin.as_bytes()).await?;
            }
        }

        let run_output = match tokio::time::timeout(
            std::time::Duration::from_secs(self.config.run_timeout_s),
            run_child.wait_with_output(),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Ok(TestOutcome {
                    compile_status: CompileStatus::Ok,
                    run_status: RunStatus::Timeout,
                    stdout: String::new(),
                    stderr: String::new(),
                    exit_code: None,
                    wall_time_ms: (start.elapsed() + run_start.elapsed()).as_millis() as u64,
                });
            }
        };

        let run_status = if run_output.status.success() {
            RunStatus::ExitOk
        } else if run_output.status.code().is_none() {
            RunStatus::Signal
        } else {
            RunStatus::ExitNonzero
        };

        Ok(TestOutcome {
            compile_status: CompileStatus::Ok,
            run_status,
            stdout: String::from_utf8_lossy(&run_output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&run_output.stderr).to_string(),
            exit_code: run_output.status.code(),
            wall_time_ms: start.elapsed().as_millis() as u64,
        })
    }
}

fn cache_key(source: &str, recipe: &Recipe) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(recipe.recipe_hash().as_bytes());
    hasher.update(recipe.stdin.as_deref().unwrap_or("").as_bytes());
    hex::encode(hasher.finalize())
}

fn looks_like_ice(stderr: &str) -> bool {
    stderr.contains("internal compiler error") || stderr.contains("Segmentation fault")
}
