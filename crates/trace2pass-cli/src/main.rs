//! Trace2Pass-Core CLI
//!
//! A thin collaborator over the `BugStore`/`ToolchainDriver`/orchestrator
//! surface, for manual and offline use.
//!
//! ## Commands
//!
//! - `submit`: ingest an anomaly event (JSON) into the report store
//! - `get`: fetch a single bug record by fingerprint
//! - `queue`: list records pending diagnosis, highest priority first
//! - `stats`: aggregate counts by status
//! - `diagnose`: run the C3->C4->C5 pipeline once for one fingerprint

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::Level;

use trace2pass_core::{init_tracing, run_diagnosis, DiagnosisRequest};
use trace2pass_domain::{AnomalyEvent, CompilerFamily, Config, Fingerprint, TestOutcome};
use trace2pass_store::fakes::MemoryBugStore;
use trace2pass_store::BugStore;
use trace2pass_toolchain::{ToolchainDriver, ToolchainRegistry};

#[derive(Parser)]
#[command(name = "trace2pass")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Compiler-bug diagnosis pipeline: report store, toolchain driver, bisectors")]
struct Cli {
    /// Enable verbose (debug-level) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit an anomaly event from a JSON file into the report store
    Submit {
        /// Path to the anomaly-event JSON file
        event: PathBuf,
    },

    /// Fetch a single bug record by fingerprint
    Get {
        /// Fingerprint hex digest
        fingerprint: String,
    },

    /// List records pending diagnosis, highest priority first
    Queue {
        /// Maximum number of records to print
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Aggregate record counts by status
    Stats,

    /// Run the UB Detector -> Version Bisector -> Pass Bisector pipeline
    /// once for a single fingerprint
    Diagnose {
        /// Fingerprint hex digest of the record to diagnose
        fingerprint: String,

        /// Path to the reproducer source file
        #[arg(long)]
        source: PathBuf,

        /// Compiler family to drive ("clang" or "gcc")
        #[arg(long, default_value = "clang")]
        family: String,

        /// Ordered oldest -> newest compiler versions to bisect over
        #[arg(long, value_delimiter = ',')]
        versions: Vec<String>,

        /// Optimization level to compile at
        #[arg(long, default_value = "-O2")]
        optimization_level: String,

        /// Maximum number of indeterminate probes to skip per bisection
        #[arg(long, default_value_t = 2)]
        skip_budget: u32,

        /// Expected exit code for the reproducer to be judged "passing"
        #[arg(long, default_value_t = 0)]
        expect_exit_code: i32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    // In-process store: this CLI is a local/offline collaborator, not the
    // daemon. A persistent SurrealDB-backed store is wired up by
    // `trace2passd` instead.
    let store = MemoryBugStore::new(Config::default());
    let driver = ToolchainDriver::new(ToolchainRegistry::new(), Config::default());
    let registry = ToolchainRegistry::new();

    match cli.command {
        Commands::Submit { event } => cmd_submit(&store, &event).await,
        Commands::Get { fingerprint } => cmd_get(&store, &fingerprint).await,
        Commands::Queue { limit } => cmd_queue(&store, limit).await,
        Commands::Stats => cmd_stats(&store).await,
        Commands::Diagnose {
            fingerprint,
            source,
            family,
            versions,
            optimization_level,
            skip_budget,
            expect_exit_code,
        } => {
            cmd_diagnose(
                &store,
                &driver,
                &registry,
                &fingerprint,
                &source,
                &family,
                &versions,
                &optimization_level,
                skip_budget,
                expect_exit_code,
            )
            .await
        }
    }
}

async fn cmd_submit(store: &dyn BugStore, path: &PathBuf) -> Result<()> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading anomaly event from {}", path.display()))?;
    let event: AnomalyEvent =
        serde_json::from_str(&contents).context("parsing anomaly event JSON")?;

    let record = store.submit(event).await?;
    println!("fingerprint {}", record.fingerprint);
    println!("occurrence_count {}", record.occurrence_count);
    println!("status {:?}", record.status);
    Ok(())
}

async fn cmd_get(store: &dyn BugStore, fingerprint_hex: &str) -> Result<()> {
    let fingerprint = parse_fingerprint(fingerprint_hex)?;
    match store.get(&fingerprint).await? {
        Some(record) => {
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        None => println!("no record for fingerprint {fingerprint_hex}"),
    }
    Ok(())
}

async fn cmd_queue(store: &dyn BugStore, limit: usize) -> Result<()> {
    let queued = store.queue().await?;
    if queued.is_empty() {
        println!("queue is empty");
        return Ok(());
    }
    for entry in queued.into_iter().take(limit) {
        println!(
            "{:>8.4}  {}  {:?}  x{}",
            entry.priority,
            entry.record.fingerprint,
            entry.record.status,
            entry.record.occurrence_count,
        );
    }
    Ok(())
}

async fn cmd_stats(store: &dyn BugStore) -> Result<()> {
    let stats = store.stats().await?;
    println!("total_records {}", stats.total_records);
    for (status, count) in stats.by_status {
        println!("{:?} {}", status, count);
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn cmd_diagnose(
    store: &dyn BugStore,
    driver: &ToolchainDriver,
    registry: &ToolchainRegistry,
    fingerprint_hex: &str,
    source_path: &PathBuf,
    family: &str,
    versions: &[String],
    optimization_level: &str,
    skip_budget: u32,
    expect_exit_code: i32,
) -> Result<()> {
    let fingerprint = parse_fingerprint(fingerprint_hex)?;
    let source = std::fs::read_to_string(source_path)
        .with_context(|| format!("reading reproducer source from {}", source_path.display()))?;
    let family = parse_family(family)?;
    anyhow::ensure!(!versions.is_empty(), "--versions must list at least one compiler version");

    let passes = move |outcome: &TestOutcome| outcome.exit_code == Some(expect_exit_code);

    let request = DiagnosisRequest {
        fingerprint,
        source: &source,
        family,
        versions,
        optimization_level,
        skip_budget,
        passes: &passes,
    };

    let diagnosis = run_diagnosis(store, driver, registry, request).await?;
    println!("{}", serde_json::to_string_pretty(&diagnosis)?);
    Ok(())
}

fn parse_fingerprint(hex: &str) -> Result<Fingerprint> {
    Fingerprint::try_from(hex.to_string()).context("invalid fingerprint")
}

fn parse_family(name: &str) -> Result<CompilerFamily> {
    match name {
        "clang" => Ok(CompilerFamily::Clang),
        "gcc" => Ok(CompilerFamily::Gcc),
        other => anyhow::bail!("unknown compiler family '{other}' (expected clang or gcc)"),
    }
}
