//! Process-wide configuration, passed explicitly to component constructors.
//!
//! Replaces the canonical source's mutable module-level globals for sample
//! rate and output destination (spec §9): every knob lives here as a named
//! field on a value object built once at the CLI/daemon entry point.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::event::CheckKind;
use crate::priority::default_severity_weight;

/// Where diagnostic/telemetry output is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputSink {
    File(PathBuf),
    Stderr,
}

/// A compiler family the Toolchain Driver knows how to invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilerFamily {
    Clang,
    Gcc,
}

impl CompilerFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompilerFamily::Clang => "clang",
            CompilerFamily::Gcc => "gcc",
        }
    }
}

/// Process-wide configuration value object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub sample_rate: f64,
    pub output_sink: OutputSink,
    pub compile_timeout_s: u64,
    pub run_timeout_s: u64,
    pub skip_budget: u32,
    pub severity_weights: HashMap<String, f64>,
    /// (family, version) -> executable path, consulted before the
    /// containerized-toolchain adapter and PATH lookup.
    pub toolchain_registry: HashMap<(CompilerFamily, String), PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let mut severity_weights = HashMap::new();
        for kind in [
            CheckKind::ArithmeticOverflow,
            CheckKind::Unreachable,
            CheckKind::BoundsViolation,
            CheckKind::DivisionByZero,
            CheckKind::SignConversion,
            CheckKind::PureInconsistency,
            CheckKind::LoopBoundExceeded,
        ] {
            severity_weights.insert(kind.as_str().to_string(), default_severity_weight(kind));
        }

        Config {
            sample_rate: 1.0,
            output_sink: OutputSink::Stderr,
            compile_timeout_s: 60,
            run_timeout_s: 10,
            skip_budget: 2,
            severity_weights,
            toolchain_registry: HashMap::new(),
        }
    }
}

impl Config {
    /// Severity weight for `kind`, falling back to the built-in default
    /// table if this config doesn't override it.
    pub fn severity_weight(&self, kind: CheckKind) -> f64 {
        self.severity_weights
            .get(kind.as_str())
            .copied()
            .unwrap_or_else(|| default_severity_weight(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_full_severity_table() {
        let config = Config::default();
        assert_eq!(
            config.severity_weight(CheckKind::ArithmeticOverflow),
            1.0
        );
        assert_eq!(config.severity_weight(CheckKind::SignConversion), 0.5);
    }

    #[test]
    fn default_timeouts_match_spec() {
        let config = Config::default();
        assert_eq!(config.compile_timeout_s, 60);
        assert_eq!(config.run_timeout_s, 10);
        assert_eq!(config.skip_budget, 2);
    }
}
