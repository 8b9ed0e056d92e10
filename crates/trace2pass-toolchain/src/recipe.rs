//! `Recipe`: the full set of knobs the Toolchain Driver needs to compile
//! and run one probe.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use trace2pass_domain::CompilerFamily;

/// How to compile and run a source file for one probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub family: CompilerFamily,
    pub version: String,
    pub optimization_level: String,
    pub flags: Vec<String>,
    /// Explicit pass list, consulted only by the Pass Bisector (C5).
    pub pass_list: Option<Vec<String>>,
    pub stdin: Option<String>,
    pub argv: Vec<String>,
}

impl Recipe {
    pub fn new(family: CompilerFamily, version: impl Into<String>, optimization_level: impl Into<String>) -> Self {
        Recipe {
            family,
            version: version.into(),
            optimization_level: optimization_level.into(),
            flags: Vec::new(),
            pass_list: None,
            stdin: None,
            argv: Vec::new(),
        }
    }

    pub fn with_flags(mut self, flags: Vec<String>) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_pass_list(mut self, pass_list: Vec<String>) -> Self {
        self.pass_list = Some(pass_list);
        self
    }

    /// Stable hash of this recipe's compile-affecting fields, used as part
    /// of the outcome memoization key.
    pub fn recipe_hash(&self) -> String {
        let mut flags = self.flags.clone();
        flags.sort();
        let passes = self.pass_list.clone().unwrap_or_default();

        let mut hasher = Sha256::new();
        hasher.update(self.family.as_str().as_bytes());
        hasher.update(self.version.as_bytes());
        hasher.update(self.optimization_level.as_bytes());
        for flag in &flags {
            hasher.update(flag.as_bytes());
        }
        for pass in &passes {
            hasher.update(pass.as_bytes());
        }
        hex::encode(hasher.finalize())
    }
}
