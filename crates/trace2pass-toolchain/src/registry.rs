//! Compiler binary resolution: explicit registry → containerized-toolchain
//! adapter → PATH lookup.

use std::collections::HashMap;
use std::path::PathBuf;

use trace2pass_domain::CompilerFamily;

/// Resolves `(family, version)` to an executable path.
///
/// Consultation order: an explicit registry map, then a containerized
/// toolchain adapter (a directory of per-version installs), then a
/// PATH-based lookup of the bare family name. No mapping at any tier means
/// the probe reports `compile_status = toolchain_missing`, never an error.
#[derive(Debug, Clone, Default)]
pub struct ToolchainRegistry {
    explicit: HashMap<(CompilerFamily, String), PathBuf>,
    container_root: Option<PathBuf>,
}

impl ToolchainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_explicit(mut self, registry: HashMap<(CompilerFamily, String), PathBuf>) -> Self {
        self.explicit = registry;
        self
    }

    /// A directory containing `<family>-<version>` executables, e.g. an
    /// image that bind-mounts multiple compiler toolchains.
    pub fn with_container_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.container_root = Some(root.into());
        self
    }

    pub fn resolve(&self, family: CompilerFamily, version: &str) -> Option<PathBuf> {
        if let Some(path) = self.explicit.get(&(family, version.to_string())) {
            return Some(path.clone());
        }

        if let Some(root) = &self.container_root {
            let candidate = root.join(format!("{}-{}", family.as_str(), version));
            if candidate.is_file() {
                return Some(candidate);
            }
        }

        which::which(family.as_str()).ok()
    }
}

/// Test-only seam so the resolver chain can be exercised without touching
/// the real filesystem PATH.
pub fn resolve_with_path_lookup(
    registry: &ToolchainRegistry,
    family: CompilerFamily,
    version: &str,
    path_lookup: impl Fn(&str) -> Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(path) = registry.explicit.get(&(family, version.to_string())) {
        return Some(path.clone());
    }
    if let Some(root) = &registry.container_root {
        let candidate = root.join(format!("{}-{}", family.as_str(), version));
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    path_lookup(family.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_registry_wins_over_path() {
        let mut explicit = HashMap::new();
        explicit.insert(
            (CompilerFamily::Clang, "17".to_string()),
            PathBuf::from("/opt/clang-17/bin/clang"),
        );
        let registry = ToolchainRegistry::new().with_explicit(explicit);

        let resolved = resolve_with_path_lookup(&registry, CompilerFamily::Clang, "17", |_| {
            Some(PathBuf::from("/usr/bin/clang"))
        });
        assert_eq!(resolved, Some(PathBuf::from("/opt/clang-17/bin/clang")));
    }

    #[test]
    fn falls_back_to_path_lookup_when_unmapped() {
        let registry = ToolchainRegistry::new();
        let resolved = resolve_with_path_lookup(&registry, CompilerFamily::Gcc, "13", |_| {
            Some(PathBuf::from("/usr/bin/gcc"))
        });
        assert_eq!(resolved, Some(PathBuf::from("/usr/bin/gcc")));
    }

    #[test]
    fn no_mapping_anywhere_returns_none() {
        let registry = ToolchainRegistry::new();
        let resolved = resolve_with_path_lookup(&registry, CompilerFamily::Gcc, "999", |_| None);
        assert_eq!(resolved, None);
    }

    #[test]
    fn path_lookup_finds_real_shell_on_this_machine() {
        // Not a toolchain, but exercises the real `which` call used by
        // `ToolchainRegistry::resolve` for the final PATH-based tier.
        let found = which::which("sh");
        assert!(found.is_ok());
    }
}
