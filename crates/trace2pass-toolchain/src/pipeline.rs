//! Optimization pass pipeline listing, consumed by the Pass Bisector (C5).

use tokio::process::Command;

use trace2pass_domain::CompilerFamily;

use crate::registry::ToolchainRegistry;

/// Query a compiler for the ordered list of optimization passes it would
/// run at a given optimization level, via `-mllvm -print-passes` (clang) or
/// `-fdump-passes` (gcc). A missing or unparseable listing is a hard error:
/// C5 has nothing to bisect over without it.
pub async fn list_passes(
    registry: &ToolchainRegistry,
    family: CompilerFamily,
    version: &str,
    optimization_level: &str,
) -> anyhow::Result<Vec<String>> {
    let Some(compiler) = registry.resolve(family, version) else {
        anyhow::bail!("no toolchain mapped for {:?} {}", family, version);
    };

    let args: Vec<&str> = match family {
        CompilerFamily::Clang => vec!["-mllvm", "-print-passes", optimization_level],
        CompilerFamily::Gcc => vec!["-fdump-passes", optimization_level],
    };

    let output = Command::new(&compiler).args(&args).output().await?;
    let stdout = String::from_utf8_lossy(&output.stdout);

    let passes: Vec<String> = stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    if passes.is_empty() {
        anyhow::bail!(
            "{:?} {} produced no parseable pass listing at {}",
            family,
            version,
            optimization_level
        );
    }
    Ok(passes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn list_passes_errors_on_unmapped_toolchain() {
        let registry = ToolchainRegistry::new();
        let result = list_passes(&registry, CompilerFamily::Clang, "999", "-O2").await;
        assert!(result.is_err());
    }
}
