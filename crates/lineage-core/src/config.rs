use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration from `.lineage.toml`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub inheritance: InheritanceConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Which packages take part in an analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Whitelist of package names. Absent means "every package"; an empty
    /// list means "no package".
    #[serde(default)]
    pub include_packages: Option<Vec<String>>,
    /// Glob patterns of package names to leave out.
    #[serde(default)]
    pub exclude_packages: Vec<String>,
}

/// Denominator of the average number of derived classes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AndcDenominator {
    /// Only classes with at least one direct child.
    #[default]
    ClassesWithChildren,
    /// Every accepted class.
    AllClasses,
}

/// Reference set of the average hierarchy height.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AhhReference {
    /// Mean DIT over every accepted class.
    #[default]
    AllClasses,
    /// Mean over hierarchy roots of the deepest DIT below each root.
    HierarchyRoots,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InheritanceConfig {
    #[serde(default)]
    pub andc_denominator: AndcDenominator,
    #[serde(default)]
    pub ahh_reference: AhhReference,
}

impl InheritanceConfig {
    /// The convention of the classic inheritance analyzer: ANDC over all
    /// classes, AHH over hierarchy roots.
    pub fn classic() -> Self {
        Self {
            andc_denominator: AndcDenominator::AllClasses,
            ahh_reference: AhhReference::HierarchyRoots,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Visit nodes on the rayon thread pool.
    #[serde(default = "default_true")]
    pub parallel: bool,
}

fn default_true() -> bool {
    true
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            parallel: default_true(),
        }
    }
}

impl Config {
    /// Load configuration from a `.lineage.toml` file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("failed to parse '{}'", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("invalid lineage configuration")?;
        Ok(config)
    }

    /// Load from `.lineage.toml` in the given directory or any ancestor, or return defaults.
    pub fn load_or_default(dir: &Path) -> Self {
        let start = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        let mut current = start.as_path();
        loop {
            let config_path = current.join(".lineage.toml");
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!(
                            path = %config_path.display(),
                            error = %format!("{e:#}"),
                            "failed to load config, using defaults"
                        );
                        Self::default()
                    }
                };
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }
        Self::default()
    }

    /// Default TOML content for a new `.lineage.toml`.
    pub fn default_toml() -> String {
        r#"# Lineage - inheritance metrics configuration

[filter]
# Only analyze these packages (omit to analyze every package).
# include_packages = ["library"]
# Leave out packages matching these glob patterns.
exclude_packages = []

[inheritance]
# "classes-with-children" or "all-classes"
andc_denominator = "classes-with-children"
# "all-classes" or "hierarchy-roots"
ahh_reference = "all-classes"

[analysis]
parallel = true
"#
        .to_string()
    }
}
