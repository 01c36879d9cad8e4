//! Analysis configuration.
//!
//! The knobs here are the ones a driver passes down to the analyzer: the
//! work bound on sealed-hierarchy reduction and the two compatibility gates.
//! They can be built in code or read from a TOML table:
//!
//! ```toml
//! max_base_checks = 512
//! constant_pattern_mix = true
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Default upper bound on reduction work during exhaustiveness checking.
pub const DEFAULT_MAX_BASE_CHECKS: usize = 65_536;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Maximum number of pattern comparisons the exhaustiveness reduction may
    /// perform before giving up and reporting the switch as non-exhaustive.
    pub max_base_checks: usize,
    /// Allow constant case labels and pattern case labels in the same switch.
    pub constant_pattern_mix: bool,
    /// Allow an `instanceof` whose pattern is unconditional for the tested
    /// expression.
    pub unconditional_instanceof: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisConfig {
            max_base_checks: DEFAULT_MAX_BASE_CHECKS,
            constant_pattern_mix: false,
            unconditional_instanceof: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid analysis config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("max_base_checks must be at least 1")]
    ZeroBudget,
}

impl AnalysisConfig {
    /// Parse a config from TOML text. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> Result<AnalysisConfig, ConfigError> {
        let config: AnalysisConfig = toml::from_str(content)?;
        if config.max_base_checks == 0 {
            return Err(ConfigError::ZeroBudget);
        }
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<AnalysisConfig, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn with_constant_pattern_mix(mut self, allow: bool) -> Self {
        self.constant_pattern_mix = allow;
        self
    }

    pub fn with_max_base_checks(mut self, max: usize) -> Self {
        self.max_base_checks = max;
        self
    }

    pub fn with_unconditional_instanceof(mut self, allow: bool) -> Self {
        self.unconditional_instanceof = allow;
        self
    }
}
