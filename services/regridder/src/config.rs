//! Regridder configuration.
//!
//! Values come from, in increasing precedence: built-in defaults, an
//! optional YAML file (with `${VAR}` / `${VAR:-default}` substitution),
//! `COARSEN_*` / `REGRIDDER_*` environment variables, and command-line flags.

use anyhow::{Context, Result};
use grid_processor::CoarsenConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

/// Default wet-day threshold in mm.
pub const DEFAULT_MASK_THRESHOLD: f32 = 0.1;

/// Top-level regridder configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegridderConfig {
    /// Grid classification and block coarsening
    pub coarsen: CoarsenConfig,

    /// Path or name of the `cdo` executable
    pub cdo_binary: String,

    /// Selector threshold for `mask`
    pub mask_threshold: f32,

    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `text` or `json`
    pub format: String,
}

impl Default for RegridderConfig {
    fn default() -> Self {
        Self {
            coarsen: CoarsenConfig::default(),
            cdo_binary: "cdo".to_string(),
            mask_threshold: DEFAULT_MASK_THRESHOLD,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl LoggingConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl RegridderConfig {
    /// Load configuration: YAML file if given, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_yaml(path)?,
            None => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load and parse a YAML configuration file.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config from {:?}", path.as_ref()))?;

        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse config from {:?}", path.as_ref()))
    }

    /// Parse YAML content after environment substitution.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let expanded = shellexpand::env(content)
            .map_err(|e| anyhow::anyhow!("Environment variable {} not set", e.var_name))?;

        let config: RegridderConfig =
            serde_yaml::from_str(&expanded).context("Invalid regridder config YAML")?;
        Ok(config)
    }

    /// Apply `COARSEN_*` and `REGRIDDER_*` environment variable overrides.
    fn apply_env(&mut self) {
        self.coarsen.apply_env();
        if let Ok(val) = env::var("REGRIDDER_CDO") {
            self.cdo_binary = val;
        }
        if let Ok(val) = env::var("REGRIDDER_MASK_THRESHOLD") {
            if let Ok(threshold) = val.parse() {
                self.mask_threshold = threshold;
            }
        }
        if let Ok(val) = env::var("REGRIDDER_LOG_FORMAT") {
            self.logging.format = val;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.coarsen.validate()?;
        anyhow::ensure!(!self.cdo_binary.is_empty(), "cdo_binary cannot be empty");
        anyhow::ensure!(
            self.mask_threshold.is_finite(),
            "mask_threshold must be finite, got {}",
            self.mask_threshold
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use grid_processor::EdgePolicy;

    #[test]
    fn test_defaults() {
        let config = RegridderConfig::default();
        assert_eq!(config.coarsen.block_size, 2);
        assert_eq!(config.mask_threshold, 0.1);
        assert_eq!(config.cdo_binary, "cdo");
        assert!(!config.logging.is_json());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
coarsen:
  block_size: 11
  edge_policy: pad
logging:
  format: json
"#;
        let config = RegridderConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.coarsen.block_size, 11);
        assert_eq!(config.coarsen.edge_policy, EdgePolicy::Pad);
        assert_eq!(config.coarsen.lat_name, "lat");
        assert_eq!(config.logging.level, "info");
        assert!(config.logging.is_json());
    }

    #[test]
    fn test_yaml_env_substitution() {
        std::env::set_var("REGRIDDER_TEST_CDO", "/opt/cdo/bin/cdo");
        let config = RegridderConfig::from_yaml_str("cdo_binary: ${REGRIDDER_TEST_CDO}").unwrap();
        assert_eq!(config.cdo_binary, "/opt/cdo/bin/cdo");
    }

    #[test]
    fn test_yaml_env_default() {
        std::env::remove_var("REGRIDDER_TEST_UNSET");
        let config =
            RegridderConfig::from_yaml_str("cdo_binary: ${REGRIDDER_TEST_UNSET:-cdo2}").unwrap();
        assert_eq!(config.cdo_binary, "cdo2");
    }

    #[test]
    fn test_yaml_missing_env_fails() {
        std::env::remove_var("REGRIDDER_TEST_REQUIRED");
        assert!(RegridderConfig::from_yaml_str("cdo_binary: ${REGRIDDER_TEST_REQUIRED}").is_err());
    }

    #[test]
    fn test_zero_block_size_rejected() {
        let mut config = RegridderConfig::default();
        config.coarsen.block_size = 0;
        assert!(config.validate().is_err());
    }
}
