//! Configuration for grid coarsening.

use serde::{Deserialize, Serialize};

use crate::error::{GridProcessorError, Result};

/// Configuration for block coarsening and grid classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoarsenConfig {
    /// Coarsening factor: each output cell covers `block_size x block_size` input cells.
    pub block_size: usize,

    /// What the plain block reducer does with partial trailing blocks.
    pub edge_policy: EdgePolicy,

    /// Name of the 2D latitude coordinate variable.
    pub lat_name: String,

    /// Name of the 2D longitude coordinate variable.
    pub lon_name: String,

    /// Trailing `(y, x)` dimension-name pairs that identify an equal-area
    /// projected grid.
    pub projected_dims: Vec<(String, String)>,
}

impl Default for CoarsenConfig {
    fn default() -> Self {
        Self {
            block_size: 2,
            edge_policy: EdgePolicy::Trim,
            lat_name: "lat".to_string(),
            lon_name: "lon".to_string(),
            projected_dims: vec![
                ("N".to_string(), "E".to_string()),
                ("northing".to_string(), "easting".to_string()),
                ("y_proj".to_string(), "x_proj".to_string()),
            ],
        }
    }
}

impl CoarsenConfig {
    /// Default configuration with a given block size.
    pub fn with_block_size(block_size: usize) -> Self {
        Self {
            block_size,
            ..Default::default()
        }
    }

    /// Override fields from `COARSEN_*` environment variables that are set.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("COARSEN_BLOCK_SIZE") {
            if let Ok(size) = val.parse() {
                self.block_size = size;
            }
        }

        if let Ok(val) = std::env::var("COARSEN_EDGE_POLICY") {
            self.edge_policy = EdgePolicy::from_str(&val);
        }

        if let Ok(val) = std::env::var("COARSEN_LAT_NAME") {
            self.lat_name = val;
        }

        if let Ok(val) = std::env::var("COARSEN_LON_NAME") {
            self.lon_name = val;
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(GridProcessorError::config("block_size must be >= 1"));
        }

        if self.lat_name.is_empty() || self.lon_name.is_empty() {
            return Err(GridProcessorError::config(
                "lat_name and lon_name must not be empty",
            ));
        }

        Ok(())
    }

    /// Whether a trailing `(y, x)` dimension pair names a projected grid.
    pub fn is_projected_pair(&self, y_dim: &str, x_dim: &str) -> bool {
        self.projected_dims
            .iter()
            .any(|(y, x)| y == y_dim && x == x_dim)
    }
}

/// Handling of trailing rows/columns that do not fill a whole block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EdgePolicy {
    /// Drop partial blocks.
    #[default]
    Trim,
    /// Keep partial blocks, averaging only the cells that exist.
    Pad,
}

impl EdgePolicy {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pad" => Self::Pad,
            _ => Self::Trim,
        }
    }

    /// Get the policy name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trim => "trim",
            Self::Pad => "pad",
        }
    }

    /// Number of output cells along an axis of `len` input cells.
    pub fn output_len(&self, len: usize, block_size: usize) -> usize {
        match self {
            Self::Trim => len / block_size,
            Self::Pad => len.div_ceil(block_size),
        }
    }
}

impl std::fmt::Display for EdgePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CoarsenConfig::default();
        assert_eq!(config.block_size, 2);
        assert_eq!(config.edge_policy, EdgePolicy::Trim);
        assert_eq!(config.lat_name, "lat");
        assert_eq!(config.lon_name, "lon");
        assert!(config.is_projected_pair("N", "E"));
        assert!(!config.is_projected_pair("y", "x"));
    }

    #[test]
    fn test_config_validation() {
        let mut config = CoarsenConfig::default();
        assert!(config.validate().is_ok());

        config.block_size = 0;
        assert!(config.validate().is_err());

        config = CoarsenConfig::default();
        config.lon_name.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_edge_policy_from_str() {
        assert_eq!(EdgePolicy::from_str("pad"), EdgePolicy::Pad);
        assert_eq!(EdgePolicy::from_str("PAD"), EdgePolicy::Pad);
        assert_eq!(EdgePolicy::from_str("trim"), EdgePolicy::Trim);
        assert_eq!(EdgePolicy::from_str("invalid"), EdgePolicy::Trim);
    }

    #[test]
    fn test_edge_policy_output_len() {
        assert_eq!(EdgePolicy::Trim.output_len(13, 3), 4);
        assert_eq!(EdgePolicy::Pad.output_len(13, 3), 5);
        assert_eq!(EdgePolicy::Pad.output_len(12, 3), 4);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: CoarsenConfig =
            serde_json::from_str(r#"{"block_size": 12, "edge_policy": "pad"}"#).unwrap();
        assert_eq!(config.block_size, 12);
        assert_eq!(config.edge_policy, EdgePolicy::Pad);
        assert_eq!(config.lat_name, "lat");
    }
}
