//! Error types for grid processing.

use thiserror::Error;

/// Errors that can occur during grid processing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridProcessorError {
    /// An array is too small or has an unsupported rank.
    #[error("invalid array shape: {0}")]
    Shape(String),

    /// Co-registered arrays disagree in shape.
    #[error("shape mismatch: {left} vs {right}")]
    ShapeMismatch { left: String, right: String },

    /// The grid type cannot be determined from dimensions and coordinates.
    #[error("could not determine grid type: {0}")]
    GridType(String),

    /// A reduction block has a non-positive total area weight.
    #[error("degenerate area weight {total} in block ({block_row}, {block_col})")]
    DegenerateWeight {
        block_row: usize,
        block_col: usize,
        total: f64,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl GridProcessorError {
    /// Create a Shape error.
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    /// Create a ShapeMismatch error from two shapes.
    pub fn shape_mismatch(left: &[usize], right: &[usize]) -> Self {
        Self::ShapeMismatch {
            left: format!("{:?}", left),
            right: format!("{:?}", right),
        }
    }

    /// Create a GridType error.
    pub fn grid_type(msg: impl Into<String>) -> Self {
        Self::GridType(msg.into())
    }

    /// Create a Config error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result type for grid processor operations.
pub type Result<T> = std::result::Result<T, GridProcessorError>;
