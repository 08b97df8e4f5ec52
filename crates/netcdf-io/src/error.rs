//! Error types for NetCDF reading and writing.

use grid_processor::GridProcessorError;
use thiserror::Error;

/// Result type for NetCDF I/O operations.
pub type NetCdfResult<T> = Result<T, NetCdfError>;

/// Error types for NetCDF I/O.
#[derive(Error, Debug)]
pub enum NetCdfError {
    /// Error reported by the NetCDF library
    #[error("NetCDF error: {0}")]
    Netcdf(#[from] netcdf::Error),

    /// File I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Missing required variable, dimension or attribute
    #[error("Missing required data: {0}")]
    MissingData(String),

    /// Invalid data format
    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    /// External command failed
    #[error("Command execution failed: {0}")]
    CommandError(String),

    /// Grid computation rejected the data
    #[error(transparent)]
    Grid(#[from] GridProcessorError),
}
