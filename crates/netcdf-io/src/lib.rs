//! NetCDF I/O for the regridding toolkit.
//!
//! Reads fields and cell-center coordinates into [`grid_processor`] types and
//! writes grid descriptions, polygon bounds and coarsened outputs back out.
//! Remapping onto a target grid is delegated to CDO through [`Cdo`].
//!
//! # Example
//!
//! ```no_run
//! use grid_processor::{compute_corners, CoarsenConfig};
//! use netcdf_io::{read_grid, write_grid_description};
//!
//! let config = CoarsenConfig::default();
//! let grid = read_grid("TabsD.nc", &config.lat_name, &config.lon_name)?
//!     .expect("file has lat/lon");
//! let corners = compute_corners(&grid)?;
//! write_grid_description("grid_with_bounds.nc", &grid, &corners)?;
//! # Ok::<(), netcdf_io::NetCdfError>(())
//! ```

pub mod cdo;
pub mod error;
pub mod reader;
pub mod writer;

pub use cdo::{Cdo, RemapMethod};
pub use error::{NetCdfError, NetCdfResult};
pub use reader::{read_axis, read_field, read_grid, silence_hdf5_errors, Axis, NetCdfReader};
pub use writer::{
    write_coarsened, write_field, write_grid_description, write_with_bounds, CoordNames,
    VERTEX_DIM,
};
