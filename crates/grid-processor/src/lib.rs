//! Grid processing for conservative remapping and coarsening.
//!
//! This crate holds the numerical core that sits between NetCDF inputs and
//! an external conservative-remapping tool:
//!
//! - **Cell bounds**: infer cell corners from cell centers and assemble the
//!   per-cell polygon vertices a remapper consumes
//! - **Coarsening**: reduce a field by an integer block factor, area-weighted
//!   on geographic grids and plain on equal-area projected grids
//! - **Co-masking**: mask one field by a threshold on another
//!
//! Every function is pure: it reads its inputs and returns new arrays or an
//! error. Nothing here logs or touches the filesystem.
//!
//! # Architecture
//!
//! ```text
//! Grid (lat/lon centers)
//!      │
//!      ├─► compute_corners ─► CornerGrid ─► cell_polygons ─► CellPolygons
//!      │
//! Field + Grid?
//!      │
//!      └─► classify ─┬─► Projected  ─► coarsen_block_mean
//!                    └─► Geographic ─► coarsen_area_weighted
//! ```
//!
//! # Example
//!
//! ```
//! use grid_processor::{coarsen, CoarsenConfig, Field, Grid, GridType};
//!
//! let lat: Vec<f64> = (0..16).map(|k| 46.0 + (k / 4) as f64 * 0.1).collect();
//! let lon: Vec<f64> = (0..16).map(|k| 7.0 + (k % 4) as f64 * 0.1).collect();
//! let grid = Grid::new(4, 4, lat, lon).unwrap();
//! let field = Field::new(
//!     "tabsd",
//!     vec!["y".into(), "x".into()],
//!     vec![4, 4],
//!     vec![1.0; 16],
//! )
//! .unwrap();
//!
//! let result = coarsen(&field, Some(&grid), &CoarsenConfig::with_block_size(2)).unwrap();
//! assert_eq!(result.grid_type, GridType::Geographic);
//! assert_eq!(result.field.shape, vec![2, 2]);
//! ```

pub mod area;
pub mod bounds;
pub mod config;
pub mod corners;
pub mod downsample;
pub mod error;
pub mod grid_type;
pub mod mask;
pub mod types;

// Re-export commonly used types at crate root
pub use area::{area_weights, EARTH_RADIUS_M};
pub use bounds::cell_polygons;
pub use config::{CoarsenConfig, EdgePolicy};
pub use corners::compute_corners;
pub use downsample::{
    block_areas, coarsen, coarsen_area_weighted, coarsen_axis, coarsen_block_mean, Block,
    BlockLayout, Coarsened,
};
pub use error::{GridProcessorError, Result};
pub use grid_type::{classify, GridType};
pub use mask::mask_by_threshold;
pub use types::{AttrValue, CellPolygons, CornerGrid, Field, Grid, VERTICES_PER_CELL};
