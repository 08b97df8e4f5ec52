//! Core types for grid processing.
//!
//! All arrays are stored as flat, row-major buffers with explicit extents.
//! Row index `i` runs over `ny` (the slower axis), column index `j` over `nx`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{GridProcessorError, Result};

/// A structured 2D grid of cell-center coordinates in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    pub ny: usize,
    pub nx: usize,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
}

impl Grid {
    /// Create a grid, checking both buffers hold `ny * nx` values.
    pub fn new(ny: usize, nx: usize, lat: Vec<f64>, lon: Vec<f64>) -> Result<Self> {
        let expected = ny * nx;
        if lat.len() != expected {
            return Err(GridProcessorError::shape_mismatch(&[lat.len()], &[ny, nx]));
        }
        if lon.len() != expected {
            return Err(GridProcessorError::shape_mismatch(&[lon.len()], &[ny, nx]));
        }
        Ok(Self { ny, nx, lat, lon })
    }

    /// Grid extents as `(ny, nx)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.ny, self.nx)
    }

    #[inline]
    pub fn lat_at(&self, i: usize, j: usize) -> f64 {
        self.lat[i * self.nx + j]
    }

    #[inline]
    pub fn lon_at(&self, i: usize, j: usize) -> f64 {
        self.lon[i * self.nx + j]
    }

    /// The leading `ny x nx` sub-grid.
    pub fn trimmed(&self, ny: usize, nx: usize) -> Grid {
        let ny = ny.min(self.ny);
        let nx = nx.min(self.nx);
        let mut lat = Vec::with_capacity(ny * nx);
        let mut lon = Vec::with_capacity(ny * nx);
        for i in 0..ny {
            let row = i * self.nx;
            lat.extend_from_slice(&self.lat[row..row + nx]);
            lon.extend_from_slice(&self.lon[row..row + nx]);
        }
        Grid { ny, nx, lat, lon }
    }
}

/// Grid-line intersections of a cell mesh, shape `(ny + 1, nx + 1)`.
///
/// `ny`/`nx` are the extents of the cell grid the corners were derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CornerGrid {
    pub ny: usize,
    pub nx: usize,
    pub lat_b: Vec<f64>,
    pub lon_b: Vec<f64>,
}

impl CornerGrid {
    /// Corner array extents as `(ny + 1, nx + 1)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.ny + 1, self.nx + 1)
    }

    #[inline]
    pub fn lat_at(&self, i: usize, j: usize) -> f64 {
        self.lat_b[i * (self.nx + 1) + j]
    }

    #[inline]
    pub fn lon_at(&self, i: usize, j: usize) -> f64 {
        self.lon_b[i * (self.nx + 1) + j]
    }
}

/// Number of vertices stored per cell polygon.
pub const VERTICES_PER_CELL: usize = 4;

/// Ordered per-cell polygon vertices, shape `(ny, nx, 4)` with the vertex
/// index varying fastest.
///
/// Vertex order is top-left, top-right, bottom-right, bottom-left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellPolygons {
    pub ny: usize,
    pub nx: usize,
    pub lat_v: Vec<f64>,
    pub lon_v: Vec<f64>,
}

impl CellPolygons {
    /// Vertex array extents as `(ny, nx, 4)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (self.ny, self.nx, VERTICES_PER_CELL)
    }

    #[inline]
    pub fn lat_vertex(&self, i: usize, j: usize, k: usize) -> f64 {
        self.lat_v[(i * self.nx + j) * VERTICES_PER_CELL + k]
    }

    #[inline]
    pub fn lon_vertex(&self, i: usize, j: usize, k: usize) -> f64 {
        self.lon_v[(i * self.nx + j) * VERTICES_PER_CELL + k]
    }
}

/// Metadata attribute value carried along with a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Text(String),
    Number(f64),
    Numbers(Vec<f64>),
}

/// A scalar field of shape `[ny, nx]` or `[time, ny, nx]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub dims: Vec<String>,
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttrValue>,
}

impl Field {
    /// Create a field, validating rank and buffer length.
    pub fn new(
        name: impl Into<String>,
        dims: Vec<String>,
        shape: Vec<usize>,
        data: Vec<f32>,
    ) -> Result<Self> {
        if shape.len() != 2 && shape.len() != 3 {
            return Err(GridProcessorError::shape(format!(
                "field must be [y, x] or [time, y, x], got rank {}",
                shape.len()
            )));
        }
        if dims.len() != shape.len() {
            return Err(GridProcessorError::shape(format!(
                "{} dimension names for rank {} field",
                dims.len(),
                shape.len()
            )));
        }
        let expected: usize = shape.iter().product();
        if data.len() != expected {
            return Err(GridProcessorError::shape_mismatch(&[data.len()], &shape));
        }
        Ok(Self {
            name: name.into(),
            dims,
            shape,
            data,
            attributes: BTreeMap::new(),
        })
    }

    /// Attach metadata attributes.
    pub fn with_attributes(mut self, attributes: BTreeMap<String, AttrValue>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Extents of the trailing two (spatial) dimensions.
    pub fn spatial_shape(&self) -> (usize, usize) {
        let n = self.shape.len();
        (self.shape[n - 2], self.shape[n - 1])
    }

    /// Names of the trailing two (spatial) dimensions.
    pub fn spatial_dims(&self) -> (&str, &str) {
        let n = self.dims.len();
        (&self.dims[n - 2], &self.dims[n - 1])
    }

    /// Name of the leading time dimension, if the field has one.
    pub fn time_dim(&self) -> Option<&str> {
        (self.dims.len() == 3).then(|| self.dims[0].as_str())
    }

    /// Number of 2D slices: the time length, or 1 without a time axis.
    pub fn n_steps(&self) -> usize {
        if self.shape.len() == 3 {
            self.shape[0]
        } else {
            1
        }
    }

    /// The 2D slice at step `t`.
    pub fn step(&self, t: usize) -> &[f32] {
        let (ny, nx) = self.spatial_shape();
        let len = ny * nx;
        &self.data[t * len..(t + 1) * len]
    }
}
