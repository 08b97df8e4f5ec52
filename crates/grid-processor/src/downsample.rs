//! Block coarsening of gridded fields.
//!
//! A field is reduced by an integer factor `N` in both spatial dimensions:
//! each output cell summarizes an `N x N` block of input cells. Two
//! strategies exist, selected by [`classify`]:
//!
//! - **Area-weighted mean** for geographic grids. Cells are weighted by their
//!   relative area (see [`area_weights`]) and the grid is always trimmed to
//!   whole blocks.
//! - **Plain mean** for equal-area projected grids, honouring [`EdgePolicy`].
//!
//! Coordinates are always coarsened by a plain mean. Missing values (NaN)
//! are excluded from both sums; a block with no valid value yields NaN.

use std::ops::Range;

use crate::area::area_weights;
use crate::config::{CoarsenConfig, EdgePolicy};
use crate::error::{GridProcessorError, Result};
use crate::grid_type::{classify, GridType};
use crate::types::{Field, Grid};

/// Footprint of one output cell in input index space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Output row index.
    pub row: usize,
    /// Output column index.
    pub col: usize,
    /// Input rows covered.
    pub rows: Range<usize>,
    /// Input columns covered.
    pub cols: Range<usize>,
}

/// Partition of an `ny x nx` grid into `block_size x block_size` blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    pub ny: usize,
    pub nx: usize,
    pub block_size: usize,
    pub out_ny: usize,
    pub out_nx: usize,
}

impl BlockLayout {
    /// Lay out blocks over a grid.
    ///
    /// # Errors
    ///
    /// [`GridProcessorError::Config`] for a zero block size and
    /// [`GridProcessorError::Shape`] when no output cell would remain.
    pub fn new(ny: usize, nx: usize, block_size: usize, policy: EdgePolicy) -> Result<Self> {
        if block_size == 0 {
            return Err(GridProcessorError::config("block_size must be >= 1"));
        }

        let out_ny = policy.output_len(ny, block_size);
        let out_nx = policy.output_len(nx, block_size);
        if out_ny == 0 || out_nx == 0 {
            return Err(GridProcessorError::shape(format!(
                "{}x{} grid holds no {}x{} block",
                ny, nx, block_size, block_size
            )));
        }

        Ok(Self {
            ny,
            nx,
            block_size,
            out_ny,
            out_nx,
        })
    }

    /// Output extents as `(out_ny, out_nx)`.
    pub fn out_shape(&self) -> (usize, usize) {
        (self.out_ny, self.out_nx)
    }

    /// Input extents covered by whole or partial blocks.
    pub fn covered(&self) -> (usize, usize) {
        (
            (self.out_ny * self.block_size).min(self.ny),
            (self.out_nx * self.block_size).min(self.nx),
        )
    }

    /// Trailing rows and columns left outside every block.
    pub fn dropped(&self) -> (usize, usize) {
        let (ny, nx) = self.covered();
        (self.ny - ny, self.nx - nx)
    }

    /// All blocks in row-major output order.
    pub fn blocks(self) -> impl Iterator<Item = Block> {
        let n = self.block_size;
        (0..self.out_ny).flat_map(move |row| {
            (0..self.out_nx).map(move |col| Block {
                row,
                col,
                rows: row * n..((row + 1) * n).min(self.ny),
                cols: col * n..((col + 1) * n).min(self.nx),
            })
        })
    }
}

/// A coarsened field together with its coarsened coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Coarsened {
    pub field: Field,
    /// Block-mean lat/lon, when coordinates were supplied.
    pub grid: Option<Grid>,
    pub grid_type: GridType,
    pub block_size: usize,
    /// Trailing `(rows, cols)` discarded by trimming.
    pub dropped: (usize, usize),
}

/// Classify the field's grid and coarsen it with the matching strategy.
pub fn coarsen(field: &Field, coords: Option<&Grid>, config: &CoarsenConfig) -> Result<Coarsened> {
    config.validate()?;

    match classify(field, coords, config)? {
        GridType::Projected => {
            coarsen_block_mean(field, coords, config.block_size, config.edge_policy)
        }
        GridType::Geographic => {
            let grid = coords.ok_or_else(|| {
                GridProcessorError::grid_type("geographic grid without coordinates")
            })?;
            coarsen_area_weighted(field, grid, config.block_size)
        }
    }
}

/// Area-weighted block mean for geographic grids.
///
/// Trailing rows/columns that do not fill a whole block are dropped. Each
/// output value is `Σ(v·a) / Σ(a)` over the valid cells of its block.
///
/// # Errors
///
/// - [`GridProcessorError::ShapeMismatch`] if the grid does not match the
///   field's spatial extents.
/// - [`GridProcessorError::DegenerateWeight`] if any block's total area is
///   not strictly positive.
pub fn coarsen_area_weighted(field: &Field, grid: &Grid, block_size: usize) -> Result<Coarsened> {
    let (ny, nx) = field.spatial_shape();
    if grid.shape() != (ny, nx) {
        return Err(GridProcessorError::shape_mismatch(
            &[grid.ny, grid.nx],
            &[ny, nx],
        ));
    }

    let layout = BlockLayout::new(ny, nx, block_size, EdgePolicy::Trim)?;
    let (ny_t, nx_t) = layout.covered();
    let area = area_weights(&grid.trimmed(ny_t, nx_t));

    for block in layout.blocks() {
        let total = block_sum(&area, nx_t, &block);
        if !(total.is_finite() && total > 0.0) {
            return Err(GridProcessorError::DegenerateWeight {
                block_row: block.row,
                block_col: block.col,
                total,
            });
        }
    }

    let (out_ny, out_nx) = layout.out_shape();
    let mut data = Vec::with_capacity(field.n_steps() * out_ny * out_nx);
    for t in 0..field.n_steps() {
        let slice = field.step(t);
        for block in layout.blocks() {
            data.push(weighted_block_mean(slice, nx, &area, nx_t, &block) as f32);
        }
    }

    Ok(Coarsened {
        field: output_field(field, &layout, data)?,
        grid: Some(coarsen_grid(grid, &layout)),
        grid_type: GridType::Geographic,
        block_size,
        dropped: layout.dropped(),
    })
}

/// Plain block mean for equal-area projected grids.
///
/// Auxiliary lat/lon coordinates, when given, are coarsened alongside.
pub fn coarsen_block_mean(
    field: &Field,
    coords: Option<&Grid>,
    block_size: usize,
    policy: EdgePolicy,
) -> Result<Coarsened> {
    let (ny, nx) = field.spatial_shape();
    if let Some(grid) = coords {
        if grid.shape() != (ny, nx) {
            return Err(GridProcessorError::shape_mismatch(
                &[grid.ny, grid.nx],
                &[ny, nx],
            ));
        }
    }

    let layout = BlockLayout::new(ny, nx, block_size, policy)?;
    let (out_ny, out_nx) = layout.out_shape();
    let mut data = Vec::with_capacity(field.n_steps() * out_ny * out_nx);
    for t in 0..field.n_steps() {
        let slice = field.step(t);
        for block in layout.blocks() {
            data.push(block_mean(slice, nx, &block) as f32);
        }
    }

    Ok(Coarsened {
        field: output_field(field, &layout, data)?,
        grid: coords.map(|grid| coarsen_grid(grid, &layout)),
        grid_type: GridType::Projected,
        block_size,
        dropped: layout.dropped(),
    })
}

/// Block mean of a 1D coordinate axis (e.g. northing or easting values).
///
/// Only the axis length is divided by `block_size`; each output value is the
/// mean of one run of up to `block_size` consecutive values.
pub fn coarsen_axis(values: &[f64], block_size: usize, policy: EdgePolicy) -> Result<Vec<f64>> {
    if block_size == 0 {
        return Err(GridProcessorError::config("block_size must be >= 1"));
    }

    let len = values.len();
    let out_len = policy.output_len(len, block_size);
    if out_len == 0 {
        return Err(GridProcessorError::shape(format!(
            "axis of {} values holds no block of {}",
            len, block_size
        )));
    }

    Ok((0..out_len)
        .map(|k| {
            let block = Block {
                row: 0,
                col: k,
                rows: 0..1,
                cols: k * block_size..((k + 1) * block_size).min(len),
            };
            block_mean(values, len, &block)
        })
        .collect())
}

/// Total area weight of every output block of the trimmed grid, row-major.
pub fn block_areas(grid: &Grid, block_size: usize) -> Result<Vec<f64>> {
    let layout = BlockLayout::new(grid.ny, grid.nx, block_size, EdgePolicy::Trim)?;
    let (ny_t, nx_t) = layout.covered();
    let area = area_weights(&grid.trimmed(ny_t, nx_t));
    Ok(layout
        .blocks()
        .map(|block| block_sum(&area, nx_t, &block))
        .collect())
}

fn output_field(field: &Field, layout: &BlockLayout, data: Vec<f32>) -> Result<Field> {
    let mut shape = field.shape.clone();
    let n = shape.len();
    shape[n - 2] = layout.out_ny;
    shape[n - 1] = layout.out_nx;

    Ok(Field::new(field.name.clone(), field.dims.clone(), shape, data)?
        .with_attributes(field.attributes.clone()))
}

fn coarsen_grid(grid: &Grid, layout: &BlockLayout) -> Grid {
    let (lat, lon): (Vec<f64>, Vec<f64>) = layout
        .blocks()
        .map(|block| {
            (
                block_mean(&grid.lat, grid.nx, &block),
                block_mean(&grid.lon, grid.nx, &block),
            )
        })
        .unzip();

    Grid {
        ny: layout.out_ny,
        nx: layout.out_nx,
        lat,
        lon,
    }
}

/// Mean of the valid (non-NaN) values in a block.
#[inline]
fn block_mean<T: Copy + Into<f64>>(data: &[T], width: usize, block: &Block) -> f64 {
    let mut sum = 0.0;
    let mut count = 0usize;

    for i in block.rows.clone() {
        for j in block.cols.clone() {
            let v: f64 = data[i * width + j].into();
            if !v.is_nan() {
                sum += v;
                count += 1;
            }
        }
    }

    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Area-weighted mean of the valid values in a block.
#[inline]
fn weighted_block_mean(
    data: &[f32],
    width: usize,
    weights: &[f64],
    weight_width: usize,
    block: &Block,
) -> f64 {
    let mut weighted = 0.0;
    let mut total = 0.0;

    for i in block.rows.clone() {
        for j in block.cols.clone() {
            let v = f64::from(data[i * width + j]);
            if v.is_nan() {
                continue;
            }
            let w = weights[i * weight_width + j];
            weighted += v * w;
            total += w;
        }
    }

    if total == 0.0 {
        f64::NAN
    } else {
        weighted / total
    }
}

#[inline]
fn block_sum(values: &[f64], width: usize, block: &Block) -> f64 {
    block
        .rows
        .clone()
        .flat_map(|i| block.cols.clone().map(move |j| i * width + j))
        .map(|idx| values[idx])
        .sum()
}
