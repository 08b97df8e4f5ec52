//! Cell-corner inference from cell centers.
//!
//! Interior corners are the mean of the four surrounding cell centers. The
//! outermost corner rows and columns are copied from their interior
//! neighbours (zero-order extension), so the boundary cells of the corner
//! mesh are degenerate in the outward direction.

use crate::error::{GridProcessorError, Result};
use crate::types::{CornerGrid, Grid};

/// Compute the `(ny + 1, nx + 1)` corner mesh of a grid.
///
/// # Errors
///
/// Returns [`GridProcessorError::Shape`] when `ny < 2` or `nx < 2`, since no
/// interior corner exists.
pub fn compute_corners(grid: &Grid) -> Result<CornerGrid> {
    let (ny, nx) = grid.shape();
    if ny < 2 || nx < 2 {
        return Err(GridProcessorError::shape(format!(
            "corner inference needs at least 2x2 cells, got {}x{}",
            ny, nx
        )));
    }

    Ok(CornerGrid {
        ny,
        nx,
        lat_b: corners_of(&grid.lat, ny, nx),
        lon_b: corners_of(&grid.lon, ny, nx),
    })
}

fn corners_of(centers: &[f64], ny: usize, nx: usize) -> Vec<f64> {
    let width = nx + 1;
    let mut out = vec![0.0; (ny + 1) * width];

    for i in 1..ny {
        for j in 1..nx {
            let c00 = centers[(i - 1) * nx + (j - 1)];
            let c01 = centers[(i - 1) * nx + j];
            let c10 = centers[i * nx + (j - 1)];
            let c11 = centers[i * nx + j];
            out[i * width + j] = 0.25 * (c00 + c01 + c10 + c11);
        }
    }

    // Rows first, then columns, so the four outer corners take the value of
    // their diagonal interior neighbour.
    for j in 0..width {
        out[j] = out[width + j];
        out[ny * width + j] = out[(ny - 1) * width + j];
    }
    for i in 0..=ny {
        out[i * width] = out[i * width + 1];
        out[i * width + nx] = out[i * width + nx - 1];
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linspace_grid(ny: usize, nx: usize) -> Grid {
        let mut lat = Vec::with_capacity(ny * nx);
        let mut lon = Vec::with_capacity(ny * nx);
        for i in 0..ny {
            for j in 0..nx {
                lat.push(45.0 + i as f64 * 0.5);
                lon.push(5.0 + j as f64 * 0.25);
            }
        }
        Grid::new(ny, nx, lat, lon).unwrap()
    }

    #[test]
    fn test_corner_shape() {
        let corners = compute_corners(&linspace_grid(4, 6)).unwrap();
        assert_eq!(corners.shape(), (5, 7));
        assert_eq!(corners.lat_b.len(), 35);
    }

    #[test]
    fn test_interior_corners_match_uniform_mesh() {
        let corners = compute_corners(&linspace_grid(4, 5)).unwrap();
        for i in 1..4 {
            for j in 1..5 {
                let expected_lat = 45.0 + (i as f64 - 0.5) * 0.5;
                let expected_lon = 5.0 + (j as f64 - 0.5) * 0.25;
                assert!((corners.lat_at(i, j) - expected_lat).abs() < 1e-12);
                assert!((corners.lon_at(i, j) - expected_lon).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_border_rows_and_columns_are_copied() {
        let corners = compute_corners(&linspace_grid(3, 4)).unwrap();
        let (rows, cols) = corners.shape();
        for j in 0..cols {
            assert_eq!(corners.lat_at(0, j), corners.lat_at(1, j));
            assert_eq!(corners.lat_at(rows - 1, j), corners.lat_at(rows - 2, j));
        }
        for i in 0..rows {
            assert_eq!(corners.lon_at(i, 0), corners.lon_at(i, 1));
            assert_eq!(corners.lon_at(i, cols - 1), corners.lon_at(i, cols - 2));
        }
    }

    #[test]
    fn test_outer_corner_takes_diagonal_neighbour() {
        let corners = compute_corners(&linspace_grid(3, 3)).unwrap();
        assert_eq!(corners.lat_at(0, 0), corners.lat_at(1, 1));
        assert_eq!(corners.lon_at(3, 3), corners.lon_at(2, 2));
    }

    #[test]
    fn test_too_small_grid_is_rejected() {
        let grid = Grid::new(1, 5, vec![0.0; 5], vec![0.0; 5]).unwrap();
        assert!(matches!(
            compute_corners(&grid),
            Err(GridProcessorError::Shape(_))
        ));

        let grid = Grid::new(4, 1, vec![0.0; 4], vec![0.0; 4]).unwrap();
        assert!(compute_corners(&grid).is_err());
    }
}
