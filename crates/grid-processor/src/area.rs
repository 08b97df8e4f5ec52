//! Relative cell-area weights for geographic grids.
//!
//! Each cell gets `R² · dlat · dlon · cos(lat)`, with `dlat`/`dlon` taken as
//! the mean angular spacing along the first column/row. This assumes
//! near-uniform spacing; only the relative size of the weights matters for a
//! weighted mean.

use crate::types::Grid;

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Compute the per-cell area weight of a grid, in square metres.
pub fn area_weights(grid: &Grid) -> Vec<f64> {
    let (ny, nx) = grid.shape();
    let dlat = mean_spacing_rad((0..ny).map(|i| grid.lat_at(i, 0)));
    let dlon = mean_spacing_rad((0..nx).map(|j| grid.lon_at(0, j)));
    let scale = EARTH_RADIUS_M * EARTH_RADIUS_M * dlat * dlon;

    grid.lat
        .iter()
        .map(|lat| scale * lat.to_radians().cos())
        .collect()
}

/// Absolute mean step of a coordinate sequence, in radians.
///
/// A single sample has no spacing; 1 radian is used so the weight reduces to
/// `cos(lat)` times a constant.
fn mean_spacing_rad(values: impl Iterator<Item = f64>) -> f64 {
    let values: Vec<f64> = values.collect();
    if values.len() < 2 {
        return 1.0;
    }
    let span = values[values.len() - 1] - values[0];
    (span / (values.len() - 1) as f64).to_radians().abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn regular(ny: usize, nx: usize, lat0: f64, dlat: f64, dlon: f64) -> Grid {
        let mut lat = Vec::new();
        let mut lon = Vec::new();
        for i in 0..ny {
            for j in 0..nx {
                lat.push(lat0 + i as f64 * dlat);
                lon.push(j as f64 * dlon);
            }
        }
        Grid::new(ny, nx, lat, lon).unwrap()
    }

    #[test]
    fn test_equator_cell_area() {
        let grid = regular(2, 2, 0.0, 1.0, 1.0);
        let area = area_weights(&grid);
        let expected = EARTH_RADIUS_M.powi(2) * 1f64.to_radians().powi(2);
        assert!((area[0] - expected).abs() / expected < 1e-12);
    }

    #[test]
    fn test_weights_shrink_poleward() {
        let grid = regular(3, 2, 0.0, 30.0, 1.0);
        let area = area_weights(&grid);
        assert!(area[0] > area[2]);
        assert!(area[2] > area[4]);
        assert!((area[4] / area[0] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_descending_latitudes_stay_positive() {
        let grid = regular(3, 3, 60.0, -10.0, 0.5);
        assert!(area_weights(&grid).iter().all(|&a| a > 0.0));
    }

    #[test]
    fn test_single_column_uses_unit_spacing() {
        let grid = regular(3, 1, 10.0, 1.0, 1.0);
        let area = area_weights(&grid);
        let expected = EARTH_RADIUS_M.powi(2) * 1f64.to_radians() * 10f64.to_radians().cos();
        assert!((area[0] - expected).abs() / expected < 1e-12);
    }
}
