//! Synthetic coordinate and field generators.
//!
//! All buffers are row-major: row 0 first, then row 1, etc.

/// Regular lat/lon cell centers starting at `(lat0, lon0)`.
///
/// Latitude varies along rows, longitude along columns.
///
/// # Example
///
/// ```
/// use test_utils::uniform_latlon;
///
/// let (lat, lon) = uniform_latlon(2, 3, 45.0, 5.0, 0.5, 1.0);
/// assert_eq!(lat, vec![45.0, 45.0, 45.0, 45.5, 45.5, 45.5]);
/// assert_eq!(lon, vec![5.0, 6.0, 7.0, 5.0, 6.0, 7.0]);
/// ```
pub fn uniform_latlon(
    ny: usize,
    nx: usize,
    lat0: f64,
    lon0: f64,
    dlat: f64,
    dlon: f64,
) -> (Vec<f64>, Vec<f64>) {
    let mut lat = Vec::with_capacity(ny * nx);
    let mut lon = Vec::with_capacity(ny * nx);
    for row in 0..ny {
        for col in 0..nx {
            lat.push(lat0 + row as f64 * dlat);
            lon.push(lon0 + col as f64 * dlon);
        }
    }
    (lat, lon)
}

/// Curvilinear lat/lon cell centers: a regular mesh rotated by `angle_deg`
/// about `(lat0, lon0)`.
///
/// This mimics a projected national grid (e.g. Swiss LV95) whose cell
/// centers are not aligned with lat/lon lines.
pub fn rotated_latlon(
    ny: usize,
    nx: usize,
    lat0: f64,
    lon0: f64,
    spacing: f64,
    angle_deg: f64,
) -> (Vec<f64>, Vec<f64>) {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let mut lat = Vec::with_capacity(ny * nx);
    let mut lon = Vec::with_capacity(ny * nx);
    for row in 0..ny {
        for col in 0..nx {
            let dy = row as f64 * spacing;
            let dx = col as f64 * spacing;
            lat.push(lat0 + dy * cos + dx * sin);
            lon.push(lon0 + dx * cos - dy * sin);
        }
    }
    (lat, lon)
}

/// A buffer of `len` copies of `value`.
pub fn constant_values(len: usize, value: f32) -> Vec<f32> {
    vec![value; len]
}

/// Creates a grid with predictable values: `col * 1000 + row`.
///
/// # Example
///
/// ```
/// use test_utils::indexed_values;
///
/// let grid = indexed_values(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0);  // row=0, col=1
/// assert_eq!(grid[10], 1.0);    // row=1, col=0
/// ```
pub fn indexed_values(nx: usize, ny: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(nx * ny);
    for row in 0..ny {
        for col in 0..nx {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Daily-mean temperature-like values in °C for `steps` time steps.
///
/// Warmer toward the later rows, drifting by 0.5 °C per step.
pub fn temperature_series(steps: usize, ny: usize, nx: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(steps * ny * nx);
    for t in 0..steps {
        for row in 0..ny {
            for col in 0..nx {
                let y_factor = row as f32 / ny.max(1) as f32;
                let x_factor = col as f32 / nx.max(1) as f32;
                data.push(-5.0 + 20.0 * y_factor + 2.0 * x_factor + 0.5 * t as f32);
            }
        }
    }
    data
}

/// Daily precipitation-like values in mm, alternating dry and wet cells.
///
/// Every third cell is dry (0.0), the rest range from 0.05 to several mm.
pub fn precipitation_values(ny: usize, nx: usize) -> Vec<f32> {
    (0..ny * nx)
        .map(|k| match k % 3 {
            0 => 0.0,
            1 => 0.05,
            _ => 1.0 + (k % 7) as f32,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotated_latlon_zero_angle_is_uniform() {
        let (lat_r, lon_r) = rotated_latlon(3, 4, 46.0, 7.0, 0.01, 0.0);
        let (lat_u, lon_u) = uniform_latlon(3, 4, 46.0, 7.0, 0.01, 0.01);
        for k in 0..12 {
            assert!((lat_r[k] - lat_u[k]).abs() < 1e-12);
            assert!((lon_r[k] - lon_u[k]).abs() < 1e-12);
        }
    }

    #[test]
    fn test_temperature_series_len() {
        assert_eq!(temperature_series(3, 4, 5).len(), 60);
    }

    #[test]
    fn test_precipitation_has_dry_cells() {
        let values = precipitation_values(3, 3);
        assert_eq!(values[0], 0.0);
        assert_eq!(values[1], 0.05);
        assert!(values[2] >= 1.0);
    }
}
