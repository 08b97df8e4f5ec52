//! Per-cell polygon vertices for conservative remapping.
//!
//! Remapping tools read the vertex dimension positionally, so the order
//! emitted here is fixed: top-left, top-right, bottom-right, bottom-left.

use crate::types::{CellPolygons, CornerGrid, VERTICES_PER_CELL};

/// Corner offsets `(di, dj)` for each vertex slot.
const VERTEX_OFFSETS: [(usize, usize); VERTICES_PER_CELL] = [(0, 0), (0, 1), (1, 1), (1, 0)];

/// Assemble the `(ny, nx, 4)` vertex arrays of every cell from a corner mesh.
pub fn cell_polygons(corners: &CornerGrid) -> CellPolygons {
    let (ny, nx) = (corners.ny, corners.nx);
    let mut lat_v = Vec::with_capacity(ny * nx * VERTICES_PER_CELL);
    let mut lon_v = Vec::with_capacity(ny * nx * VERTICES_PER_CELL);

    for i in 0..ny {
        for j in 0..nx {
            for &(di, dj) in &VERTEX_OFFSETS {
                lat_v.push(corners.lat_at(i + di, j + dj));
                lon_v.push(corners.lon_at(i + di, j + dj));
            }
        }
    }

    CellPolygons { ny, nx, lat_v, lon_v }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corners::compute_corners;
    use crate::types::Grid;

    #[test]
    fn test_vertex_order() {
        let ny = 3;
        let nx = 4;
        let lat: Vec<f64> = (0..ny * nx)
            .map(|k| (k / nx) as f64 * 1.5 + (k % nx) as f64 * 0.1)
            .collect();
        let lon: Vec<f64> = (0..ny * nx)
            .map(|k| (k % nx) as f64 * 2.0 - (k / nx) as f64 * 0.3)
            .collect();
        let grid = Grid::new(ny, nx, lat, lon).unwrap();
        let corners = compute_corners(&grid).unwrap();
        let polygons = cell_polygons(&corners);

        assert_eq!(polygons.shape(), (3, 4, 4));
        for i in 0..ny {
            for j in 0..nx {
                assert_eq!(polygons.lat_vertex(i, j, 0), corners.lat_at(i, j));
                assert_eq!(polygons.lat_vertex(i, j, 1), corners.lat_at(i, j + 1));
                assert_eq!(polygons.lat_vertex(i, j, 2), corners.lat_at(i + 1, j + 1));
                assert_eq!(polygons.lat_vertex(i, j, 3), corners.lat_at(i + 1, j));
                assert_eq!(polygons.lon_vertex(i, j, 0), corners.lon_at(i, j));
                assert_eq!(polygons.lon_vertex(i, j, 1), corners.lon_at(i, j + 1));
                assert_eq!(polygons.lon_vertex(i, j, 2), corners.lon_at(i + 1, j + 1));
                assert_eq!(polygons.lon_vertex(i, j, 3), corners.lon_at(i + 1, j));
            }
        }
    }

    #[test]
    fn test_vertex_buffer_layout() {
        let corners = CornerGrid {
            ny: 1,
            nx: 1,
            lat_b: vec![1.0, 2.0, 3.0, 4.0],
            lon_b: vec![10.0, 20.0, 30.0, 40.0],
        };
        let polygons = cell_polygons(&corners);
        assert_eq!(polygons.lat_v, vec![1.0, 2.0, 4.0, 3.0]);
        assert_eq!(polygons.lon_v, vec![10.0, 20.0, 40.0, 30.0]);
    }
}
