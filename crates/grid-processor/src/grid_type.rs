//! Grid classification.
//!
//! Decides which reduction strategy applies to a field by looking at the
//! names of its spatial dimensions and at the coordinate arrays available.

use serde::{Deserialize, Serialize};

use crate::config::CoarsenConfig;
use crate::error::{GridProcessorError, Result};
use crate::types::{Field, Grid};

/// The closed set of grid kinds a field can live on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridType {
    /// Equal-area projected grid (e.g. northing/easting); plain block mean.
    Projected,
    /// Geographic or curvilinear lat/lon grid; area-weighted block mean.
    Geographic,
}

impl GridType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Projected => "projected",
            Self::Geographic => "geographic",
        }
    }
}

impl std::fmt::Display for GridType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classify the grid a field lives on.
///
/// A recognized projected dimension pair wins. Otherwise the field is
/// geographic when `coords` is present and matches its trailing two extents.
///
/// # Errors
///
/// Returns [`GridProcessorError::GridType`] when neither rule applies.
pub fn classify(field: &Field, coords: Option<&Grid>, config: &CoarsenConfig) -> Result<GridType> {
    let (y_dim, x_dim) = field.spatial_dims();
    if config.is_projected_pair(y_dim, x_dim) {
        return Ok(GridType::Projected);
    }

    match coords {
        Some(grid) if grid.shape() == field.spatial_shape() => Ok(GridType::Geographic),
        Some(grid) => Err(GridProcessorError::grid_type(format!(
            "coordinates {}/{} have shape {:?}, field '{}' has spatial shape {:?}",
            config.lat_name,
            config.lon_name,
            grid.shape(),
            field.name,
            field.spatial_shape()
        ))),
        None => Err(GridProcessorError::grid_type(format!(
            "field '{}' has dimensions ({}, {}) and no {}/{} coordinates",
            field.name, y_dim, x_dim, config.lat_name, config.lon_name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(dims: &[&str], shape: &[usize]) -> Field {
        let len = shape.iter().product();
        Field::new(
            "tabsd",
            dims.iter().map(|s| s.to_string()).collect(),
            shape.to_vec(),
            vec![0.0; len],
        )
        .unwrap()
    }

    fn grid(ny: usize, nx: usize) -> Grid {
        Grid::new(ny, nx, vec![46.0; ny * nx], vec![8.0; ny * nx]).unwrap()
    }

    #[test]
    fn test_projected_dims_route_to_projected() {
        let f = field(&["time", "N", "E"], &[2, 3, 4]);
        let config = CoarsenConfig::default();
        assert_eq!(classify(&f, None, &config).unwrap(), GridType::Projected);
    }

    #[test]
    fn test_projected_dims_win_over_coordinates() {
        let f = field(&["N", "E"], &[3, 4]);
        let g = grid(3, 4);
        let config = CoarsenConfig::default();
        assert_eq!(classify(&f, Some(&g), &config).unwrap(), GridType::Projected);
    }

    #[test]
    fn test_latlon_coordinates_route_to_geographic() {
        let f = field(&["time", "y", "x"], &[2, 3, 4]);
        let g = grid(3, 4);
        let config = CoarsenConfig::default();
        assert_eq!(classify(&f, Some(&g), &config).unwrap(), GridType::Geographic);
    }

    #[test]
    fn test_unknown_grid_is_rejected() {
        let f = field(&["time", "y", "x"], &[2, 3, 4]);
        let config = CoarsenConfig::default();
        let err = classify(&f, None, &config).unwrap_err();
        assert!(matches!(err, GridProcessorError::GridType(_)));
        assert!(err.to_string().contains("could not determine grid type"));
    }

    #[test]
    fn test_mismatched_coordinates_are_rejected() {
        let f = field(&["y", "x"], &[3, 4]);
        let g = grid(4, 3);
        let config = CoarsenConfig::default();
        assert!(matches!(
            classify(&f, Some(&g), &config),
            Err(GridProcessorError::GridType(_))
        ));
    }
}
