//! Writing grid descriptions, bounded fields and coarsened fields.
//!
//! Every writer stages its output in a temporary file next to the
//! destination and renames it into place once the NetCDF handle is closed.

use std::path::Path;

use grid_processor::{
    AttrValue, CellPolygons, Coarsened, CornerGrid, Field, Grid, GridProcessorError,
};
use tracing::debug;

use crate::error::{NetCdfError, NetCdfResult};
use crate::reader::{silence_hdf5_errors, Axis, PACKING_ATTRIBUTES};

/// Name of the vertex dimension of polygon bounds.
pub const VERTEX_DIM: &str = "nv";

/// Suffix appended to `lat`/`lon` to name their vertex variables.
pub const VERTICES_SUFFIX: &str = "_vertices";

/// Permission bits of written files.
#[cfg(unix)]
const OUTPUT_MODE: u32 = 0o644;

/// Names of the coordinate variables written next to a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordNames {
    pub lat: String,
    pub lon: String,
}

impl CoordNames {
    pub fn new(lat: impl Into<String>, lon: impl Into<String>) -> Self {
        Self {
            lat: lat.into(),
            lon: lon.into(),
        }
    }
}

impl Default for CoordNames {
    fn default() -> Self {
        Self::new("lat", "lon")
    }
}

/// Write a grid description: `lat`/`lon` on `(y, x)` and the corner
/// arrays `lat_b`/`lon_b` on `(y_b, x_b)`.
pub fn write_grid_description(
    path: impl AsRef<Path>,
    grid: &Grid,
    corners: &CornerGrid,
) -> NetCdfResult<()> {
    let (ny, nx) = grid.shape();
    let (ny_b, nx_b) = corners.shape();

    write_atomically(path.as_ref(), |file| {
        file.add_dimension("y", ny)?;
        file.add_dimension("x", nx)?;
        file.add_dimension("y_b", ny_b)?;
        file.add_dimension("x_b", nx_b)?;

        put_coordinate(file, "lat", &["y", "x"], &grid.lat, Latitude)?;
        put_coordinate(file, "lon", &["y", "x"], &grid.lon, Longitude)?;
        put_coordinate(file, "lat_b", &["y_b", "x_b"], &corners.lat_b, Latitude)?;
        put_coordinate(file, "lon_b", &["y_b", "x_b"], &corners.lon_b, Longitude)?;
        Ok(())
    })
}

/// Write a field with its coordinates and per-cell polygon vertices.
///
/// `lat`/`lon` get a `bounds` attribute naming `lat_vertices`/`lon_vertices`,
/// which live on `(y_dim, x_dim, nv)`.
pub fn write_with_bounds(
    path: impl AsRef<Path>,
    field: &Field,
    grid: &Grid,
    polygons: &CellPolygons,
    axes: &[Axis],
    names: &CoordNames,
) -> NetCdfResult<()> {
    check_grid(field, grid)?;
    let (y_dim, x_dim) = field.spatial_dims();
    let (ny, nx, nv) = polygons.shape();
    if (ny, nx) != grid.shape() {
        let (gy, gx) = grid.shape();
        return Err(GridProcessorError::shape_mismatch(&[ny, nx], &[gy, gx]).into());
    }

    write_atomically(path.as_ref(), |file| {
        define_dimensions(file, field)?;
        file.add_dimension(VERTEX_DIM, nv)?;
        put_axes(file, axes, names)?;
        put_grid(file, field, grid, names, true)?;

        let lat_vertices = format!("{}{}", names.lat, VERTICES_SUFFIX);
        let lon_vertices = format!("{}{}", names.lon, VERTICES_SUFFIX);
        let dims = [y_dim, x_dim, VERTEX_DIM];
        put_coordinate(file, &lat_vertices, &dims, &polygons.lat_v, LatitudeBounds)?;
        put_coordinate(file, &lon_vertices, &dims, &polygons.lon_v, LongitudeBounds)?;

        put_field(file, field, Some(names))?;
        Ok(())
    })
}

/// Write the result of coarsening: the field on `(time?, y, x)`, the
/// block-mean `lat`/`lon` when present, and the given axes.
pub fn write_coarsened(
    path: impl AsRef<Path>,
    coarsened: &Coarsened,
    axes: &[Axis],
    names: &CoordNames,
) -> NetCdfResult<()> {
    write_field(path, &coarsened.field, coarsened.grid.as_ref(), axes, names)
}

/// Write a single field with optional coordinates and axes.
pub fn write_field(
    path: impl AsRef<Path>,
    field: &Field,
    grid: Option<&Grid>,
    axes: &[Axis],
    names: &CoordNames,
) -> NetCdfResult<()> {
    if let Some(grid) = grid {
        check_grid(field, grid)?;
    }

    write_atomically(path.as_ref(), |file| {
        define_dimensions(file, field)?;
        put_axes(file, axes, names)?;
        if let Some(grid) = grid {
            put_grid(file, field, grid, names, false)?;
        }
        put_field(file, field, grid.map(|_| names))?;
        Ok(())
    })
}

// =============================================================================
// Internal helpers
// =============================================================================

/// CF metadata for the coordinate kinds written here.
#[derive(Debug, Clone, Copy)]
enum CoordKind {
    Latitude,
    Longitude,
    LatitudeBounds,
    LongitudeBounds,
}

use CoordKind::{Latitude, LatitudeBounds, Longitude, LongitudeBounds};

impl CoordKind {
    fn standard_name(self) -> &'static str {
        match self {
            Latitude => "latitude",
            Longitude => "longitude",
            LatitudeBounds => "latitude_bounds",
            LongitudeBounds => "longitude_bounds",
        }
    }

    fn units(self) -> &'static str {
        match self {
            Latitude | LatitudeBounds => "degrees_north",
            Longitude | LongitudeBounds => "degrees_east",
        }
    }
}

/// Create `path` through a temporary sibling file, renaming it into place
/// only after `write` succeeded and the handle was closed.
fn write_atomically<F>(path: &Path, write: F) -> NetCdfResult<()>
where
    F: FnOnce(&mut netcdf::FileMut) -> NetCdfResult<()>,
{
    silence_hdf5_errors();

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let staged = tempfile::Builder::new()
        .prefix(".regrid-")
        .suffix(".nc")
        .tempfile_in(dir)?;

    {
        let mut file = netcdf::create(staged.path())?;
        file.add_attribute("Conventions", "CF-1.8")?;
        write(&mut file)?;
    }

    // Temp files are created owner-only; outputs get regular file permissions.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(staged.path(), std::fs::Permissions::from_mode(OUTPUT_MODE))?;
    }

    staged.persist(path).map_err(|e| NetCdfError::IoError(e.error))?;
    debug!(path = %path.display(), "Wrote NetCDF file");
    Ok(())
}

fn check_grid(field: &Field, grid: &Grid) -> NetCdfResult<()> {
    let (ny, nx) = field.spatial_shape();
    if grid.shape() != (ny, nx) {
        let (gy, gx) = grid.shape();
        return Err(GridProcessorError::shape_mismatch(&[gy, gx], &[ny, nx]).into());
    }
    Ok(())
}

fn define_dimensions(file: &mut netcdf::FileMut, field: &Field) -> NetCdfResult<()> {
    for (dim, &len) in field.dims.iter().zip(&field.shape) {
        file.add_dimension(dim, len)?;
    }
    Ok(())
}

/// Write 1D axes, skipping any that collide with the lat/lon names.
fn put_axes(file: &mut netcdf::FileMut, axes: &[Axis], names: &CoordNames) -> NetCdfResult<()> {
    for axis in axes {
        if axis.name == names.lat || axis.name == names.lon {
            continue;
        }
        let len = file
            .dimension(&axis.name)
            .map(|d| d.len())
            .ok_or_else(|| NetCdfError::MissingData(format!("dimension '{}'", axis.name)))?;
        if len != axis.values.len() {
            return Err(NetCdfError::InvalidFormat(format!(
                "axis '{}' has {} values for a dimension of length {}",
                axis.name,
                axis.values.len(),
                len
            )));
        }

        let mut var = file.add_variable::<f64>(&axis.name, &[axis.name.as_str()])?;
        for (key, value) in &axis.attributes {
            if !PACKING_ATTRIBUTES.contains(&key.as_str()) {
                put_attr(&mut var, key, value)?;
            }
        }
        var.put_values(&axis.values, ..)?;
    }
    Ok(())
}

/// Write `lat`/`lon` for the field's spatial dimensions.
///
/// When the spatial dimensions are themselves named after lat/lon the grid
/// is regular and 1D coordinate variables are written instead.
fn put_grid(
    file: &mut netcdf::FileMut,
    field: &Field,
    grid: &Grid,
    names: &CoordNames,
    with_bounds: bool,
) -> NetCdfResult<()> {
    let (y_dim, x_dim) = field.spatial_dims();
    let (ny, nx) = grid.shape();

    if y_dim == names.lat && x_dim == names.lon {
        let lat: Vec<f64> = (0..ny).map(|i| grid.lat_at(i, 0)).collect();
        let lon: Vec<f64> = (0..nx).map(|j| grid.lon_at(0, j)).collect();
        put_coordinate(file, &names.lat, &[y_dim], &lat, Latitude)?;
        put_coordinate(file, &names.lon, &[x_dim], &lon, Longitude)?;
    } else {
        put_coordinate(file, &names.lat, &[y_dim, x_dim], &grid.lat, Latitude)?;
        put_coordinate(file, &names.lon, &[y_dim, x_dim], &grid.lon, Longitude)?;
    }

    if with_bounds {
        let lat_vertices = format!("{}{}", names.lat, VERTICES_SUFFIX);
        let lon_vertices = format!("{}{}", names.lon, VERTICES_SUFFIX);
        if let Some(mut var) = file.variable_mut(&names.lat) {
            var.put_attribute("bounds", lat_vertices.as_str())?;
        }
        if let Some(mut var) = file.variable_mut(&names.lon) {
            var.put_attribute("bounds", lon_vertices.as_str())?;
        }
    }
    Ok(())
}

fn put_coordinate(
    file: &mut netcdf::FileMut,
    name: &str,
    dims: &[&str],
    values: &[f64],
    kind: CoordKind,
) -> NetCdfResult<()> {
    let mut var = file.add_variable::<f64>(name, dims)?;
    var.put_attribute("standard_name", kind.standard_name())?;
    var.put_attribute("units", kind.units())?;
    var.put_values(values, ..)?;
    Ok(())
}

fn put_field(
    file: &mut netcdf::FileMut,
    field: &Field,
    coords: Option<&CoordNames>,
) -> NetCdfResult<()> {
    let dims: Vec<&str> = field.dims.iter().map(String::as_str).collect();
    let mut var = file.add_variable::<f32>(&field.name, &dims)?;
    var.put_attribute("_FillValue", f32::NAN)?;

    for (key, value) in &field.attributes {
        if !PACKING_ATTRIBUTES.contains(&key.as_str()) && key != "coordinates" {
            put_attr(&mut var, key, value)?;
        }
    }
    if let Some(names) = coords {
        let (y_dim, x_dim) = field.spatial_dims();
        if y_dim != names.lat || x_dim != names.lon {
            var.put_attribute("coordinates", format!("{} {}", names.lat, names.lon).as_str())?;
        }
    }

    var.put_values(&field.data, ..)?;
    debug!(variable = %field.name, shape = ?field.shape, "Wrote field");
    Ok(())
}

fn put_attr(var: &mut netcdf::VariableMut, key: &str, value: &AttrValue) -> NetCdfResult<()> {
    match value {
        AttrValue::Text(s) => var.put_attribute(key, s.as_str())?,
        AttrValue::Number(v) => var.put_attribute(key, *v)?,
        AttrValue::Numbers(v) => var.put_attribute(key, v.clone())?,
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coord_kind_metadata() {
        assert_eq!(Latitude.units(), "degrees_north");
        assert_eq!(LongitudeBounds.units(), "degrees_east");
        assert_eq!(LatitudeBounds.standard_name(), "latitude_bounds");
    }

    #[test]
    fn test_write_field_rejects_mismatched_grid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.nc");
        let field = Field::new(
            "v",
            vec!["y".to_string(), "x".to_string()],
            vec![2, 2],
            vec![0.0; 4],
        )
        .unwrap();
        let grid = Grid::new(1, 2, vec![0.0; 2], vec![0.0; 2]).unwrap();

        let result = write_field(&path, &field, Some(&grid), &[], &CoordNames::default());
        assert!(matches!(result, Err(NetCdfError::Grid(_))));
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_output_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.nc");
        let field = Field::new(
            "v",
            vec!["y".to_string(), "x".to_string()],
            vec![1, 2],
            vec![1.0, 2.0],
        )
        .unwrap();

        write_field(&path, &field, None, &[], &CoordNames::default()).unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, OUTPUT_MODE);
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with(".regrid-"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
