//! Reading fields and coordinates with the native netcdf library.
//!
//! Values are unpacked on read: `scale_factor`/`add_offset` are applied and
//! `_FillValue`/`missing_value` cells become NaN, so downstream code only
//! ever sees physical values.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Once;

use grid_processor::{AttrValue, Field, Grid, GridProcessorError};
use tracing::debug;

use crate::error::{NetCdfError, NetCdfResult};

/// Packing and fill attributes consumed while unpacking. They no longer
/// describe the unpacked f32 values and are not carried into outputs.
pub(crate) const PACKING_ATTRIBUTES: [&str; 8] = [
    "_FillValue",
    "missing_value",
    "scale_factor",
    "add_offset",
    "valid_range",
    "valid_min",
    "valid_max",
    "grid_mapping",
];

/// Silence HDF5's automatic error printing to stderr.
///
/// The HDF5 C library prints diagnostics even for errors the Rust code
/// handles, such as probing for optional attributes. Call this early, before
/// any NetCDF operation; repeated calls are no-ops.
pub fn silence_hdf5_errors() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        // SAFETY: H5Eset_auto2 is thread-safe and null handlers are a
        // documented way to disable automatic error printing.
        unsafe {
            hdf5_metno_sys::h5e::H5Eset_auto2(
                hdf5_metno_sys::h5e::H5E_DEFAULT,
                None,
                std::ptr::null_mut(),
            );
        }
    });
}

/// A 1D coordinate variable (time, northing, easting, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub name: String,
    pub values: Vec<f64>,
    pub attributes: BTreeMap<String, AttrValue>,
}

impl Axis {
    pub fn new(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            values,
            attributes: BTreeMap::new(),
        }
    }

    /// Same axis with different values, keeping name and attributes.
    pub fn with_values(&self, values: Vec<f64>) -> Self {
        Self {
            values,
            ..self.clone()
        }
    }
}

/// An open NetCDF file.
pub struct NetCdfReader {
    path: PathBuf,
    file: netcdf::File,
}

impl NetCdfReader {
    /// Open a NetCDF file for reading.
    pub fn open(path: impl AsRef<Path>) -> NetCdfResult<Self> {
        silence_hdf5_errors();

        let path = path.as_ref().to_path_buf();
        let file = netcdf::open(&path).map_err(|e| {
            NetCdfError::InvalidFormat(format!("Failed to open {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Opened NetCDF file");

        Ok(Self { path, file })
    }

    /// Dimension names of a variable.
    pub fn dimension_names(&self, name: &str) -> NetCdfResult<Vec<String>> {
        let var = self.variable(name)?;
        Ok(var.dimensions().iter().map(|d| d.name()).collect())
    }

    /// Read a 2D or 3D variable as a [`Field`] of unpacked f32 values.
    pub fn field(&self, name: &str) -> NetCdfResult<Field> {
        let var = self.variable(name)?;
        let dims: Vec<String> = var.dimensions().iter().map(|d| d.name()).collect();
        let shape: Vec<usize> = var.dimensions().iter().map(|d| d.len()).collect();

        let raw: Vec<f32> = var.get_values::<f32, _>(..)?;

        let scale_factor = get_f64_attr(&var, "scale_factor").unwrap_or(1.0);
        let add_offset = get_f64_attr(&var, "add_offset").unwrap_or(0.0);
        let fill_values: Vec<f64> = ["_FillValue", "missing_value"]
            .iter()
            .filter_map(|attr| get_f64_attr(&var, attr))
            .collect();
        let packed = scale_factor != 1.0 || add_offset != 0.0;

        let data: Vec<f32> = raw
            .into_iter()
            .map(|val| {
                let v = f64::from(val);
                if fill_values.iter().any(|&fill| v == fill) {
                    f32::NAN
                } else if packed {
                    (v * scale_factor + add_offset) as f32
                } else {
                    val
                }
            })
            .collect();

        debug!(variable = name, shape = ?shape, "Read field");

        let field = Field::new(name, dims, shape, data)?;
        Ok(field.with_attributes(read_attributes(&var, true)))
    }

    /// Read cell-center coordinates as a [`Grid`].
    ///
    /// 2D coordinate variables are taken as-is; a pair of 1D variables is
    /// expanded to a regular mesh (latitude along rows). Returns `None` when
    /// either variable is absent.
    pub fn grid(&self, lat_name: &str, lon_name: &str) -> NetCdfResult<Option<Grid>> {
        let (Some(lat_var), Some(lon_var)) =
            (self.file.variable(lat_name), self.file.variable(lon_name))
        else {
            return Ok(None);
        };

        let lat_shape: Vec<usize> = lat_var.dimensions().iter().map(|d| d.len()).collect();
        let lon_shape: Vec<usize> = lon_var.dimensions().iter().map(|d| d.len()).collect();
        let lat: Vec<f64> = lat_var.get_values::<f64, _>(..)?;
        let lon: Vec<f64> = lon_var.get_values::<f64, _>(..)?;

        match (lat_shape.as_slice(), lon_shape.as_slice()) {
            ([ny, nx], [_, _]) if lat_shape == lon_shape => {
                Ok(Some(Grid::new(*ny, *nx, lat, lon)?))
            }
            ([ny], [nx]) => {
                let (ny, nx) = (*ny, *nx);
                let mut lat2 = Vec::with_capacity(ny * nx);
                let mut lon2 = Vec::with_capacity(ny * nx);
                for &la in &lat {
                    lat2.extend(std::iter::repeat(la).take(nx));
                    lon2.extend_from_slice(&lon);
                }
                Ok(Some(Grid::new(ny, nx, lat2, lon2)?))
            }
            _ => Err(GridProcessorError::shape_mismatch(&lat_shape, &lon_shape).into()),
        }
    }

    /// Read a 1D coordinate variable, if present.
    pub fn axis(&self, name: &str) -> NetCdfResult<Option<Axis>> {
        let Some(var) = self.file.variable(name) else {
            return Ok(None);
        };
        if var.dimensions().len() != 1 {
            return Ok(None);
        }

        let values: Vec<f64> = var.get_values::<f64, _>(..)?;
        Ok(Some(Axis {
            name: name.to_string(),
            values,
            attributes: read_attributes(&var, false),
        }))
    }

    /// Read every 1D coordinate variable named after one of `dims`.
    pub fn axes_for(&self, dims: &[String]) -> NetCdfResult<Vec<Axis>> {
        let mut axes = Vec::new();
        for dim in dims {
            if let Some(axis) = self.axis(dim)? {
                axes.push(axis);
            }
        }
        Ok(axes)
    }

    fn variable(&self, name: &str) -> NetCdfResult<netcdf::Variable<'_>> {
        self.file.variable(name).ok_or_else(|| {
            NetCdfError::MissingData(format!("variable '{}' in {}", name, self.path.display()))
        })
    }
}

/// Read one variable of a file as a [`Field`].
pub fn read_field(path: impl AsRef<Path>, name: &str) -> NetCdfResult<Field> {
    NetCdfReader::open(path)?.field(name)
}

/// Read a file's cell-center coordinates, if both variables exist.
pub fn read_grid(
    path: impl AsRef<Path>,
    lat_name: &str,
    lon_name: &str,
) -> NetCdfResult<Option<Grid>> {
    NetCdfReader::open(path)?.grid(lat_name, lon_name)
}

/// Read a 1D coordinate variable of a file, if present.
pub fn read_axis(path: impl AsRef<Path>, name: &str) -> NetCdfResult<Option<Axis>> {
    NetCdfReader::open(path)?.axis(name)
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Collect a variable's attributes, optionally skipping packing attributes.
fn read_attributes(var: &netcdf::Variable, skip_packing: bool) -> BTreeMap<String, AttrValue> {
    var.attributes()
        .filter(|attr| !(skip_packing && PACKING_ATTRIBUTES.contains(&attr.name())))
        .filter_map(|attr| {
            let value = attr.value().ok().and_then(to_attr_value)?;
            Some((attr.name().to_string(), value))
        })
        .collect()
}

fn to_attr_value(value: netcdf::AttributeValue) -> Option<AttrValue> {
    use netcdf::AttributeValue as V;

    Some(match value {
        V::Str(s) => AttrValue::Text(s),
        V::Strs(s) => AttrValue::Text(s.join(" ")),
        V::Double(v) => AttrValue::Number(v),
        V::Float(v) => AttrValue::Number(f64::from(v)),
        V::Int(v) => AttrValue::Number(f64::from(v)),
        V::Short(v) => AttrValue::Number(f64::from(v)),
        V::Schar(v) => AttrValue::Number(f64::from(v)),
        V::Uchar(v) => AttrValue::Number(f64::from(v)),
        V::Ushort(v) => AttrValue::Number(f64::from(v)),
        V::Uint(v) => AttrValue::Number(f64::from(v)),
        V::Longlong(v) => AttrValue::Number(v as f64),
        V::Ulonglong(v) => AttrValue::Number(v as f64),
        V::Doubles(v) => AttrValue::Numbers(v),
        V::Floats(v) => AttrValue::Numbers(v.into_iter().map(f64::from).collect()),
        V::Ints(v) => AttrValue::Numbers(v.into_iter().map(f64::from).collect()),
        V::Shorts(v) => AttrValue::Numbers(v.into_iter().map(f64::from).collect()),
        _ => return None,
    })
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(var: &netcdf::Variable, name: &str) -> bool {
    var.attributes().any(|attr| attr.name() == name)
}

/// Helper to get a numeric attribute as f64.
fn get_f64_attr(var: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(var, name) {
        return None;
    }
    let attr_value = var.attribute_value(name)?.ok()?;
    match to_attr_value(attr_value)? {
        AttrValue::Number(v) => Some(v),
        AttrValue::Numbers(v) => v.first().copied(),
        AttrValue::Text(_) => None,
    }
}
