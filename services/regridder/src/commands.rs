//! Pipeline steps behind each subcommand.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use grid_processor::{
    cell_polygons, coarsen, coarsen_axis, compute_corners, mask_by_threshold, CoarsenConfig,
    EdgePolicy, Field, Grid, GridType,
};
use netcdf_io::{
    write_coarsened, write_field, write_grid_description, write_with_bounds, Axis, Cdo,
    CoordNames, NetCdfReader, RemapMethod,
};
use tracing::info;

/// Read a field, its coordinates (if any) and the 1D axes of its dimensions.
struct Source {
    field: Field,
    grid: Option<Grid>,
    axes: Vec<Axis>,
}

impl Source {
    fn read(path: &Path, var: &str, config: &CoarsenConfig) -> Result<Self> {
        let reader = NetCdfReader::open(path)
            .with_context(|| format!("Failed to open {}", path.display()))?;
        let field = reader
            .field(var)
            .with_context(|| format!("Failed to read '{}' from {}", var, path.display()))?;
        let grid = reader.grid(&config.lat_name, &config.lon_name)?;
        let axes = reader.axes_for(&field.dims)?;

        info!(
            path = %path.display(),
            variable = var,
            shape = ?field.shape,
            has_coordinates = grid.is_some(),
            "Read input"
        );
        Ok(Self { field, grid, axes })
    }

    fn require_grid(&self, path: &Path, config: &CoarsenConfig) -> Result<&Grid> {
        self.grid.as_ref().with_context(|| {
            format!(
                "{} has no '{}'/'{}' coordinates",
                path.display(),
                config.lat_name,
                config.lon_name
            )
        })
    }
}

fn coord_names(config: &CoarsenConfig) -> CoordNames {
    CoordNames::new(&config.lat_name, &config.lon_name)
}

fn read_grid_only(path: &Path, config: &CoarsenConfig) -> Result<Grid> {
    let reader = NetCdfReader::open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    reader
        .grid(&config.lat_name, &config.lon_name)?
        .with_context(|| {
            format!(
                "{} has no '{}'/'{}' coordinates",
                path.display(),
                config.lat_name,
                config.lon_name
            )
        })
}

/// Infer cell corners and write a grid description file.
pub fn grid_description(input: &Path, output: &Path, config: &CoarsenConfig) -> Result<()> {
    let grid = read_grid_only(input, config)?;
    let corners = compute_corners(&grid)?;

    write_grid_description(output, &grid, &corners)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    let (ny, nx) = grid.shape();
    info!(output = %output.display(), ny, nx, "Wrote grid description");
    Ok(())
}

/// Attach per-cell polygon vertices to a field.
pub fn bounds(input: &Path, var: &str, output: &Path, config: &CoarsenConfig) -> Result<()> {
    let source = Source::read(input, var, config)?;
    let grid = source.require_grid(input, config)?;
    let polygons = cell_polygons(&compute_corners(grid)?);

    write_with_bounds(
        output,
        &source.field,
        grid,
        &polygons,
        &source.axes,
        &coord_names(config),
    )
    .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(output = %output.display(), variable = var, "Wrote field with polygon bounds");
    Ok(())
}

/// Block-coarsen a field with the strategy matching its grid type.
pub fn coarsen_file(input: &Path, var: &str, output: &Path, config: &CoarsenConfig) -> Result<()> {
    let source = Source::read(input, var, config)?;
    let coarsened = coarsen(&source.field, source.grid.as_ref(), config)?;

    // Area-weighted coarsening always trims partial blocks.
    let policy = match coarsened.grid_type {
        GridType::Projected => config.edge_policy,
        GridType::Geographic => EdgePolicy::Trim,
    };
    let axes = coarsen_spatial_axes(&source.field, &source.axes, config.block_size, policy)?;

    write_coarsened(output, &coarsened, &axes, &coord_names(config))
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!(
        output = %output.display(),
        grid_type = %coarsened.grid_type,
        block_size = coarsened.block_size,
        shape = ?coarsened.field.shape,
        dropped_rows = coarsened.dropped.0,
        dropped_cols = coarsened.dropped.1,
        "Wrote coarsened field"
    );
    Ok(())
}

/// Block-average the 1D axes of the spatial dimensions; others pass through.
fn coarsen_spatial_axes(
    field: &Field,
    axes: &[Axis],
    block_size: usize,
    policy: EdgePolicy,
) -> Result<Vec<Axis>> {
    let (y_dim, x_dim) = field.spatial_dims();
    axes.iter()
        .map(|axis| -> Result<Axis> {
            if axis.name == y_dim || axis.name == x_dim {
                Ok(axis.with_values(coarsen_axis(&axis.values, block_size, policy)?))
            } else {
                Ok(axis.clone())
            }
        })
        .collect()
}

/// Inputs of the masking step.
pub struct MaskArgs<'a> {
    pub selector_file: &'a Path,
    pub selector_var: &'a str,
    pub values_file: &'a Path,
    pub values_var: &'a str,
    pub output: &'a Path,
    pub threshold: f32,
}

/// Keep values where the selector reaches the threshold, NaN elsewhere.
pub fn mask(args: &MaskArgs<'_>, config: &CoarsenConfig) -> Result<()> {
    let selector = Source::read(args.selector_file, args.selector_var, config)?;
    let values = Source::read(args.values_file, args.values_var, config)?;

    let masked = mask_by_threshold(&selector.field, &values.field, args.threshold)
        .context("Selector and values must have the same shape")?;

    let kept = masked.data.iter().filter(|v| !v.is_nan()).count();
    write_field(
        args.output,
        &masked,
        values.grid.as_ref(),
        &values.axes,
        &coord_names(config),
    )
    .with_context(|| format!("Failed to write {}", args.output.display()))?;

    info!(
        output = %args.output.display(),
        threshold = args.threshold,
        kept,
        total = masked.data.len(),
        "Wrote masked field"
    );
    Ok(())
}

/// Inputs of the remapping step.
pub struct RemapArgs<'a> {
    pub input: &'a Path,
    pub target_grid: &'a Path,
    pub output: &'a Path,
    pub method: RemapMethod,
    /// The input already carries polygon bounds; skip `setgrid`.
    pub skip_setgrid: bool,
}

/// Conservatively remap a file onto a target grid with CDO.
pub fn remap(args: &RemapArgs<'_>, cdo: &Cdo, config: &CoarsenConfig) -> Result<()> {
    if args.skip_setgrid {
        cdo.remap(args.method, args.target_grid, args.input, args.output)?;
    } else {
        let scratch = tempfile::tempdir().context("Failed to create scratch directory")?;
        let grid_file = scratch.path().join("grid.nc");
        let with_grid: PathBuf = scratch.path().join("with_grid.nc");

        grid_description(args.input, &grid_file, config)?;
        cdo.set_grid(&grid_file, args.input, &with_grid)?;
        info!(grid = %grid_file.display(), "Attached source grid");

        cdo.remap(args.method, args.target_grid, &with_grid, args.output)?;
    }

    info!(
        output = %args.output.display(),
        method = %args.method,
        target = %args.target_grid.display(),
        "Wrote remapped file"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::fixtures::grid::ODD_13X7;
    use test_utils::fixtures::variables::{RHIRESD, TABSD, WET_DAY_THRESHOLD};
    use test_utils::{precipitation_values, temperature_series};

    fn dims(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn write_projected(path: &Path, var: &str, data: Vec<f32>, steps: usize) {
        let (ny, nx) = (ODD_13X7.ny, ODD_13X7.nx);
        let field = Field::new(var, dims(&["time", "N", "E"]), vec![steps, ny, nx], data).unwrap();
        let (lat, lon) = ODD_13X7.latlon();
        let grid = Grid::new(ny, nx, lat, lon).unwrap();
        let axes = vec![
            Axis::new("time", (0..steps).map(|t| t as f64).collect()),
            Axis::new("N", (0..ny).map(|i| 1_100_000.0 + 1000.0 * i as f64).collect()),
            Axis::new("E", (0..nx).map(|j| 2_480_000.0 + 1000.0 * j as f64).collect()),
        ];
        write_field(path, &field, Some(&grid), &axes, &CoordNames::default()).unwrap();
    }

    #[test]
    fn test_coarsen_projected_file_coarsens_axes() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("TabsD.nc");
        let output = dir.path().join("TabsD_coarse.nc");
        let (ny, nx) = (ODD_13X7.ny, ODD_13X7.nx);
        write_projected(&input, TABSD, temperature_series(2, ny, nx), 2);

        let config = CoarsenConfig::with_block_size(3);
        coarsen_file(&input, TABSD, &output, &config).unwrap();

        let reader = NetCdfReader::open(&output).unwrap();
        let field = reader.field(TABSD).unwrap();
        assert_eq!(field.shape, vec![2, 4, 2]);

        let n_axis = reader.axis("N").unwrap().unwrap();
        assert_eq!(n_axis.values, vec![1_101_000.0, 1_104_000.0, 1_107_000.0, 1_110_000.0]);
        let time = reader.axis("time").unwrap().unwrap();
        assert_eq!(time.values, vec![0.0, 1.0]);
    }

    #[test]
    fn test_mask_keeps_wet_days() {
        let dir = tempfile::tempdir().unwrap();
        let precip = dir.path().join("RhiresD.nc");
        let temp = dir.path().join("TabsD.nc");
        let output = dir.path().join("TabsD_wet.nc");
        let (ny, nx) = (ODD_13X7.ny, ODD_13X7.nx);
        write_projected(&precip, RHIRESD, precipitation_values(ny, nx), 1);
        write_projected(&temp, TABSD, temperature_series(1, ny, nx), 1);

        let args = MaskArgs {
            selector_file: &precip,
            selector_var: RHIRESD,
            values_file: &temp,
            values_var: TABSD,
            output: &output,
            threshold: WET_DAY_THRESHOLD,
        };
        mask(&args, &CoarsenConfig::default()).unwrap();

        let field = NetCdfReader::open(&output).unwrap().field(TABSD).unwrap();
        let precip_values = precipitation_values(ny, nx);
        for (v, p) in field.data.iter().zip(&precip_values) {
            assert_eq!(v.is_nan(), *p < WET_DAY_THRESHOLD);
        }
    }

    #[test]
    fn test_bounds_requires_coordinates() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("nocoords.nc");
        let field = Field::new("v", dims(&["y", "x"]), vec![2, 2], vec![1.0; 4]).unwrap();
        write_field(&input, &field, None, &[], &CoordNames::default()).unwrap();

        let err = bounds(&input, "v", &dir.path().join("out.nc"), &CoarsenConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("no 'lat'/'lon' coordinates"));
    }

    #[cfg(unix)]
    #[test]
    fn test_remap_reports_cdo_failure() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("TabsD.nc");
        let (ny, nx) = (ODD_13X7.ny, ODD_13X7.nx);
        write_projected(&input, TABSD, temperature_series(1, ny, nx), 1);

        let args = RemapArgs {
            input: &input,
            target_grid: Path::new("cordex_grid_CH.txt"),
            output: &dir.path().join("out.nc"),
            method: RemapMethod::Con2,
            skip_setgrid: false,
        };
        let result = remap(&args, &Cdo::new("false"), &CoarsenConfig::default());
        assert!(result.is_err());
        assert!(!dir.path().join("out.nc").exists());
    }
}
