//! Regridding pipeline for gridded climate fields.
//!
//! Infers cell corners for curvilinear lat/lon grids, attaches polygon
//! bounds, block-coarsens fields (area-weighted on geographic grids),
//! masks one field by another and drives CDO conservative remapping.

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use grid_processor::EdgePolicy;
use netcdf_io::{silence_hdf5_errors, Cdo, RemapMethod};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use commands::{MaskArgs, RemapArgs};
use config::RegridderConfig;

#[derive(Parser, Debug)]
#[command(name = "regridder")]
#[command(about = "Grid bounds, block coarsening, masking and conservative remapping")]
struct Args {
    /// Configuration file path
    #[arg(short, long, env = "REGRIDDER_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (overrides the config file)
    #[arg(long)]
    log_level: Option<String>,

    /// Name of the latitude coordinate variable
    #[arg(long)]
    lat_name: Option<String>,

    /// Name of the longitude coordinate variable
    #[arg(long)]
    lon_name: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write lat/lon centers and inferred corners (lat_b/lon_b) to a grid file
    GridDescription {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Copy a variable with per-cell polygon vertices (lat_vertices/lon_vertices)
    Bounds {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        var: String,
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Block-coarsen a variable (area-weighted on geographic grids)
    Coarsen {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        var: String,
        #[arg(short, long)]
        output: PathBuf,
        /// Coarsening factor (overrides the config file)
        #[arg(short, long)]
        block_size: Option<usize>,
        /// Partial trailing blocks; only used on projected grids
        #[arg(long, value_enum)]
        edge_policy: Option<EdgePolicyArg>,
    },

    /// Keep values of var2 where var1 >= threshold, NaN elsewhere
    Mask {
        #[arg(long)]
        file1: PathBuf,
        #[arg(long)]
        var1: String,
        #[arg(long)]
        file2: PathBuf,
        #[arg(long)]
        var2: String,
        #[arg(short, long)]
        output: PathBuf,
        /// Selector threshold (overrides the config file, default 0.1)
        #[arg(short, long)]
        threshold: Option<f32>,
    },

    /// Conservatively remap onto a target grid with CDO
    Remap {
        #[arg(short, long)]
        input: PathBuf,
        /// CDO grid description of the target (file or grid name)
        #[arg(short, long)]
        target_grid: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long, value_enum, default_value_t = MethodArg::Con)]
        method: MethodArg,
        /// Input already carries polygon bounds
        #[arg(long)]
        skip_setgrid: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum EdgePolicyArg {
    /// Drop rows/columns that do not fill a whole block
    Trim,
    /// Average the cells of a partial block that exist
    Pad,
}

impl From<EdgePolicyArg> for EdgePolicy {
    fn from(arg: EdgePolicyArg) -> Self {
        match arg {
            EdgePolicyArg::Trim => EdgePolicy::Trim,
            EdgePolicyArg::Pad => EdgePolicy::Pad,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum MethodArg {
    /// First-order conservative (remapcon)
    Con,
    /// Second-order conservative (remapcon2)
    #[value(name = "con2")]
    Con2,
}

impl From<MethodArg> for RemapMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Con => RemapMethod::Con,
            MethodArg::Con2 => RemapMethod::Con2,
        }
    }
}

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let mut config = RegridderConfig::load(args.config.as_deref())?;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if let Some(name) = &args.lat_name {
        config.coarsen.lat_name = name.clone();
    }
    if let Some(name) = &args.lon_name {
        config.coarsen.lon_name = name.clone();
    }

    init_tracing(&config)?;
    silence_hdf5_errors();

    match args.command {
        Command::GridDescription { input, output } => {
            commands::grid_description(&input, &output, &config.coarsen)
        }
        Command::Bounds { input, var, output } => {
            commands::bounds(&input, &var, &output, &config.coarsen)
        }
        Command::Coarsen {
            input,
            var,
            output,
            block_size,
            edge_policy,
        } => {
            if let Some(size) = block_size {
                config.coarsen.block_size = size;
            }
            if let Some(policy) = edge_policy {
                config.coarsen.edge_policy = policy.into();
            }
            config.validate()?;
            info!(
                block_size = config.coarsen.block_size,
                edge_policy = %config.coarsen.edge_policy,
                "Coarsening"
            );
            commands::coarsen_file(&input, &var, &output, &config.coarsen)
        }
        Command::Mask {
            file1,
            var1,
            file2,
            var2,
            output,
            threshold,
        } => {
            let args = MaskArgs {
                selector_file: &file1,
                selector_var: &var1,
                values_file: &file2,
                values_var: &var2,
                output: &output,
                threshold: threshold.unwrap_or(config.mask_threshold),
            };
            commands::mask(&args, &config.coarsen)
        }
        Command::Remap {
            input,
            target_grid,
            output,
            method,
            skip_setgrid,
        } => {
            let args = RemapArgs {
                input: &input,
                target_grid: &target_grid,
                output: &output,
                method: method.into(),
                skip_setgrid,
            };
            commands::remap(&args, &Cdo::new(&config.cdo_binary), &config.coarsen)
        }
    }
}

fn init_tracing(config: &RegridderConfig) -> Result<()> {
    let level = match config.logging.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let builder = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr);

    if config.logging.is_json() {
        tracing::subscriber::set_global_default(builder.json().finish())?;
    } else {
        tracing::subscriber::set_global_default(builder.finish())?;
    }
    Ok(())
}
