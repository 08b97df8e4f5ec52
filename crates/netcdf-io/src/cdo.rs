//! Thin wrapper around the `cdo` command-line tool.
//!
//! Conservative remapping itself is delegated to CDO; this module only
//! builds the operator arguments and reports failures.

use std::ffi::OsString;
use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::{NetCdfError, NetCdfResult};

/// Conservative remapping operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RemapMethod {
    /// First-order conservative (`remapcon`)
    #[default]
    Con,
    /// Second-order conservative (`remapcon2`)
    Con2,
}

impl RemapMethod {
    pub fn operator(&self) -> &'static str {
        match self {
            RemapMethod::Con => "remapcon",
            RemapMethod::Con2 => "remapcon2",
        }
    }
}

impl std::fmt::Display for RemapMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.operator())
    }
}

/// Invokes a `cdo` binary.
#[derive(Debug, Clone)]
pub struct Cdo {
    binary: OsString,
}

impl Default for Cdo {
    fn default() -> Self {
        Self::new("cdo")
    }
}

impl Cdo {
    pub fn new(binary: impl Into<OsString>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Attach the grid described by `grid_file` to `input`, writing `output`.
    pub fn set_grid(&self, grid_file: &Path, input: &Path, output: &Path) -> NetCdfResult<()> {
        self.run(&operator_arg("setgrid", grid_file), input, output)
    }

    /// Remap `input` onto `target_grid` with a conservative operator.
    pub fn remap(
        &self,
        method: RemapMethod,
        target_grid: &Path,
        input: &Path,
        output: &Path,
    ) -> NetCdfResult<()> {
        self.run(&operator_arg(method.operator(), target_grid), input, output)
    }

    fn run(&self, operator: &OsString, input: &Path, output: &Path) -> NetCdfResult<()> {
        debug!(
            binary = ?self.binary,
            operator = ?operator,
            input = %input.display(),
            output = %output.display(),
            "Running cdo"
        );

        let result = Command::new(&self.binary)
            .arg(operator)
            .arg(input)
            .arg(output)
            .output()
            .map_err(|e| {
                NetCdfError::CommandError(format!("Failed to run {:?}: {}", self.binary, e))
            })?;

        if !result.status.success() {
            return Err(NetCdfError::CommandError(format!(
                "cdo {:?} failed: {}",
                operator,
                String::from_utf8_lossy(&result.stderr).trim()
            )));
        }

        Ok(())
    }
}

/// `operator,path` as a single argument.
fn operator_arg(operator: &str, path: &Path) -> OsString {
    let mut arg = OsString::from(operator);
    arg.push(",");
    arg.push(path);
    arg
}
