//! Command-line interface for normalising geospatial uploads into PMTiles.
#![forbid(unsafe_code)]

use std::io::Write;
use std::time::Duration;

use camino::Utf8Path;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tilebundle_core::ToolRunner;
use tilebundle_pipeline::ProcessToolRunner;

mod classify;
mod convert;
mod error;
mod probe;

pub use error::{CliError, EXIT_INPUT, EXIT_INTERNAL};

use classify::{ClassifyArgs, run_classify};
use convert::{ConvertArgs, run_convert_with};
use probe::{ProbeArgs, run_probe_with};

pub(crate) const ARG_CONVERT_UPLOAD: &str = "upload";
pub(crate) const ARG_CONVERT_NAME: &str = "name";
pub(crate) const ARG_CONVERT_OUTPUT_DIR: &str = "output-dir";
pub(crate) const ARG_PROBE_DATASET: &str = "dataset";
pub(crate) const ARG_WORK_ROOT: &str = "work-root";
pub(crate) const ARG_OGR2OGR: &str = "ogr2ogr";
pub(crate) const ARG_OGRINFO: &str = "ogrinfo";
pub(crate) const ARG_TIPPECANOE: &str = "tippecanoe";
pub(crate) const ARG_PMTILES: &str = "pmtiles";
pub(crate) const ARG_TOOL_TIMEOUT: &str = "tool-timeout-secs";
pub(crate) const ENV_CONVERT_UPLOAD: &str = "TILEBUNDLE_CMDS_CONVERT_UPLOAD";
pub(crate) const ENV_PROBE_DATASET: &str = "TILEBUNDLE_CMDS_PROBE_DATASET";

/// Run the tilebundle CLI with the current process arguments and environment.
///
/// # Errors
///
/// Returns the first failure; [`CliError::exit_code`] maps it to a status.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    dispatch(cli.command, &ProcessRunnerBuilder, &mut stdout)
}

fn dispatch(
    command: Command,
    builder: &dyn RunnerBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    match command {
        Command::Convert(args) => run_convert_with(args, builder, writer),
        Command::Probe(args) => run_probe_with(args, builder, writer),
        Command::Classify(args) => run_classify(&args, writer),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "tilebundle",
    about = "Normalise geospatial uploads into PMTiles archives",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert a dataset into a PMTiles archive.
    Convert(ConvertArgs),
    /// Print the bounding box of a dataset.
    Probe(ProbeArgs),
    /// Print the conversion route chosen for a file name.
    Classify(ClassifyArgs),
}

/// Builds the tool runner for a command invocation.
pub(crate) trait RunnerBuilder {
    fn build(&self, timeout: Option<Duration>) -> Box<dyn ToolRunner + '_>;
}

pub(crate) struct ProcessRunnerBuilder;

impl RunnerBuilder for ProcessRunnerBuilder {
    fn build(&self, timeout: Option<Duration>) -> Box<dyn ToolRunner + '_> {
        let runner = ProcessToolRunner::new();
        Box::new(timeout.map_or(runner, |limit| runner.with_timeout(limit)))
    }
}

/// Zero disables the limit.
pub(crate) fn tool_timeout(seconds: Option<u64>) -> Option<Duration> {
    seconds.filter(|secs| *secs > 0).map(Duration::from_secs)
}

pub(crate) fn require_existing_file(path: &Utf8Path, field: &'static str) -> Result<(), CliError> {
    match tilebundle_fs::file_is_file(path) {
        Ok(true) => Ok(()),
        Ok(false) => Err(CliError::SourcePathNotFile {
            field,
            path: path.to_path_buf(),
        }),
        Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
            Err(CliError::MissingSourceFile {
                field,
                path: path.to_path_buf(),
            })
        }
        Err(source) => Err(CliError::InspectSourcePath {
            field,
            path: path.to_path_buf(),
            source,
        }),
    }
}

pub(crate) fn write_json<T: Serialize + ?Sized>(
    writer: &mut dyn Write,
    value: &T,
) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

#[cfg(test)]
mod tests;
