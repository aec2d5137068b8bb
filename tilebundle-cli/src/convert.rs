//! Convert command implementation for the tilebundle CLI.

use std::io::Write;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use tilebundle_core::{BoundingBox, ConversionRoute, UploadArtifact, sanitize_name};
use tilebundle_pipeline::stages::ARCHIVE_EXTENSION;
use tilebundle_pipeline::{DriverConfig, PipelineDriver, ToolPaths};

use crate::{
    ARG_CONVERT_NAME, ARG_CONVERT_OUTPUT_DIR, ARG_CONVERT_UPLOAD, ARG_OGR2OGR, ARG_OGRINFO,
    ARG_PMTILES, ARG_TIPPECANOE, ARG_TOOL_TIMEOUT, ARG_WORK_ROOT, CliError, ENV_CONVERT_UPLOAD,
    RunnerBuilder, require_existing_file, tool_timeout, write_json,
};

/// CLI arguments for the `convert` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Convert a geospatial dataset (PMTiles, MBTiles, GeoJSON, a \
                 zipped shapefile, or anything OGR can read) into a PMTiles \
                 archive. The archive is copied into the output directory and \
                 a JSON report is printed.",
    about = "Convert a dataset into a PMTiles archive"
)]
#[ortho_config(prefix = "TILEBUNDLE")]
pub(crate) struct ConvertArgs {
    /// Path to the dataset to convert.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) upload: Option<Utf8PathBuf>,
    /// Bundle name; names the tile layer and the archive. Defaults to the
    /// upload's file stem.
    #[arg(long = ARG_CONVERT_NAME, value_name = "name")]
    #[serde(default)]
    pub(crate) name: Option<String>,
    /// Directory that receives the finished archive.
    #[arg(long = ARG_CONVERT_OUTPUT_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) output_dir: Option<Utf8PathBuf>,
    /// Directory under which per-run working directories are created.
    #[arg(long = ARG_WORK_ROOT, value_name = "dir")]
    #[serde(default)]
    pub(crate) work_root: Option<Utf8PathBuf>,
    /// Override the `ogr2ogr` binary.
    #[arg(long = ARG_OGR2OGR, value_name = "path")]
    #[serde(default)]
    pub(crate) ogr2ogr: Option<String>,
    /// Override the `ogrinfo` binary.
    #[arg(long = ARG_OGRINFO, value_name = "path")]
    #[serde(default)]
    pub(crate) ogrinfo: Option<String>,
    /// Override the `tippecanoe` binary.
    #[arg(long = ARG_TIPPECANOE, value_name = "path")]
    #[serde(default)]
    pub(crate) tippecanoe: Option<String>,
    /// Override the `pmtiles` binary.
    #[arg(long = ARG_PMTILES, value_name = "path")]
    #[serde(default)]
    pub(crate) pmtiles: Option<String>,
    /// Kill any tool that runs longer than this many seconds (0 disables).
    #[arg(long = ARG_TOOL_TIMEOUT, value_name = "secs")]
    #[serde(default)]
    pub(crate) tool_timeout_secs: Option<u64>,
}

impl ConvertArgs {
    pub(crate) fn into_config(self) -> Result<ConvertConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ConvertConfig::try_from(merged)
    }
}

/// Resolved `convert` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConvertConfig {
    /// Dataset to convert.
    pub(crate) upload: Utf8PathBuf,
    /// Bundle name as given; sanitised by the pipeline.
    pub(crate) name: String,
    /// Directory that receives the archive.
    pub(crate) output_dir: Utf8PathBuf,
    /// Pipeline settings.
    pub(crate) driver: DriverConfig,
    /// Per-tool time limit.
    pub(crate) tool_timeout: Option<Duration>,
}

impl ConvertConfig {
    pub(crate) fn validate_sources(&self) -> Result<(), CliError> {
        require_existing_file(&self.upload, ARG_CONVERT_UPLOAD)?;
        match tilebundle_fs::dir_is_dir(&self.output_dir) {
            Ok(false) => Err(CliError::OutputDirectoryNotDirectory {
                path: self.output_dir.clone(),
            }),
            // Missing directories are created when the archive is copied.
            Ok(true) | Err(_) => Ok(()),
        }
    }

    /// Where the archive lands in the output directory.
    pub(crate) fn archive_target(&self) -> Utf8PathBuf {
        self.output_dir
            .join(format!("{}.{ARCHIVE_EXTENSION}", sanitize_name(&self.name)))
    }
}

impl TryFrom<ConvertArgs> for ConvertConfig {
    type Error = CliError;

    fn try_from(args: ConvertArgs) -> Result<Self, Self::Error> {
        let upload = args.upload.ok_or(CliError::MissingArgument {
            field: ARG_CONVERT_UPLOAD,
            env: ENV_CONVERT_UPLOAD,
        })?;
        let name = args
            .name
            .unwrap_or_else(|| upload.file_stem().unwrap_or_default().to_owned());
        let output_dir = args.output_dir.unwrap_or_else(|| Utf8PathBuf::from("."));

        let defaults = ToolPaths::default();
        let tools = ToolPaths {
            ogr2ogr: args.ogr2ogr.unwrap_or(defaults.ogr2ogr),
            ogrinfo: args.ogrinfo.unwrap_or(defaults.ogrinfo),
            tippecanoe: args.tippecanoe.unwrap_or(defaults.tippecanoe),
            pmtiles: args.pmtiles.unwrap_or(defaults.pmtiles),
        };
        let driver = DriverConfig::default().with_tools(tools);
        let driver = match args.work_root {
            Some(root) => driver.with_work_root(root),
            None => driver,
        };

        Ok(Self {
            upload,
            name,
            output_dir,
            driver,
            tool_timeout: tool_timeout(args.tool_timeout_secs),
        })
    }
}

/// JSON report printed after a successful conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct ConvertReport {
    /// Bundle name as given.
    pub(crate) name: String,
    /// Upload path.
    pub(crate) source: Utf8PathBuf,
    /// Route the upload took.
    pub(crate) route: ConversionRoute,
    /// Dataset file routed inside the upload (the member name for containers).
    pub(crate) dataset: String,
    /// Extent, when the probe produced one.
    pub(crate) bounds: Option<BoundingBox>,
    /// Archive copied into the output directory.
    pub(crate) archive: Utf8PathBuf,
    /// Archive size in bytes.
    pub(crate) bytes: u64,
}

pub(crate) fn run_convert_with(
    args: ConvertArgs,
    builder: &dyn RunnerBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = resolve_convert_config(args)?;
    let report = execute_convert(&config, builder)?;
    write_json(writer, &report)
}

fn resolve_convert_config(args: ConvertArgs) -> Result<ConvertConfig, CliError> {
    let config = args.into_config()?;
    config.validate_sources()?;
    Ok(config)
}

pub(crate) fn execute_convert(
    config: &ConvertConfig,
    builder: &dyn RunnerBuilder,
) -> Result<ConvertReport, CliError> {
    let upload = load_upload(&config.upload)?;
    let driver = PipelineDriver::new(builder.build(config.tool_timeout), config.driver.clone());
    let output = driver.run(&upload, &config.name)?;

    let target = config.archive_target();
    let copied = output.persist_archive(&target);
    let scope = output.scope_path().to_path_buf();
    let result = output.close();
    let bytes = copied?;
    info!("wrote {target} ({bytes} bytes)");

    Ok(ConvertReport {
        name: config.name.clone(),
        source: config.upload.clone(),
        route: result.route,
        dataset: dataset_label(&result.dataset, &scope),
        bounds: result.bounds,
        archive: target,
        bytes,
    })
}

fn load_upload(path: &Utf8Path) -> Result<UploadArtifact, CliError> {
    let bytes = tilebundle_fs::read_file(path).map_err(|source| CliError::ReadUpload {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(UploadArtifact::new(path.file_name().unwrap_or_default(), bytes))
}

/// Path of the routed dataset relative to the unpacked or stored upload.
fn dataset_label(dataset: &Utf8Path, scope: &Utf8Path) -> String {
    let relative = dataset.strip_prefix(scope).unwrap_or(dataset);
    let mut components = relative.components();
    // Drop the scope's staging directory (`source/` or `unzipped/`).
    if relative.components().count() > 1 {
        components.next();
    }
    components.as_path().to_string()
}

