//! Probe command: print a dataset's bounding box.

use std::io::Write;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use tilebundle_core::BoundingBox;
use tilebundle_pipeline::ToolPaths;
use tilebundle_pipeline::extent::probe_extent;

use crate::{
    ARG_OGRINFO, ARG_PROBE_DATASET, ARG_TOOL_TIMEOUT, CliError, ENV_PROBE_DATASET, RunnerBuilder,
    require_existing_file, tool_timeout, write_json,
};

/// CLI arguments for the `probe` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Ask ogrinfo for the extent of a dataset and print it as \
                 [minLon, minLat, maxLon, maxLat], or null when the extent \
                 cannot be determined.",
    about = "Print the bounding box of a dataset"
)]
#[ortho_config(prefix = "TILEBUNDLE")]
pub(crate) struct ProbeArgs {
    /// Path to the dataset to probe.
    #[arg(value_name = "path")]
    #[serde(default)]
    pub(crate) dataset: Option<Utf8PathBuf>,
    /// Override the `ogrinfo` binary.
    #[arg(long = ARG_OGRINFO, value_name = "path")]
    #[serde(default)]
    pub(crate) ogrinfo: Option<String>,
    /// Kill the probe after this many seconds (0 disables).
    #[arg(long = ARG_TOOL_TIMEOUT, value_name = "secs")]
    #[serde(default)]
    pub(crate) tool_timeout_secs: Option<u64>,
}

/// Resolved `probe` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ProbeConfig {
    pub(crate) dataset: Utf8PathBuf,
    pub(crate) tools: ToolPaths,
    pub(crate) tool_timeout: Option<Duration>,
}

impl TryFrom<ProbeArgs> for ProbeConfig {
    type Error = CliError;

    fn try_from(args: ProbeArgs) -> Result<Self, Self::Error> {
        let dataset = args.dataset.ok_or(CliError::MissingArgument {
            field: ARG_PROBE_DATASET,
            env: ENV_PROBE_DATASET,
        })?;
        let mut tools = ToolPaths::default();
        if let Some(ogrinfo) = args.ogrinfo {
            tools.ogrinfo = ogrinfo;
        }
        Ok(Self {
            dataset,
            tools,
            tool_timeout: tool_timeout(args.tool_timeout_secs),
        })
    }
}

pub(crate) fn run_probe_with(
    args: ProbeArgs,
    builder: &dyn RunnerBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let merged = args.load_and_merge().map_err(CliError::Configuration)?;
    let config = ProbeConfig::try_from(merged)?;
    require_existing_file(&config.dataset, ARG_PROBE_DATASET)?;
    let bounds = execute_probe(&config, builder);
    write_json(writer, &bounds)
}

pub(crate) fn execute_probe(
    config: &ProbeConfig,
    builder: &dyn RunnerBuilder,
) -> Option<BoundingBox> {
    let runner = builder.build(config.tool_timeout);
    probe_extent(&*runner, &config.tools, &config.dataset)
}
