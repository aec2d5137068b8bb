//! Classify command: report the route for a file name without running tools.

use std::io::Write;

use clap::Parser;
use serde::{Deserialize, Serialize};
use tilebundle_core::{ConversionRoute, ConversionStage, extension_of, is_container};

use crate::{CliError, write_json};

/// CLI arguments for the `classify` subcommand.
#[derive(Debug, Clone, Parser, Default)]
#[command(about = "Print the conversion route chosen for a file name")]
pub(crate) struct ClassifyArgs {
    /// File name (or path) to classify. The file need not exist.
    #[arg(value_name = "name")]
    pub(crate) file_name: String,
}

/// JSON report printed by `classify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ClassifyReport {
    pub(crate) file_name: String,
    pub(crate) extension: String,
    /// Containers are routed by the member chosen after unpacking.
    pub(crate) container: bool,
    pub(crate) route: Option<ConversionRoute>,
    pub(crate) stages: Vec<ConversionStage>,
    pub(crate) attempts_bounds: bool,
}

impl ClassifyReport {
    pub(crate) fn for_name(file_name: &str) -> Self {
        let extension = extension_of(file_name);
        let container = is_container(&extension);
        let route = (!container).then(|| ConversionRoute::classify(&extension));
        Self {
            file_name: file_name.to_owned(),
            stages: route.map(|r| r.stages().to_vec()).unwrap_or_default(),
            attempts_bounds: route.is_some_and(ConversionRoute::attempts_bounds),
            extension,
            container,
            route,
        }
    }
}

pub(crate) fn run_classify(args: &ClassifyArgs, writer: &mut dyn Write) -> Result<(), CliError> {
    write_json(writer, &ClassifyReport::for_name(&args.file_name))
}
