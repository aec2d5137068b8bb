//! Error types emitted by the tilebundle CLI.
//!
//! Keep this error type reasonably small, as every command helper returns
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use camino::Utf8PathBuf;
use thiserror::Error;
use tilebundle_pipeline::PipelineError;

/// Exit status for failures caused by the input or the invocation.
pub const EXIT_INPUT: i32 = 2;

/// Exit status for every other failure.
pub const EXIT_INTERNAL: i32 = 1;

/// Errors emitted by the tilebundle CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Flag name.
        field: &'static str,
        /// Environment variable that can supply the value.
        env: &'static str,
    },
    /// A referenced input path does not exist on disk.
    #[error("{field} path {path:?} does not exist")]
    MissingSourceFile {
        /// Flag name.
        field: &'static str,
        /// Path that was given.
        path: Utf8PathBuf,
    },
    /// A referenced input path exists but is not a file.
    #[error("{field} path {path:?} exists but is not a file")]
    SourcePathNotFile {
        /// Flag name.
        field: &'static str,
        /// Path that was given.
        path: Utf8PathBuf,
    },
    /// A referenced input path could not be inspected due to an IO error.
    #[error("failed to inspect {field} path {path:?}: {source}")]
    InspectSourcePath {
        /// Flag name.
        field: &'static str,
        /// Path that was given.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The output directory exists but is not a directory.
    #[error("output directory {path:?} is not a directory")]
    OutputDirectoryNotDirectory {
        /// Path that was given.
        path: Utf8PathBuf,
    },
    /// Reading the upload into memory failed.
    #[error("failed to read upload {path:?}: {source}")]
    ReadUpload {
        /// Upload path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The pipeline rejected the upload or could not run.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    /// Serialising a command report failed.
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing a command report failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}

impl CliError {
    /// Whether the failure lies with the invocation or the supplied data.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        match self {
            Self::ArgumentParsing(_)
            | Self::MissingArgument { .. }
            | Self::MissingSourceFile { .. }
            | Self::SourcePathNotFile { .. }
            | Self::OutputDirectoryNotDirectory { .. } => true,
            Self::Pipeline(err) => err.is_input_error(),
            Self::Configuration(_)
            | Self::InspectSourcePath { .. }
            | Self::ReadUpload { .. }
            | Self::SerialiseOutput(_)
            | Self::WriteOutput(_) => false,
        }
    }

    /// Process exit status for this failure.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        if self.is_input_error() {
            EXIT_INPUT
        } else {
            EXIT_INTERNAL
        }
    }
}
