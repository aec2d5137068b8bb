//! Error types produced by the normalisation pipeline.

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;
use tilebundle_core::{ConversionStage, ToolError};

/// Who is at fault for a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// The upload is malformed or unsupported; report it back to the client.
    Input,
    /// The host environment failed; the same upload may succeed later.
    Internal,
}

/// Errors that abort a pipeline run.
///
/// Bounding-box probing never appears here: a failed probe only leaves the
/// bounds empty.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PipelineError {
    /// The per-run working directory could not be created.
    #[error("failed to create working directory under {root:?}: {source}")]
    CreateScope {
        /// Parent directory of the scope.
        root: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Writing the uploaded bytes into the working directory failed.
    #[error("failed to store upload at {path:?}: {source}")]
    PersistUpload {
        /// Destination of the upload.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The stored container could not be reopened.
    #[error("failed to open container {path:?}: {source}")]
    OpenContainer {
        /// Container path.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The container is not a readable zip archive.
    #[error("container {path:?} could not be read: {source}")]
    UnreadableContainer {
        /// Container path.
        path: Utf8PathBuf,
        /// Decoder error.
        #[source]
        source: zip::result::ZipError,
    },
    /// A container entry would be written outside the extraction directory.
    #[error("container entry {entry:?} escapes the extraction directory")]
    UnsafeContainerEntry {
        /// Entry name as stored in the container.
        entry: String,
    },
    /// Writing an extracted entry to disk failed.
    #[error("failed to extract {entry:?} to {path:?}: {source}")]
    ExtractEntry {
        /// Entry name as stored in the container.
        entry: String,
        /// Destination on disk.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// An entry collides with another entry, or with the extraction
    /// directory itself, so it cannot be written.
    #[error("container entry {entry:?} conflicts with existing path {path:?}: {source}")]
    ConflictingContainerEntry {
        /// Entry name as stored in the container.
        entry: String,
        /// Destination on disk.
        path: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Walking the extracted files failed.
    #[error("failed to scan extracted files in {path:?}: {source}")]
    ScanContainer {
        /// Extraction directory.
        path: Utf8PathBuf,
        /// Traversal error.
        #[source]
        source: walkdir::Error,
    },
    /// The container held no regular files.
    #[error("zip was empty or contained no files")]
    EmptyContainer,
    /// A conversion tool exited unsuccessfully.
    #[error(
        "{stage} stage failed: {command:?} exited with {}\nSTDOUT:\n{stdout}\nSTDERR:\n{stderr}",
        describe_status(.status)
    )]
    StageFailed {
        /// Stage that failed.
        stage: ConversionStage,
        /// Program and arguments that were run.
        command: Vec<String>,
        /// Exit code, if the process exited normally.
        status: Option<i32>,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },
    /// A conversion tool could not be started or did not finish.
    #[error("{stage} stage could not run: {source}")]
    ToolInvocation {
        /// Stage being attempted.
        stage: ConversionStage,
        /// Runner error.
        #[source]
        source: ToolError,
    },
    /// Copying the finished archive out of the working directory failed.
    #[error("failed to copy archive {archive:?} to {target:?}: {source}")]
    CopyArchive {
        /// Archive inside the working directory.
        archive: Utf8PathBuf,
        /// Requested destination.
        target: Utf8PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

impl PipelineError {
    /// Classify the failure for the caller.
    ///
    /// Conversion tools rejecting their input almost always means the upload
    /// is bad, so non-zero exits count as input errors.
    #[must_use]
    pub const fn class(&self) -> FailureClass {
        match self {
            Self::UnreadableContainer { .. }
            | Self::UnsafeContainerEntry { .. }
            | Self::ConflictingContainerEntry { .. }
            | Self::EmptyContainer
            | Self::StageFailed { .. } => FailureClass::Input,
            Self::CreateScope { .. }
            | Self::PersistUpload { .. }
            | Self::OpenContainer { .. }
            | Self::ExtractEntry { .. }
            | Self::ScanContainer { .. }
            | Self::ToolInvocation { .. }
            | Self::CopyArchive { .. } => FailureClass::Internal,
        }
    }

    /// Whether the failure should be reported as a client error.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(self.class(), FailureClass::Input)
    }
}

fn describe_status(status: &Option<i32>) -> String {
    status.map_or_else(
        || "no exit code (terminated by signal)".to_owned(),
        |code| format!("status {code}"),
    )
}
