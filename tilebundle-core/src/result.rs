//! Output handed from the pipeline to its caller.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::{BoundingBox, ConversionRoute};

/// Final archive plus best-effort metadata for one pipeline run.
///
/// The caller owns storage keys and catalogue identifiers; this value only
/// says where the archive is and what was learned while producing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Path to the PMTiles archive.
    pub archive: Utf8PathBuf,
    /// Route the upload took.
    pub route: ConversionRoute,
    /// Dataset file that was routed and probed (a container member when the
    /// upload was unpacked).
    pub dataset: Utf8PathBuf,
    /// Extent of the dataset, when it could be determined.
    pub bounds: Option<BoundingBox>,
}
