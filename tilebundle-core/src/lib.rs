//! Core domain types for the tilebundle pipeline.
//!
//! This crate holds the pure parts of format normalisation: name
//! sanitisation, extension-driven routing, the bounding box and result
//! models, and the [`ToolRunner`] seam through which every external binary
//! is reached. Nothing here touches the filesystem or spawns processes.

#![forbid(unsafe_code)]

mod bounds;
mod result;
mod route;
mod sanitize;
mod tool;
mod upload;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use bounds::BoundingBox;
pub use result::PipelineResult;
pub use route::{
    CONTAINER_EXTENSION, ConversionRoute, ConversionStage, extension_of, is_container,
};
pub use sanitize::{DEFAULT_BUNDLE_NAME, MAX_NAME_LEN, sanitize_name};
pub use tool::{ToolError, ToolInvocation, ToolOutput, ToolRunner};
pub use upload::{DEFAULT_UPLOAD_NAME, UploadArtifact};
