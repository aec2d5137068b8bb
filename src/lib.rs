//! Facade crate for the tilebundle normalisation pipeline.
//!
//! This crate re-exports the domain types from `tilebundle-core` and the
//! driver, runner and error types from `tilebundle-pipeline`, so callers can
//! depend on a single crate.
//!
//! # Examples
//!
//! ```
//! use tilebundle::{ConversionRoute, UploadArtifact};
//!
//! let upload = UploadArtifact::new("harbour.mbtiles", Vec::new());
//! let route = ConversionRoute::classify(&upload.extension());
//! assert_eq!(route, ConversionRoute::FromTileDatabase);
//! assert_eq!(route.stages().len(), 1);
//! ```

#![forbid(unsafe_code)]

pub use tilebundle_core::{
    BoundingBox, ConversionRoute, ConversionStage, PipelineResult, ToolError, ToolInvocation,
    ToolOutput, ToolRunner, UploadArtifact, sanitize_name,
};

pub use tilebundle_pipeline::{
    DriverConfig, FailureClass, PipelineDriver, PipelineError, PipelineOutput, ProcessToolRunner,
    ToolPaths, WorkingScope,
};

#[cfg(feature = "test-support")]
pub use tilebundle_core::test_support;
