//! Format-normalisation pipeline for uploaded geospatial datasets.
//!
//! Responsibilities:
//! - Persist an upload into a private working directory.
//! - Unpack containers and pick the member that represents them.
//! - Probe the dataset extent on a best-effort basis.
//! - Drive the external conversion tools until a PMTiles archive exists.
//!
//! Boundaries:
//! - Routing rules and domain types live in `tilebundle-core`.
//! - Storage of the finished archive and catalogue records belong to the
//!   caller.
//!
//! Invariants:
//! - Every run owns its working directory; concurrent runs share nothing.
//! - The working directory is removed on every exit path.
//! - Extent probing never fails a run.
#![forbid(unsafe_code)]

mod config;
mod driver;
mod error;
pub mod extent;
mod process;
mod scope;
pub mod stages;
pub mod unpack;

pub use config::{DriverConfig, ToolPaths};
pub use driver::{PipelineDriver, PipelineOutput, SOURCE_DIR, UNPACK_DIR};
pub use error::{FailureClass, PipelineError};
pub use process::ProcessToolRunner;
pub use scope::WorkingScope;
