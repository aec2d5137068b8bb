//! Orchestrates one upload from raw bytes to a tile archive.

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use tilebundle_core::{
    BoundingBox, ConversionRoute, PipelineResult, ToolRunner, UploadArtifact, sanitize_name,
};

use crate::extent::probe_extent;
use crate::stages::StageRunner;
use crate::unpack::unpack_container;
use crate::{DriverConfig, PipelineError, WorkingScope};

/// Directory inside the scope that receives the raw upload.
pub const SOURCE_DIR: &str = "source";

/// Directory inside the scope that containers are extracted into.
pub const UNPACK_DIR: &str = "unzipped";

/// Runs the normalisation pipeline with an injected [`ToolRunner`].
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8Path;
/// use tilebundle_core::UploadArtifact;
/// use tilebundle_pipeline::{DriverConfig, PipelineDriver, ProcessToolRunner};
///
/// # fn main() -> Result<(), tilebundle_pipeline::PipelineError> {
/// let driver = PipelineDriver::new(ProcessToolRunner::new(), DriverConfig::default());
/// let geojson = br#"{"type":"FeatureCollection","features":[]}"#;
/// let upload = UploadArtifact::new("parks.geojson", geojson.to_vec());
/// let output = driver.run(&upload, "City Parks")?;
/// output.persist_archive(Utf8Path::new("bundles/city-parks.pmtiles"))?;
/// let result = output.close();
/// println!("{} via {}", result.archive, result.route);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct PipelineDriver<R> {
    runner: R,
    config: DriverConfig,
}

impl<R: ToolRunner> PipelineDriver<R> {
    /// Build a driver around `runner`.
    pub const fn new(runner: R, config: DriverConfig) -> Self {
        Self { runner, config }
    }

    /// Settings the driver was built with.
    #[must_use]
    pub const fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// The injected tool runner.
    #[must_use]
    pub const fn runner(&self) -> &R {
        &self.runner
    }

    /// Normalise `upload` into a tile archive named after `bundle_name`.
    ///
    /// The returned [`PipelineOutput`] owns the working directory holding the
    /// archive; copy the archive out before closing it. On error the working
    /// directory has already been removed.
    ///
    /// # Errors
    ///
    /// See [`PipelineError`]; [`PipelineError::class`] says whether the upload
    /// or the environment is at fault.
    pub fn run(
        &self,
        upload: &UploadArtifact,
        bundle_name: &str,
    ) -> Result<PipelineOutput, PipelineError> {
        let scope = WorkingScope::create(self.config.work_root.as_deref())?;
        info!(
            "normalising {:?} as bundle {bundle_name:?} in {}",
            upload.file_name(),
            scope.path()
        );
        match self.run_in_scope(&scope, upload, bundle_name) {
            Ok(result) => {
                info!(
                    "bundle {bundle_name:?} ready at {} via {}",
                    result.archive, result.route
                );
                Ok(PipelineOutput { scope, result })
            }
            Err(err) => {
                info!("bundle {bundle_name:?} failed: {err}");
                scope.close();
                Err(err)
            }
        }
    }

    /// Probe `dataset` for its extent without converting it.
    #[must_use]
    pub fn probe(&self, dataset: &Utf8Path) -> Option<BoundingBox> {
        probe_extent(&self.runner, &self.config.tools, dataset)
    }

    fn run_in_scope(
        &self,
        scope: &WorkingScope,
        upload: &UploadArtifact,
        bundle_name: &str,
    ) -> Result<PipelineResult, PipelineError> {
        let stored = persist_upload(scope, upload)?;

        let dataset = if upload.is_container() {
            unpack_container(&stored, &scope.join(UNPACK_DIR))?.selected
        } else {
            stored
        };
        let route = ConversionRoute::resolve(
            &upload.extension(),
            upload.is_container().then_some(dataset.as_path()),
        );
        debug!("routing {dataset} via {route}");

        let bounds = if route.attempts_bounds() {
            self.probe(&dataset)
        } else {
            None
        };

        let layer = sanitize_name(bundle_name);
        let archive = StageRunner::new(&self.runner, &self.config.tools).run_route(
            route,
            &dataset,
            scope.path(),
            &layer,
        )?;

        Ok(PipelineResult {
            archive,
            route,
            dataset,
            bounds,
        })
    }
}

fn persist_upload(
    scope: &WorkingScope,
    upload: &UploadArtifact,
) -> Result<Utf8PathBuf, PipelineError> {
    let path = scope.join(SOURCE_DIR).join(upload.stored_name());
    tilebundle_fs::write_file(&path, upload.bytes()).map_err(|source| {
        PipelineError::PersistUpload {
            path: path.clone(),
            source,
        }
    })?;
    debug!("stored {} bytes at {path}", upload.bytes().len());
    Ok(path)
}

/// A finished run whose working directory is still alive.
///
/// Dropping the value removes the directory and the archive inside it.
#[derive(Debug)]
#[must_use = "the archive is deleted when the output is dropped"]
pub struct PipelineOutput {
    scope: WorkingScope,
    result: PipelineResult,
}

impl PipelineOutput {
    /// Archive path, route, dataset and bounds.
    pub const fn result(&self) -> &PipelineResult {
        &self.result
    }

    /// Path of the archive inside the working directory.
    pub fn archive(&self) -> &Utf8Path {
        &self.result.archive
    }

    /// Root of the working directory.
    pub fn scope_path(&self) -> &Utf8Path {
        self.scope.path()
    }

    /// Copy the archive to `target`, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// [`PipelineError::CopyArchive`] when reading or writing fails.
    pub fn persist_archive(&self, target: &Utf8Path) -> Result<u64, PipelineError> {
        let archive = self.archive();
        let copied = tilebundle_fs::copy_file(archive, target).map_err(|source| {
            PipelineError::CopyArchive {
                archive: archive.to_path_buf(),
                target: target.to_path_buf(),
                source,
            }
        })?;
        info!("copied {copied} bytes from {archive} to {target}");
        Ok(copied)
    }

    /// Remove the working directory and return the result.
    ///
    /// The returned archive path no longer exists once this returns.
    pub fn close(self) -> PipelineResult {
        let Self { scope, result } = self;
        scope.close();
        result
    }
}
