//! Exclusively-owned temporary directory for a single pipeline run.

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use tempfile::{Builder, TempDir};

use crate::PipelineError;

const SCOPE_PREFIX: &str = "bundle-";

/// Temporary directory tied to one run.
///
/// The directory is removed exactly once: by [`WorkingScope::close`], which
/// logs removal failures, or by `Drop` on every other exit path. Removal
/// failures never surface as errors.
#[derive(Debug)]
pub struct WorkingScope {
    dir: TempDir,
    path: Utf8PathBuf,
}

impl WorkingScope {
    /// Create a fresh scope beneath `root`, or the system temporary directory.
    pub fn create(root: Option<&Utf8Path>) -> Result<Self, PipelineError> {
        let mut builder = Builder::new();
        builder.prefix(SCOPE_PREFIX);
        let created = match root {
            Some(parent) => tilebundle_fs::ensure_dir(parent)
                .and_then(|()| builder.tempdir_in(parent.as_std_path())),
            None => builder.tempdir(),
        };
        let scope_root = || {
            root.map_or_else(
                || Utf8PathBuf::from("<system temp>"),
                Utf8Path::to_path_buf,
            )
        };
        let dir = created.map_err(|source| PipelineError::CreateScope {
            root: scope_root(),
            source,
        })?;
        let path = tilebundle_fs::utf8_path(dir.path().to_path_buf()).map_err(|source| {
            PipelineError::CreateScope {
                root: scope_root(),
                source,
            }
        })?;
        debug!("created working scope {path}");
        Ok(Self { dir, path })
    }

    /// Root of the scope.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Path of `relative` inside the scope.
    #[must_use]
    pub fn join(&self, relative: impl AsRef<Utf8Path>) -> Utf8PathBuf {
        self.path.join(relative)
    }

    /// Remove the scope and everything beneath it.
    pub fn close(self) {
        let Self { dir, path } = self;
        match dir.close() {
            Ok(()) => debug!("removed working scope {path}"),
            Err(err) => warn!("failed to remove working scope {path}: {err}"),
        }
    }
}
