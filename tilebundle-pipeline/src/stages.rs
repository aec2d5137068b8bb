//! Conversion stages and the commands that implement them.
//!
//! Each stage is one synchronous tool invocation reading the previous
//! stage's output from the working scope. A stage only starts once its
//! predecessor exited with status zero; the first failure aborts the route.

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use tilebundle_core::{ConversionRoute, ConversionStage, ToolInvocation, ToolRunner};

use crate::{PipelineError, ToolPaths};

/// Interchange file written by the generic conversion stage.
pub const INTERCHANGE_FILE: &str = "converted.geojson";

/// Tile database written by the tiling stage.
pub const TILE_DATABASE_FILE: &str = "out.mbtiles";

/// Extension of the final archive.
pub const ARCHIVE_EXTENSION: &str = "pmtiles";

/// Coordinate reference system every interchange file is projected into.
pub const TARGET_CRS: &str = "EPSG:4326";

/// Where `stage` writes its output inside `scope_dir`.
///
/// `layer` is the sanitised bundle name and names the final archive.
#[must_use]
pub fn stage_output(stage: ConversionStage, scope_dir: &Utf8Path, layer: &str) -> Utf8PathBuf {
    match stage {
        ConversionStage::GenericToInterchange => scope_dir.join(INTERCHANGE_FILE),
        ConversionStage::InterchangeToTileDatabase => scope_dir.join(TILE_DATABASE_FILE),
        ConversionStage::TileDatabaseToArchive => {
            scope_dir.join(format!("{layer}.{ARCHIVE_EXTENSION}"))
        }
    }
}

/// Command that converts `input` into `output` for `stage`.
///
/// # Examples
///
/// ```
/// use camino::Utf8Path;
/// use tilebundle_core::ConversionStage;
/// use tilebundle_pipeline::ToolPaths;
/// use tilebundle_pipeline::stages::stage_invocation;
///
/// let invocation = stage_invocation(
///     &ToolPaths::default(),
///     ConversionStage::TileDatabaseToArchive,
///     Utf8Path::new("out.mbtiles"),
///     Utf8Path::new("harbour.pmtiles"),
///     "harbour",
/// );
/// assert_eq!(invocation.to_string(), "pmtiles convert out.mbtiles harbour.pmtiles");
/// ```
#[must_use]
pub fn stage_invocation(
    tools: &ToolPaths,
    stage: ConversionStage,
    input: &Utf8Path,
    output: &Utf8Path,
    layer: &str,
) -> ToolInvocation {
    match stage {
        ConversionStage::GenericToInterchange => ToolInvocation::new(tools.ogr2ogr.as_str())
            .args(["-f", "GeoJSON", "-t_srs", TARGET_CRS])
            .arg(output.as_str())
            .arg(input.as_str()),
        ConversionStage::InterchangeToTileDatabase => {
            ToolInvocation::new(tools.tippecanoe.as_str())
                .arg("-o")
                .arg(output.as_str())
                .arg("-l")
                .arg(layer)
                .args([
                    "-zg",
                    "--drop-densest-as-needed",
                    "--extend-zooms-if-still-dropping",
                ])
                .arg(input.as_str())
        }
        ConversionStage::TileDatabaseToArchive => ToolInvocation::new(tools.pmtiles.as_str())
            .arg("convert")
            .arg(input.as_str())
            .arg(output.as_str()),
    }
}

/// Runs the stages of a route through a [`ToolRunner`].
#[derive(Debug)]
pub struct StageRunner<'a, R: ?Sized> {
    runner: &'a R,
    tools: &'a ToolPaths,
}

impl<'a, R> StageRunner<'a, R>
where
    R: ToolRunner + ?Sized,
{
    /// Borrow a runner and the tool binaries it should invoke.
    pub const fn new(runner: &'a R, tools: &'a ToolPaths) -> Self {
        Self { runner, tools }
    }

    /// Run a single stage.
    ///
    /// # Errors
    ///
    /// [`PipelineError::StageFailed`] when the tool exits unsuccessfully and
    /// [`PipelineError::ToolInvocation`] when it cannot run at all.
    pub fn run_stage(
        &self,
        stage: ConversionStage,
        input: &Utf8Path,
        output: &Utf8Path,
        layer: &str,
    ) -> Result<(), PipelineError> {
        let invocation = stage_invocation(self.tools, stage, input, output, layer);
        debug!("{stage}: {invocation}");
        let result = self
            .runner
            .run(&invocation)
            .map_err(|source| PipelineError::ToolInvocation { stage, source })?;
        if result.success() {
            return Ok(());
        }
        Err(PipelineError::StageFailed {
            stage,
            command: invocation.command_line(),
            status: result.status,
            stdout: result.stdout,
            stderr: result.stderr,
        })
    }

    /// Run every stage `route` schedules, starting from `source`.
    ///
    /// Returns the path of the final archive. For
    /// [`ConversionRoute::PassThrough`] that is `source` itself and no tool
    /// runs.
    ///
    /// # Errors
    ///
    /// The first failing stage's error; later stages do not run.
    pub fn run_route(
        &self,
        route: ConversionRoute,
        source: &Utf8Path,
        scope_dir: &Utf8Path,
        layer: &str,
    ) -> Result<Utf8PathBuf, PipelineError> {
        let mut current = source.to_path_buf();
        for &stage in route.stages() {
            let output = stage_output(stage, scope_dir, layer);
            self.run_stage(stage, &current, &output, layer)?;
            current = output;
        }
        Ok(current)
    }
}
