//! Driver configuration: tool binaries and the working-directory root.

use camino::Utf8PathBuf;

/// Names or paths of the external binaries the pipeline invokes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    /// GDAL vector translator.
    pub ogr2ogr: String,
    /// GDAL vector introspection tool.
    pub ogrinfo: String,
    /// Tile database builder.
    pub tippecanoe: String,
    /// PMTiles command-line tool.
    pub pmtiles: String,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            ogr2ogr: "ogr2ogr".to_owned(),
            ogrinfo: "ogrinfo".to_owned(),
            tippecanoe: "tippecanoe".to_owned(),
            pmtiles: "pmtiles".to_owned(),
        }
    }
}

/// Settings shared by every run of a [`crate::PipelineDriver`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverConfig {
    /// Directory under which per-run working directories are created.
    /// Defaults to the system temporary directory.
    pub work_root: Option<Utf8PathBuf>,
    /// External binaries.
    pub tools: ToolPaths,
}

impl DriverConfig {
    /// Create working directories beneath `root`.
    #[must_use]
    pub fn with_work_root(mut self, root: impl Into<Utf8PathBuf>) -> Self {
        self.work_root = Some(root.into());
        self
    }

    /// Use the given tool binaries.
    #[must_use]
    pub fn with_tools(mut self, tools: ToolPaths) -> Self {
        self.tools = tools;
        self
    }
}
