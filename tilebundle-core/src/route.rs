//! Extension-driven classification of uploads into conversion routes.
//!
//! Routing never inspects file content. A mislabelled file is routed by its
//! label, and the downstream tools report the mismatch.

use std::fmt;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

/// Extension of the container format that is unpacked before routing.
pub const CONTAINER_EXTENSION: &str = "zip";

/// Lower-cased extension of `file_name`, without the leading dot.
///
/// Returns an empty string when the name has no extension. Dot-files such as
/// `.profile` have no extension.
///
/// # Examples
///
/// ```
/// use tilebundle_core::extension_of;
///
/// assert_eq!(extension_of("Parks.GeoJSON"), "geojson");
/// assert_eq!(extension_of("city.shp.zip"), "zip");
/// assert_eq!(extension_of("README"), "");
/// ```
#[must_use]
pub fn extension_of(file_name: &str) -> String {
    Utf8Path::new(file_name)
        .extension()
        .map(str::to_ascii_lowercase)
        .unwrap_or_default()
}

/// Whether `extension` names the container format.
#[must_use]
pub fn is_container(extension: &str) -> bool {
    extension.eq_ignore_ascii_case(CONTAINER_EXTENSION)
}

/// External transformation applied to a dataset on its way to the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionStage {
    /// Reproject an arbitrary vector dataset into GeoJSON (EPSG:4326).
    GenericToInterchange,
    /// Build an MBTiles tile database from GeoJSON.
    InterchangeToTileDatabase,
    /// Repackage an MBTiles database as a PMTiles archive.
    TileDatabaseToArchive,
}

impl ConversionStage {
    /// Short, stable label used in logs and error messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::GenericToInterchange => "generic-to-interchange",
            Self::InterchangeToTileDatabase => "interchange-to-tile-database",
            Self::TileDatabaseToArchive => "tile-database-to-archive",
        }
    }
}

impl fmt::Display for ConversionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

const NO_STAGES: &[ConversionStage] = &[];
const TILE_DATABASE_STAGES: &[ConversionStage] = &[ConversionStage::TileDatabaseToArchive];
const INTERCHANGE_STAGES: &[ConversionStage] = &[
    ConversionStage::InterchangeToTileDatabase,
    ConversionStage::TileDatabaseToArchive,
];
const GENERIC_STAGES: &[ConversionStage] = &[
    ConversionStage::GenericToInterchange,
    ConversionStage::InterchangeToTileDatabase,
    ConversionStage::TileDatabaseToArchive,
];

/// Sequence of conversion stages selected for an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionRoute {
    /// Already a PMTiles archive; returned unchanged.
    PassThrough,
    /// MBTiles input; converted straight to the archive format.
    FromTileDatabase,
    /// GeoJSON input; tiled, then archived.
    FromInterchange,
    /// Anything else OGR can read; converted to GeoJSON first.
    FromGenericOgr,
}

impl ConversionRoute {
    /// Map a file extension (case-insensitive, without the dot) to a route.
    ///
    /// # Examples
    ///
    /// ```
    /// use tilebundle_core::ConversionRoute;
    ///
    /// assert_eq!(ConversionRoute::classify("PMTILES"), ConversionRoute::PassThrough);
    /// assert_eq!(ConversionRoute::classify("json"), ConversionRoute::FromInterchange);
    /// assert_eq!(ConversionRoute::classify("gpkg"), ConversionRoute::FromGenericOgr);
    /// ```
    #[must_use]
    pub fn classify(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "pmtiles" => Self::PassThrough,
            "mbtiles" => Self::FromTileDatabase,
            "geojson" | "json" => Self::FromInterchange,
            _ => Self::FromGenericOgr,
        }
    }

    /// Route for an upload, taking the selected container member into account.
    ///
    /// Container uploads are routed by the extension of `member`; when no
    /// member is supplied, or the upload is not a container, the upload's own
    /// extension decides.
    #[must_use]
    pub fn resolve(upload_extension: &str, member: Option<&Utf8Path>) -> Self {
        match member {
            Some(path) if is_container(upload_extension) => Self::for_path(path),
            _ => Self::classify(upload_extension),
        }
    }

    /// Route for a dataset on disk, judged by its file name.
    #[must_use]
    pub fn for_path(path: &Utf8Path) -> Self {
        Self::classify(path.file_name().map(extension_of).as_deref().unwrap_or(""))
    }

    /// Stages to run, in execution order.
    #[must_use]
    pub const fn stages(self) -> &'static [ConversionStage] {
        match self {
            Self::PassThrough => NO_STAGES,
            Self::FromTileDatabase => TILE_DATABASE_STAGES,
            Self::FromInterchange => INTERCHANGE_STAGES,
            Self::FromGenericOgr => GENERIC_STAGES,
        }
    }

    /// Whether the route probes the dataset for a bounding box.
    ///
    /// Tile inputs are already tiled and never probed.
    #[must_use]
    pub const fn attempts_bounds(self) -> bool {
        matches!(self, Self::FromInterchange | Self::FromGenericOgr)
    }

    /// Stable identifier, matching the serialised form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PassThrough => "pass_through",
            Self::FromTileDatabase => "from_tile_database",
            Self::FromInterchange => "from_interchange",
            Self::FromGenericOgr => "from_generic_ogr",
        }
    }
}

impl fmt::Display for ConversionRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
