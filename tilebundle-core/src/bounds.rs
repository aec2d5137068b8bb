//! Geographic extent reported for a processed bundle.

use serde::{Deserialize, Serialize};

/// Extent of a dataset as `[min_lon, min_lat, max_lon, max_lat]` degrees.
///
/// Values are kept exactly as reported by the introspection tool. No ordering
/// is enforced: datasets crossing the antimeridian, or with odd source
/// metadata, may report `min_lon > max_lon`.
///
/// The box serialises as a plain four-element array so it can be handed to
/// catalogue writers and map clients without reshaping.
///
/// # Examples
///
/// ```
/// use tilebundle_core::BoundingBox;
///
/// let bbox = BoundingBox::new(-0.5, 51.3, 0.3, 51.7);
/// let json = serde_json::to_string(&bbox)?;
/// assert_eq!(json, "[-0.5,51.3,0.3,51.7]");
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    /// Western edge (longitude).
    pub min_lon: f64,
    /// Southern edge (latitude).
    pub min_lat: f64,
    /// Eastern edge (longitude).
    pub max_lon: f64,
    /// Northern edge (latitude).
    pub max_lat: f64,
}

impl BoundingBox {
    /// Construct a box from its four edges.
    #[must_use]
    pub const fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// The edges in `[min_lon, min_lat, max_lon, max_lat]` order.
    #[must_use]
    pub const fn to_array(self) -> [f64; 4] {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from([min_lon, min_lat, max_lon, max_lat]: [f64; 4]) -> Self {
        Self::new(min_lon, min_lat, max_lon, max_lat)
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(bbox: BoundingBox) -> Self {
        bbox.to_array()
    }
}
