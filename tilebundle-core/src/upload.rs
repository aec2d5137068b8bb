//! The raw file handed to the pipeline.

use crate::route::{extension_of, is_container};
use crate::sanitize::sanitize_name;

/// Name stored for uploads that arrive without a file name.
pub const DEFAULT_UPLOAD_NAME: &str = "upload";

/// A user-supplied file awaiting normalisation.
///
/// # Examples
///
/// ```
/// use tilebundle_core::UploadArtifact;
///
/// let upload = UploadArtifact::new("City Parks.GeoJSON", b"{}".to_vec())
///     .with_content_type("application/geo+json");
/// assert_eq!(upload.stored_name(), "City-Parks.GeoJSON");
/// assert_eq!(upload.extension(), "geojson");
/// assert!(!upload.is_container());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadArtifact {
    file_name: String,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

impl UploadArtifact {
    /// Wrap the uploaded bytes together with the client-supplied file name.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes,
        }
    }

    /// Attach the declared content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// File name as supplied by the client.
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Declared content type, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Uploaded content.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Sanitised file name used when the upload is written to disk.
    #[must_use]
    pub fn stored_name(&self) -> String {
        if self.file_name.is_empty() {
            DEFAULT_UPLOAD_NAME.to_owned()
        } else {
            sanitize_name(&self.file_name)
        }
    }

    /// Lower-cased extension of the stored name.
    #[must_use]
    pub fn extension(&self) -> String {
        extension_of(&self.stored_name())
    }

    /// Whether the upload must be unpacked before routing.
    #[must_use]
    pub fn is_container(&self) -> bool {
        is_container(&self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn missing_names_fall_back_to_upload() {
        let upload = UploadArtifact::new("", Vec::new());
        assert_eq!(upload.stored_name(), DEFAULT_UPLOAD_NAME);
        assert_eq!(upload.extension(), "");
    }

    #[rstest]
    #[case("city.shp.zip", true)]
    #[case("CITY.ZIP", true)]
    #[case("zip", false)]
    #[case("parks.geojson", false)]
    fn detects_containers(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(UploadArtifact::new(name, Vec::new()).is_container(), expected);
    }

    #[rstest]
    fn content_type_is_optional() {
        let upload = UploadArtifact::new("a.pmtiles", vec![1, 2, 3]);
        assert_eq!(upload.content_type(), None);
        assert_eq!(upload.bytes(), &[1, 2, 3]);
    }
}
