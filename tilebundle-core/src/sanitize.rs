//! Filesystem- and key-safe tokens derived from user-supplied text.

/// Token returned when nothing of the input survives sanitisation.
pub const DEFAULT_BUNDLE_NAME: &str = "bundle";

/// Maximum number of characters in a sanitised token.
pub const MAX_NAME_LEN: usize = 120;

/// Reduce arbitrary text to a token safe for file names and storage keys.
///
/// Surrounding whitespace is trimmed, every internal run of whitespace
/// becomes a single `-`, and anything outside `[A-Za-z0-9._-]` is dropped.
/// The result is truncated to [`MAX_NAME_LEN`] characters and falls back to
/// [`DEFAULT_BUNDLE_NAME`] when empty, so the function never fails.
///
/// # Examples
///
/// ```
/// use tilebundle_core::sanitize_name;
///
/// assert_eq!(sanitize_name("  City Parks 2024 "), "City-Parks-2024");
/// assert_eq!(sanitize_name("rivers/lakes?.geojson"), "riverslakes.geojson");
/// assert_eq!(sanitize_name("€€€"), "bundle");
/// ```
#[must_use]
pub fn sanitize_name(input: &str) -> String {
    let mut token = String::with_capacity(input.len().min(MAX_NAME_LEN));
    for (index, word) in input.split_whitespace().enumerate() {
        if index > 0 {
            token.push('-');
        }
        token.extend(word.chars().filter(is_safe_char));
    }

    let truncated: String = token.chars().take(MAX_NAME_LEN).collect();
    if truncated.is_empty() {
        DEFAULT_BUNDLE_NAME.to_owned()
    } else {
        truncated
    }
}

fn is_safe_char(ch: &char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-')
}
