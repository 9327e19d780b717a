//! The "already minified" marker.
//!
//! Raster outputs carry [`MARKER`] in their descriptive metadata slot. Finding
//! it on input means the bytes came out of this tool and are left alone. SVG
//! has no such slot and is always re-optimized.

use super::codec::EncodeOptions;
use super::metadata::ImageMetadata;

/// Sentinel written to the ImageDescription tag (or GIF comment)
pub const MARKER: &str = "__MINIFIED__";

pub fn has_marker(metadata: &ImageMetadata) -> bool {
    metadata
        .description
        .as_deref()
        .is_some_and(|text| text.trim_matches(|c: char| c == '\0' || c.is_whitespace()) == MARKER)
}

/// Asks the codec to embed the marker in its output.
pub fn with_marker(options: EncodeOptions) -> EncodeOptions {
    EncodeOptions {
        marker: Some(MARKER),
        ..options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FormatOptions, JpegOptions};

    fn described(text: &str) -> ImageMetadata {
        ImageMetadata {
            description: Some(text.to_string()),
            ..ImageMetadata::default()
        }
    }

    #[test]
    fn exact_sentinel_is_a_marker() {
        assert!(has_marker(&described("__MINIFIED__")));
        assert!(has_marker(&described("__MINIFIED__\0")));
    }

    #[test]
    fn other_descriptions_are_not() {
        assert!(!has_marker(&ImageMetadata::default()));
        assert!(!has_marker(&described("Holiday photo")));
        assert!(!has_marker(&described("__MINIFIED__ by hand")));
    }

    #[test]
    fn with_marker_keeps_other_options() {
        let options = EncodeOptions::new(FormatOptions::Jpeg(JpegOptions::default()))
            .with_orientation(Some(8));
        let marked = with_marker(options);
        assert_eq!(marked.marker, Some(MARKER));
        assert_eq!(marked.orientation, Some(8));
    }
}
