use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use crate::utils::OptimizerError;

/// Image formats the minifier can classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    WebP,
    Svg,
    Avif,
    Heif,
    Tiff,
    Jp2,
    Raw,
}

impl ImageFormat {
    pub const ALL: [ImageFormat; 10] = [
        Self::Jpeg,
        Self::Png,
        Self::Gif,
        Self::WebP,
        Self::Svg,
        Self::Avif,
        Self::Heif,
        Self::Tiff,
        Self::Jp2,
        Self::Raw,
    ];

    /// Config key and display name for this format
    pub fn name(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::WebP => "webp",
            Self::Svg => "svg",
            Self::Avif => "avif",
            Self::Heif => "heif",
            Self::Tiff => "tiff",
            Self::Jp2 => "jp2",
            Self::Raw => "raw",
        }
    }

    /// Get file extensions associated with this format
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Jpeg => &["jpg", "jpeg", "jpe", "jfif"],
            Self::Png => &["png"],
            Self::Gif => &["gif"],
            Self::WebP => &["webp"],
            Self::Svg => &["svg"],
            Self::Avif => &["avif"],
            Self::Heif => &["heif", "heic"],
            Self::Tiff => &["tif", "tiff"],
            Self::Jp2 => &["jp2", "j2k", "jpx", "j2c"],
            Self::Raw => &["raw"],
        }
    }

    /// Vector formats carry no metadata marker channel.
    pub fn is_vector(&self) -> bool {
        matches!(self, Self::Svg)
    }

    /// Check if the extension matches this format
    pub fn matches_extension(&self, ext: &str) -> bool {
        let ext = ext.to_lowercase();
        self.extensions().contains(&ext.as_str())
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ImageFormat {
    type Err = OptimizerError;

    fn from_str(ext: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.matches_extension(ext))
            .ok_or_else(|| OptimizerError::unrecognized(format!("unsupported file type '{ext}'")))
    }
}

/// Lowercased extension of `path`, if it has one.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Get format from file extension
pub fn format_from_extension(path: &Path) -> Option<ImageFormat> {
    extension_of(path).and_then(|ext| ImageFormat::from_str(&ext).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("photo.JPG", Some(ImageFormat::Jpeg))]
    #[case("photo.jpeg", Some(ImageFormat::Jpeg))]
    #[case("icon.svg", Some(ImageFormat::Svg))]
    #[case("scan.tif", Some(ImageFormat::Tiff))]
    #[case("shot.heic", Some(ImageFormat::Heif))]
    #[case("notes.txt", None)]
    #[case("Makefile", None)]
    fn extension_lookup(#[case] path: &str, #[case] expected: Option<ImageFormat>) {
        assert_eq!(format_from_extension(Path::new(path)), expected);
    }

    #[test]
    fn only_svg_is_vector() {
        let vectors: Vec<_> = ImageFormat::ALL.iter().filter(|f| f.is_vector()).collect();
        assert_eq!(vectors, vec![&ImageFormat::Svg]);
    }

    #[test]
    fn unknown_extension_is_unrecognized() {
        let err = ImageFormat::from_str("txt").unwrap_err();
        assert!(matches!(err, OptimizerError::UnrecognizedFormat(_)));
    }
}
