//! Embedded metadata per container format.
//!
//! Each raster container has one descriptive text slot used as the minified
//! marker channel, and most carry an EXIF Orientation that must survive
//! re-encoding.
//!
//! | format | channel |
//! |--------|---------|
//! | JPEG   | APP1 Exif, IFD0 ImageDescription |
//! | PNG    | eXIf chunk, IFD0 ImageDescription |
//! | WebP   | EXIF chunk, IFD0 ImageDescription |
//! | TIFF   | IFD0 ImageDescription |
//! | GIF    | comment extension |
//!
//! AVIF, HEIF, JPEG 2000 and raw have no channel here.

pub mod exif;
mod gif;
mod jpeg;
mod png;
mod tiff;
mod webp;

pub use png::SIGNATURE as PNG_SIGNATURE;

use crate::utils::{ImageFormat, OptimizerError, OptimizerResult};

/// Metadata read from an encoded image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageMetadata {
    /// Descriptive text slot (ImageDescription or GIF comment)
    pub description: Option<String>,
    /// EXIF Orientation, 1-8
    pub orientation: Option<u16>,
    /// More than one frame
    pub animated: bool,
    /// More than one TIFF directory
    pub multi_page: bool,
}

impl From<exif::Ifd0> for ImageMetadata {
    fn from(ifd: exif::Ifd0) -> Self {
        Self {
            description: ifd.description,
            orientation: ifd.orientation,
            animated: false,
            multi_page: false,
        }
    }
}

/// Fields to write into an encoded image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stamp<'a> {
    pub description: Option<&'a str>,
    pub orientation: Option<u16>,
}

/// Best-effort read; malformed containers yield empty metadata.
pub fn read(format: ImageFormat, data: &[u8]) -> ImageMetadata {
    match format {
        ImageFormat::Jpeg => jpeg::read(data),
        ImageFormat::Png => png::read(data),
        ImageFormat::WebP => webp::read(data),
        ImageFormat::Tiff => tiff::read(data),
        ImageFormat::Gif => gif::read(data),
        _ => ImageMetadata::default(),
    }
}

/// Writes `stamp` into an encoded image of `format`.
pub fn stamp(format: ImageFormat, data: &[u8], stamp: &Stamp) -> OptimizerResult<Vec<u8>> {
    match format {
        ImageFormat::Jpeg => jpeg::stamp(data, stamp),
        ImageFormat::Png => png::stamp(data, stamp),
        ImageFormat::WebP => webp::stamp(data, stamp),
        ImageFormat::Tiff => tiff::stamp(data, stamp),
        ImageFormat::Gif => gif::stamp(data, stamp),
        other => Err(OptimizerError::encode(format!(
            "{other} has no metadata channel"
        ))),
    }
}
