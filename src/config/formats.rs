//! Per-format encoder options.
//!
//! Each record is deserialized from the config block named after its format
//! (`jpeg`, `png`, ...). Missing fields fall back to the record's default and
//! unknown fields are ignored.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// JPEG encoder options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct JpegOptions {
    /// Quality 1-100
    pub quality: u8,
    /// Requested progressive scan order. The bundled encoder writes baseline
    /// JPEG; the flag is kept so existing configs load unchanged.
    pub progressive: bool,
}

impl Default for JpegOptions {
    fn default() -> Self {
        Self {
            quality: 80,
            progressive: false,
        }
    }
}

/// PNG encoder options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PngOptions {
    /// zlib level 0-9
    pub compression_level: u8,
    /// Effort 1-10; 5 and above enables adaptive row filtering
    pub effort: u8,
    /// Force adaptive row filtering regardless of effort
    pub adaptive_filtering: bool,
}

impl Default for PngOptions {
    fn default() -> Self {
        Self {
            compression_level: 6,
            effort: 7,
            adaptive_filtering: false,
        }
    }
}

/// WebP encoder options.
///
/// Output is always lossless; `quality` and `nearLossless` are accepted for
/// compatibility with configs written for lossy encoders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WebpOptions {
    pub quality: u8,
    pub lossless: bool,
    pub near_lossless: bool,
    pub effort: u8,
}

impl Default for WebpOptions {
    fn default() -> Self {
        Self {
            quality: 80,
            lossless: false,
            near_lossless: false,
            effort: 4,
        }
    }
}

/// GIF encoder options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GifOptions {
    /// Effort 1-10; higher spends more time on palette quantization
    pub effort: u8,
}

impl Default for GifOptions {
    fn default() -> Self {
        Self { effort: 7 }
    }
}

/// TIFF encoder options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TiffOptions {}

/// Options for formats that are classified but have no bundled encoder
/// (AVIF, HEIF, JPEG 2000, raw pixel data). Kept so a custom `Codec` can read
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenericOptions {
    pub quality: u8,
    pub lossless: bool,
    pub effort: u8,
}

impl Default for GenericOptions {
    fn default() -> Self {
        Self {
            quality: 50,
            lossless: false,
            effort: 4,
        }
    }
}

/// SVG optimizer options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SvgOptions {
    /// Re-run the optimizer on its own output until the size stops shrinking
    pub multipass: bool,
    /// Decimal places kept for coordinates and transforms (1-10)
    pub float_precision: u8,
}

impl Default for SvgOptions {
    fn default() -> Self {
        Self {
            multipass: false,
            float_precision: 3,
        }
    }
}

/// Typed options for one format, as handed to a codec.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatOptions {
    Jpeg(JpegOptions),
    Png(PngOptions),
    WebP(WebpOptions),
    Gif(GifOptions),
    Tiff(TiffOptions),
    Svg(SvgOptions),
    Other(GenericOptions),
}

pub(super) fn check_range(
    field: &str,
    value: u8,
    range: std::ops::RangeInclusive<u8>,
) -> Result<(), ConfigError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::invalid(
            field,
            format!(
                "{value} is out of range ({}-{})",
                range.start(),
                range.end()
            ),
        ))
    }
}

impl JpegOptions {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        check_range("jpeg.quality", self.quality, 1..=100)
    }
}

impl PngOptions {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        check_range("png.compressionLevel", self.compression_level, 0..=9)?;
        check_range("png.effort", self.effort, 1..=10)
    }
}

impl WebpOptions {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        check_range("webp.quality", self.quality, 1..=100)?;
        check_range("webp.effort", self.effort, 0..=6)
    }
}

impl GifOptions {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        check_range("gif.effort", self.effort, 1..=10)
    }
}

impl GenericOptions {
    pub(super) fn validate(&self, format: &str) -> Result<(), ConfigError> {
        check_range(&format!("{format}.quality"), self.quality, 1..=100)?;
        check_range(&format!("{format}.effort"), self.effort, 0..=9)
    }
}

impl SvgOptions {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        check_range("svg.floatPrecision", self.float_precision, 1..=10)
    }
}
