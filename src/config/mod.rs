//! Minifier configuration.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── formats   # Typed option records per image format
//! ├── loader    # Layered loading + project config discovery
//! └── mod.rs    # MinifyConfig, ConfigOverrides, ConfigError (this file)
//! ```
//!
//! Layers, innermost wins: built-in defaults < discovered project config <
//! `IMAGEMIN_*` environment < call-site overrides. Format blocks are merged
//! field by field, so `png: { effort: 3 }` keeps the default compression level.

pub mod formats;
mod loader;

pub use formats::{
    FormatOptions, GenericOptions, GifOptions, JpegOptions, PngOptions, SvgOptions, TiffOptions,
    WebpOptions,
};
pub use loader::{CONFIG_NAME, ConfigLoader, ConfigSource, env_overrides};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::ImageFormat;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Config file not found: {}", .0.display())]
    NotFound(std::path::PathBuf),

    #[error("Invalid config value for `{field}`: {reason}")]
    Invalid { field: String, reason: String },
}

impl ConfigError {
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}

/// Resolved minifier configuration.
///
/// Read-only once handed to the minifier. Unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MinifyConfig {
    pub jpeg: JpegOptions,
    pub png: PngOptions,
    pub webp: WebpOptions,
    pub gif: GifOptions,
    pub tiff: TiffOptions,
    pub svg: SvgOptions,
    pub avif: GenericOptions,
    pub heif: GenericOptions,
    pub jp2: GenericOptions,
    pub raw: GenericOptions,

    /// Minimum byte reduction required before a result is written
    pub skip_delta: u64,
    /// Report encode errors and carry on instead of failing the run
    pub silent_errors: bool,
    /// Print a savings line for every accepted file
    pub show_savings: bool,
}

impl Default for MinifyConfig {
    fn default() -> Self {
        Self {
            svg: SvgOptions {
                multipass: true,
                ..SvgOptions::default()
            },
            jpeg: JpegOptions {
                progressive: true,
                ..JpegOptions::default()
            },
            png: PngOptions {
                effort: 6,
                compression_level: 9,
                ..PngOptions::default()
            },
            webp: WebpOptions {
                near_lossless: true,
                effort: 6,
                ..WebpOptions::default()
            },
            gif: GifOptions { effort: 6 },
            tiff: TiffOptions::default(),
            avif: GenericOptions::default(),
            heif: GenericOptions::default(),
            jp2: GenericOptions::default(),
            raw: GenericOptions::default(),

            skip_delta: 500,
            silent_errors: false,
            show_savings: true,
        }
    }
}

impl MinifyConfig {
    /// Options for `format`, typed for the codec.
    pub fn format_options(&self, format: ImageFormat) -> FormatOptions {
        match format {
            ImageFormat::Jpeg => FormatOptions::Jpeg(self.jpeg.clone()),
            ImageFormat::Png => FormatOptions::Png(self.png.clone()),
            ImageFormat::WebP => FormatOptions::WebP(self.webp.clone()),
            ImageFormat::Gif => FormatOptions::Gif(self.gif.clone()),
            ImageFormat::Tiff => FormatOptions::Tiff(self.tiff.clone()),
            ImageFormat::Svg => FormatOptions::Svg(self.svg.clone()),
            ImageFormat::Avif => FormatOptions::Other(self.avif.clone()),
            ImageFormat::Heif => FormatOptions::Other(self.heif.clone()),
            ImageFormat::Jp2 => FormatOptions::Other(self.jp2.clone()),
            ImageFormat::Raw => FormatOptions::Other(self.raw.clone()),
        }
    }

    /// Apply call-site or environment overrides on top of this config.
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(skip_delta) = overrides.skip_delta {
            self.skip_delta = skip_delta;
        }
        if let Some(silent_errors) = overrides.silent_errors {
            self.silent_errors = silent_errors;
        }
        if let Some(show_savings) = overrides.show_savings {
            self.show_savings = show_savings;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.jpeg.validate()?;
        self.png.validate()?;
        self.webp.validate()?;
        self.gif.validate()?;
        self.svg.validate()?;
        for (name, options) in [
            ("avif", &self.avif),
            ("heif", &self.heif),
            ("jp2", &self.jp2),
            ("raw", &self.raw),
        ] {
            options.validate(name)?;
        }
        Ok(())
    }
}

/// Policy overrides supplied by the caller or the environment.
///
/// Field names are snake_case so `IMAGEMIN_SKIP_DELTA` and friends extract
/// directly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigOverrides {
    pub skip_delta: Option<u64>,
    pub silent_errors: Option<bool>,
    pub show_savings: Option<bool>,
}

impl ConfigOverrides {
    /// Fields set on `self` win; the rest come from `fallback`.
    pub fn or(self, fallback: ConfigOverrides) -> Self {
        Self {
            skip_delta: self.skip_delta.or(fallback.skip_delta),
            silent_errors: self.silent_errors.or(fallback.silent_errors),
            show_savings: self.show_savings.or(fallback.show_savings),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
