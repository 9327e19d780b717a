//! Codec seam.
//!
//! The minifier only needs "bytes + format + options in, re-encoded bytes
//! out". [`NativeCodec`] does that with pure-Rust encoders; tests and
//! embedders can plug in their own [`Codec`].

mod raster;
mod svg;

use crate::config::{FormatOptions, SvgOptions};
use crate::utils::{ImageFormat, OptimizerResult};

/// Per-call encode request for a raster image.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeOptions {
    pub options: FormatOptions,
    /// Text for the output's descriptive metadata slot
    pub marker: Option<&'static str>,
    /// EXIF orientation carried over from the source
    pub orientation: Option<u16>,
}

impl EncodeOptions {
    pub fn new(options: FormatOptions) -> Self {
        Self {
            options,
            marker: None,
            orientation: None,
        }
    }

    pub fn with_orientation(mut self, orientation: Option<u16>) -> Self {
        self.orientation = orientation;
        self
    }
}

/// Re-encodes images. Must be usable from several worker threads at once.
pub trait Codec: Send + Sync {
    /// Re-encode `input` into its own `format`.
    fn encode_raster(
        &self,
        input: &[u8],
        format: ImageFormat,
        options: &EncodeOptions,
    ) -> OptimizerResult<Vec<u8>>;

    /// Optimize SVG source text.
    fn optimize_svg(&self, source: &str, options: &SvgOptions) -> OptimizerResult<Vec<u8>>;
}

/// Pure-Rust codec backed by the `image` and `usvg` crates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeCodec;

impl Codec for NativeCodec {
    fn encode_raster(
        &self,
        input: &[u8],
        format: ImageFormat,
        options: &EncodeOptions,
    ) -> OptimizerResult<Vec<u8>> {
        raster::encode(input, format, options)
    }

    fn optimize_svg(&self, source: &str, options: &SvgOptions) -> OptimizerResult<Vec<u8>> {
        svg::optimize(source, options)
    }
}
