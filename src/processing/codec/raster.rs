//! Raster re-encoding with the `image` crate.
//!
//! Each format is decoded and written back into the same container. The
//! source ICC profile is handed to the encoder; the marker and orientation are
//! stamped afterwards.

use std::io::Cursor;

use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::tiff::TiffEncoder;
use image::codecs::webp::WebPEncoder;
use image::{AnimationDecoder, DynamicImage, ImageDecoder, ImageEncoder, ImageReader};
use tracing::debug;

use super::EncodeOptions;
use crate::config::{FormatOptions, GifOptions, JpegOptions, PngOptions};
use crate::processing::metadata::{self, Stamp};
use crate::utils::{ImageFormat, OptimizerError, OptimizerResult};

pub fn encode(input: &[u8], format: ImageFormat, options: &EncodeOptions) -> OptimizerResult<Vec<u8>> {
    let source = metadata::read(format, input);
    if source.multi_page {
        return Err(OptimizerError::encode("multi-page TIFF is not supported"));
    }

    let encoded = match (format, &options.options) {
        (ImageFormat::Jpeg, FormatOptions::Jpeg(opts)) => encode_jpeg(input, opts)?,
        (ImageFormat::Png, FormatOptions::Png(opts)) => {
            if source.animated {
                return Err(OptimizerError::encode("animated PNG is not supported"));
            }
            encode_png(input, opts)?
        }
        (ImageFormat::WebP, FormatOptions::WebP(_)) => {
            if source.animated {
                return Err(OptimizerError::encode("animated WebP is not supported"));
            }
            encode_webp(input)?
        }
        (ImageFormat::Gif, FormatOptions::Gif(opts)) => encode_gif(input, opts)?,
        (ImageFormat::Tiff, FormatOptions::Tiff(_)) => encode_tiff(input)?,
        (ImageFormat::Avif | ImageFormat::Heif | ImageFormat::Jp2 | ImageFormat::Raw, _) => {
            return Err(OptimizerError::encode(format!(
                "no encoder available for {format}"
            )));
        }
        (format, options) => {
            return Err(OptimizerError::encode(format!(
                "options {options:?} do not apply to {format}"
            )));
        }
    };
    debug!("Encoded {} ({} -> {} bytes)", format, input.len(), encoded.len());

    if options.marker.is_none() && options.orientation.is_none() {
        return Ok(encoded);
    }
    metadata::stamp(
        format,
        &encoded,
        &Stamp {
            description: options.marker,
            orientation: options.orientation,
        },
    )
}

/// Decodes the first image along with its embedded ICC profile.
fn decode(input: &[u8], format: image::ImageFormat) -> OptimizerResult<(DynamicImage, Option<Vec<u8>>)> {
    let mut reader = ImageReader::new(Cursor::new(input));
    reader.set_format(format);
    let mut decoder = reader.into_decoder()?;
    let icc = decoder.icc_profile()?;
    Ok((DynamicImage::from_decoder(decoder)?, icc))
}

fn with_icc<E: ImageEncoder>(mut encoder: E, icc: Option<Vec<u8>>) -> E {
    if let Some(profile) = icc {
        if let Err(err) = encoder.set_icc_profile(profile) {
            debug!("ICC profile dropped: {}", err);
        }
    }
    encoder
}

fn encode_jpeg(input: &[u8], opts: &JpegOptions) -> OptimizerResult<Vec<u8>> {
    let (img, icc) = decode(input, image::ImageFormat::Jpeg)?;
    // baseline encoder takes 8-bit grey or RGB only
    let img = match img {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => img,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    };

    let mut out = Vec::new();
    img.write_with_encoder(with_icc(JpegEncoder::new_with_quality(&mut out, opts.quality), icc))?;
    Ok(out)
}

fn encode_png(input: &[u8], opts: &PngOptions) -> OptimizerResult<Vec<u8>> {
    let (img, icc) = decode(input, image::ImageFormat::Png)?;

    let compression = match opts.compression_level {
        0..=3 => CompressionType::Fast,
        4..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    };
    let filter = if opts.adaptive_filtering || opts.effort >= 5 {
        FilterType::Adaptive
    } else {
        FilterType::Sub
    };

    let mut out = Vec::new();
    img.write_with_encoder(with_icc(PngEncoder::new_with_quality(&mut out, compression, filter), icc))?;
    Ok(out)
}

fn encode_webp(input: &[u8]) -> OptimizerResult<Vec<u8>> {
    let (img, icc) = decode(input, image::ImageFormat::WebP)?;
    let img = if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    };

    let mut out = Vec::new();
    img.write_with_encoder(with_icc(WebPEncoder::new_lossless(&mut out), icc))?;
    Ok(out)
}

fn encode_gif(input: &[u8], opts: &GifOptions) -> OptimizerResult<Vec<u8>> {
    let frames = GifDecoder::new(Cursor::new(input))?
        .into_frames()
        .collect_frames()?;
    if frames.is_empty() {
        return Err(OptimizerError::encode("GIF has no frames"));
    }
    let animated = frames.len() > 1;

    // effort 10 maps to the slowest, best-quantized speed 1
    let speed = (31 - i32::from(opts.effort) * 3).clamp(1, 30);
    let mut out = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut out, speed);
        if animated {
            encoder.set_repeat(Repeat::Infinite)?;
        }
        encoder.encode_frames(frames)?;
        // trailer is written on drop
    }
    Ok(out)
}

fn encode_tiff(input: &[u8]) -> OptimizerResult<Vec<u8>> {
    let (img, icc) = decode(input, image::ImageFormat::Tiff)?;
    let img = match img {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_)
        | DynamicImage::ImageLuma16(_)
        | DynamicImage::ImageRgb16(_)
        | DynamicImage::ImageRgba16(_) => img,
        other if other.color().has_alpha() => DynamicImage::ImageRgba8(other.to_rgba8()),
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    };

    let mut out = Cursor::new(Vec::new());
    img.write_with_encoder(with_icc(TiffEncoder::new(&mut out), icc))?;
    Ok(out.into_inner())
}
