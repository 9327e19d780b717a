//! Format classification by content sniffing.
//!
//! Magic bytes decide the format. The path's extension is only consulted for
//! formats without a reliable signature (raw pixel dumps).

use std::path::Path;

use super::metadata::{self, ImageMetadata};
use crate::utils::{ImageFormat, OptimizerError, OptimizerResult, extension_of, format_from_extension};

/// How far into a text file to look for the `<svg` root element
const SVG_SNIFF_LEN: usize = 4096;

/// Format and embedded metadata of an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub format: ImageFormat,
    pub metadata: ImageMetadata,
}

/// Identifies `bytes` from its leading signature.
pub fn sniff(bytes: &[u8]) -> Option<ImageFormat> {
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(ImageFormat::Jpeg);
    }
    if bytes.starts_with(&metadata::PNG_SIGNATURE) {
        return Some(ImageFormat::Png);
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some(ImageFormat::Gif);
    }
    if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some(ImageFormat::WebP);
    }
    if bytes.starts_with(b"II*\0") || bytes.starts_with(b"MM\0*") {
        return Some(ImageFormat::Tiff);
    }
    if bytes.starts_with(&[0x00, 0x00, 0x00, 0x0C, 0x6A, 0x50, 0x20, 0x20])
        || bytes.starts_with(&[0xFF, 0x4F, 0xFF, 0x51])
    {
        return Some(ImageFormat::Jp2);
    }
    if let Some(format) = sniff_ftyp(bytes) {
        return Some(format);
    }
    if looks_like_svg(bytes) {
        return Some(ImageFormat::Svg);
    }
    None
}

/// ISO-BMFF `ftyp` brands for AVIF and HEIF.
fn sniff_ftyp(bytes: &[u8]) -> Option<ImageFormat> {
    if bytes.get(4..8)? != b"ftyp" {
        return None;
    }
    let size = u32::from_be_bytes(bytes.get(0..4)?.try_into().ok()?) as usize;
    let end = size.clamp(16, 64).min(bytes.len());
    let major = bytes.get(8..12)?;
    // major brand, then compatible brands after the minor version
    let brands = std::iter::once(major).chain(bytes.get(16..end).unwrap_or(&[]).chunks_exact(4));

    let mut heif = false;
    for brand in brands {
        match brand {
            b"avif" | b"avis" => return Some(ImageFormat::Avif),
            b"heic" | b"heix" | b"hevc" | b"hevx" | b"heim" | b"heis" | b"mif1" | b"msf1" => {
                heif = true
            }
            _ => {}
        }
    }
    heif.then_some(ImageFormat::Heif)
}

fn looks_like_svg(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(SVG_SNIFF_LEN)];
    // the cut may split a multi-byte character; keep the valid prefix
    let text = match std::str::from_utf8(head) {
        Ok(text) => text,
        Err(e) => match std::str::from_utf8(&head[..e.valid_up_to()]) {
            Ok(text) => text,
            Err(_) => return false,
        },
    };
    let text = text.trim_start_matches('\u{feff}').trim_start();
    let lower = text.to_ascii_lowercase();
    let prologue = lower.starts_with("<?xml")
        || lower.starts_with("<!--")
        || lower.starts_with("<!doctype svg")
        || lower.starts_with("<svg");
    prologue && lower.contains("<svg")
}

/// Classifies an input and reads its embedded metadata.
///
/// `path` is only used for the extension fallback and error messages.
pub fn classify(bytes: &[u8], path: Option<&Path>) -> OptimizerResult<Classified> {
    let format = match sniff(bytes) {
        Some(format) => format,
        None => path
            .and_then(format_from_extension)
            .filter(|f| *f == ImageFormat::Raw)
            .ok_or_else(|| unrecognized(path))?,
    };

    Ok(Classified {
        format,
        metadata: metadata::read(format, bytes),
    })
}

fn unrecognized(path: Option<&Path>) -> OptimizerError {
    match path.and_then(extension_of) {
        Some(ext) => OptimizerError::unrecognized(format!("unsupported file type '{ext}'")),
        None => OptimizerError::unrecognized("unsupported file type"),
    }
}
