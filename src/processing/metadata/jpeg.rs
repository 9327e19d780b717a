//! JPEG marker channel: an APP1 `Exif` segment.
//!
//! The stamped segment goes right after SOI, or after the JFIF APP0 segment
//! when one is present. Existing Exif segments are dropped.

use super::{ImageMetadata, Stamp, exif};
use crate::utils::{OptimizerError, OptimizerResult};

const MARKER_PREFIX: u8 = 0xFF;
const SOI: u8 = 0xD8;
const EOI: u8 = 0xD9;
const SOS: u8 = 0xDA;
const APP0: u8 = 0xE0;
const APP1: u8 = 0xE1;

const EXIF_HEADER: &[u8; 6] = b"Exif\0\0";

/// A header segment before SOS, `start` pointing at its 0xFF byte.
#[derive(Debug, Clone, Copy)]
struct Segment {
    marker: u8,
    start: usize,
    end: usize,
}

impl Segment {
    fn payload<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.start + 4..self.end]
    }

    fn is_exif(&self, data: &[u8]) -> bool {
        self.marker == APP1 && self.payload(data).starts_with(EXIF_HEADER)
    }
}

fn is_standalone(marker: u8) -> bool {
    matches!(marker, SOI | EOI | 0x01 | 0xD0..=0xD7)
}

/// Header segments up to (not including) SOS, plus the offset SOS starts at.
fn segments(data: &[u8]) -> Option<(Vec<Segment>, usize)> {
    if data.len() < 4 || data[0] != MARKER_PREFIX || data[1] != SOI {
        return None;
    }
    let mut out = Vec::new();
    let mut pos = 2;

    loop {
        if *data.get(pos)? != MARKER_PREFIX {
            return None;
        }
        let start = pos;
        // fill bytes
        while data.get(pos + 1) == Some(&MARKER_PREFIX) {
            pos += 1;
        }
        let marker = *data.get(pos + 1)?;
        if marker == SOS || marker == EOI {
            return Some((out, start));
        }
        if is_standalone(marker) {
            pos += 2;
            continue;
        }
        let len = u16::from_be_bytes([*data.get(pos + 2)?, *data.get(pos + 3)?]) as usize;
        if len < 2 {
            return None;
        }
        let end = pos + 2 + len;
        if end > data.len() {
            return None;
        }
        out.push(Segment {
            marker,
            start: pos,
            end,
        });
        pos = end;
    }
}

pub fn read(data: &[u8]) -> ImageMetadata {
    let Some((segments, _)) = segments(data) else {
        return ImageMetadata::default();
    };
    segments
        .iter()
        .find(|s| s.is_exif(data))
        .and_then(|s| exif::read_ifd0(&s.payload(data)[EXIF_HEADER.len()..]))
        .map(ImageMetadata::from)
        .unwrap_or_default()
}

pub fn stamp(data: &[u8], stamp: &Stamp) -> OptimizerResult<Vec<u8>> {
    let (segments, _) =
        segments(data).ok_or_else(|| OptimizerError::encode("malformed JPEG stream"))?;

    let tiff = exif::build(stamp.description, stamp.orientation);
    let seg_len = 2 + EXIF_HEADER.len() + tiff.len();
    if seg_len > u16::MAX as usize {
        return Err(OptimizerError::encode("Exif segment too large"));
    }
    let mut app1 = Vec::with_capacity(seg_len + 2);
    app1.extend_from_slice(&[MARKER_PREFIX, APP1]);
    app1.extend_from_slice(&(seg_len as u16).to_be_bytes());
    app1.extend_from_slice(EXIF_HEADER);
    app1.extend_from_slice(&tiff);

    let insert_at = match segments.first() {
        Some(first) if first.marker == APP0 => first.end,
        _ => 2,
    };

    let mut out = Vec::with_capacity(data.len() + app1.len());
    out.extend_from_slice(&data[..insert_at]);
    out.extend_from_slice(&app1);
    let mut pos = insert_at;
    for segment in segments.iter().filter(|s| s.start >= insert_at && s.is_exif(data)) {
        out.extend_from_slice(&data[pos..segment.start]);
        pos = segment.end;
    }
    out.extend_from_slice(&data[pos..]);
    Ok(out)
}
