//! PNG marker channel: an `eXIf` chunk placed right after IHDR.

use super::{ImageMetadata, Stamp, exif};
use crate::utils::{OptimizerError, OptimizerResult};

/// PNG signature bytes.
pub const SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

#[derive(Debug, Clone, Copy)]
struct Chunk {
    kind: [u8; 4],
    start: usize,
    data_start: usize,
    end: usize,
}

impl Chunk {
    fn data<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        &bytes[self.data_start..self.end - 4]
    }
}

fn chunks(bytes: &[u8]) -> Option<Vec<Chunk>> {
    if !bytes.starts_with(&SIGNATURE) {
        return None;
    }
    let mut out = Vec::new();
    let mut pos = SIGNATURE.len();

    while pos < bytes.len() {
        let len = u32::from_be_bytes(bytes.get(pos..pos + 4)?.try_into().ok()?) as usize;
        let kind: [u8; 4] = bytes.get(pos + 4..pos + 8)?.try_into().ok()?;
        let end = (pos + 12).checked_add(len)?;
        if end > bytes.len() {
            return None;
        }
        out.push(Chunk {
            kind,
            start: pos,
            data_start: pos + 8,
            end,
        });
        pos = end;
        if &kind == b"IEND" {
            break;
        }
    }
    Some(out)
}

fn write_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(kind);
    hasher.update(data);

    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    out.extend_from_slice(&hasher.finalize().to_be_bytes());
}

pub fn read(bytes: &[u8]) -> ImageMetadata {
    let Some(chunks) = chunks(bytes) else {
        return ImageMetadata::default();
    };
    let mut meta = chunks
        .iter()
        .find(|c| &c.kind == b"eXIf")
        .and_then(|c| exif::read_ifd0(c.data(bytes)))
        .map(ImageMetadata::from)
        .unwrap_or_default();
    meta.animated = chunks.iter().any(|c| &c.kind == b"acTL");
    meta
}

pub fn stamp(bytes: &[u8], stamp: &Stamp) -> OptimizerResult<Vec<u8>> {
    let chunks = chunks(bytes).ok_or_else(|| OptimizerError::encode("malformed PNG stream"))?;
    let ihdr = chunks
        .first()
        .filter(|c| &c.kind == b"IHDR")
        .ok_or_else(|| OptimizerError::encode("PNG stream does not start with IHDR"))?;

    let tiff = exif::build(stamp.description, stamp.orientation);
    let mut out = Vec::with_capacity(bytes.len() + tiff.len() + 12);
    out.extend_from_slice(&bytes[..ihdr.end]);
    write_chunk(&mut out, b"eXIf", &tiff);

    let mut pos = ihdr.end;
    for chunk in chunks.iter().skip(1).filter(|c| &c.kind == b"eXIf") {
        out.extend_from_slice(&bytes[pos..chunk.start]);
        pos = chunk.end;
    }
    out.extend_from_slice(&bytes[pos..]);
    Ok(out)
}
