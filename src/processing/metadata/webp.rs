//! WebP marker channel: an `EXIF` chunk.
//!
//! Simple-format files (a lone `VP8 ` or `VP8L` chunk) are upgraded to the
//! extended format by prepending a `VP8X` header, since only that layout may
//! carry metadata chunks.

use super::{ImageMetadata, Stamp, exif};
use crate::utils::{OptimizerError, OptimizerResult};

const RIFF: &[u8; 4] = b"RIFF";
const WEBP: &[u8; 4] = b"WEBP";

const FLAG_ANIMATION: u8 = 0x02;
const FLAG_EXIF: u8 = 0x08;
const FLAG_ALPHA: u8 = 0x10;

#[derive(Debug, Clone, Copy)]
struct Chunk {
    fourcc: [u8; 4],
    start: usize,
    data_start: usize,
    len: usize,
}

impl Chunk {
    fn data<'a>(&self, bytes: &'a [u8]) -> &'a [u8] {
        &bytes[self.data_start..self.data_start + self.len]
    }

    /// End including the pad byte.
    fn end(&self) -> usize {
        self.data_start + self.len + (self.len & 1)
    }
}

fn chunks(bytes: &[u8]) -> Option<Vec<Chunk>> {
    if bytes.get(0..4)? != RIFF || bytes.get(8..12)? != WEBP {
        return None;
    }
    let mut out = Vec::new();
    let mut pos = 12;
    while pos + 8 <= bytes.len() {
        let fourcc: [u8; 4] = bytes[pos..pos + 4].try_into().ok()?;
        let len = u32::from_le_bytes(bytes[pos + 4..pos + 8].try_into().ok()?) as usize;
        let chunk = Chunk {
            fourcc,
            start: pos,
            data_start: pos + 8,
            len,
        };
        if chunk.data_start + len > bytes.len() {
            return None;
        }
        pos = chunk.end().min(bytes.len());
        out.push(chunk);
    }
    Some(out)
}

fn write_chunk(out: &mut Vec<u8>, fourcc: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(fourcc);
    out.extend_from_slice(&(data.len() as u32).to_le_bytes());
    out.extend_from_slice(data);
    if data.len() % 2 != 0 {
        out.push(0);
    }
}

pub fn read(bytes: &[u8]) -> ImageMetadata {
    let Some(chunks) = chunks(bytes) else {
        return ImageMetadata::default();
    };
    let mut meta = chunks
        .iter()
        .find(|c| &c.fourcc == b"EXIF")
        .and_then(|c| {
            let data = c.data(bytes);
            // some writers keep the JPEG-style prefix
            let tiff = data.strip_prefix(b"Exif\0\0").unwrap_or(data);
            exif::read_ifd0(tiff)
        })
        .map(ImageMetadata::from)
        .unwrap_or_default();
    meta.animated = chunks.iter().any(|c| &c.fourcc == b"ANIM");
    meta
}

/// Canvas size and alpha flag of a simple-format bitstream.
fn canvas(chunk: &Chunk, bytes: &[u8]) -> Option<(u32, u32, bool)> {
    let data = chunk.data(bytes);
    match &chunk.fourcc {
        b"VP8L" => {
            if *data.first()? != 0x2F {
                return None;
            }
            let bits = u32::from_le_bytes(data.get(1..5)?.try_into().ok()?);
            let width = (bits & 0x3FFF) + 1;
            let height = ((bits >> 14) & 0x3FFF) + 1;
            let alpha = (bits >> 28) & 1 == 1;
            Some((width, height, alpha))
        }
        b"VP8 " => {
            if data.get(3..6)? != [0x9D, 0x01, 0x2A] {
                return None;
            }
            let width = u16::from_le_bytes(data.get(6..8)?.try_into().ok()?) & 0x3FFF;
            let height = u16::from_le_bytes(data.get(8..10)?.try_into().ok()?) & 0x3FFF;
            Some((width as u32, height as u32, false))
        }
        _ => None,
    }
}

fn vp8x(flags: u8, width: u32, height: u32) -> Vec<u8> {
    let mut data = vec![flags, 0, 0, 0];
    data.extend_from_slice(&(width - 1).to_le_bytes()[..3]);
    data.extend_from_slice(&(height - 1).to_le_bytes()[..3]);
    data
}

pub fn stamp(bytes: &[u8], stamp: &Stamp) -> OptimizerResult<Vec<u8>> {
    let chunks = chunks(bytes).ok_or_else(|| OptimizerError::encode("malformed WebP container"))?;
    let first = chunks
        .first()
        .ok_or_else(|| OptimizerError::encode("empty WebP container"))?;

    let mut body = Vec::with_capacity(bytes.len() + 64);
    if &first.fourcc == b"VP8X" {
        let header = first.data(bytes);
        if header.len() < 10 {
            return Err(OptimizerError::encode("truncated VP8X header"));
        }
        if header[0] & FLAG_ANIMATION != 0 {
            return Err(OptimizerError::encode("animated WebP is not supported"));
        }
        let mut header = header.to_vec();
        header[0] |= FLAG_EXIF;
        write_chunk(&mut body, b"VP8X", &header);
    } else {
        let (width, height, alpha) = canvas(first, bytes)
            .ok_or_else(|| OptimizerError::encode("unrecognized WebP bitstream header"))?;
        let flags = FLAG_EXIF | if alpha { FLAG_ALPHA } else { 0 };
        write_chunk(&mut body, b"VP8X", &vp8x(flags, width, height));
        body.extend_from_slice(&bytes[first.start..first.end().min(bytes.len())]);
    }

    for chunk in chunks.iter().skip(1).filter(|c| &c.fourcc != b"EXIF") {
        body.extend_from_slice(&bytes[chunk.start..chunk.end().min(bytes.len())]);
    }
    // pad byte of a trailing odd chunk may be missing; keep chunk boundaries even
    if body.len() % 2 != 0 {
        body.push(0);
    }
    write_chunk(&mut body, b"EXIF", &exif::build(stamp.description, stamp.orientation));

    let mut out = Vec::with_capacity(body.len() + 12);
    out.extend_from_slice(RIFF);
    out.extend_from_slice(&((body.len() + 4) as u32).to_le_bytes());
    out.extend_from_slice(WEBP);
    out.extend_from_slice(&body);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn riff(body: &[u8]) -> Vec<u8> {
        let mut out = RIFF.to_vec();
        out.extend_from_slice(&((body.len() + 4) as u32).to_le_bytes());
        out.extend_from_slice(WEBP);
        out.extend_from_slice(body);
        out
    }

    /// Simple lossless file: 3x2 canvas with alpha.
    fn lossless() -> Vec<u8> {
        let bits: u32 = 2 | (1 << 14) | (1 << 28);
        let mut data = vec![0x2F];
        data.extend_from_slice(&bits.to_le_bytes());
        data.extend_from_slice(&[0, 0]);
        let mut body = Vec::new();
        write_chunk(&mut body, b"VP8L", &data);
        riff(&body)
    }

    #[test]
    fn simple_file_is_upgraded_to_vp8x() {
        let marked = stamp(
            &lossless(),
            &Stamp {
                description: Some("__MINIFIED__"),
                orientation: Some(1),
            },
        )
        .unwrap();
        let parsed = chunks(&marked).unwrap();
        let kinds: Vec<[u8; 4]> = parsed.iter().map(|c| c.fourcc).collect();
        assert_eq!(kinds, vec![*b"VP8X", *b"VP8L", *b"EXIF"]);

        let header = parsed[0].data(&marked);
        assert_eq!(header[0], FLAG_EXIF | FLAG_ALPHA);
        assert_eq!(&header[4..7], &[2, 0, 0]);
        assert_eq!(&header[7..10], &[1, 0, 0]);

        let riff_size = u32::from_le_bytes(marked[4..8].try_into().unwrap()) as usize;
        assert_eq!(riff_size, marked.len() - 8);

        let meta = read(&marked);
        assert_eq!(meta.description.as_deref(), Some("__MINIFIED__"));
        assert_eq!(meta.orientation, Some(1));
    }

    #[test]
    fn restamp_keeps_a_single_exif_chunk() {
        let once = stamp(&lossless(), &Stamp { description: Some("a"), orientation: None }).unwrap();
        let twice = stamp(&once, &Stamp { description: Some("b"), orientation: None }).unwrap();
        let exif_chunks = chunks(&twice)
            .unwrap()
            .iter()
            .filter(|c| &c.fourcc == b"EXIF")
            .count();
        assert_eq!(exif_chunks, 1);
        assert_eq!(read(&twice).description.as_deref(), Some("b"));
    }

    #[test]
    fn animated_is_detected_and_refused() {
        let mut body = Vec::new();
        write_chunk(&mut body, b"VP8X", &vp8x(FLAG_ANIMATION, 4, 4));
        write_chunk(&mut body, b"ANIM", &[0; 6]);
        let data = riff(&body);
        assert!(read(&data).animated);
        assert!(stamp(&data, &Stamp::default()).is_err());
    }
}
