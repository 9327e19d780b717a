//! GIF marker channel: a comment extension (`21 FE`) placed before the
//! trailer. GIF has no orientation field.

use super::{ImageMetadata, Stamp};
use crate::utils::{OptimizerError, OptimizerResult};

const EXTENSION: u8 = 0x21;
const COMMENT: u8 = 0xFE;
const IMAGE: u8 = 0x2C;
const TRAILER: u8 = 0x3B;

/// Result of walking the block stream.
#[derive(Debug, Default)]
struct Layout {
    comments: Vec<(usize, usize, String)>,
    frames: usize,
    trailer: usize,
}

/// Skips a run of data sub-blocks starting at `pos`, returning the offset after
/// the terminator and the concatenated payload.
fn sub_blocks(data: &[u8], mut pos: usize) -> Option<(usize, Vec<u8>)> {
    let mut payload = Vec::new();
    loop {
        let size = *data.get(pos)? as usize;
        pos += 1;
        if size == 0 {
            return Some((pos, payload));
        }
        payload.extend_from_slice(data.get(pos..pos + size)?);
        pos += size;
    }
}

fn color_table_len(flags: u8) -> usize {
    if flags & 0x80 != 0 {
        3 * (1 << ((flags & 0x07) + 1))
    } else {
        0
    }
}

fn layout(data: &[u8]) -> Option<Layout> {
    if !(data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a")) {
        return None;
    }
    let mut pos = 13 + color_table_len(*data.get(10)?);
    let mut layout = Layout::default();

    loop {
        match *data.get(pos)? {
            EXTENSION => {
                let label = *data.get(pos + 1)?;
                let (end, payload) = sub_blocks(data, pos + 2)?;
                if label == COMMENT {
                    let text = String::from_utf8_lossy(&payload).into_owned();
                    layout.comments.push((pos, end, text));
                }
                pos = end;
            }
            IMAGE => {
                let flags = *data.get(pos + 9)?;
                // descriptor, local table, LZW minimum code size
                let (end, _) = sub_blocks(data, pos + 10 + color_table_len(flags) + 1)?;
                layout.frames += 1;
                pos = end;
            }
            TRAILER => {
                layout.trailer = pos;
                return Some(layout);
            }
            _ => return None,
        }
    }
}

pub fn read(data: &[u8]) -> ImageMetadata {
    let Some(layout) = layout(data) else {
        return ImageMetadata::default();
    };
    ImageMetadata {
        description: layout.comments.last().map(|(_, _, text)| text.clone()),
        orientation: None,
        animated: layout.frames > 1,
        multi_page: false,
    }
}

pub fn stamp(data: &[u8], stamp: &Stamp) -> OptimizerResult<Vec<u8>> {
    let layout = layout(data).ok_or_else(|| OptimizerError::encode("malformed GIF stream"))?;
    let Some(text) = stamp.description else {
        return Ok(data.to_vec());
    };

    let mut out = Vec::with_capacity(data.len() + text.len() + 8);
    let mut pos = 0;
    for (start, end, _) in &layout.comments {
        out.extend_from_slice(&data[pos..*start]);
        pos = *end;
    }
    out.extend_from_slice(&data[pos..layout.trailer]);

    out.extend_from_slice(&[EXTENSION, COMMENT]);
    for block in text.as_bytes().chunks(255) {
        out.push(block.len() as u8);
        out.extend_from_slice(block);
    }
    out.push(0);
    out.push(TRAILER);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 1x1 GIF89a with a two-colour global table.
    fn tiny_gif() -> Vec<u8> {
        let mut data = b"GIF89a".to_vec();
        data.extend_from_slice(&[1, 0, 1, 0, 0x80, 0, 0]);
        data.extend_from_slice(&[0, 0, 0, 255, 255, 255]);
        data.extend_from_slice(&[IMAGE, 0, 0, 0, 0, 1, 0, 1, 0, 0]);
        data.extend_from_slice(&[2, 2, 0x44, 0x01, 0]);
        data.push(TRAILER);
        data
    }

    #[test]
    fn comment_goes_before_trailer() {
        let marked = stamp(
            &tiny_gif(),
            &Stamp {
                description: Some("__MINIFIED__"),
                orientation: Some(6),
            },
        )
        .unwrap();
        assert_eq!(marked.last(), Some(&TRAILER));
        let meta = read(&marked);
        assert_eq!(meta.description.as_deref(), Some("__MINIFIED__"));
        assert_eq!(meta.orientation, None);
        assert!(!meta.animated);
    }

    #[test]
    fn restamp_replaces_comment() {
        let once = stamp(&tiny_gif(), &Stamp { description: Some("x"), orientation: None }).unwrap();
        let twice = stamp(&once, &Stamp { description: Some("y"), orientation: None }).unwrap();
        assert_eq!(layout(&twice).unwrap().comments.len(), 1);
        assert_eq!(read(&twice).description.as_deref(), Some("y"));
    }

    #[test]
    fn two_frames_are_animated() {
        let mut data = tiny_gif();
        data.pop();
        data.extend_from_slice(&[IMAGE, 0, 0, 0, 0, 1, 0, 1, 0, 0, 2, 2, 0x44, 0x01, 0, TRAILER]);
        assert!(read(&data).animated);
    }
}
