//! TIFF marker channel: IFD0's own ImageDescription and Orientation tags.
//!
//! Stamping appends a rewritten IFD0 (and the description text) to the end of
//! the file and repoints the header at it. The old directory becomes
//! unreferenced; every other entry keeps its original offsets.

use super::{ImageMetadata, Stamp, exif};
use crate::utils::{OptimizerError, OptimizerResult};
use exif::{ENTRY_LEN, Entry, TAG_DESCRIPTION, TAG_ORIENTATION};

pub fn read(data: &[u8]) -> ImageMetadata {
    exif::read_ifd0(data)
        .map(|ifd| {
            let multi_page = ifd.next_ifd != 0;
            let mut meta = ImageMetadata::from(ifd);
            meta.multi_page = multi_page;
            meta
        })
        .unwrap_or_default()
}

fn entries(data: &[u8]) -> Option<(exif::Header, Vec<Entry>, u32)> {
    let header = exif::header(data)?;
    let order = header.order;
    let count = order.u16(data, header.ifd0)? as usize;
    let mut entries = Vec::with_capacity(count + 2);
    for i in 0..count {
        let pos = header.ifd0 + 2 + i * ENTRY_LEN;
        entries.push(Entry {
            tag: order.u16(data, pos)?,
            kind: order.u16(data, pos + 2)?,
            count: order.u32(data, pos + 4)?,
            value: data.get(pos + 8..pos + 12)?.try_into().ok()?,
        });
    }
    let next = order.u32(data, header.ifd0 + 2 + count * ENTRY_LEN)?;
    Some((header, entries, next))
}

pub fn stamp(data: &[u8], stamp: &Stamp) -> OptimizerResult<Vec<u8>> {
    let (header, mut entries, next) =
        entries(data).ok_or_else(|| OptimizerError::encode("malformed TIFF directory"))?;
    if next != 0 {
        return Err(OptimizerError::encode("multi-page TIFF is not supported"));
    }
    let order = header.order;

    entries.retain(|e| e.tag != TAG_DESCRIPTION && e.tag != TAG_ORIENTATION);

    let mut out = data.to_vec();
    if out.len() % 2 != 0 {
        out.push(0);
    }

    if let Some(text) = stamp.description {
        let offset = u32::try_from(out.len())
            .map_err(|_| OptimizerError::encode("TIFF exceeds 4 GiB"))?;
        let (entry, bytes) = exif::ascii_entry(order, TAG_DESCRIPTION, text, offset);
        out.extend_from_slice(&bytes);
        if out.len() % 2 != 0 {
            out.push(0);
        }
        entries.push(entry);
    }
    if let Some(value) = stamp.orientation {
        entries.push(Entry::short(order, TAG_ORIENTATION, value));
    }
    entries.sort_by_key(|e| e.tag);

    let ifd_offset =
        u32::try_from(out.len()).map_err(|_| OptimizerError::encode("TIFF exceeds 4 GiB"))?;
    order.put_u16(&mut out, entries.len() as u16);
    for entry in &entries {
        entry.write_to(order, &mut out);
    }
    order.put_u32(&mut out, 0);

    let mut pointer = Vec::with_capacity(4);
    order.put_u32(&mut pointer, ifd_offset);
    out[4..8].copy_from_slice(&pointer);
    Ok(out)
}
