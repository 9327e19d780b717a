//! Minimal TIFF-structured EXIF reader/writer.
//!
//! Only IFD0 is read, and only two tags matter here:
//! - 270 ImageDescription (ASCII), which carries the minified marker
//! - 274 Orientation (SHORT), carried from source to output

/// ImageDescription tag.
pub const TAG_DESCRIPTION: u16 = 270;
/// Orientation tag.
pub const TAG_ORIENTATION: u16 = 274;

pub const TYPE_ASCII: u16 = 2;
pub const TYPE_SHORT: u16 = 3;

/// Size of one IFD entry.
pub const ENTRY_LEN: usize = 12;

/// Byte order of a TIFF structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Little,
    Big,
}

impl ByteOrder {
    pub fn u16(self, bytes: &[u8], pos: usize) -> Option<u16> {
        let raw: [u8; 2] = bytes.get(pos..pos + 2)?.try_into().ok()?;
        Some(match self {
            Self::Little => u16::from_le_bytes(raw),
            Self::Big => u16::from_be_bytes(raw),
        })
    }

    pub fn u32(self, bytes: &[u8], pos: usize) -> Option<u32> {
        let raw: [u8; 4] = bytes.get(pos..pos + 4)?.try_into().ok()?;
        Some(match self {
            Self::Little => u32::from_le_bytes(raw),
            Self::Big => u32::from_be_bytes(raw),
        })
    }

    pub fn put_u16(self, out: &mut Vec<u8>, value: u16) {
        match self {
            Self::Little => out.extend_from_slice(&value.to_le_bytes()),
            Self::Big => out.extend_from_slice(&value.to_be_bytes()),
        }
    }

    pub fn put_u32(self, out: &mut Vec<u8>, value: u32) {
        match self {
            Self::Little => out.extend_from_slice(&value.to_le_bytes()),
            Self::Big => out.extend_from_slice(&value.to_be_bytes()),
        }
    }
}

/// Parsed TIFF header.
#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub order: ByteOrder,
    pub ifd0: usize,
}

pub fn header(tiff: &[u8]) -> Option<Header> {
    let order = match tiff.get(0..2)? {
        b"II" => ByteOrder::Little,
        b"MM" => ByteOrder::Big,
        _ => return None,
    };
    if order.u16(tiff, 2)? != 42 {
        return None;
    }
    let ifd0 = order.u32(tiff, 4)? as usize;
    Some(Header { order, ifd0 })
}

/// Fields read from IFD0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ifd0 {
    pub description: Option<String>,
    pub orientation: Option<u16>,
    /// Offset of the next IFD; non-zero means more pages follow
    pub next_ifd: u32,
}

/// Reads IFD0 of a TIFF structure. Returns `None` if the structure is malformed.
pub fn read_ifd0(tiff: &[u8]) -> Option<Ifd0> {
    let Header { order, ifd0 } = header(tiff)?;
    let count = order.u16(tiff, ifd0)? as usize;
    let mut fields = Ifd0::default();

    for i in 0..count {
        let entry = ifd0 + 2 + i * ENTRY_LEN;
        let tag = order.u16(tiff, entry)?;
        let kind = order.u16(tiff, entry + 2)?;
        let len = order.u32(tiff, entry + 4)? as usize;

        match (tag, kind) {
            (TAG_DESCRIPTION, TYPE_ASCII) => {
                let start = if len <= 4 {
                    entry + 8
                } else {
                    order.u32(tiff, entry + 8)? as usize
                };
                let raw = tiff.get(start..start.checked_add(len)?)?;
                let text = String::from_utf8_lossy(raw);
                fields.description = Some(text.trim_end_matches('\0').to_string());
            }
            (TAG_ORIENTATION, TYPE_SHORT) => {
                fields.orientation = order.u16(tiff, entry + 8);
            }
            _ => {}
        }
    }

    fields.next_ifd = order.u32(tiff, ifd0 + 2 + count * ENTRY_LEN).unwrap_or(0);
    Some(fields)
}

/// One IFD entry, value field kept raw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub tag: u16,
    pub kind: u16,
    pub count: u32,
    pub value: [u8; 4],
}

impl Entry {
    pub fn short(order: ByteOrder, tag: u16, value: u16) -> Self {
        let mut raw = Vec::with_capacity(4);
        order.put_u16(&mut raw, value);
        raw.extend_from_slice(&[0, 0]);
        Self {
            tag,
            kind: TYPE_SHORT,
            count: 1,
            value: [raw[0], raw[1], raw[2], raw[3]],
        }
    }

    pub fn write_to(&self, order: ByteOrder, out: &mut Vec<u8>) {
        order.put_u16(out, self.tag);
        order.put_u16(out, self.kind);
        order.put_u32(out, self.count);
        out.extend_from_slice(&self.value);
    }
}

/// Builds an ASCII entry whose value is stored at `data_offset` (or inline
/// when it fits), returning the entry and the bytes to place at that offset.
pub fn ascii_entry(order: ByteOrder, tag: u16, text: &str, data_offset: u32) -> (Entry, Vec<u8>) {
    let mut data = text.as_bytes().to_vec();
    data.push(0);
    let count = data.len() as u32;

    if data.len() <= 4 {
        let mut value = [0u8; 4];
        value[..data.len()].copy_from_slice(&data);
        let entry = Entry {
            tag,
            kind: TYPE_ASCII,
            count,
            value,
        };
        return (entry, Vec::new());
    }

    let mut raw = Vec::with_capacity(4);
    order.put_u32(&mut raw, data_offset);
    let entry = Entry {
        tag,
        kind: TYPE_ASCII,
        count,
        value: [raw[0], raw[1], raw[2], raw[3]],
    };
    (entry, data)
}

/// A standalone little-endian TIFF block with IFD0 holding `description`
/// and `orientation`, as embedded in JPEG APP1, PNG eXIf and WebP EXIF.
pub fn build(description: Option<&str>, orientation: Option<u16>) -> Vec<u8> {
    let order = ByteOrder::Little;
    let count = description.is_some() as usize + orientation.is_some() as usize;
    let ifd_len = 2 + count * ENTRY_LEN + 4;
    let data_offset = (8 + ifd_len) as u32;

    let mut entries = Vec::with_capacity(count);
    let mut data = Vec::new();
    if let Some(text) = description {
        let (entry, bytes) = ascii_entry(order, TAG_DESCRIPTION, text, data_offset);
        entries.push(entry);
        data = bytes;
    }
    if let Some(value) = orientation {
        entries.push(Entry::short(order, TAG_ORIENTATION, value));
    }

    let mut out = Vec::with_capacity(8 + ifd_len + data.len());
    out.extend_from_slice(b"II");
    order.put_u16(&mut out, 42);
    order.put_u32(&mut out, 8);
    order.put_u16(&mut out, count as u16);
    for entry in &entries {
        entry.write_to(order, &mut out);
    }
    order.put_u32(&mut out, 0);
    out.extend_from_slice(&data);
    out
}
