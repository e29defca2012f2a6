//! Minimal JPEG/EXIF walker for the orientation tag
//!
//! Only the first [`SCAN_WINDOW`] bytes are inspected. Every read is bounds
//! checked; anything unexpected ends the walk with `None`.

use super::Orientation;

/// Bytes inspected from the start of the buffer
pub const SCAN_WINDOW: usize = 64 * 1024;

const SOI: u16 = 0xFFD8;
const EOI: u16 = 0xFFD9;
const SOS: u16 = 0xFFDA;
const APP1: u16 = 0xFFE1;
const TAG_ORIENTATION: u16 = 0x0112;
const EXIF_HEADER: &[u8; 6] = b"Exif\0\0";
const IFD_ENTRY_LEN: usize = 12;

#[derive(Clone, Copy)]
enum ByteOrder {
    Little,
    Big,
}

struct Reader<'a> {
    data: &'a [u8],
    order: ByteOrder,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8], order: ByteOrder) -> Self {
        Self { data, order }
    }

    fn u16_at(&self, offset: usize) -> Option<u16> {
        let bytes: [u8; 2] = self.data.get(offset..offset.checked_add(2)?)?.try_into().ok()?;
        Some(match self.order {
            ByteOrder::Little => u16::from_le_bytes(bytes),
            ByteOrder::Big => u16::from_be_bytes(bytes),
        })
    }

    fn u32_at(&self, offset: usize) -> Option<u32> {
        let bytes: [u8; 4] = self.data.get(offset..offset.checked_add(4)?)?.try_into().ok()?;
        Some(match self.order {
            ByteOrder::Little => u32::from_le_bytes(bytes),
            ByteOrder::Big => u32::from_be_bytes(bytes),
        })
    }
}

/// Raw value of tag 0x0112 from the first EXIF segment that carries it
///
/// Returns `None` for non-JPEG input, missing EXIF, a missing tag, or any
/// malformed structure. The value is not range checked.
pub fn read_orientation_tag(bytes: &[u8]) -> Option<u16> {
    let window = &bytes[..bytes.len().min(SCAN_WINDOW)];
    let markers = Reader::new(window, ByteOrder::Big);
    if markers.u16_at(0)? != SOI {
        return None;
    }

    let mut offset = 2usize;
    loop {
        let marker = markers.u16_at(offset)?;
        if marker & 0xFF00 != 0xFF00 || marker == SOS || marker == EOI {
            return None;
        }
        let segment_len = markers.u16_at(offset + 2)? as usize;
        if segment_len < 2 {
            return None;
        }
        let body_start = offset + 4;
        let body_end = (offset + 2 + segment_len).min(window.len());
        if marker == APP1 {
            if let Some(value) = window.get(body_start..body_end).and_then(parse_app1) {
                return Some(value);
            }
        }
        offset += 2 + segment_len;
    }
}

/// Orientation from the JPEG EXIF block, identity when absent or invalid
pub fn read_exif_orientation(bytes: &[u8]) -> Orientation {
    read_orientation_tag(bytes)
        .and_then(Orientation::from_tag)
        .unwrap_or(Orientation::Identity)
}

fn parse_app1(segment: &[u8]) -> Option<u16> {
    if !segment.starts_with(EXIF_HEADER) {
        return None;
    }
    let tiff = &segment[EXIF_HEADER.len()..];
    let order = match tiff.get(..2)? {
        b"II" => ByteOrder::Little,
        b"MM" => ByteOrder::Big,
        _ => return None,
    };
    let reader = Reader::new(tiff, order);
    if reader.u16_at(2)? != 42 {
        return None;
    }
    let ifd0 = reader.u32_at(4)? as usize;
    if ifd0 < 8 {
        return None;
    }

    let entries = reader.u16_at(ifd0)? as usize;
    (0..entries).find_map(|i| {
        let entry = ifd0 + 2 + i * IFD_ENTRY_LEN;
        if reader.u16_at(entry)? == TAG_ORIENTATION {
            reader.u16_at(entry + 8)
        } else {
            None
        }
    })
}
