// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Just enough Exif parsing to find the YCbCrPositioning tag in IFD0.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use num_traits::FromPrimitive;

use crate::upsample::ChromaSiting;

const TAG_YCBCR_POSITIONING: u16 = 0x0213;
const TYPE_SHORT: u16 = 3;
const IFD_ENTRY_SIZE: usize = 12;
/// "Exif\0\0" precedes the TIFF header; offsets are relative to the latter.
const TIFF_START: usize = 6;

/// Returns the chroma siting declared by an APP1 payload, or `None` if the
/// payload is not Exif or carries no positioning tag.
pub(crate) fn read_chroma_siting(payload: &[u8]) -> Option<ChromaSiting> {
    if payload.len() < 18 {
        return None;
    }
    match &payload[..10] {
        b"Exif\0\0II*\0" => scan_ifd0::<LittleEndian>(payload),
        b"Exif\0\0MM\0*" => scan_ifd0::<BigEndian>(payload),
        _ => None,
    }
}

fn scan_ifd0<B: ByteOrder>(payload: &[u8]) -> Option<ChromaSiting> {
    let ifd = (B::read_u32(&payload[10..14]) as usize).checked_add(TIFF_START)?;
    if ifd < 14 || ifd > payload.len() - 2 {
        return None;
    }
    let entries = &payload[ifd..];
    let count = B::read_u16(entries) as usize;
    if count > (entries.len() - 2) / IFD_ENTRY_SIZE {
        return None;
    }
    entries[2..]
        .chunks_exact(IFD_ENTRY_SIZE)
        .take(count)
        .find(|entry| {
            B::read_u16(&entry[0..2]) == TAG_YCBCR_POSITIONING
                && B::read_u16(&entry[2..4]) == TYPE_SHORT
                && B::read_u32(&entry[4..8]) == 1
        })
        .map(|entry| {
            ChromaSiting::from_u16(B::read_u16(&entry[8..10])).unwrap_or(ChromaSiting::Centered)
        })
}

#[cfg(test)]
mod test {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::Write;

    fn exif<B: ByteOrder>(entries: &[(u16, u16, u32, u16)]) -> Vec<u8> {
        let mut out = b"Exif\0\0".to_vec();
        let mut magic = [0; 4];
        B::write_u16(&mut magic[..2], 0x4949);
        B::write_u16(&mut magic[2..], 42);
        // 0x4949 reads the same both ways; the TIFF magic number tells them apart.
        if magic[2] == 0 {
            magic[..2].copy_from_slice(b"MM");
        }
        out.write_all(&magic).unwrap();
        out.write_u32::<B>(8).unwrap();
        out.write_u16::<B>(entries.len() as u16).unwrap();
        for &(tag, ty, count, value) in entries {
            out.write_u16::<B>(tag).unwrap();
            out.write_u16::<B>(ty).unwrap();
            out.write_u32::<B>(count).unwrap();
            out.write_u16::<B>(value).unwrap();
            out.write_u16::<B>(0).unwrap();
        }
        out.write_u32::<B>(0).unwrap();
        out
    }

    #[test]
    fn co_sited_in_both_byte_orders() {
        let entries = [(0x010f, 2, 4, 0), (0x0213, 3, 1, 2)];
        assert_eq!(
            read_chroma_siting(&exif::<LittleEndian>(&entries)),
            Some(ChromaSiting::CoSited)
        );
        assert_eq!(
            read_chroma_siting(&exif::<BigEndian>(&entries)),
            Some(ChromaSiting::CoSited)
        );
    }

    #[test]
    fn centered_and_unknown_values() {
        assert_eq!(
            read_chroma_siting(&exif::<LittleEndian>(&[(0x0213, 3, 1, 1)])),
            Some(ChromaSiting::Centered)
        );
        assert_eq!(
            read_chroma_siting(&exif::<LittleEndian>(&[(0x0213, 3, 1, 7)])),
            Some(ChromaSiting::Centered)
        );
    }

    #[test]
    fn mismatched_entries_are_ignored() {
        // Wrong type, then wrong count.
        let entries = [(0x0213, 4, 1, 2), (0x0213, 3, 2, 2)];
        assert_eq!(read_chroma_siting(&exif::<BigEndian>(&entries)), None);
    }

    #[test]
    fn rejects_bad_headers() {
        assert_eq!(read_chroma_siting(b"Exif\0\0II*\0"), None);
        let mut data = exif::<LittleEndian>(&[(0x0213, 3, 1, 2)]);
        data[6] = b'X';
        assert_eq!(read_chroma_siting(&data), None);
        assert_eq!(read_chroma_siting(b"http://ns.adobe.com/xap/1.0/\0"), None);
    }

    #[test]
    fn rejects_out_of_range_offsets() {
        let mut data = exif::<LittleEndian>(&[(0x0213, 3, 1, 2)]);
        // IFD offset past the end.
        data[10..14].copy_from_slice(&1000u32.to_le_bytes());
        assert_eq!(read_chroma_siting(&data), None);
        // IFD offset inside the header.
        data[10..14].copy_from_slice(&4u32.to_le_bytes());
        assert_eq!(read_chroma_siting(&data), None);
        // Overflowing offset.
        data[10..14].copy_from_slice(&u32::MAX.to_le_bytes());
        assert_eq!(read_chroma_siting(&data), None);
    }

    #[test]
    fn rejects_excessive_entry_count() {
        let mut data = exif::<LittleEndian>(&[(0x0213, 3, 1, 2)]);
        data[14..16].copy_from_slice(&3u16.to_le_bytes());
        assert_eq!(read_chroma_siting(&data), None);
    }
}
