//! Data descriptor trailer for streamed entries.
//!
//! When an entry was written in streaming mode (general-purpose flag bit 3),
//! its CRC and sizes were unknown at local-header time and live in a trailer
//! immediately after the compressed data. The trailer's `PK\x07\x08`
//! signature is technically optional, so locating it involves sniffing.
//!
//! This implementation tightens the historical heuristic: the signed form is
//! taken at face value, while the legacy unsigned 12-byte form is accepted
//! only when its CRC field matches the CRC the central directory already
//! declared for the entry. A crafted trailer that matches neither is
//! reported as missing rather than guessed at.

use super::{DESCRIPTOR_SIGNATURE, read_u32_le, read_u64_le};

/// A parsed data descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataDescriptor {
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Compressed payload size.
    pub compressed_size: u64,
    /// Uncompressed size.
    pub uncompressed_size: u64,
}

impl DataDescriptor {
    /// Locates the descriptor that follows compressed data ending at
    /// `data_end`.
    ///
    /// `zip64` selects 8-byte size fields (20/24-byte records) over the
    /// classic 4-byte ones (12/16-byte records). `expected_crc` is the
    /// central directory's CRC, used to validate the signature-less legacy
    /// form. Returns `None` when no acceptable descriptor is present.
    pub fn locate(buf: &[u8], data_end: usize, zip64: bool, expected_crc: u32) -> Option<Self> {
        let size_width = if zip64 { 8usize } else { 4usize };

        // Preferred: the signed form.
        if buf.len() >= data_end + 4 + 4 + 2 * size_width
            && read_u32_le(buf, data_end) == DESCRIPTOR_SIGNATURE
        {
            return Some(Self::read_fields(buf, data_end + 4, zip64));
        }

        // Legacy unsigned form: fields begin directly at data_end. Only
        // trusted when the CRC agrees with the central directory.
        if buf.len() >= data_end + 4 + 2 * size_width && read_u32_le(buf, data_end) == expected_crc
        {
            return Some(Self::read_fields(buf, data_end, zip64));
        }

        None
    }

    fn read_fields(buf: &[u8], offset: usize, zip64: bool) -> Self {
        let crc32 = read_u32_le(buf, offset);
        if zip64 {
            Self {
                crc32,
                compressed_size: read_u64_le(buf, offset + 4),
                uncompressed_size: read_u64_le(buf, offset + 12),
            }
        } else {
            Self {
                crc32,
                compressed_size: read_u32_le(buf, offset + 4) as u64,
                uncompressed_size: read_u32_le(buf, offset + 8) as u64,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_signed_form() {
        let mut buf = vec![0xAA; 10];
        buf.extend_from_slice(&DESCRIPTOR_SIGNATURE.to_le_bytes());
        buf.extend_from_slice(&0x11223344u32.to_le_bytes());
        buf.extend_from_slice(&100u32.to_le_bytes());
        buf.extend_from_slice(&250u32.to_le_bytes());

        let d = DataDescriptor::locate(&buf, 10, false, 0x11223344).unwrap();
        assert_eq!(d.crc32, 0x11223344);
        assert_eq!(d.compressed_size, 100);
        assert_eq!(d.uncompressed_size, 250);
    }

    #[test]
    fn test_locate_legacy_form_requires_crc_match() {
        let mut buf = vec![0xAA; 10];
        buf.extend_from_slice(&0x11223344u32.to_le_bytes());
        buf.extend_from_slice(&100u32.to_le_bytes());
        buf.extend_from_slice(&250u32.to_le_bytes());

        let d = DataDescriptor::locate(&buf, 10, false, 0x11223344).unwrap();
        assert_eq!(d.compressed_size, 100);

        // Same bytes, wrong expected CRC: rejected, not guessed.
        assert!(DataDescriptor::locate(&buf, 10, false, 0xFFFFFFFF).is_none());
    }

    #[test]
    fn test_locate_zip64_form() {
        let mut buf = vec![0u8; 4];
        buf.extend_from_slice(&DESCRIPTOR_SIGNATURE.to_le_bytes());
        buf.extend_from_slice(&0xCAFEu32.to_le_bytes());
        buf.extend_from_slice(&0x1_0000_0001u64.to_le_bytes());
        buf.extend_from_slice(&0x2_0000_0002u64.to_le_bytes());

        let d = DataDescriptor::locate(&buf, 4, true, 0xCAFE).unwrap();
        assert_eq!(d.compressed_size, 0x1_0000_0001);
        assert_eq!(d.uncompressed_size, 0x2_0000_0002);
    }

    #[test]
    fn test_locate_truncated() {
        let mut buf = vec![0u8; 4];
        buf.extend_from_slice(&DESCRIPTOR_SIGNATURE.to_le_bytes());
        buf.extend_from_slice(&0xCAFEu32.to_le_bytes());
        assert!(DataDescriptor::locate(&buf, 4, false, 0xCAFE).is_none());
    }
}
