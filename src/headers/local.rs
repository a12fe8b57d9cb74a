//! Local file header codec.

use crate::error::{Error, Result};
use crate::timestamp::DosDateTime;

use super::{LOCAL_HEADER_SIZE, LOCAL_SIGNATURE, read_u16_le, read_u32_le};

/// The header immediately preceding each entry's compressed bytes.
///
/// The local header repeats a subset of the central directory fields. After
/// a full parse the central directory is authoritative; the local header is
/// consulted only to find the real start of the compressed data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFileHeader {
    /// Minimum ZIP feature version needed to extract.
    pub version_needed: u16,
    /// General-purpose bit flags (encryption, descriptor, UTF-8).
    pub flags: u16,
    /// Compression method id.
    pub method: u16,
    /// Last-modified time in packed MS-DOS form.
    pub modified: DosDateTime,
    /// CRC-32 of the uncompressed data (zero when a descriptor is used).
    pub crc32: u32,
    /// Compressed payload size (may be a ZIP64 sentinel).
    pub compressed_size: u32,
    /// Uncompressed size (may be a ZIP64 sentinel).
    pub uncompressed_size: u32,
    /// Byte length of the entry name that follows the fixed header.
    pub name_len: u16,
    /// Byte length of the local extra field that follows the name.
    pub extra_len: u16,
}

impl LocalFileHeader {
    /// Decodes a local header from `buf` at `offset`.
    ///
    /// Verifies the `PK\x03\x04` signature first; a mismatch or truncated
    /// window yields [`Error::InvalidLocalHeader`].
    pub fn decode(buf: &[u8], offset: usize) -> Result<Self> {
        if buf.len() < offset + LOCAL_HEADER_SIZE {
            return Err(Error::InvalidLocalHeader {
                offset: offset as u64,
            });
        }
        let w = &buf[offset..offset + LOCAL_HEADER_SIZE];
        if read_u32_le(w, 0) != LOCAL_SIGNATURE {
            return Err(Error::InvalidLocalHeader {
                offset: offset as u64,
            });
        }

        Ok(Self {
            version_needed: read_u16_le(w, 4),
            flags: read_u16_le(w, 6),
            method: read_u16_le(w, 8),
            modified: DosDateTime::new(read_u16_le(w, 12), read_u16_le(w, 10)),
            crc32: read_u32_le(w, 14),
            compressed_size: read_u32_le(w, 18),
            uncompressed_size: read_u32_le(w, 22),
            name_len: read_u16_le(w, 26),
            extra_len: read_u16_le(w, 28),
        })
    }

    /// Encodes the fixed 30-byte header into `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&LOCAL_SIGNATURE.to_le_bytes());
        out.extend_from_slice(&self.version_needed.to_le_bytes());
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.extend_from_slice(&self.method.to_le_bytes());
        out.extend_from_slice(&self.modified.time_word().to_le_bytes());
        out.extend_from_slice(&self.modified.date_word().to_le_bytes());
        out.extend_from_slice(&self.crc32.to_le_bytes());
        out.extend_from_slice(&self.compressed_size.to_le_bytes());
        out.extend_from_slice(&self.uncompressed_size.to_le_bytes());
        out.extend_from_slice(&self.name_len.to_le_bytes());
        out.extend_from_slice(&self.extra_len.to_le_bytes());
    }

    /// Byte offset of the compressed data for a header decoded at
    /// `header_offset`: fixed size plus the variable name and extra blocks.
    pub fn data_offset(&self, header_offset: u64) -> u64 {
        header_offset + LOCAL_HEADER_SIZE as u64 + self.name_len as u64 + self.extra_len as u64
    }
}
