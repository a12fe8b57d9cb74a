//! Central directory header codec.

use crate::error::{Error, Result};
use crate::timestamp::DosDateTime;

use super::local::LocalFileHeader;
use super::{CENTRAL_HEADER_SIZE, CENTRAL_SIGNATURE, read_u16_le, read_u32_le};

/// One entry's record in the central directory.
///
/// The central directory is the authoritative index of the archive; every
/// field the local header also carries is trusted from here after a full
/// parse. This type and [`LocalFileHeader`] are deliberately distinct values
/// related by [`to_local`][CentralFileHeader::to_local] — the two records
/// have different extra fields and must never share one mutable object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralFileHeader {
    /// Version (and host system) of the software that made the entry.
    pub version_made_by: u16,
    /// Minimum ZIP feature version needed to extract.
    pub version_needed: u16,
    /// General-purpose bit flags.
    pub flags: u16,
    /// Compression method id.
    pub method: u16,
    /// Last-modified time in packed MS-DOS form.
    pub modified: DosDateTime,
    /// CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Compressed payload size (may be a ZIP64 sentinel).
    pub compressed_size: u32,
    /// Uncompressed size (may be a ZIP64 sentinel).
    pub uncompressed_size: u32,
    /// Byte length of the entry name.
    pub name_len: u16,
    /// Byte length of the central extra field.
    pub extra_len: u16,
    /// Byte length of the entry comment.
    pub comment_len: u16,
    /// Disk on which the entry starts (may be a ZIP64 sentinel).
    pub disk_start: u16,
    /// Internal file attributes (bit 0: apparent text file).
    pub internal_attrs: u16,
    /// External file attributes (unix mode in the high 16 bits on unix).
    pub external_attrs: u32,
    /// Offset of the entry's local header (may be a ZIP64 sentinel).
    pub local_header_offset: u32,
}

impl CentralFileHeader {
    /// Decodes a central header from `buf` at `offset`.
    ///
    /// Verifies the `PK\x01\x02` signature first; a mismatch or truncated
    /// window yields [`Error::InvalidCentralHeader`].
    pub fn decode(buf: &[u8], offset: usize) -> Result<Self> {
        if buf.len() < offset + CENTRAL_HEADER_SIZE {
            return Err(Error::InvalidCentralHeader {
                offset: offset as u64,
            });
        }
        let w = &buf[offset..offset + CENTRAL_HEADER_SIZE];
        if read_u32_le(w, 0) != CENTRAL_SIGNATURE {
            return Err(Error::InvalidCentralHeader {
                offset: offset as u64,
            });
        }

        Ok(Self {
            version_made_by: read_u16_le(w, 4),
            version_needed: read_u16_le(w, 6),
            flags: read_u16_le(w, 8),
            method: read_u16_le(w, 10),
            modified: DosDateTime::new(read_u16_le(w, 14), read_u16_le(w, 12)),
            crc32: read_u32_le(w, 16),
            compressed_size: read_u32_le(w, 20),
            uncompressed_size: read_u32_le(w, 24),
            name_len: read_u16_le(w, 28),
            extra_len: read_u16_le(w, 30),
            comment_len: read_u16_le(w, 32),
            disk_start: read_u16_le(w, 34),
            internal_attrs: read_u16_le(w, 36),
            external_attrs: read_u32_le(w, 38),
            local_header_offset: read_u32_le(w, 42),
        })
    }

    /// Encodes the fixed 46-byte header into `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&CENTRAL_SIGNATURE.to_le_bytes());
        out.extend_from_slice(&self.version_made_by.to_le_bytes());
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
        out.extend_from_slice(&self.comment_len.to_le_bytes());
        out.extend_from_slice(&self.disk_start.to_le_bytes());
        out.extend_from_slice(&self.internal_attrs.to_le_bytes());
        out.extend_from_slice(&self.external_attrs.to_le_bytes());
        out.extend_from_slice(&self.local_header_offset.to_le_bytes());
    }

    /// Derives the matching local header.
    ///
    /// The local extra field is independent of the central one, so the
    /// caller supplies its length.
    pub fn to_local(&self, local_extra_len: u16) -> LocalFileHeader {
        LocalFileHeader {
            version_needed: self.version_needed,
            flags: self.flags,
            method: self.method,
            modified: self.modified,
            crc32: self.crc32,
            compressed_size: self.compressed_size,
            uncompressed_size: self.uncompressed_size,
            name_len: self.name_len,
            extra_len: local_extra_len,
        }
    }

    /// Total on-disk size of this record including its variable blocks.
    pub fn total_size(&self) -> usize {
        CENTRAL_HEADER_SIZE
            + self.name_len as usize
            + self.extra_len as usize
            + self.comment_len as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CentralFileHeader {
        CentralFileHeader {
            version_made_by: 0x031E, // unix, 3.0
            version_needed: 20,
            flags: 0x0800,
            method: 8,
            modified: DosDateTime::from_unix_secs(1_686_832_496),
            crc32: 0xCAFEBABE,
            compressed_size: 512,
            uncompressed_size: 2048,
            name_len: 12,
            extra_len: 0,
            comment_len: 5,
            disk_start: 0,
            internal_attrs: 0,
            external_attrs: 0o100644 << 16,
            local_header_offset: 4096,
        }
    }

    #[test]
    fn test_roundtrip() {
        let header = sample();
        let mut buf = Vec::new();
        header.encode(&mut buf);
        assert_eq!(buf.len(), CENTRAL_HEADER_SIZE);
        assert_eq!(CentralFileHeader::decode(&buf, 0).unwrap(), header);
    }

    #[test]
    fn test_bad_signature() {
        let mut buf = Vec::new();
        sample().encode(&mut buf);
        buf[1] = 0;
        assert!(matches!(
            CentralFileHeader::decode(&buf, 0),
            Err(Error::InvalidCentralHeader { offset: 0 })
        ));
    }

    #[test]
    fn test_to_local_carries_shared_fields() {
        let central = sample();
        let local = central.to_local(4);
        assert_eq!(local.method, central.method);
        assert_eq!(local.crc32, central.crc32);
        assert_eq!(local.modified, central.modified);
        assert_eq!(local.extra_len, 4);
    }

    #[test]
    fn test_total_size() {
        assert_eq!(sample().total_size(), 46 + 12 + 5);
    }
}
