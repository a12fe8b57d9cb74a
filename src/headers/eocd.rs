//! End-of-central-directory records and the tail scan that locates them.

use crate::error::{Error, Result};

use super::{
    END_RECORD_SIZE, END_SIGNATURE, ZIP64_END_RECORD_SIZE, ZIP64_END_SIGNATURE,
    ZIP64_LOCATOR_SIGNATURE, ZIP64_LOCATOR_SIZE, ZIP64_MARKER_U16, ZIP64_MARKER_U32, read_u16_le,
    read_u32_le, read_u64_le,
};

/// The 22-byte trailer record closing every ZIP archive.
///
/// An optional archive comment of up to 65535 bytes follows the fixed
/// record, which is why locating it requires a backward scan.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EndOfCentralDirectory {
    /// Number of this disk.
    pub disk_number: u16,
    /// Disk on which the central directory starts.
    pub cd_start_disk: u16,
    /// Central directory entries on this disk.
    pub disk_entries: u16,
    /// Central directory entries in total.
    pub total_entries: u16,
    /// Central directory size in bytes.
    pub cd_size: u32,
    /// Central directory offset from the start of the archive.
    pub cd_offset: u32,
    /// Archive comment (length is stored in the record).
    pub comment: Vec<u8>,
}

impl EndOfCentralDirectory {
    /// Decodes the record from `buf` at `offset`, including the trailing
    /// comment as far as the buffer allows.
    pub fn decode(buf: &[u8], offset: usize) -> Result<Self> {
        if buf.len() < offset + END_RECORD_SIZE {
            return Err(Error::InvalidEndRecord {
                offset: offset as u64,
            });
        }
        let w = &buf[offset..offset + END_RECORD_SIZE];
        if read_u32_le(w, 0) != END_SIGNATURE {
            return Err(Error::InvalidEndRecord {
                offset: offset as u64,
            });
        }

        let comment_len = read_u16_le(w, 20) as usize;
        let comment_start = offset + END_RECORD_SIZE;
        let comment_end = (comment_start + comment_len).min(buf.len());

        Ok(Self {
            disk_number: read_u16_le(w, 4),
            cd_start_disk: read_u16_le(w, 6),
            disk_entries: read_u16_le(w, 8),
            total_entries: read_u16_le(w, 10),
            cd_size: read_u32_le(w, 12),
            cd_offset: read_u32_le(w, 16),
            comment: buf[comment_start..comment_end].to_vec(),
        })
    }

    /// Encodes the record (and comment) into `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&END_SIGNATURE.to_le_bytes());
        out.extend_from_slice(&self.disk_number.to_le_bytes());
        out.extend_from_slice(&self.cd_start_disk.to_le_bytes());
        out.extend_from_slice(&self.disk_entries.to_le_bytes());
        out.extend_from_slice(&self.total_entries.to_le_bytes());
        out.extend_from_slice(&self.cd_size.to_le_bytes());
        out.extend_from_slice(&self.cd_offset.to_le_bytes());
        out.extend_from_slice(&(self.comment.len() as u16).to_le_bytes());
        out.extend_from_slice(&self.comment);
    }
}

/// The ZIP64 end-of-central-directory record (`PK\x06\x06`).
///
/// Written when any count, size or offset overflows the 16/32-bit fields of
/// the classic record; those fields then hold all-ones sentinels.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Zip64EndOfCentralDirectory {
    /// Version of the software that wrote the record.
    pub version_made_by: u16,
    /// Minimum version needed to read it.
    pub version_needed: u16,
    /// Number of this disk.
    pub disk_number: u32,
    /// Disk on which the central directory starts.
    pub cd_start_disk: u32,
    /// Central directory entries on this disk.
    pub disk_entries: u64,
    /// Central directory entries in total.
    pub total_entries: u64,
    /// Central directory size in bytes.
    pub cd_size: u64,
    /// Central directory offset from the start of the archive.
    pub cd_offset: u64,
}

impl Zip64EndOfCentralDirectory {
    /// Decodes the record from `buf` at `offset`.
    pub fn decode(buf: &[u8], offset: usize) -> Result<Self> {
        if buf.len() < offset + ZIP64_END_RECORD_SIZE {
            return Err(Error::InvalidEndRecord {
                offset: offset as u64,
            });
        }
        let w = &buf[offset..offset + ZIP64_END_RECORD_SIZE];
        if read_u32_le(w, 0) != ZIP64_END_SIGNATURE {
            return Err(Error::InvalidEndRecord {
                offset: offset as u64,
            });
        }

        Ok(Self {
            version_made_by: read_u16_le(w, 12),
            version_needed: read_u16_le(w, 14),
            disk_number: read_u32_le(w, 16),
            cd_start_disk: read_u32_le(w, 20),
            disk_entries: read_u64_le(w, 24),
            total_entries: read_u64_le(w, 32),
            cd_size: read_u64_le(w, 40),
            cd_offset: read_u64_le(w, 48),
        })
    }

    /// Encodes the record followed by its locator into `out`.
    ///
    /// `record_offset` is where this record begins in the output, needed by
    /// the locator that points back at it.
    pub fn encode_with_locator(&self, out: &mut Vec<u8>, record_offset: u64) {
        out.extend_from_slice(&ZIP64_END_SIGNATURE.to_le_bytes());
        // Size of the remainder of the record.
        out.extend_from_slice(&((ZIP64_END_RECORD_SIZE - 12) as u64).to_le_bytes());
        out.extend_from_slice(&self.version_made_by.to_le_bytes());
        out.extend_from_slice(&self.version_needed.to_le_bytes());
        out.extend_from_slice(&self.disk_number.to_le_bytes());
        out.extend_from_slice(&self.cd_start_disk.to_le_bytes());
        out.extend_from_slice(&self.disk_entries.to_le_bytes());
        out.extend_from_slice(&self.total_entries.to_le_bytes());
        out.extend_from_slice(&self.cd_size.to_le_bytes());
        out.extend_from_slice(&self.cd_offset.to_le_bytes());

        // Locator: disk of the ZIP64 end record, its offset, total disks.
        out.extend_from_slice(&ZIP64_LOCATOR_SIGNATURE.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&record_offset.to_le_bytes());
        out.extend_from_slice(&1u32.to_le_bytes());
    }
}

/// The end-record state after a successful tail scan, widened to 64 bits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedEnd {
    /// Central directory entries on this disk.
    pub disk_entries: u64,
    /// Central directory entries in total.
    pub total_entries: u64,
    /// Central directory size in bytes.
    pub cd_size: u64,
    /// Central directory offset.
    pub cd_offset: u64,
    /// Disk number fields (both must be zero; multi-volume is unsupported).
    pub disk_number: u32,
    /// Disk on which the central directory starts.
    pub cd_start_disk: u32,
    /// Archive comment from the classic record.
    pub comment: Vec<u8>,
    /// Whether a ZIP64 end record supplied the 64-bit values.
    pub zip64: bool,
}

/// Locates and parses the end record by scanning backward from the end of
/// the buffer.
///
/// The classic record may be followed by up to 65535 comment bytes, so the
/// scan window is bounded at 65535 + 22 bytes. Only a `'P'` (0x50) byte
/// triggers a full signature comparison, keeping the scan cheap. When a
/// ZIP64 locator precedes the classic record, the ZIP64 end record it
/// points at supplies the 64-bit values.
///
/// Fails with [`Error::InvalidFormat`] when no end record exists in the
/// window.
pub fn locate_end_record(buf: &[u8]) -> Result<LocatedEnd> {
    if buf.len() < END_RECORD_SIZE {
        return Err(Error::InvalidFormat(
            "buffer too small to contain an end of central directory record".into(),
        ));
    }

    let start = buf.len() - END_RECORD_SIZE;
    let window_floor = buf.len().saturating_sub(END_RECORD_SIZE + u16::MAX as usize);

    let mut found = None;
    for i in (window_floor..=start).rev() {
        if buf[i] != 0x50 {
            continue;
        }
        if read_u32_le(buf, i) == END_SIGNATURE {
            found = Some(i);
            break;
        }
    }

    let eocd_offset = found.ok_or_else(|| {
        Error::InvalidFormat("end of central directory record not found".into())
    })?;
    let eocd = EndOfCentralDirectory::decode(buf, eocd_offset)?;

    // A ZIP64 locator, when present, sits immediately before the classic
    // record and points at the ZIP64 end record.
    if eocd_offset >= ZIP64_LOCATOR_SIZE {
        let locator_offset = eocd_offset - ZIP64_LOCATOR_SIZE;
        if read_u32_le(buf, locator_offset) == ZIP64_LOCATOR_SIGNATURE {
            let zip64_offset = read_u64_le(buf, locator_offset + 8);
            let zip64 = Zip64EndOfCentralDirectory::decode(buf, zip64_offset as usize)?;
            return Ok(LocatedEnd {
                disk_entries: resolve_u64(eocd.disk_entries as u64, ZIP64_MARKER_U16 as u64, zip64.disk_entries),
                total_entries: resolve_u64(eocd.total_entries as u64, ZIP64_MARKER_U16 as u64, zip64.total_entries),
                cd_size: resolve_u64(eocd.cd_size as u64, ZIP64_MARKER_U32 as u64, zip64.cd_size),
                cd_offset: resolve_u64(eocd.cd_offset as u64, ZIP64_MARKER_U32 as u64, zip64.cd_offset),
                disk_number: zip64.disk_number,
                cd_start_disk: zip64.cd_start_disk,
                comment: eocd.comment,
                zip64: true,
            });
        }
    }

    Ok(LocatedEnd {
        disk_entries: eocd.disk_entries as u64,
        total_entries: eocd.total_entries as u64,
        cd_size: eocd.cd_size as u64,
        cd_offset: eocd.cd_offset as u64,
        disk_number: eocd.disk_number as u32,
        cd_start_disk: eocd.cd_start_disk as u32,
        comment: eocd.comment,
        zip64: false,
    })
}

/// Takes the ZIP64 value when the classic field holds its sentinel.
fn resolve_u64(classic: u64, marker: u64, zip64: u64) -> u64 {
    if classic == marker { zip64 } else { classic }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_eocd(comment: &[u8]) -> Vec<u8> {
        let record = EndOfCentralDirectory {
            disk_number: 0,
            cd_start_disk: 0,
            disk_entries: 3,
            total_entries: 3,
            cd_size: 150,
            cd_offset: 1000,
            comment: comment.to_vec(),
        };
        let mut buf = Vec::new();
        record.encode(&mut buf);
        buf
    }

    #[test]
    fn test_eocd_roundtrip() {
        let buf = sample_eocd(b"hello");
        let record = EndOfCentralDirectory::decode(&buf, 0).unwrap();
        assert_eq!(record.total_entries, 3);
        assert_eq!(record.comment, b"hello");
    }

    #[test]
    fn test_locate_without_comment() {
        let mut buf = vec![0u8; 512];
        buf.extend_from_slice(&sample_eocd(b""));
        let end = locate_end_record(&buf).unwrap();
        assert_eq!(end.total_entries, 3);
        assert_eq!(end.cd_offset, 1000);
        assert!(!end.zip64);
    }

    #[test]
    fn test_locate_with_comment() {
        let mut buf = vec![0u8; 100];
        buf.extend_from_slice(&sample_eocd(b"archive comment with P bytes: PPPP"));
        let end = locate_end_record(&buf).unwrap();
        assert_eq!(end.comment, b"archive comment with P bytes: PPPP");
    }

    #[test]
    fn test_locate_missing() {
        let buf = vec![0u8; 256];
        assert!(matches!(
            locate_end_record(&buf),
            Err(Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_locate_zip64() {
        let mut buf = vec![0u8; 64];
        let zip64_offset = buf.len() as u64;
        let zip64 = Zip64EndOfCentralDirectory {
            version_made_by: 45,
            version_needed: 45,
            disk_number: 0,
            cd_start_disk: 0,
            disk_entries: 70000,
            total_entries: 70000,
            cd_size: 5000,
            cd_offset: 32,
        };
        zip64.encode_with_locator(&mut buf, zip64_offset);

        let classic = EndOfCentralDirectory {
            disk_entries: ZIP64_MARKER_U16,
            total_entries: ZIP64_MARKER_U16,
            cd_size: ZIP64_MARKER_U32,
            cd_offset: ZIP64_MARKER_U32,
            ..Default::default()
        };
        classic.encode(&mut buf);

        let end = locate_end_record(&buf).unwrap();
        assert!(end.zip64);
        assert_eq!(end.total_entries, 70000);
        assert_eq!(end.cd_offset, 32);
    }
}
