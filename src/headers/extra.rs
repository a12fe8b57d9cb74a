//! ZIP64 extended-information extra field.
//!
//! Extra fields are a sequence of `(id: u16, len: u16, data)` blocks. The
//! ZIP64 field (id `0x0001`) carries 64-bit replacements for header fields
//! whose 32-bit (or 16-bit, for the disk number) slots hold all-ones
//! sentinels. Only the overridden fields are present, in a fixed order:
//! uncompressed size, compressed size, local header offset, disk start.

use super::{ZIP64_MARKER_U16, ZIP64_MARKER_U32, read_u16_le, read_u32_le, read_u64_le};

/// Extra field id of the ZIP64 extended information block.
pub const ZIP64_EXTRA_ID: u16 = 0x0001;

/// Parsed ZIP64 overrides for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Zip64ExtraField {
    /// 64-bit uncompressed size, when the 32-bit field was a sentinel.
    pub uncompressed_size: Option<u64>,
    /// 64-bit compressed size, when the 32-bit field was a sentinel.
    pub compressed_size: Option<u64>,
    /// 64-bit local header offset, when the 32-bit field was a sentinel.
    pub local_header_offset: Option<u64>,
    /// 32-bit disk start, when the 16-bit field was a sentinel.
    pub disk_start: Option<u32>,
}

impl Zip64ExtraField {
    /// Walks an entry's extra-field bytes and extracts the ZIP64 overrides.
    ///
    /// Which sub-fields exist depends on which header fields hold their
    /// sentinel, so the caller passes the classic values. Truncated or
    /// absent blocks simply produce no overrides; extra fields are
    /// best-effort by format design.
    pub fn parse(
        extra: &[u8],
        uncompressed_size: u32,
        compressed_size: u32,
        local_header_offset: u32,
        disk_start: u16,
    ) -> Self {
        let mut result = Self::default();
        let mut pos = 0usize;

        while pos + 4 <= extra.len() {
            let id = read_u16_le(extra, pos);
            let len = read_u16_le(extra, pos + 2) as usize;
            let data_start = pos + 4;
            let data_end = data_start + len;
            if data_end > extra.len() {
                break;
            }
            if id == ZIP64_EXTRA_ID {
                let data = &extra[data_start..data_end];
                let mut field_pos = 0usize;

                if uncompressed_size == ZIP64_MARKER_U32 && field_pos + 8 <= data.len() {
                    result.uncompressed_size = Some(read_u64_le(data, field_pos));
                    field_pos += 8;
                }
                if compressed_size == ZIP64_MARKER_U32 && field_pos + 8 <= data.len() {
                    result.compressed_size = Some(read_u64_le(data, field_pos));
                    field_pos += 8;
                }
                if local_header_offset == ZIP64_MARKER_U32 && field_pos + 8 <= data.len() {
                    result.local_header_offset = Some(read_u64_le(data, field_pos));
                    field_pos += 8;
                }
                if disk_start == ZIP64_MARKER_U16 && field_pos + 4 <= data.len() {
                    result.disk_start = Some(read_u32_le(data, field_pos));
                }
                break;
            }
            pos = data_end;
        }

        result
    }

    /// Returns true if no override is present.
    pub fn is_empty(&self) -> bool {
        self.uncompressed_size.is_none()
            && self.compressed_size.is_none()
            && self.local_header_offset.is_none()
            && self.disk_start.is_none()
    }
}

/// Builds a ZIP64 extra field containing the given overrides, in the
/// order the format requires. Returns an empty vector when nothing
/// overflows.
pub fn build_zip64_extra(
    uncompressed_size: Option<u64>,
    compressed_size: Option<u64>,
    local_header_offset: Option<u64>,
) -> Vec<u8> {
    let mut data = Vec::new();
    if let Some(v) = uncompressed_size {
        data.extend_from_slice(&v.to_le_bytes());
    }
    if let Some(v) = compressed_size {
        data.extend_from_slice(&v.to_le_bytes());
    }
    if let Some(v) = local_header_offset {
        data.extend_from_slice(&v.to_le_bytes());
    }
    if data.is_empty() {
        return data;
    }

    let mut out = Vec::with_capacity(4 + data.len());
    out.extend_from_slice(&ZIP64_EXTRA_ID.to_le_bytes());
    out.extend_from_slice(&(data.len() as u16).to_le_bytes());
    out.extend_from_slice(&data);
    out
}

/// Strips any ZIP64 block from an extra field, leaving foreign blocks
/// intact. Used on save so stale overrides never survive a rewrite.
pub fn strip_zip64_extra(extra: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(extra.len());
    let mut pos = 0usize;
    while pos + 4 <= extra.len() {
        let id = read_u16_le(extra, pos);
        let len = read_u16_le(extra, pos + 2) as usize;
        let block_end = (pos + 4 + len).min(extra.len());
        if id != ZIP64_EXTRA_ID {
            out.extend_from_slice(&extra[pos..block_end]);
        }
        pos = block_end;
    }
    out
}
