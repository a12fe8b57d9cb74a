//! Archive entry model.
//!
//! An [`Entry`] is one file or directory inside the archive. Entries loaded
//! from an existing archive keep only their central-directory metadata and a
//! payload offset into the backing buffer; the compressed bytes are not
//! touched until the entry's content is actually requested. Entries added
//! in memory carry their uncompressed content until the next serialization
//! compresses them into place.

use crate::codec::CompressionMethod;
use crate::crypto::Password;
use crate::error::{Error, Result};
use crate::headers::{CentralFileHeader, FLAG_ENCRYPTED, FLAG_UTF8};
use crate::timestamp::DosDateTime;

/// Host system "made by" id for Unix, in the high byte of `version_made_by`.
const MADE_BY_UNIX: u16 = 3 << 8;
/// Minimum extract version for STORED/DEFLATE entries.
pub(crate) const VERSION_DEFAULT: u16 = 20;
/// Minimum extract version once ZIP64 fields are in play.
pub(crate) const VERSION_ZIP64: u16 = 45;
/// DOS directory attribute bit.
const DOS_DIRECTORY: u32 = 0x10;

/// Where an entry's payload currently lives.
#[derive(Debug, Clone)]
pub(crate) enum EntryData {
    /// Compressed payload sits in the archive buffer at the recorded
    /// local-header offset.
    Archived {
        /// Offset of the entry's local file header.
        local_header_offset: u64,
    },
    /// Uncompressed content held in memory, not yet serialized.
    Fresh {
        /// The entry's uncompressed bytes.
        content: Vec<u8>,
        /// Password for legacy-cipher encryption at serialization time.
        password: Option<Password>,
    },
    /// A directory implied by child paths; it has no record in the
    /// archive and is never serialized.
    Synthesized,
}

/// One file or directory in the archive.
#[derive(Debug, Clone)]
pub struct Entry {
    pub(crate) name: String,
    pub(crate) comment: String,
    /// Extra-field bytes as loaded; ZIP64 blocks are regenerated on save.
    pub(crate) extra: Vec<u8>,
    pub(crate) version_made_by: u16,
    pub(crate) version_needed: u16,
    pub(crate) flags: u16,
    pub(crate) method: u16,
    pub(crate) modified: DosDateTime,
    pub(crate) crc32: u32,
    pub(crate) compressed_size: u64,
    pub(crate) uncompressed_size: u64,
    pub(crate) internal_attrs: u16,
    pub(crate) external_attrs: u32,
    pub(crate) data: EntryData,
}

impl Entry {
    /// Builds an entry from a decoded central-directory header.
    ///
    /// `local_header_offset` is the ZIP64-resolved offset; name and comment
    /// bytes arrive separately because the header struct only records their
    /// lengths.
    pub(crate) fn from_central(
        header: &CentralFileHeader,
        name: String,
        extra: Vec<u8>,
        comment: String,
        local_header_offset: u64,
        compressed_size: u64,
        uncompressed_size: u64,
    ) -> Self {
        Self {
            name,
            comment,
            extra,
            version_made_by: header.version_made_by,
            version_needed: header.version_needed,
            flags: header.flags,
            method: header.method,
            modified: header.modified,
            crc32: header.crc32,
            compressed_size,
            uncompressed_size,
            internal_attrs: header.internal_attrs,
            external_attrs: header.external_attrs,
            data: EntryData::Archived {
                local_header_offset,
            },
        }
    }

    /// Builds a fresh file entry from in-memory content.
    pub(crate) fn new_file(
        name: String,
        content: Vec<u8>,
        method: CompressionMethod,
        modified: DosDateTime,
        password: Option<Password>,
    ) -> Self {
        let crc32 = crate::checksum::Crc32::compute(&content);
        let uncompressed_size = content.len() as u64;
        let mut flags = FLAG_UTF8;
        if password.is_some() {
            flags |= FLAG_ENCRYPTED;
        }
        Self {
            name,
            comment: String::new(),
            extra: Vec::new(),
            version_made_by: MADE_BY_UNIX | VERSION_DEFAULT,
            version_needed: VERSION_DEFAULT,
            flags,
            method: method.raw(),
            modified,
            crc32,
            compressed_size: 0, // settled at serialization
            uncompressed_size,
            internal_attrs: 0,
            external_attrs: (0o100644 << 16),
            data: EntryData::Fresh { content, password },
        }
    }

    /// Builds a fresh directory entry (trailing slash, no content).
    pub(crate) fn new_directory(name: String, modified: DosDateTime) -> Self {
        debug_assert!(name.ends_with('/'));
        Self {
            name,
            comment: String::new(),
            extra: Vec::new(),
            version_made_by: MADE_BY_UNIX | VERSION_DEFAULT,
            version_needed: VERSION_DEFAULT,
            flags: FLAG_UTF8,
            method: CompressionMethod::Stored.raw(),
            modified,
            crc32: 0,
            compressed_size: 0,
            uncompressed_size: 0,
            internal_attrs: 0,
            external_attrs: (0o040755 << 16) | DOS_DIRECTORY,
            data: EntryData::Fresh {
                content: Vec::new(),
                password: None,
            },
        }
    }

    /// Builds a directory entry implied by a child path but absent from
    /// the central directory.
    pub(crate) fn synthesized_directory(name: String) -> Self {
        let mut entry = Self::new_directory(name, DosDateTime::default());
        entry.data = EntryData::Synthesized;
        entry
    }

    /// The entry's path inside the archive, forward-slash separated.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Renames the entry. Fails when the encoded name would not fit the
    /// format's 16-bit length field. Exposed through
    /// `Archive::rename_entry`, which also maintains the name index.
    pub(crate) fn set_name(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if name.len() > u16::MAX as usize {
            return Err(Error::NameTooLong { len: name.len() });
        }
        self.name = name;
        Ok(())
    }

    /// The entry comment, empty when none was set.
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Sets the entry comment, bounded by the format's 16-bit length field.
    pub fn set_comment(&mut self, comment: impl Into<String>) -> Result<()> {
        let comment = comment.into();
        if comment.len() > u16::MAX as usize {
            return Err(Error::CommentTooLong { len: comment.len() });
        }
        self.comment = comment;
        Ok(())
    }

    /// True when the entry is a directory (name ends with `/`).
    pub fn is_directory(&self) -> bool {
        self.name.ends_with('/')
    }

    /// True when the payload is encrypted with the legacy cipher.
    pub fn is_encrypted(&self) -> bool {
        self.flags & FLAG_ENCRYPTED != 0
    }

    /// True for directories the loader invented to represent intermediate
    /// path components; such entries have no record in the archive.
    pub fn is_synthesized(&self) -> bool {
        matches!(self.data, EntryData::Synthesized)
    }

    /// The entry's compression method.
    pub fn method(&self) -> CompressionMethod {
        CompressionMethod::from_raw(self.method)
    }

    /// CRC-32 of the uncompressed content.
    pub fn crc32(&self) -> u32 {
        self.crc32
    }

    /// Compressed payload size in bytes. Zero for entries added since the
    /// last serialization.
    pub fn compressed_size(&self) -> u64 {
        self.compressed_size
    }

    /// Uncompressed content size in bytes.
    pub fn uncompressed_size(&self) -> u64 {
        self.uncompressed_size
    }

    /// Last-modified timestamp.
    pub fn modified(&self) -> DosDateTime {
        self.modified
    }

    /// Sets the last-modified timestamp.
    pub fn set_modified(&mut self, modified: DosDateTime) {
        self.modified = modified;
    }

    /// Unix permission bits, when the entry was made on a Unix host.
    pub fn unix_mode(&self) -> Option<u32> {
        if self.version_made_by & 0xFF00 == MADE_BY_UNIX && self.external_attrs >> 16 != 0 {
            Some(self.external_attrs >> 16)
        } else {
            None
        }
    }

    /// Sets Unix permission bits, marking the entry as Unix-made and
    /// keeping the DOS directory bit consistent.
    pub fn set_unix_mode(&mut self, mode: u32) {
        self.version_made_by = MADE_BY_UNIX | (self.version_made_by & 0xFF);
        let dos_bits = if self.is_directory() { DOS_DIRECTORY } else { 0 };
        self.external_attrs = (mode << 16) | dos_bits;
    }

    /// General-purpose flags word.
    pub fn flags(&self) -> u16 {
        self.flags
    }

    /// True when sizes and CRC were deferred to a trailing data descriptor.
    pub fn uses_descriptor(&self) -> bool {
        self.flags & crate::headers::FLAG_DATA_DESCRIPTOR != 0
    }
}
