//! In-memory archive index and (de)serialization.
//!
//! An [`Archive`] keeps the raw archive bytes plus a parsed entry index.
//! Loading is two-phase: a backward tail scan finds the end record, then a
//! single forward walk over the central directory builds the index. Entry
//! payloads stay untouched in the buffer until read.
//!
//! Mutation is index-only. Added entries carry their content in memory and
//! deleted entries simply leave the index; nothing is rewritten until
//! [`Archive::to_bytes`] serializes the whole archive from scratch, at
//! which point unchanged payloads are copied compressed as-is and fresh
//! entries are compressed (and encrypted) into place.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use log::{debug, trace, warn};

use crate::checksum::Crc32;
use crate::codec::{self, CompressionMethod};
use crate::crypto::{self, Password, SaltPolicy};
use crate::entry::{Entry, EntryData, VERSION_ZIP64};
use crate::error::{Error, Result};
use crate::headers::{
    CENTRAL_HEADER_SIZE, CentralFileHeader, DataDescriptor, EndOfCentralDirectory,
    FLAG_DATA_DESCRIPTOR, LocalFileHeader, ZIP64_MARKER_U16, ZIP64_MARKER_U32,
    Zip64EndOfCentralDirectory, build_zip64_extra, locate_end_record, strip_zip64_extra,
    Zip64ExtraField,
};
use crate::path::ancestor_dirs;
use crate::timestamp::DosDateTime;

/// Options for entries added from memory.
#[derive(Debug, Clone, Default)]
pub struct EntryOptions {
    method: Option<CompressionMethod>,
    modified: Option<DosDateTime>,
    unix_mode: Option<u32>,
    comment: Option<String>,
    password: Option<Password>,
}

impl EntryOptions {
    /// Default options: auto-selected method, current time, no password.
    pub fn new() -> Self {
        Self::default()
    }

    /// Forces a compression method instead of the automatic choice.
    pub fn method(mut self, method: CompressionMethod) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the last-modified timestamp.
    pub fn modified(mut self, modified: DosDateTime) -> Self {
        self.modified = Some(modified);
        self
    }

    /// Sets Unix permission bits.
    pub fn unix_mode(mut self, mode: u32) -> Self {
        self.unix_mode = Some(mode);
        self
    }

    /// Sets the entry comment.
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Encrypts the entry with the legacy cipher at serialization time.
    pub fn password(mut self, password: impl Into<Password>) -> Self {
        self.password = Some(password.into());
        self
    }
}

/// A ZIP archive held entirely in memory.
pub struct Archive {
    /// Raw bytes of the last loaded or serialized archive.
    buffer: Vec<u8>,
    /// Real entries, in central-directory order.
    entries: Vec<Entry>,
    /// Entry index by exact name.
    index: HashMap<String, usize>,
    /// Directories implied by child paths but absent from the central
    /// directory. Listed, never serialized.
    synthesized: Vec<Entry>,
    comment: String,
    sort_on_save: bool,
    compression_level: u32,
    salt_policy: SaltPolicy,
}

impl Default for Archive {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Archive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("entries", &self.entries.len())
            .field("synthesized", &self.synthesized.len())
            .field("buffer_len", &self.buffer.len())
            .field("comment", &self.comment)
            .finish_non_exhaustive()
    }
}

impl Archive {
    /// Creates an empty archive.
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            entries: Vec::new(),
            index: HashMap::new(),
            synthesized: Vec::new(),
            comment: String::new(),
            sort_on_save: true,
            compression_level: 6,
            salt_policy: SaltPolicy::Random,
        }
    }

    /// Parses an archive from its raw bytes.
    pub fn from_bytes(buffer: Vec<u8>) -> Result<Self> {
        let end = locate_end_record(&buffer)?;
        if end.disk_number != 0 || end.cd_start_disk != 0 {
            return Err(Error::InvalidFormat(format!(
                "multi-volume archives are not supported (disk {}, central directory on disk {})",
                end.disk_number, end.cd_start_disk
            )));
        }
        if end.disk_entries != end.total_entries {
            return Err(Error::InvalidFormat(format!(
                "entry counts disagree ({} on this disk, {} total)",
                end.disk_entries, end.total_entries
            )));
        }

        let available = buffer.len() as u64;
        let cd_end = end.cd_offset.checked_add(end.cd_size).ok_or_else(|| {
            Error::CentralDirectoryOverrun {
                declared: u64::MAX,
                available,
            }
        })?;
        if cd_end > available {
            return Err(Error::CentralDirectoryOverrun {
                declared: cd_end,
                available,
            });
        }
        // Every header is at least 46 bytes, so the declared count bounds
        // the directory span from below.
        let needed = end
            .total_entries
            .saturating_mul(CENTRAL_HEADER_SIZE as u64);
        if needed > end.cd_size {
            return Err(Error::CentralDirectoryOverrun {
                declared: needed,
                available: end.cd_size,
            });
        }

        debug!(
            "loading archive: {} entries, central directory at {} ({} bytes)",
            end.total_entries, end.cd_offset, end.cd_size
        );

        let mut archive = Self {
            comment: String::from_utf8_lossy(&end.comment).into_owned(),
            ..Self::new()
        };

        let mut pos = end.cd_offset as usize;
        for _ in 0..end.total_entries {
            let header = CentralFileHeader::decode(&buffer, pos)?;
            let name_start = pos + CENTRAL_HEADER_SIZE;
            let extra_start = name_start + header.name_len as usize;
            let comment_start = extra_start + header.extra_len as usize;
            let record_end = pos + header.total_size();
            if record_end > buffer.len() {
                return Err(Error::InvalidCentralHeader { offset: pos as u64 });
            }

            let name = String::from_utf8_lossy(&buffer[name_start..extra_start]).into_owned();
            let extra = buffer[extra_start..comment_start].to_vec();
            let comment =
                String::from_utf8_lossy(&buffer[comment_start..record_end]).into_owned();

            let zip64 = Zip64ExtraField::parse(
                &extra,
                header.uncompressed_size,
                header.compressed_size,
                header.local_header_offset,
                header.disk_start,
            );
            if zip64.disk_start.unwrap_or(header.disk_start as u32) != 0 {
                return Err(Error::InvalidFormat(format!(
                    "entry '{}' starts on another volume",
                    name
                )));
            }

            let compressed_size = resolve_size(header.compressed_size, zip64.compressed_size);
            let uncompressed_size = resolve_size(header.uncompressed_size, zip64.uncompressed_size);
            let local_header_offset = if header.local_header_offset == ZIP64_MARKER_U32 {
                zip64.local_header_offset.ok_or_else(|| {
                    Error::InvalidCentralHeader { offset: pos as u64 }
                })?
            } else {
                header.local_header_offset as u64
            };

            trace!("entry '{}' at offset {}", name, local_header_offset);
            let entry = Entry::from_central(
                &header,
                name,
                extra,
                comment,
                local_header_offset,
                compressed_size,
                uncompressed_size,
            );
            archive.insert(entry);
            pos = record_end;
        }

        archive.buffer = buffer;
        archive.synthesize_directories();
        Ok(archive)
    }

    /// Loads an archive from a file on disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let buffer = std::fs::read(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => Error::Io(err),
        })?;
        Self::from_bytes(buffer)
    }

    /// Serializes the archive and writes it to `path`.
    pub fn write_path(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn insert(&mut self, entry: Entry) {
        match self.index.get(&entry.name) {
            // Later records win, as readers that index by name behave.
            Some(&slot) => self.entries[slot] = entry,
            None => {
                self.index.insert(entry.name.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    /// Invents directory entries for intermediate path components no real
    /// entry covers, so listings show the full tree.
    fn synthesize_directories(&mut self) {
        let mut seen: HashSet<String> =
            self.synthesized.iter().map(|e| e.name.clone()).collect();
        let mut invented = Vec::new();
        for entry in &self.entries {
            for dir in ancestor_dirs(&entry.name) {
                if !self.index.contains_key(&dir) && seen.insert(dir.clone()) {
                    invented.push(Entry::synthesized_directory(dir));
                }
            }
        }
        if !invented.is_empty() {
            trace!("synthesized {} directory entries", invented.len());
            self.synthesized.extend(invented);
        }
    }

    /// Number of real entries (synthesized directories excluded).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the archive holds no real entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over real entries in central-directory order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    /// Iterates over real entries followed by synthesized directories.
    pub fn all_entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter().chain(self.synthesized.iter())
    }

    /// Looks up an entry by exact name, checking synthesized directories
    /// after real entries.
    pub fn entry(&self, name: &str) -> Option<&Entry> {
        match self.index.get(name) {
            Some(&slot) => Some(&self.entries[slot]),
            None => self.synthesized.iter().find(|e| e.name == name),
        }
    }

    /// Mutable entry lookup over real entries.
    pub fn entry_mut(&mut self, name: &str) -> Option<&mut Entry> {
        let slot = *self.index.get(name)?;
        Some(&mut self.entries[slot])
    }

    /// The archive comment.
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Sets the archive comment, bounded by the end record's 16-bit length
    /// field.
    pub fn set_comment(&mut self, comment: impl Into<String>) -> Result<()> {
        let comment = comment.into();
        if comment.len() > u16::MAX as usize {
            return Err(Error::CommentTooLong { len: comment.len() });
        }
        self.comment = comment;
        Ok(())
    }

    /// Toggles name-sorted output (the default). When off, serialization
    /// keeps insertion order.
    pub fn set_sort_entries(&mut self, sort: bool) {
        self.sort_on_save = sort;
    }

    /// Sets the deflate level (0..=9) for entries compressed on save.
    pub fn set_compression_level(&mut self, level: u32) {
        self.compression_level = level.min(9);
    }

    /// Sets how encryption salts are produced on save.
    pub fn set_salt_policy(&mut self, policy: SaltPolicy) {
        self.salt_policy = policy;
    }

    /// Adds a file entry from in-memory content, replacing any existing
    /// entry of the same name.
    pub fn add_entry(
        &mut self,
        name: impl Into<String>,
        content: Vec<u8>,
        options: EntryOptions,
    ) -> Result<()> {
        let name = name.into();
        if name.len() > u16::MAX as usize {
            return Err(Error::NameTooLong { len: name.len() });
        }

        let method = options
            .method
            .unwrap_or_else(|| CompressionMethod::auto_select(&content));
        let modified = options.modified.unwrap_or_else(DosDateTime::now);
        let mut entry = Entry::new_file(name, content, method, modified, options.password);
        if let Some(mode) = options.unix_mode {
            entry.set_unix_mode(mode);
        }
        if let Some(comment) = options.comment {
            entry.set_comment(comment)?;
        }

        // A real file shadows any synthesized placeholder of the same name.
        self.synthesized.retain(|e| e.name != entry.name);
        self.insert(entry);
        Ok(())
    }

    /// Adds an explicit directory entry. A trailing slash is appended when
    /// missing.
    pub fn add_directory(&mut self, name: impl Into<String>) -> Result<()> {
        let mut name = name.into();
        if !name.ends_with('/') {
            name.push('/');
        }
        if name.len() > u16::MAX as usize {
            return Err(Error::NameTooLong { len: name.len() });
        }
        self.synthesized.retain(|e| e.name != name);
        self.insert(Entry::new_directory(name, DosDateTime::now()));
        Ok(())
    }

    /// Renames an entry, keeping the name index in sync. An existing entry
    /// under the new name is replaced.
    pub fn rename_entry(&mut self, from: &str, to: impl Into<String>) -> Result<()> {
        let to = to.into();
        if to == from {
            return Ok(());
        }
        let slot = *self.index.get(from).ok_or_else(|| Error::EntryNotFound {
            path: from.to_string(),
        })?;
        self.entries[slot].set_name(to.clone())?;
        if let Some(shadowed) = self.index.insert(to, slot) {
            if shadowed != slot {
                self.entries.remove(shadowed);
                self.reindex();
            }
        }
        self.index.remove(from);
        Ok(())
    }

    /// Deletes an entry by name. Deleting a directory also deletes
    /// everything beneath it.
    pub fn delete_entry(&mut self, name: &str) -> Result<()> {
        let known = self.index.contains_key(name)
            || self.synthesized.iter().any(|e| e.name == name);
        if !known {
            return Err(Error::EntryNotFound {
                path: name.to_string(),
            });
        }

        if name.ends_with('/') {
            debug!("deleting directory subtree '{}'", name);
            self.entries
                .retain(|e| e.name != name && !e.name.starts_with(name));
            self.synthesized
                .retain(|e| e.name != name && !e.name.starts_with(name));
        } else {
            self.entries.retain(|e| e.name != name);
        }
        self.reindex();
        // Dropping a subtree may orphan synthesized parents.
        let entries = &self.entries;
        self.synthesized
            .retain(|dir| entries.iter().any(|e| e.name.starts_with(&dir.name)));
        Ok(())
    }

    fn reindex(&mut self) {
        self.index = self
            .entries
            .iter()
            .enumerate()
            .map(|(slot, e)| (e.name.clone(), slot))
            .collect();
    }

    /// Reads and verifies an entry's content.
    ///
    /// Directories and synthesized entries yield an empty buffer. Encrypted
    /// entries need `password`; [`Error::PasswordRequired`] otherwise.
    pub fn read_entry(&self, name: &str, password: Option<&Password>) -> Result<Vec<u8>> {
        let entry = self.entry(name).ok_or_else(|| Error::EntryNotFound {
            path: name.to_string(),
        })?;
        self.read(entry, password)
    }

    /// Like [`read_entry`][Self::read_entry] but takes the entry itself.
    pub fn read(&self, entry: &Entry, password: Option<&Password>) -> Result<Vec<u8>> {
        match &entry.data {
            EntryData::Synthesized => Ok(Vec::new()),
            EntryData::Fresh { content, .. } => Ok(content.clone()),
            EntryData::Archived {
                local_header_offset,
            } => self.read_archived(entry, *local_header_offset, password),
        }
    }

    fn read_archived(
        &self,
        entry: &Entry,
        local_header_offset: u64,
        password: Option<&Password>,
    ) -> Result<Vec<u8>> {
        if entry.is_directory() {
            return Ok(Vec::new());
        }
        let (data_offset, data_end) = self.payload_bounds(entry, local_header_offset)?;
        decode_payload(
            entry,
            &self.buffer[data_offset..],
            data_end - data_offset,
            password,
        )
    }

    /// Locates an archived entry's compressed payload in the buffer via its
    /// local header.
    fn payload_bounds(&self, entry: &Entry, local_header_offset: u64) -> Result<(usize, usize)> {
        let local = LocalFileHeader::decode(&self.buffer, local_header_offset as usize)?;
        let data_offset = local.data_offset(local_header_offset) as usize;
        let data_end = data_offset
            .checked_add(entry.compressed_size as usize)
            .filter(|&end| end <= self.buffer.len())
            .ok_or(Error::InvalidLocalHeader {
                offset: local_header_offset,
            })?;
        Ok((data_offset, data_end))
    }

    /// Copies an archived entry's payload (plus room for a trailing data
    /// descriptor) out of the buffer, so decoding can move to another
    /// thread without borrowing the archive.
    #[cfg(feature = "async")]
    pub(crate) fn archived_decode_input(
        &self,
        entry: &Entry,
        local_header_offset: u64,
    ) -> Result<(Vec<u8>, usize)> {
        let (data_offset, data_end) = self.payload_bounds(entry, local_header_offset)?;
        // The largest descriptor form (signed, ZIP64) is 24 bytes.
        let window_end = self.buffer.len().min(data_end + 24);
        Ok((
            self.buffer[data_offset..window_end].to_vec(),
            data_end - data_offset,
        ))
    }

    /// Reads an entry as text, replacing invalid UTF-8.
    pub fn read_to_string(&self, name: &str, password: Option<&Password>) -> Result<String> {
        let bytes = self.read_entry(name, password)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Verifies every entry's payload against its CRC.
    ///
    /// Returns `false` on the first entry that fails to read or verify;
    /// encrypted entries use `password` when given and otherwise fail.
    pub fn test(&self, password: Option<&Password>) -> bool {
        for entry in &self.entries {
            if entry.is_directory() {
                continue;
            }
            if let Err(err) = self.read(entry, password) {
                warn!("integrity check failed for '{}': {}", entry.name, err);
                return false;
            }
        }
        true
    }

    /// The raw compressed payload of an archived entry, salt included.
    fn raw_payload(&self, entry: &Entry, local_header_offset: u64) -> Result<&[u8]> {
        let (data_offset, data_end) = self.payload_bounds(entry, local_header_offset)?;
        Ok(&self.buffer[data_offset..data_end])
    }

    /// Serializes the archive into a fresh byte buffer and commits it as
    /// the new backing store.
    ///
    /// Output is deterministic for a given archive state: entries are
    /// written name-sorted (case-insensitive, stable) unless sorting is
    /// disabled, archived payloads are copied compressed as-is, and fresh
    /// entries are compressed with the configured level. After this call
    /// every entry is backed by the returned bytes.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut order: Vec<usize> = (0..self.entries.len()).collect();
        if self.sort_on_save {
            order.sort_by_key(|&slot| self.entries[slot].name.to_lowercase());
        }

        let mut out = Vec::with_capacity(self.buffer.len().max(1024));
        let mut written: Vec<PendingRecord> = Vec::with_capacity(order.len());

        for slot in order {
            let offset = out.len() as u64;
            let entry = &self.entries[slot];
            trace!("writing '{}' at offset {}", entry.name, offset);

            let (payload, crc32, uncompressed_size) = match &entry.data {
                EntryData::Synthesized => continue,
                EntryData::Archived {
                    local_header_offset,
                } => {
                    let raw = self.raw_payload(entry, *local_header_offset)?.to_vec();
                    (raw, entry.crc32, entry.uncompressed_size)
                }
                EntryData::Fresh { content, password } => {
                    let crc32 = entry.crc32;
                    let compressed =
                        codec::compress(entry.method(), content, self.compression_level)?;
                    let payload = match password {
                        Some(password) => {
                            let check = crypto::verification_byte(
                                entry.flags,
                                crc32,
                                entry.modified.time_word(),
                            );
                            crypto::encrypt(&compressed, password, check, &self.salt_policy)
                        }
                        None => compressed,
                    };
                    (payload, crc32, content.len() as u64)
                }
            };

            let entry = &self.entries[slot];
            let compressed_size = payload.len() as u64;
            let zip64_sizes = compressed_size >= ZIP64_MARKER_U32 as u64
                || uncompressed_size >= ZIP64_MARKER_U32 as u64;
            let zip64_offset = offset >= ZIP64_MARKER_U32 as u64;

            let local_extra = if zip64_sizes {
                build_zip64_extra(Some(uncompressed_size), Some(compressed_size), None)
            } else {
                Vec::new()
            };
            let mut extra = strip_zip64_extra(&entry.extra);
            extra.extend_from_slice(&build_zip64_extra(
                zip64_sizes.then_some(uncompressed_size),
                zip64_sizes.then_some(compressed_size),
                zip64_offset.then_some(offset),
            ));

            let header = CentralFileHeader {
                version_made_by: entry.version_made_by,
                version_needed: if zip64_sizes || zip64_offset {
                    VERSION_ZIP64
                } else {
                    entry.version_needed.max(crate::entry::VERSION_DEFAULT)
                },
                flags: entry.flags,
                method: entry.method,
                modified: entry.modified,
                crc32,
                compressed_size: if zip64_sizes {
                    ZIP64_MARKER_U32
                } else {
                    compressed_size as u32
                },
                uncompressed_size: if zip64_sizes {
                    ZIP64_MARKER_U32
                } else {
                    uncompressed_size as u32
                },
                name_len: entry.name.len() as u16,
                extra_len: extra.len() as u16,
                comment_len: entry.comment.len() as u16,
                disk_start: 0,
                internal_attrs: entry.internal_attrs,
                external_attrs: entry.external_attrs,
                local_header_offset: if zip64_offset {
                    ZIP64_MARKER_U32
                } else {
                    offset as u32
                },
            };

            // The local header is the central one minus its own fields,
            // with its own extra length.
            header.to_local(local_extra.len() as u16).encode(&mut out);
            out.extend_from_slice(entry.name.as_bytes());
            out.extend_from_slice(&local_extra);
            out.extend_from_slice(&payload);

            if entry.flags & FLAG_DATA_DESCRIPTOR != 0 {
                // Streamed entries keep their descriptor so the payload's
                // encryption check byte stays valid; the signed form is
                // always written.
                out.extend_from_slice(&crate::headers::DESCRIPTOR_SIGNATURE.to_le_bytes());
                out.extend_from_slice(&crc32.to_le_bytes());
                if zip64_sizes {
                    out.extend_from_slice(&compressed_size.to_le_bytes());
                    out.extend_from_slice(&uncompressed_size.to_le_bytes());
                } else {
                    out.extend_from_slice(&(compressed_size as u32).to_le_bytes());
                    out.extend_from_slice(&(uncompressed_size as u32).to_le_bytes());
                }
            }

            written.push(PendingRecord {
                slot,
                offset,
                crc32,
                compressed_size,
                uncompressed_size,
                header,
                extra,
            });
        }

        let cd_offset = out.len() as u64;
        for pending in &written {
            let entry = &self.entries[pending.slot];
            pending.header.encode(&mut out);
            out.extend_from_slice(entry.name.as_bytes());
            out.extend_from_slice(&pending.extra);
            out.extend_from_slice(entry.comment.as_bytes());
        }

        let cd_size = out.len() as u64 - cd_offset;
        let total = written.len() as u64;
        let needs_zip64_end = total >= ZIP64_MARKER_U16 as u64
            || cd_offset >= ZIP64_MARKER_U32 as u64
            || cd_size >= ZIP64_MARKER_U32 as u64;

        if needs_zip64_end {
            let record_offset = out.len() as u64;
            Zip64EndOfCentralDirectory {
                version_made_by: VERSION_ZIP64,
                version_needed: VERSION_ZIP64,
                disk_number: 0,
                cd_start_disk: 0,
                disk_entries: total,
                total_entries: total,
                cd_size,
                cd_offset,
            }
            .encode_with_locator(&mut out, record_offset);
        }

        EndOfCentralDirectory {
            disk_number: 0,
            cd_start_disk: 0,
            disk_entries: clamp_u16(total),
            total_entries: clamp_u16(total),
            cd_size: clamp_u32(cd_size),
            cd_offset: clamp_u32(cd_offset),
            comment: self.comment.as_bytes().to_vec(),
        }
        .encode(&mut out);

        debug!(
            "serialized {} entries into {} bytes",
            written.len(),
            out.len()
        );

        // Commit: every entry is now backed by the new buffer.
        for pending in written {
            let entry = &mut self.entries[pending.slot];
            entry.crc32 = pending.crc32;
            entry.compressed_size = pending.compressed_size;
            entry.uncompressed_size = pending.uncompressed_size;
            entry.data = EntryData::Archived {
                local_header_offset: pending.offset,
            };
        }
        self.buffer = out.clone();
        Ok(out)
    }
}

/// Bookkeeping for one entry between the local-block pass and the central
/// directory pass of serialization.
struct PendingRecord {
    slot: usize,
    offset: u64,
    crc32: u32,
    compressed_size: u64,
    uncompressed_size: u64,
    header: CentralFileHeader,
    extra: Vec<u8>,
}

/// Decrypts, decompresses, and verifies one archived payload.
///
/// `window` starts at the payload and runs at least to its end, with any
/// trailing descriptor bytes included; `payload_len` marks where the
/// payload stops. Borrowing only the copied-out window (not the archive)
/// lets the async API run this on a blocking worker.
pub(crate) fn decode_payload(
    entry: &Entry,
    window: &[u8],
    payload_len: usize,
    password: Option<&Password>,
) -> Result<Vec<u8>> {
    let method = entry.method();
    if !method.is_supported() {
        return Err(Error::UnsupportedMethod {
            method: entry.method,
            entry: entry.name.clone(),
        });
    }

    let mut payload = &window[..payload_len];
    let decrypted;
    if entry.is_encrypted() {
        let password = password.ok_or_else(|| Error::PasswordRequired {
            entry: entry.name.clone(),
        })?;
        let check =
            crypto::verification_byte(entry.flags, entry.crc32, entry.modified.time_word());
        decrypted = crypto::decrypt(payload, password, check, &entry.name)?;
        payload = &decrypted;
    }

    let plain = codec::decompress(method, payload, entry.uncompressed_size)?;

    let actual = Crc32::compute(&plain);
    if actual != entry.crc32 {
        return Err(Error::CrcMismatch {
            entry: entry.name.clone(),
            expected: entry.crc32,
            actual,
        });
    }

    if entry.uses_descriptor() {
        let zip64 = entry.compressed_size >= ZIP64_MARKER_U32 as u64
            || entry.uncompressed_size >= ZIP64_MARKER_U32 as u64;
        let descriptor = DataDescriptor::locate(window, payload_len, zip64, entry.crc32)
            .ok_or_else(|| Error::DescriptorMismatch {
                entry: entry.name.clone(),
            })?;
        if descriptor.crc32 != entry.crc32
            || descriptor.compressed_size != entry.compressed_size
            || descriptor.uncompressed_size != entry.uncompressed_size
        {
            return Err(Error::DescriptorMismatch {
                entry: entry.name.clone(),
            });
        }
    }

    Ok(plain)
}

fn resolve_size(classic: u32, zip64: Option<u64>) -> u64 {
    if classic == ZIP64_MARKER_U32 {
        zip64.unwrap_or(classic as u64)
    } else {
        classic as u64
    }
}

fn clamp_u16(value: u64) -> u16 {
    if value >= ZIP64_MARKER_U16 as u64 {
        ZIP64_MARKER_U16
    } else {
        value as u16
    }
}

fn clamp_u32(value: u64) -> u32 {
    if value >= ZIP64_MARKER_U32 as u64 {
        ZIP64_MARKER_U32
    } else {
        value as u32
    }
}
