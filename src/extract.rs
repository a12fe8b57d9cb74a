//! Filesystem facade: extraction to disk and ingestion from disk.
//!
//! All destination paths pass through the clamping sanitizer, so a hostile
//! entry name can never write outside the extraction root. Timestamps and
//! Unix permissions are restored after each write; a restore that fails
//! fails the extraction call, like the write itself.

use std::fs;
use std::path::{Path, PathBuf};

use filetime::FileTime;
use log::{debug, warn};

use crate::archive::{Archive, EntryOptions};
use crate::crypto::Password;
use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::path::safe_join;
use crate::timestamp::DosDateTime;

/// Options for extraction to disk.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    overwrite: bool,
    keep_mtime: bool,
    keep_permissions: bool,
    password: Option<Password>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            overwrite: false,
            keep_mtime: true,
            keep_permissions: true,
            password: None,
        }
    }
}

impl ExtractOptions {
    /// Default options: no overwriting, timestamps and permissions
    /// restored, no password.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows replacing files that already exist at the destination.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Controls restoring entry modification times (on by default).
    pub fn keep_mtime(mut self, keep: bool) -> Self {
        self.keep_mtime = keep;
        self
    }

    /// Controls restoring Unix permission bits (on by default).
    pub fn keep_permissions(mut self, keep: bool) -> Self {
        self.keep_permissions = keep;
        self
    }

    /// Password for encrypted entries.
    pub fn password(mut self, password: impl Into<Password>) -> Self {
        self.password = Some(password.into());
        self
    }

}

#[cfg(feature = "async")]
impl ExtractOptions {
    pub(crate) fn overwrite_enabled(&self) -> bool {
        self.overwrite
    }

    pub(crate) fn keeps_mtime(&self) -> bool {
        self.keep_mtime
    }

    pub(crate) fn keeps_permissions(&self) -> bool {
        self.keep_permissions
    }

    pub(crate) fn password_ref(&self) -> Option<&Password> {
        self.password.as_ref()
    }
}

impl Archive {
    /// Extracts one entry into `dest_root`, returning the path written.
    ///
    /// The on-disk location is the sanitized entry name joined under
    /// `dest_root`; parent directories are created as needed. An existing
    /// file is [`Error::CantOverwrite`] unless overwriting is enabled.
    /// Extracting a directory entry also extracts every entry under it.
    pub fn extract_entry_to(
        &self,
        name: &str,
        dest_root: impl AsRef<Path>,
        options: &ExtractOptions,
    ) -> Result<PathBuf> {
        let dest_root = dest_root.as_ref();
        let entry = self.entry(name).ok_or_else(|| Error::EntryNotFound {
            path: name.to_string(),
        })?;
        let written = self.extract_one(entry, dest_root, options)?;
        if entry.is_directory() {
            for descendant in self.all_entries() {
                if descendant.name() != entry.name() && descendant.name().starts_with(entry.name())
                {
                    self.extract_one(descendant, dest_root, options)?;
                }
            }
        }
        Ok(written)
    }

    /// Extracts every entry into `dest_root`.
    ///
    /// Directory entries (synthesized ones included) become directories;
    /// files are verified against their CRC as they are read. Extraction
    /// stops at the first error.
    pub fn extract_all_to(
        &self,
        dest_root: impl AsRef<Path>,
        options: &ExtractOptions,
    ) -> Result<()> {
        let dest_root = dest_root.as_ref();
        fs::create_dir_all(dest_root)?;
        let mut count = 0usize;
        for entry in self.all_entries() {
            self.extract_one(entry, dest_root, options)?;
            count += 1;
        }
        debug!("extracted {} entries to {}", count, dest_root.display());
        Ok(())
    }

    fn extract_one(
        &self,
        entry: &Entry,
        dest_root: &Path,
        options: &ExtractOptions,
    ) -> Result<PathBuf> {
        let target = safe_join(dest_root, entry.name());
        if target == dest_root {
            // The whole name clamped away; nothing sensible to write.
            warn!("skipping entry with fully clamped name '{}'", entry.name());
            return Ok(target);
        }

        if entry.is_directory() {
            fs::create_dir_all(&target)?;
        } else {
            if target.exists() && !options.overwrite {
                return Err(Error::CantOverwrite { path: target });
            }
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let content = self.read(entry, options.password.as_ref())?;
            fs::write(&target, content)?;
        }

        if options.keep_permissions {
            restore_permissions(&target, entry)?;
        }
        if options.keep_mtime && !entry.is_synthesized() {
            let mtime = FileTime::from_unix_time(entry.modified().as_unix_secs(), 0);
            filetime::set_file_mtime(&target, mtime)?;
        }
        Ok(target)
    }

    /// Adds a file or directory from disk, under `dest_dir` when given.
    ///
    /// The entry keeps the source's name, modification time and (on Unix)
    /// permission bits. A directory source becomes a zero-length entry with
    /// a trailing slash; its children are not visited (see
    /// [`add_local_folder`][Self::add_local_folder]). Returns the entry
    /// name used.
    pub fn add_local_file(
        &mut self,
        path: impl AsRef<Path>,
        dest_dir: Option<&str>,
    ) -> Result<String> {
        let path = path.as_ref();
        let metadata = fs::metadata(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => Error::Io(err),
        })?;

        let file_name = path
            .file_name()
            .ok_or_else(|| Error::FileNotFound {
                path: path.to_path_buf(),
            })?
            .to_string_lossy()
            .into_owned();
        let mut name = match dest_dir {
            Some(dir) => format!("{}/{}", dir.trim_end_matches('/'), file_name),
            None => file_name,
        };

        if metadata.is_dir() {
            name.push('/');
            self.add_directory(name.clone())?;
            if let Some(entry) = self.entry_mut(&name) {
                entry.set_modified(mtime_of(&metadata));
                if let Some(mode) = unix_mode_of(&metadata) {
                    entry.set_unix_mode(mode);
                }
            }
            return Ok(name);
        }

        let content = fs::read(path)?;
        let mut options = EntryOptions::new().modified(mtime_of(&metadata));
        if let Some(mode) = unix_mode_of(&metadata) {
            options = options.unix_mode(mode);
        }
        self.add_entry(name.clone(), content, options)?;
        Ok(name)
    }

    /// Adds a directory tree from disk, under `dest_dir` when given.
    ///
    /// Subdirectories become explicit directory entries. Children are
    /// visited in name order so repeated runs produce the same archive.
    /// Returns the number of entries added.
    pub fn add_local_folder(
        &mut self,
        dir: impl AsRef<Path>,
        dest_dir: Option<&str>,
    ) -> Result<usize> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::FileNotFound {
                path: dir.to_path_buf(),
            });
        }
        let prefix = dest_dir.map(|d| d.trim_end_matches('/').to_string());
        let mut count = 0usize;
        self.add_folder_inner(dir, prefix.as_deref(), &mut count)?;
        debug!("added {} entries from {}", count, dir.display());
        Ok(count)
    }

    fn add_folder_inner(
        &mut self,
        dir: &Path,
        prefix: Option<&str>,
        count: &mut usize,
    ) -> Result<()> {
        let mut children: Vec<_> = fs::read_dir(dir)?.collect::<std::io::Result<_>>()?;
        children.sort_by_key(|c| c.file_name());

        for child in children {
            let path = child.path();
            let child_name = child.file_name().to_string_lossy().into_owned();
            let name = match prefix {
                Some(prefix) => format!("{}/{}", prefix, child_name),
                None => child_name,
            };
            let file_type = child.file_type()?;
            if file_type.is_dir() {
                self.add_directory(name.clone())?;
                *count += 1;
                self.add_folder_inner(&path, Some(&name), count)?;
            } else if file_type.is_file() {
                self.add_local_file(&path, prefix)?;
                *count += 1;
            } else {
                // Symlinks and specials have no portable representation.
                warn!("skipping non-regular file {}", path.display());
            }
        }
        Ok(())
    }
}

fn mtime_of(metadata: &fs::Metadata) -> DosDateTime {
    metadata
        .modified()
        .map(DosDateTime::from_system_time)
        .unwrap_or_default()
}

#[cfg(unix)]
fn unix_mode_of(metadata: &fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::MetadataExt;
    Some(metadata.mode() & 0o7777)
}

#[cfg(not(unix))]
fn unix_mode_of(_metadata: &fs::Metadata) -> Option<u32> {
    None
}

#[cfg(unix)]
fn restore_permissions(target: &Path, entry: &Entry) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    if let Some(mode) = entry.unix_mode() {
        fs::set_permissions(target, fs::Permissions::from_mode(mode & 0o7777))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn restore_permissions(_target: &Path, _entry: &Entry) -> Result<()> {
    Ok(())
}
