//! Async counterparts of the filesystem-facing operations.
//!
//! Available with the `async` feature. Every dual produces exactly the same
//! archive state and on-disk results as its synchronous twin: work is
//! awaited strictly in order, so entry ordering and replacement semantics
//! never diverge between the two APIs.
//!
//! File I/O goes through `tokio::fs`; parsing, compression, and
//! decompression run on `spawn_blocking` workers so the executor never
//! stalls on CPU-bound work.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use filetime::FileTime;
use log::{debug, warn};

use crate::archive::{self, Archive, EntryOptions};
use crate::crypto::Password;
use crate::entry::EntryData;
use crate::error::{Error, Result};
use crate::extract::ExtractOptions;
use crate::path::safe_join;
use crate::timestamp::DosDateTime;

impl Archive {
    /// Async dual of [`Archive::open`].
    pub async fn open_async(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let buffer = tokio::fs::read(&path).await.map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound { path: path.clone() },
            _ => Error::Io(err),
        })?;
        tokio::task::spawn_blocking(move || Self::from_bytes(buffer))
            .await
            .map_err(|err| Error::Io(std::io::Error::other(err)))?
    }

    /// Async dual of [`Archive::to_bytes`]. Compression runs on a blocking
    /// worker; the archive commits to the new buffer exactly as the
    /// synchronous form does, and the bytes are identical.
    pub async fn to_bytes_async(&mut self) -> Result<Vec<u8>> {
        let mut owned = std::mem::take(self);
        let (owned, result) = tokio::task::spawn_blocking(move || {
            let result = owned.to_bytes();
            (owned, result)
        })
        .await
        .map_err(|err| Error::Io(std::io::Error::other(err)))?;
        *self = owned;
        result
    }

    /// Async dual of [`Archive::read_entry`]. Decryption, decompression,
    /// and verification run on a blocking worker.
    pub async fn read_entry_async(
        &self,
        name: &str,
        password: Option<&Password>,
    ) -> Result<Vec<u8>> {
        let entry = self.entry(name).ok_or_else(|| Error::EntryNotFound {
            path: name.to_string(),
        })?;
        if entry.is_directory() {
            return Ok(Vec::new());
        }
        match &entry.data {
            EntryData::Synthesized => Ok(Vec::new()),
            EntryData::Fresh { content, .. } => Ok(content.clone()),
            EntryData::Archived {
                local_header_offset,
            } => {
                let (window, payload_len) =
                    self.archived_decode_input(entry, *local_header_offset)?;
                let entry = entry.clone();
                let password = password.cloned();
                tokio::task::spawn_blocking(move || {
                    archive::decode_payload(&entry, &window, payload_len, password.as_ref())
                })
                .await
                .map_err(|err| Error::Io(std::io::Error::other(err)))?
            }
        }
    }

    /// Async dual of [`Archive::write_path`].
    pub async fn write_path_async(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_bytes_async().await?;
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }

    /// Async dual of [`Archive::extract_entry_to`].
    pub async fn extract_entry_to_async(
        &self,
        name: &str,
        dest_root: impl AsRef<Path>,
        options: &ExtractOptions,
    ) -> Result<PathBuf> {
        let dest_root = dest_root.as_ref();
        let entry = self.entry(name).ok_or_else(|| Error::EntryNotFound {
            path: name.to_string(),
        })?;
        let entry_name = entry.name().to_string();
        let is_directory = entry.is_directory();
        let written = self
            .extract_one_async(entry_name.clone(), dest_root, options)
            .await?;
        if is_directory {
            let descendants: Vec<String> = self
                .all_entries()
                .map(|e| e.name().to_string())
                .filter(|n| *n != entry_name && n.starts_with(&entry_name))
                .collect();
            for descendant in descendants {
                self.extract_one_async(descendant, dest_root, options).await?;
            }
        }
        Ok(written)
    }

    /// Async dual of [`Archive::extract_all_to`]. Entries are written one
    /// after another, in listing order.
    pub async fn extract_all_to_async(
        &self,
        dest_root: impl AsRef<Path>,
        options: &ExtractOptions,
    ) -> Result<()> {
        let dest_root = dest_root.as_ref();
        tokio::fs::create_dir_all(dest_root).await?;
        let names: Vec<String> = self.all_entries().map(|e| e.name().to_string()).collect();
        for name in &names {
            self.extract_one_async(name.clone(), dest_root, options)
                .await?;
        }
        debug!("extracted {} entries to {}", names.len(), dest_root.display());
        Ok(())
    }

    async fn extract_one_async(
        &self,
        name: String,
        dest_root: &Path,
        options: &ExtractOptions,
    ) -> Result<PathBuf> {
        let entry = self.entry(&name).ok_or_else(|| Error::EntryNotFound {
            path: name.clone(),
        })?;
        let target = safe_join(dest_root, entry.name());
        if target == dest_root {
            warn!("skipping entry with fully clamped name '{}'", entry.name());
            return Ok(target);
        }

        if entry.is_directory() {
            tokio::fs::create_dir_all(&target).await?;
        } else {
            if tokio::fs::try_exists(&target).await? && !options.overwrite_enabled() {
                return Err(Error::CantOverwrite { path: target });
            }
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let content = self.read_entry_async(&name, options.password_ref()).await?;
            tokio::fs::write(&target, content).await?;
        }

        if options.keeps_permissions() {
            restore_permissions_async(&target, entry.unix_mode()).await?;
        }
        if options.keeps_mtime() && !entry.is_synthesized() {
            let mtime = FileTime::from_unix_time(entry.modified().as_unix_secs(), 0);
            filetime::set_file_mtime(&target, mtime)?;
        }
        Ok(target)
    }

    /// Async dual of [`Archive::add_local_file`].
    pub async fn add_local_file_async(
        &mut self,
        path: impl AsRef<Path>,
        dest_dir: Option<&str>,
    ) -> Result<String> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await.map_err(|err| match err.kind() {
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

        let modified = metadata
            .modified()
            .map(DosDateTime::from_system_time)
            .unwrap_or_default();

        if metadata.is_dir() {
            name.push('/');
            self.add_directory(name.clone())?;
            if let Some(entry) = self.entry_mut(&name) {
                entry.set_modified(modified);
                if let Some(mode) = unix_mode_of(&metadata) {
                    entry.set_unix_mode(mode);
                }
            }
            return Ok(name);
        }

        let content = tokio::fs::read(path).await?;
        let mut options = EntryOptions::new().modified(modified);
        if let Some(mode) = unix_mode_of(&metadata) {
            options = options.unix_mode(mode);
        }
        self.add_entry(name.clone(), content, options)?;
        Ok(name)
    }

    /// Async dual of [`Archive::add_local_folder`]. The tree is walked in
    /// the same sorted order, so both APIs build identical archives.
    pub async fn add_local_folder_async(
        &mut self,
        dir: impl AsRef<Path>,
        dest_dir: Option<&str>,
    ) -> Result<usize> {
        let dir = dir.as_ref();
        let metadata = tokio::fs::metadata(dir).await.map_err(|_| Error::FileNotFound {
            path: dir.to_path_buf(),
        })?;
        if !metadata.is_dir() {
            return Err(Error::FileNotFound {
                path: dir.to_path_buf(),
            });
        }
        let prefix = dest_dir.map(|d| d.trim_end_matches('/').to_string());
        let mut count = 0usize;
        self.add_folder_inner_async(dir.to_path_buf(), prefix, &mut count)
            .await?;
        debug!("added {} entries from {}", count, dir.display());
        Ok(count)
    }

    fn add_folder_inner_async<'a>(
        &'a mut self,
        dir: PathBuf,
        prefix: Option<String>,
        count: &'a mut usize,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let mut reader = tokio::fs::read_dir(&dir).await?;
            let mut children = Vec::new();
            while let Some(child) = reader.next_entry().await? {
                children.push(child);
            }
            children.sort_by_key(|c| c.file_name());

            for child in children {
                let path = child.path();
                let child_name = child.file_name().to_string_lossy().into_owned();
                let name = match &prefix {
                    Some(prefix) => format!("{}/{}", prefix, child_name),
                    None => child_name,
                };
                let file_type = child.file_type().await?;
                if file_type.is_dir() {
                    self.add_directory(name.clone())?;
                    *count += 1;
                    self.add_folder_inner_async(path, Some(name), count).await?;
                } else if file_type.is_file() {
                    self.add_local_file_async(&path, prefix.as_deref()).await?;
                    *count += 1;
                } else {
                    warn!("skipping non-regular file {}", path.display());
                }
            }
            Ok(())
        })
    }
}

#[cfg(unix)]
fn unix_mode_of(metadata: &std::fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::MetadataExt;
    Some(metadata.mode() & 0o7777)
}

#[cfg(not(unix))]
fn unix_mode_of(_metadata: &std::fs::Metadata) -> Option<u32> {
    None
}

#[cfg(unix)]
async fn restore_permissions_async(target: &Path, mode: Option<u32>) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    if let Some(mode) = mode {
        let permissions = std::fs::Permissions::from_mode(mode & 0o7777);
        tokio::fs::set_permissions(target, permissions).await?;
    }
    Ok(())
}

#[cfg(not(unix))]
async fn restore_permissions_async(_target: &Path, _mode: Option<u32>) -> Result<()> {
    Ok(())
}
