//! Error types for ZIP archive operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when working with ZIP archives, along with a convenient
//! [`Result<T>`] type alias.
//!
//! # Error Categories
//!
//! Errors fall into several categories:
//!
//! | Category | Variants | Typical Cause |
//! |----------|----------|---------------|
//! | I/O | [`Io`][Error::Io] | File system operations |
//! | Format | [`InvalidFormat`][Error::InvalidFormat], [`InvalidLocalHeader`][Error::InvalidLocalHeader], [`InvalidCentralHeader`][Error::InvalidCentralHeader], [`InvalidEndRecord`][Error::InvalidEndRecord], [`CentralDirectoryOverrun`][Error::CentralDirectoryOverrun] | Malformed archive bytes |
//! | Integrity | [`CrcMismatch`][Error::CrcMismatch], [`DescriptorMismatch`][Error::DescriptorMismatch] | Data corruption |
//! | Credentials | [`WrongPassword`][Error::WrongPassword], [`PasswordRequired`][Error::PasswordRequired] | Encrypted entries |
//! | Capability | [`UnsupportedMethod`][Error::UnsupportedMethod] | Compression methods this build cannot handle |
//! | Policy | [`CantOverwrite`][Error::CantOverwrite], [`FileNotFound`][Error::FileNotFound], [`EntryNotFound`][Error::EntryNotFound], [`NameTooLong`][Error::NameTooLong], [`CommentTooLong`][Error::CommentTooLong] | Caller-supplied operations conflicting with archive or filesystem state |
//!
//! Credential errors are deliberately distinct from integrity errors so a
//! caller can prompt for a different password instead of reporting corruption.
//! No operation in this crate retries automatically; every failure is
//! surfaced to the immediate caller.
//!
//! # Example
//!
//! ```rust,no_run
//! use zipedit::{Archive, Error};
//!
//! fn open_archive(path: &str) -> zipedit::Result<()> {
//!     match Archive::open(path) {
//!         Ok(archive) => {
//!             println!("Opened archive with {} entries", archive.len());
//!             Ok(())
//!         }
//!         Err(Error::InvalidFormat(msg)) => {
//!             eprintln!("Not a valid ZIP file: {}", msg);
//!             Err(Error::InvalidFormat(msg))
//!         }
//!         Err(e @ Error::WrongPassword { .. }) => {
//!             eprintln!("Incorrect password");
//!             Err(e)
//!         }
//!         Err(e) => Err(e),
//!     }
//! }
//! ```

use std::io;
use std::path::PathBuf;

/// A specialized `Result` type for ZIP archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for ZIP archive operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The archive bytes are not a recognizable ZIP archive.
    ///
    /// Returned when no end-of-central-directory record can be located
    /// within the trailing search window, or when the end record describes
    /// an archive shape this crate does not support (e.g. multi-volume).
    #[error("invalid ZIP format: {0}")]
    InvalidFormat(String),

    /// A local file header did not start with the `PK\x03\x04` signature.
    #[error("invalid local file header at offset {offset:#x}")]
    InvalidLocalHeader {
        /// Byte offset of the failed header within the archive buffer.
        offset: u64,
    },

    /// A central directory header did not start with the `PK\x01\x02` signature.
    #[error("invalid central directory header at offset {offset:#x}")]
    InvalidCentralHeader {
        /// Byte offset of the failed header within the archive buffer.
        offset: u64,
    },

    /// An end-of-central-directory record did not start with its signature.
    #[error("invalid end of central directory record at offset {offset:#x}")]
    InvalidEndRecord {
        /// Byte offset of the failed record within the archive buffer.
        offset: u64,
    },

    /// The end record places the central directory past the end of the
    /// buffer.
    #[error(
        "central directory overrun: directory ends at byte {declared}, archive has {available}"
    )]
    CentralDirectoryOverrun {
        /// Declared end of the central directory in bytes.
        declared: u64,
        /// Actual buffer length in bytes.
        available: u64,
    },

    /// Decompressed data does not match the stored CRC-32.
    ///
    /// The codec never silently returns corrupted bytes; callers scanning
    /// many entries (see [`Archive::test`][crate::Archive::test]) may choose
    /// to skip-and-continue.
    #[error("CRC mismatch for entry '{entry}': expected {expected:#010x}, got {actual:#010x}")]
    CrcMismatch {
        /// Name of the offending entry.
        entry: String,
        /// CRC-32 stored in the archive.
        expected: u32,
        /// CRC-32 of the decompressed bytes.
        actual: u32,
    },

    /// A streamed entry's data descriptor disagrees with its central header.
    #[error("faulty data descriptor for entry '{entry}'")]
    DescriptorMismatch {
        /// Name of the offending entry.
        entry: String,
    },

    /// The entry uses a compression method this build cannot decode.
    ///
    /// Only STORED (0) and DEFLATE (8) are supported; DEFLATE additionally
    /// requires the `deflate` feature.
    #[error("unsupported compression method {method} for entry '{entry}'")]
    UnsupportedMethod {
        /// The raw method id from the entry header.
        method: u16,
        /// Name of the offending entry.
        entry: String,
    },

    /// The password did not verify against the entry's encryption header.
    ///
    /// Distinct from [`CrcMismatch`][Error::CrcMismatch]: the archive is not
    /// corrupt, the credentials are wrong.
    #[error("wrong password for entry '{entry}'")]
    WrongPassword {
        /// Name of the encrypted entry.
        entry: String,
    },

    /// The entry is encrypted but no password was supplied.
    #[error("password required for encrypted entry '{entry}'")]
    PasswordRequired {
        /// Name of the encrypted entry.
        entry: String,
    },

    /// A source path handed to an add-from-disk operation does not exist.
    #[error("file not found: {path}")]
    FileNotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// Extraction refused to clobber an existing file.
    ///
    /// Set [`ExtractOptions::overwrite`][crate::ExtractOptions::overwrite]
    /// to allow replacement.
    #[error("refusing to overwrite existing file: {path}")]
    CantOverwrite {
        /// The on-disk path that is in the way.
        path: PathBuf,
    },

    /// No entry with the given name exists in the archive.
    #[error("entry not found: {path}")]
    EntryNotFound {
        /// The name that was looked up.
        path: String,
    },

    /// An entry name exceeds the 16-bit length field of the ZIP format.
    #[error("entry name too long: {len} bytes (maximum 65535)")]
    NameTooLong {
        /// Byte length of the offending name.
        len: usize,
    },

    /// An entry or archive comment exceeds the 16-bit length field.
    #[error("comment too long: {len} bytes (maximum 65535)")]
    CommentTooLong {
        /// Byte length of the offending comment.
        len: usize,
    },
}

impl Error {
    /// Returns `true` if this error indicates malformed archive bytes.
    ///
    /// Format errors are unrecoverable for the archive in question.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Error::InvalidFormat(_)
                | Error::InvalidLocalHeader { .. }
                | Error::InvalidCentralHeader { .. }
                | Error::InvalidEndRecord { .. }
                | Error::CentralDirectoryOverrun { .. }
        )
    }

    /// Returns `true` if this error indicates a credential problem rather
    /// than corruption, so a caller can prompt for a different password.
    pub fn is_credential_error(&self) -> bool {
        matches!(
            self,
            Error::WrongPassword { .. } | Error::PasswordRequired { .. }
        )
    }
}
