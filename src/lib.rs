//! An in-memory ZIP archive reader, editor, and writer.
//!
//! `zipedit` loads a whole archive into memory, exposes its entries through
//! a mutable index, and serializes the edited state back to deterministic
//! bytes. Payloads are decoded lazily and verified against their CRC on
//! every read.
//!
//! # Quick start
//!
//! ```no_run
//! use zipedit::{Archive, EntryOptions, ExtractOptions};
//!
//! fn main() -> zipedit::Result<()> {
//!     let mut archive = Archive::open("bundle.zip")?;
//!     for entry in archive.entries() {
//!         println!("{} ({} bytes)", entry.name(), entry.uncompressed_size());
//!     }
//!
//!     archive.add_entry("notes/today.txt", b"hello".to_vec(), EntryOptions::new())?;
//!     archive.delete_entry("obsolete.txt")?;
//!     archive.write_path("bundle.zip")?;
//!
//!     archive.extract_all_to("unpacked/", &ExtractOptions::new().overwrite(true))?;
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! | Feature | Default | Effect |
//! |---|---|---|
//! | `deflate` | yes | DEFLATE support via `flate2` |
//! | `async` | no | `tokio`-based duals of the archive and filesystem operations |
//!
//! Without `deflate` only STORED entries can be read and written; deflated
//! entries report [`Error::UnsupportedMethod`] on access.
//!
//! # Safety properties
//!
//! - Entry names are clamped to the extraction root; `../`, absolute paths
//!   and drive prefixes cannot escape it (see [`path`]).
//! - Decompression output is capped at the size the headers declare, so a
//!   mismatching stream cannot balloon memory.
//! - Multi-volume archives and unknown compression methods are rejected
//!   rather than partially decoded.
//!
//! Legacy ZipCrypto passwords are supported for reading and writing
//! ([`crypto`]), but the cipher is broken by modern standards and should be
//! treated as obfuscation, not protection.

pub mod archive;
pub mod checksum;
pub mod codec;
pub mod crypto;
pub mod entry;
pub mod error;
pub mod extract;
pub mod headers;
pub mod path;
pub mod timestamp;

#[cfg(feature = "async")]
mod async_api;

pub use archive::{Archive, EntryOptions};
pub use codec::CompressionMethod;
pub use crypto::{Password, SaltPolicy};
pub use entry::Entry;
pub use error::{Error, Result};
pub use extract::ExtractOptions;
pub use timestamp::DosDateTime;
