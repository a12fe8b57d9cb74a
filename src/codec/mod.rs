//! Compression method infrastructure.
//!
//! ZIP records a 16-bit method id per entry. This crate reads and writes
//! `STORED` (0, passthrough) and `DEFLATE` (8, raw deflate streams, behind
//! the `deflate` feature). Every other id decodes to
//! [`CompressionMethod::Unsupported`] and is a hard error at data access
//! time — there is no partial decode for unknown methods.

#[cfg(feature = "deflate")]
pub mod deflate;

pub mod stored;

use std::io;

/// Compression method ids from the ZIP registry.
pub mod method {
    /// Stored (no compression).
    pub const STORED: u16 = 0;
    /// Deflate compression.
    pub const DEFLATED: u16 = 8;
}

/// A compression method id decoded from an entry header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionMethod {
    /// No compression; payload bytes are the content.
    Stored,
    /// Raw deflate stream.
    Deflated,
    /// Any method this crate cannot code for.
    Unsupported(u16),
}

impl CompressionMethod {
    /// Decodes a raw method id.
    pub fn from_raw(raw: u16) -> Self {
        match raw {
            method::STORED => Self::Stored,
            method::DEFLATED => Self::Deflated,
            other => Self::Unsupported(other),
        }
    }

    /// The raw method id for headers.
    pub fn raw(&self) -> u16 {
        match self {
            Self::Stored => method::STORED,
            Self::Deflated => method::DEFLATED,
            Self::Unsupported(raw) => *raw,
        }
    }

    /// Whether this build can decompress the method.
    pub fn is_supported(&self) -> bool {
        match self {
            Self::Stored => true,
            Self::Deflated => cfg!(feature = "deflate"),
            Self::Unsupported(_) => false,
        }
    }

    /// Picks the method for freshly added content: STORED for empty
    /// payloads (deflate would only add overhead), DEFLATE otherwise.
    pub fn auto_select(data: &[u8]) -> Self {
        if data.is_empty() || !cfg!(feature = "deflate") {
            Self::Stored
        } else {
            Self::Deflated
        }
    }

    /// A human-readable method name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stored => "Stored",
            Self::Deflated => "Deflate",
            Self::Unsupported(_) => "Unsupported",
        }
    }
}

impl std::fmt::Display for CompressionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unsupported(raw) => write!(f, "Unsupported({})", raw),
            other => f.write_str(other.name()),
        }
    }
}

/// Compresses a buffer with the given method.
///
/// The caller is responsible for only passing supported methods; an
/// unsupported one is an invalid-input I/O error here.
pub fn compress(method: CompressionMethod, data: &[u8], level: u32) -> io::Result<Vec<u8>> {
    match method {
        CompressionMethod::Stored => Ok(stored::compress(data)),
        #[cfg(feature = "deflate")]
        CompressionMethod::Deflated => deflate::compress(data, level),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("cannot compress with method {}", method),
        )),
    }
}

/// Decompresses a buffer with the given method.
///
/// `declared_size` is the uncompressed size the headers promise; output is
/// capped there so a mismatching stream can never allocate unboundedly
/// (zip-bomb defense). A capped or short stream surfaces as a CRC failure
/// at the verification step.
pub fn decompress(
    method: CompressionMethod,
    data: &[u8],
    declared_size: u64,
) -> io::Result<Vec<u8>> {
    match method {
        CompressionMethod::Stored => Ok(stored::decompress(data)),
        #[cfg(feature = "deflate")]
        CompressionMethod::Deflated => deflate::decompress(data, declared_size),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("cannot decompress method {}", method),
        )),
    }
}
