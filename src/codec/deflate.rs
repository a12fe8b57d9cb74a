//! DEFLATE (method 8) via flate2, raw streams without a zlib wrapper.

use std::io;
use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;

/// Default compression level for freshly added entries.
pub const DEFAULT_LEVEL: u32 = 6;

/// Deflates a buffer at the given level (0..=9, clamped).
pub fn compress(data: &[u8], level: u32) -> io::Result<Vec<u8>> {
    let mut encoder = DeflateEncoder::new(
        Vec::with_capacity(data.len() / 2),
        Compression::new(level.min(9)),
    );
    encoder.write_all(data)?;
    encoder.finish()
}

/// Inflates a buffer, reading at most `declared_size` bytes of output.
///
/// A stream that would produce more than the headers declared is truncated
/// at the cap instead of inflated in full. The caller's CRC check turns a
/// lying header into an integrity error instead of an allocation.
pub fn decompress(data: &[u8], declared_size: u64) -> io::Result<Vec<u8>> {
    let cap = usize::try_from(declared_size).map_err(|_| {
        io::Error::new(io::ErrorKind::InvalidInput, "declared size exceeds address space")
    })?;

    let mut out = Vec::with_capacity(cap.min(1 << 20));
    let mut decoder = DeflateDecoder::new(data).take(declared_size);
    decoder.read_to_end(&mut out)?;
    Ok(out)
}
