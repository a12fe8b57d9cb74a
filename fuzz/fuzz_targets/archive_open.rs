//! Fuzz target for Archive::from_bytes with arbitrary byte input.
//!
//! This target exercises the tail scan, central directory walk, and entry
//! decoding with potentially malformed or adversarial input. The goal is to
//! find panics, hangs, or unbounded allocations in the parsing logic.
//!
//! Run with: cargo +nightly fuzz run archive_open

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // We don't care about the result - we're looking for panics or hangs
    if let Ok(archive) = zipedit::Archive::from_bytes(data.to_vec()) {
        for entry in archive.all_entries() {
            // Access entry fields to exercise lazy decoding
            let _ = entry.name();
            let _ = entry.uncompressed_size();
            let _ = entry.is_directory();
            let _ = entry.crc32();
            // Payload decode: decompression is capped at the declared size,
            // so even lying headers must not balloon memory
            let _ = archive.read(entry, None);
        }
    }
});
