//! Fuzz target for entry-name sanitization with arbitrary string input.
//!
//! Entry names come straight from untrusted archives, so the sanitizer has
//! to clamp every possible string to a safe relative path. The goal is to
//! find inputs whose sanitized form still escapes the extraction root.
//!
//! Run with: cargo +nightly fuzz run entry_name

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::path::Path;
use zipedit::path::{safe_join, sanitize_entry_name};

fuzz_target!(|data: &[u8]| {
    if let Ok(name) = std::str::from_utf8(data) {
        let clean = sanitize_entry_name(name);

        // No traversal segments, no absolute prefix, no NUL bytes
        assert!(
            !clean.split('/').any(|s| s == ".." || s == "."),
            "traversal segment survived sanitization: {:?}",
            clean
        );
        assert!(
            !clean.starts_with('/'),
            "absolute path survived sanitization: {:?}",
            clean
        );
        assert!(
            !clean.contains('\0'),
            "NUL byte survived sanitization: {:?}",
            clean
        );

        // Sanitization is idempotent
        assert_eq!(sanitize_entry_name(&clean), clean);

        // Joining under a root always stays under that root
        let root = Path::new("/extract/root");
        assert!(safe_join(root, name).starts_with(root));
    }
});
