//! Shared test utilities for integration tests.
//!
//! This module provides common helper functions used across multiple test
//! files. Archive creation helpers are consolidated here to avoid
//! duplication.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test
//! file compiles as a separate crate and may only use a subset of these
//! helpers.

#![allow(dead_code)]

use zipedit::{Archive, EntryOptions, Password};

/// Creates an in-memory archive from (name, content) pairs and returns its
/// serialized bytes.
pub fn build_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    build_archive_with(entries, |_| EntryOptions::new())
}

/// Creates an in-memory archive where each entry's options come from the
/// given function, keyed by entry name.
pub fn build_archive_with(
    entries: &[(&str, &[u8])],
    options_for: impl Fn(&str) -> EntryOptions,
) -> Vec<u8> {
    let mut archive = Archive::new();
    for (name, content) in entries {
        archive
            .add_entry(*name, content.to_vec(), options_for(name))
            .unwrap_or_else(|e| panic!("failed to add '{}': {}", name, e));
    }
    archive.to_bytes().expect("failed to serialize archive")
}

/// Opens serialized bytes and verifies entry count and every entry's
/// content byte-for-byte.
pub fn verify_archive_contents(bytes: &[u8], expected: &[(&str, &[u8])]) {
    verify_with_password(bytes, None, expected);
}

/// Like [`verify_archive_contents`] but decrypts with `password`.
pub fn verify_with_password(
    bytes: &[u8],
    password: Option<&Password>,
    expected: &[(&str, &[u8])],
) {
    let archive = Archive::from_bytes(bytes.to_vec()).expect("failed to reopen archive");
    assert!(archive.test(password), "integrity check failed");

    let file_count = archive.entries().filter(|e| !e.is_directory()).count();
    assert_eq!(
        file_count,
        expected.len(),
        "entry count mismatch: expected {}, got {}",
        expected.len(),
        file_count
    );

    for (name, content) in expected {
        let read = archive
            .read_entry(name, password)
            .unwrap_or_else(|e| panic!("failed to read '{}': {}", name, e));
        assert_eq!(&read[..], *content, "content mismatch for '{}'", name);
    }
}

/// Extracts the error from a Result, panicking if it's Ok.
pub fn expect_err<T, E>(result: Result<T, E>) -> E {
    match result {
        Ok(_) => panic!("Expected error but got Ok"),
        Err(e) => e,
    }
}

/// Byte offset of the classic end record in serialized bytes (no comment
/// assumed beyond `comment_len`).
pub fn eocd_offset(bytes: &[u8], comment_len: usize) -> usize {
    bytes.len() - 22 - comment_len
}
