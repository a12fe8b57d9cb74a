//! Archive mutation tests: add, replace, rename, delete, and the
//! delete-cascade over directory subtrees.

mod common;

use zipedit::{Archive, EntryOptions, Error};

fn sample() -> Archive {
    let bytes = common::build_archive(&[
        ("readme.md", b"top"),
        ("src/main.rs", b"fn main() {}"),
        ("src/lib.rs", b"pub mod x;"),
        ("src/util/helpers.rs", b"// helpers"),
        ("assets/logo.svg", b"<svg/>"),
    ]);
    Archive::from_bytes(bytes).unwrap()
}

#[test]
fn test_add_new_entry() {
    let mut archive = sample();
    archive
        .add_entry("CHANGELOG.md", b"## 1.0.0".to_vec(), EntryOptions::new())
        .unwrap();
    assert_eq!(archive.len(), 6);

    let reloaded = Archive::from_bytes(archive.to_bytes().unwrap()).unwrap();
    assert_eq!(reloaded.read_entry("CHANGELOG.md", None).unwrap(), b"## 1.0.0");
    // Existing payloads are untouched by the edit.
    assert_eq!(reloaded.read_entry("src/main.rs", None).unwrap(), b"fn main() {}");
}

#[test]
fn test_replace_overwrites_content() {
    let mut archive = sample();
    archive
        .add_entry("readme.md", b"rewritten".to_vec(), EntryOptions::new())
        .unwrap();
    assert_eq!(archive.len(), 5);
    assert_eq!(archive.read_entry("readme.md", None).unwrap(), b"rewritten");

    let reloaded = Archive::from_bytes(archive.to_bytes().unwrap()).unwrap();
    assert_eq!(reloaded.read_entry("readme.md", None).unwrap(), b"rewritten");
}

#[test]
fn test_delete_single_file() {
    let mut archive = sample();
    archive.delete_entry("assets/logo.svg").unwrap();
    assert_eq!(archive.len(), 4);
    assert!(archive.entry("assets/logo.svg").is_none());
    // The implied parent directory disappears with its last child.
    assert!(archive.entry("assets/").is_none());

    let reloaded = Archive::from_bytes(archive.to_bytes().unwrap()).unwrap();
    assert!(reloaded.entry("assets/logo.svg").is_none());
    assert_eq!(reloaded.len(), 4);
}

#[test]
fn test_delete_directory_cascades() {
    let mut archive = sample();
    archive.delete_entry("src/").unwrap();
    assert_eq!(archive.len(), 2);
    assert!(archive.entry("src/main.rs").is_none());
    assert!(archive.entry("src/util/helpers.rs").is_none());
    assert!(archive.entry("src/util/").is_none());
    assert!(archive.entry("readme.md").is_some());
}

#[test]
fn test_delete_nested_directory_only() {
    let mut archive = sample();
    archive.delete_entry("src/util/").unwrap();
    assert_eq!(archive.len(), 4);
    assert!(archive.entry("src/main.rs").is_some());
    assert!(archive.entry("src/util/helpers.rs").is_none());
}

#[test]
fn test_delete_missing_entry() {
    let mut archive = sample();
    let err = common::expect_err(archive.delete_entry("ghost.txt"));
    assert!(matches!(err, Error::EntryNotFound { .. }));
    // A file name is not a directory name.
    let err = common::expect_err(archive.delete_entry("readme.md/"));
    assert!(matches!(err, Error::EntryNotFound { .. }));
}

#[test]
fn test_rename_entry() {
    let mut archive = sample();
    archive.rename_entry("readme.md", "README.md").unwrap();
    assert!(archive.entry("readme.md").is_none());

    let reloaded = Archive::from_bytes(archive.to_bytes().unwrap()).unwrap();
    assert_eq!(reloaded.read_entry("README.md", None).unwrap(), b"top");
}

#[test]
fn test_rename_onto_existing_replaces() {
    let mut archive = sample();
    archive
        .rename_entry("src/lib.rs", "src/main.rs")
        .unwrap();
    assert_eq!(archive.len(), 4);
    assert_eq!(
        archive.read_entry("src/main.rs", None).unwrap(),
        b"pub mod x;"
    );
}

#[test]
fn test_rename_missing_entry() {
    let mut archive = sample();
    let err = common::expect_err(archive.rename_entry("ghost.txt", "other.txt"));
    assert!(matches!(err, Error::EntryNotFound { .. }));
}

#[test]
fn test_edit_then_delete_then_save() {
    let mut archive = sample();
    archive
        .add_entry("new.txt", b"fresh".to_vec(), EntryOptions::new())
        .unwrap();
    archive.delete_entry("src/").unwrap();
    archive
        .entry_mut("readme.md")
        .unwrap()
        .set_comment("kept")
        .unwrap();

    let reloaded = Archive::from_bytes(archive.to_bytes().unwrap()).unwrap();
    let names: Vec<_> = reloaded.entries().map(|e| e.name().to_string()).collect();
    assert_eq!(names, ["assets/logo.svg", "new.txt", "readme.md"]);
    assert_eq!(reloaded.entry("readme.md").unwrap().comment(), "kept");
    assert_eq!(reloaded.read_entry("new.txt", None).unwrap(), b"fresh");
}

#[test]
fn test_name_and_comment_limits() {
    let mut archive = Archive::new();
    let err = common::expect_err(archive.add_entry(
        "x".repeat(u16::MAX as usize + 1),
        Vec::new(),
        EntryOptions::new(),
    ));
    assert!(matches!(err, Error::NameTooLong { .. }));

    let err = common::expect_err(archive.set_comment("y".repeat(u16::MAX as usize + 1)));
    assert!(matches!(err, Error::CommentTooLong { .. }));
}

#[test]
fn test_deleting_everything_leaves_valid_archive() {
    let mut archive = sample();
    for name in ["readme.md", "src/", "assets/"] {
        archive.delete_entry(name).unwrap();
    }
    assert!(archive.is_empty());

    let bytes = archive.to_bytes().unwrap();
    let reloaded = Archive::from_bytes(bytes).unwrap();
    assert!(reloaded.is_empty());
}
