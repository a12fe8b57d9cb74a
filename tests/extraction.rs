//! Disk-facing integration tests: extraction, overwrite policy, hostile
//! entry names, metadata restoration, and folder ingestion.

mod common;

use std::fs;

use zipedit::{Archive, EntryOptions, Error, ExtractOptions};

#[test]
fn test_extract_all_recreates_tree() {
    let bytes = common::build_archive(&[
        ("hello.txt", b"hi"),
        ("docs/guide.md", b"# guide"),
        ("docs/api/reference.md", b"# api"),
    ]);
    let archive = Archive::from_bytes(bytes).unwrap();

    let dir = tempfile::tempdir().unwrap();
    archive
        .extract_all_to(dir.path(), &ExtractOptions::new())
        .unwrap();

    assert_eq!(fs::read(dir.path().join("hello.txt")).unwrap(), b"hi");
    assert_eq!(fs::read(dir.path().join("docs/guide.md")).unwrap(), b"# guide");
    assert_eq!(
        fs::read(dir.path().join("docs/api/reference.md")).unwrap(),
        b"# api"
    );
    assert!(dir.path().join("docs/api").is_dir());
}

#[test]
fn test_overwrite_policy() {
    let bytes = common::build_archive(&[("hello.txt", b"new")]);
    let archive = Archive::from_bytes(bytes).unwrap();

    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("hello.txt"), b"old").unwrap();

    let err = common::expect_err(archive.extract_all_to(dir.path(), &ExtractOptions::new()));
    assert!(matches!(err, Error::CantOverwrite { .. }));
    assert_eq!(fs::read(dir.path().join("hello.txt")).unwrap(), b"old");

    archive
        .extract_all_to(dir.path(), &ExtractOptions::new().overwrite(true))
        .unwrap();
    assert_eq!(fs::read(dir.path().join("hello.txt")).unwrap(), b"new");
}

#[test]
fn test_zip_slip_clamped() {
    let mut archive = Archive::new();
    for name in [
        "../../outside.txt",
        "/etc/absolute.txt",
        "C:\\windows\\drive.txt",
        "nested/../../sneaky.txt",
    ] {
        archive
            .add_entry(name, b"payload".to_vec(), EntryOptions::new())
            .unwrap();
    }

    let outer = tempfile::tempdir().unwrap();
    let dest = outer.path().join("dest");
    archive
        .extract_all_to(&dest, &ExtractOptions::new())
        .unwrap();

    // Nothing escaped the destination root.
    assert!(!outer.path().join("outside.txt").exists());
    assert!(!outer.path().join("sneaky.txt").exists());
    assert!(dest.join("outside.txt").exists());
    assert!(dest.join("etc/absolute.txt").exists());
    assert!(dest.join("windows/drive.txt").exists());
    assert!(dest.join("nested/sneaky.txt").exists());
}

#[test]
fn test_extract_single_entry_by_name() {
    let bytes = common::build_archive(&[("keep/this.txt", b"kept"), ("skip/that.txt", b"skipped")]);
    let archive = Archive::from_bytes(bytes).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let written = archive
        .extract_entry_to("keep/this.txt", dir.path(), &ExtractOptions::new())
        .unwrap();
    assert_eq!(fs::read(&written).unwrap(), b"kept");
    assert!(!dir.path().join("skip").exists());

    let err = common::expect_err(archive.extract_entry_to(
        "missing.txt",
        dir.path(),
        &ExtractOptions::new(),
    ));
    assert!(matches!(err, Error::EntryNotFound { .. }));
}

#[test]
fn test_folder_roundtrip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("project");
    fs::create_dir_all(src.join("src")).unwrap();
    fs::create_dir_all(src.join("docs")).unwrap();
    fs::write(src.join("Cargo.toml"), b"[package]").unwrap();
    fs::write(src.join("src/main.rs"), b"fn main() {}").unwrap();
    fs::write(src.join("docs/notes.md"), b"- note").unwrap();

    let mut archive = Archive::new();
    let count = archive.add_local_folder(&src, Some("project")).unwrap();
    assert_eq!(count, 5);

    let zip_path = dir.path().join("project.zip");
    archive.write_path(&zip_path).unwrap();

    let reopened = Archive::open(&zip_path).unwrap();
    let dest = dir.path().join("unpacked");
    reopened
        .extract_all_to(&dest, &ExtractOptions::new())
        .unwrap();

    assert_eq!(
        fs::read(dest.join("project/src/main.rs")).unwrap(),
        b"fn main() {}"
    );
    assert_eq!(
        fs::read(dest.join("project/docs/notes.md")).unwrap(),
        b"- note"
    );
}

#[test]
fn test_open_missing_file() {
    let err = common::expect_err(Archive::open("/no/such/archive.zip"));
    assert!(matches!(err, Error::FileNotFound { .. }));
}

#[cfg(unix)]
#[test]
fn test_executable_bit_roundtrip() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let script = dir.path().join("run.sh");
    fs::write(&script, b"#!/bin/sh\nexit 0\n").unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let mut archive = Archive::new();
    archive.add_local_file(&script, None).unwrap();
    let reloaded = Archive::from_bytes(archive.to_bytes().unwrap()).unwrap();
    assert_eq!(reloaded.entry("run.sh").unwrap().unix_mode(), Some(0o755));

    let dest = dir.path().join("out");
    reloaded
        .extract_all_to(&dest, &ExtractOptions::new())
        .unwrap();
    let mode = fs::metadata(dest.join("run.sh")).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o755);
}

#[test]
fn test_windows_reserved_names_neutralized() {
    let mut archive = Archive::new();
    archive
        .add_entry("CON", b"device".to_vec(), EntryOptions::new())
        .unwrap();
    archive
        .add_entry("logs/aux.log", b"log".to_vec(), EntryOptions::new())
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    archive
        .extract_all_to(dir.path(), &ExtractOptions::new())
        .unwrap();
    assert!(dir.path().join("_CON").exists());
    assert!(dir.path().join("logs/_aux.log").exists());
}
