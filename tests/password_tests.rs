//! Legacy ZipCrypto password tests: encrypted writes, decryption, wrong
//! password detection, and the distinction between credential errors and
//! corruption errors.

mod common;

use zipedit::{Archive, EntryOptions, Error, Password, SaltPolicy};

fn encrypted_archive(password: &str) -> Vec<u8> {
    let mut archive = Archive::new();
    archive.set_salt_policy(SaltPolicy::Deterministic { seed: 99 });
    archive
        .add_entry(
            "secret/plans.txt",
            b"the secret plans".to_vec(),
            EntryOptions::new().password(password),
        )
        .unwrap();
    archive
        .add_entry("public/readme.txt", b"not secret".to_vec(), EntryOptions::new())
        .unwrap();
    archive.to_bytes().unwrap()
}

#[test]
fn test_encrypted_entry_roundtrip() {
    let bytes = encrypted_archive("correct horse");
    let archive = Archive::from_bytes(bytes).unwrap();

    let entry = archive.entry("secret/plans.txt").unwrap();
    assert!(entry.is_encrypted());
    // The 12-byte salt header is part of the stored payload.
    assert!(entry.compressed_size() >= 12);

    let password = Password::from("correct horse");
    assert_eq!(
        archive.read_entry("secret/plans.txt", Some(&password)).unwrap(),
        b"the secret plans"
    );
}

#[test]
fn test_plain_entries_ignore_password() {
    let bytes = encrypted_archive("pw");
    let archive = Archive::from_bytes(bytes).unwrap();
    assert!(!archive.entry("public/readme.txt").unwrap().is_encrypted());

    // Unencrypted entries read fine with or without a password.
    assert_eq!(
        archive.read_entry("public/readme.txt", None).unwrap(),
        b"not secret"
    );
    assert_eq!(
        archive
            .read_entry("public/readme.txt", Some(&Password::from("pw")))
            .unwrap(),
        b"not secret"
    );
}

#[test]
fn test_password_required() {
    let archive = Archive::from_bytes(encrypted_archive("pw")).unwrap();
    let err = common::expect_err(archive.read_entry("secret/plans.txt", None));
    assert!(matches!(err, Error::PasswordRequired { .. }));
}

#[test]
fn test_wrong_password_is_not_corruption() {
    let archive = Archive::from_bytes(encrypted_archive("right")).unwrap();

    // The one-byte salt check lets roughly 1 in 256 wrong passwords through
    // to the CRC stage, so a single sample could legitimately surface as a
    // CrcMismatch. Sample a few: nearly all must be flagged as credential
    // errors and none may succeed.
    let mut credential_errors = 0;
    for guess in ["wrong", "also-wrong", "nope", "hunter3"] {
        let err = common::expect_err(
            archive.read_entry("secret/plans.txt", Some(&Password::from(guess))),
        );
        match err {
            Error::WrongPassword { .. } => {
                assert!(err.is_credential_error());
                assert!(!err.is_format_error());
                credential_errors += 1;
            }
            // A false-positive check byte decrypts to garbage, which then
            // fails either inflation or the CRC comparison.
            Error::CrcMismatch { .. } | Error::Io(_) => {}
            other => panic!("unexpected error for wrong password: {}", other),
        }
    }
    assert!(credential_errors >= 3);
}

#[test]
fn test_integrity_check_with_password() {
    let archive = Archive::from_bytes(encrypted_archive("pw")).unwrap();
    assert!(archive.test(Some(&Password::from("pw"))));
    // Without the password the encrypted entry fails the check.
    assert!(!archive.test(None));
    assert!(!archive.test(Some(&Password::from("wrong"))));
}

#[test]
fn test_deterministic_salt_gives_deterministic_bytes() {
    assert_eq!(encrypted_archive("pw"), encrypted_archive("pw"));
    // A different password changes the cipher stream.
    assert_ne!(encrypted_archive("pw"), encrypted_archive("other"));
}

#[test]
fn test_random_salt_varies() {
    let build = || {
        let mut archive = Archive::new();
        archive
            .add_entry(
                "s.txt",
                b"same content".to_vec(),
                EntryOptions::new().password("pw"),
            )
            .unwrap();
        archive.to_bytes().unwrap()
    };
    // Random salts should differ between runs; both must still decrypt.
    let a = build();
    let b = build();
    for bytes in [a, b] {
        let archive = Archive::from_bytes(bytes).unwrap();
        assert_eq!(
            archive
                .read_entry("s.txt", Some(&Password::from("pw")))
                .unwrap(),
            b"same content"
        );
    }
}

#[test]
fn test_encrypted_payload_survives_resave() {
    // An encrypted entry loaded from an archive is copied through a resave
    // without needing its password.
    let bytes = encrypted_archive("pw");
    let mut archive = Archive::from_bytes(bytes).unwrap();
    archive
        .add_entry("added.txt", b"later".to_vec(), EntryOptions::new())
        .unwrap();
    let resaved = archive.to_bytes().unwrap();

    let reloaded = Archive::from_bytes(resaved).unwrap();
    assert_eq!(
        reloaded
            .read_entry("secret/plans.txt", Some(&Password::from("pw")))
            .unwrap(),
        b"the secret plans"
    );
    assert_eq!(reloaded.read_entry("added.txt", None).unwrap(), b"later");
}

#[test]
fn test_empty_password_is_a_password() {
    let mut archive = Archive::new();
    archive.set_salt_policy(SaltPolicy::Deterministic { seed: 1 });
    archive
        .add_entry(
            "e.txt",
            b"content".to_vec(),
            EntryOptions::new().password(""),
        )
        .unwrap();
    let reloaded = Archive::from_bytes(archive.to_bytes().unwrap()).unwrap();
    assert_eq!(
        reloaded.read_entry("e.txt", Some(&Password::from(""))).unwrap(),
        b"content"
    );
}
