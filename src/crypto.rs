//! Legacy ZipCrypto stream cipher.
//!
//! The traditional PKWARE cipher: three rolling 32-bit keys seeded from the
//! password, advanced by a CRC-32 shift register and a linear congruential
//! step. Each entry's payload is preceded by a 12-byte salt header whose
//! last byte doubles as a cheap password check, so a wrong password is
//! usually caught before any payload is touched.
//!
//! The cipher is long broken and kept only for interoperability with the
//! many archives that still use it. Nothing here protects against a
//! determined attacker.

use crate::error::{Error, Result};
use crate::headers::FLAG_DATA_DESCRIPTOR;

/// Length of the encrypted salt header preceding each payload.
pub const SALT_LENGTH: usize = 12;

const KEY0_INIT: u32 = 0x1234_5678;
const KEY1_INIT: u32 = 0x2345_6789;
const KEY2_INIT: u32 = 0x3456_7890;
const KEY1_MULTIPLIER: u32 = 134_775_813;

/// A password for the legacy cipher, kept as raw bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Vec<u8>);

impl Password {
    /// Wraps password bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// The raw password bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for Password {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<String> for Password {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl std::fmt::Debug for Password {
    // Never prints the password itself.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Password(<{} bytes>)", self.0.len())
    }
}

const CRC_TABLE: [u32; 256] = build_crc_table();

const fn build_crc_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ 0xEDB8_8320
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

fn crc_shift(crc: u32, byte: u8) -> u32 {
    (crc >> 8) ^ CRC_TABLE[((crc ^ byte as u32) & 0xFF) as usize]
}

/// The three rolling cipher keys.
struct Keys {
    key0: u32,
    key1: u32,
    key2: u32,
}

impl Keys {
    fn new(password: &Password) -> Self {
        let mut keys = Self {
            key0: KEY0_INIT,
            key1: KEY1_INIT,
            key2: KEY2_INIT,
        };
        for &byte in password.as_bytes() {
            keys.update(byte);
        }
        keys
    }

    fn update(&mut self, byte: u8) {
        self.key0 = crc_shift(self.key0, byte);
        self.key1 = self
            .key1
            .wrapping_add(self.key0 & 0xFF)
            .wrapping_mul(KEY1_MULTIPLIER)
            .wrapping_add(1);
        self.key2 = crc_shift(self.key2, (self.key1 >> 24) as u8);
    }

    fn stream_byte(&self) -> u8 {
        let temp = (self.key2 | 2) as u16;
        (temp.wrapping_mul(temp ^ 1) >> 8) as u8
    }

    fn decrypt_byte(&mut self, byte: u8) -> u8 {
        let plain = byte ^ self.stream_byte();
        self.update(plain);
        plain
    }

    fn encrypt_byte(&mut self, byte: u8) -> u8 {
        let cipher = byte ^ self.stream_byte();
        self.update(byte);
        cipher
    }
}

/// How the 11 random bytes of the salt header are produced.
///
/// The twelfth byte is always the password-check byte and is never caller
/// controlled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaltPolicy {
    /// Clock-derived salt. Fine for format compliance; the cipher offers
    /// no real secrecy either way.
    Random,
    /// Salt derived from a fixed seed, for reproducible output.
    Deterministic {
        /// Generator seed.
        seed: u64,
    },
    /// Caller-supplied salt bytes.
    Explicit([u8; SALT_LENGTH - 1]),
}

impl Default for SaltPolicy {
    fn default() -> Self {
        Self::Random
    }
}

impl SaltPolicy {
    fn salt_bytes(&self) -> [u8; SALT_LENGTH - 1] {
        match self {
            Self::Explicit(bytes) => *bytes,
            Self::Deterministic { seed } => generate_salt(*seed),
            Self::Random => {
                let now = std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .map(|d| d.as_nanos() as u64)
                    .unwrap_or(0x9E37_79B9_7F4A_7C15);
                generate_salt(now)
            }
        }
    }
}

fn generate_salt(seed: u64) -> [u8; SALT_LENGTH - 1] {
    // splitmix64 over the seed; plenty for a non-secret salt.
    let mut out = [0u8; SALT_LENGTH - 1];
    let mut state = seed;
    for byte in out.iter_mut() {
        state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        *byte = (z ^ (z >> 31)) as u8;
    }
    out
}

/// The byte the last salt position must decrypt to.
///
/// Streamed entries (descriptor flag set) had no CRC at encryption time, so
/// they verify against the high byte of the DOS time word instead of the
/// high byte of the CRC.
pub fn verification_byte(flags: u16, crc32: u32, time_word: u16) -> u8 {
    if flags & FLAG_DATA_DESCRIPTOR != 0 {
        (time_word >> 8) as u8
    } else {
        (crc32 >> 24) as u8
    }
}

/// Decrypts an entry payload, verifying the password via the salt header.
///
/// `data` is the raw payload including the 12-byte salt; the returned bytes
/// are the decrypted compressed stream with the salt removed. A failed
/// check byte is [`Error::WrongPassword`]; the roughly 1-in-256 false
/// accept is caught later by the CRC check.
pub fn decrypt(data: &[u8], password: &Password, check_byte: u8, entry: &str) -> Result<Vec<u8>> {
    if data.len() < SALT_LENGTH {
        return Err(Error::InvalidFormat(format!(
            "encrypted payload of '{}' is shorter than its salt header",
            entry
        )));
    }

    let mut keys = Keys::new(password);
    let mut last = 0u8;
    for &byte in &data[..SALT_LENGTH] {
        last = keys.decrypt_byte(byte);
    }
    if last != check_byte {
        return Err(Error::WrongPassword {
            entry: entry.to_string(),
        });
    }

    Ok(data[SALT_LENGTH..]
        .iter()
        .map(|&byte| keys.decrypt_byte(byte))
        .collect())
}

/// Encrypts a compressed payload, prepending the 12-byte salt header.
pub fn encrypt(data: &[u8], password: &Password, check_byte: u8, policy: &SaltPolicy) -> Vec<u8> {
    let mut keys = Keys::new(password);
    let mut out = Vec::with_capacity(SALT_LENGTH + data.len());

    for byte in policy.salt_bytes() {
        out.push(keys.encrypt_byte(byte));
    }
    out.push(keys.encrypt_byte(check_byte));
    out.extend(data.iter().map(|&byte| keys.encrypt_byte(byte)));
    out
}
