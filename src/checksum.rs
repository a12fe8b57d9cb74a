//! Checksum computation utilities.
//!
//! CRC-32 (IEEE 802.3 polynomial) is the checksum used throughout the ZIP
//! format: every entry records the CRC of its uncompressed content, and the
//! legacy password cipher folds its key state through the same polynomial.
//!
//! # Example
//!
//! ```rust
//! use zipedit::checksum::Crc32;
//!
//! let mut crc = Crc32::new();
//! crc.update(b"Hello, ");
//! crc.update(b"World!");
//! let value = crc.finalize();
//!
//! // One-shot computation
//! assert_eq!(Crc32::compute(b"Hello, World!"), value);
//! ```

/// CRC-32 checksum calculator.
///
/// A thin streaming wrapper over [`crc32fast::Hasher`]. The lookup tables
/// live inside the hasher; no process-wide state is involved.
#[derive(Clone, Default)]
pub struct Crc32 {
    hasher: crc32fast::Hasher,
}

impl std::fmt::Debug for Crc32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crc32")
            .field("current", &self.hasher.clone().finalize())
            .finish()
    }
}

impl Crc32 {
    /// Creates a new CRC-32 calculator.
    pub fn new() -> Self {
        Self {
            hasher: crc32fast::Hasher::new(),
        }
    }

    /// Updates the checksum with additional data.
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Finishes the computation and returns the checksum value.
    pub fn finalize(&self) -> u32 {
        self.hasher.clone().finalize()
    }

    /// Resets the checksum to its initial state.
    pub fn reset(&mut self) {
        self.hasher.reset();
    }

    /// Computes the checksum of a single slice in one call.
    pub fn compute(data: &[u8]) -> u32 {
        crc32fast::hash(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_value() {
        // Standard CRC-32 test vector
        assert_eq!(Crc32::compute(b"123456789"), 0xCBF43926);
    }

    #[test]
    fn test_incremental_matches_oneshot() {
        let mut crc = Crc32::new();
        crc.update(b"Hello, ");
        crc.update(b"World!");
        assert_eq!(crc.finalize(), Crc32::compute(b"Hello, World!"));
    }

    #[test]
    fn test_reset() {
        let mut crc = Crc32::new();
        crc.update(b"garbage");
        crc.reset();
        crc.update(b"123456789");
        assert_eq!(crc.finalize(), 0xCBF43926);
    }

    #[test]
    fn test_empty() {
        assert_eq!(Crc32::compute(b""), 0);
    }
}
