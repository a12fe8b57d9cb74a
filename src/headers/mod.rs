//! ZIP record (de)serializers.
//!
//! Pure encode/decode over byte slices for the four fixed-layout records of
//! the ZIP container, plus the ZIP64 extra field and the streamed-entry data
//! descriptor. No I/O happens here; the archive index hands each codec a
//! window into the backing buffer.
//!
//! All multi-byte fields are little-endian. Every decode verifies the
//! record's 4-byte magic signature before reading any field.
//!
//! | Record | Signature | Fixed size |
//! |---|---|---|
//! | Local file header | `PK\x03\x04` | 30 |
//! | Central directory header | `PK\x01\x02` | 46 |
//! | End of central directory | `PK\x05\x06` | 22 |
//! | ZIP64 end of central directory | `PK\x06\x06` | 56 |
//! | ZIP64 end locator | `PK\x06\x07` | 20 |
//! | Data descriptor | `PK\x07\x08` | 12–24 |

mod central;
mod descriptor;
mod eocd;
mod extra;
mod local;

pub use central::CentralFileHeader;
pub use descriptor::DataDescriptor;
pub use eocd::{EndOfCentralDirectory, LocatedEnd, Zip64EndOfCentralDirectory, locate_end_record};
pub use extra::{Zip64ExtraField, build_zip64_extra, strip_zip64_extra};
pub use local::LocalFileHeader;

/// Local file header signature, `PK\x03\x04`.
pub const LOCAL_SIGNATURE: u32 = 0x0403_4B50;
/// Central directory header signature, `PK\x01\x02`.
pub const CENTRAL_SIGNATURE: u32 = 0x0201_4B50;
/// End of central directory signature, `PK\x05\x06`.
pub const END_SIGNATURE: u32 = 0x0605_4B50;
/// ZIP64 end of central directory signature, `PK\x06\x06`.
pub const ZIP64_END_SIGNATURE: u32 = 0x0606_4B50;
/// ZIP64 end of central directory locator signature, `PK\x06\x07`.
pub const ZIP64_LOCATOR_SIGNATURE: u32 = 0x0706_4B50;
/// Data descriptor signature, `PK\x07\x08`.
pub const DESCRIPTOR_SIGNATURE: u32 = 0x0807_4B50;

/// Fixed size of a local file header.
pub const LOCAL_HEADER_SIZE: usize = 30;
/// Fixed size of a central directory header.
pub const CENTRAL_HEADER_SIZE: usize = 46;
/// Fixed size of the end of central directory record (without comment).
pub const END_RECORD_SIZE: usize = 22;
/// Fixed size of the ZIP64 end of central directory record.
pub const ZIP64_END_RECORD_SIZE: usize = 56;
/// Fixed size of the ZIP64 end locator.
pub const ZIP64_LOCATOR_SIZE: usize = 20;

/// Sentinel marking a 32-bit field overridden by a ZIP64 extra field.
pub const ZIP64_MARKER_U32: u32 = 0xFFFF_FFFF;
/// Sentinel marking a 16-bit field overridden by a ZIP64 extra field.
pub const ZIP64_MARKER_U16: u16 = 0xFFFF;

/// General-purpose flag bit 0: entry is encrypted with the legacy cipher.
pub const FLAG_ENCRYPTED: u16 = 0x0001;
/// General-purpose flag bit 3: sizes/CRC live in a trailing data descriptor.
pub const FLAG_DATA_DESCRIPTOR: u16 = 0x0008;
/// General-purpose flag bit 11: name and comment are UTF-8.
pub const FLAG_UTF8: u16 = 0x0800;

pub(crate) fn read_u16_le(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes(buf[offset..offset + 2].try_into().unwrap())
}

pub(crate) fn read_u32_le(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap())
}

pub(crate) fn read_u64_le(buf: &[u8], offset: usize) -> u64 {
    u64::from_le_bytes(buf[offset..offset + 8].try_into().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signatures_are_pk_prefixed() {
        for sig in [
            LOCAL_SIGNATURE,
            CENTRAL_SIGNATURE,
            END_SIGNATURE,
            ZIP64_END_SIGNATURE,
            ZIP64_LOCATOR_SIGNATURE,
            DESCRIPTOR_SIGNATURE,
        ] {
            let bytes = sig.to_le_bytes();
            assert_eq!(&bytes[..2], b"PK");
        }
    }

    #[test]
    fn test_le_helpers() {
        let buf = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
        assert_eq!(read_u16_le(&buf, 0), 0x0201);
        assert_eq!(read_u32_le(&buf, 0), 0x0403_0201);
        assert_eq!(read_u64_le(&buf, 0), 0x0807_0605_0403_0201);
    }
}
