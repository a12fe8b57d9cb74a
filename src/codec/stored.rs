//! STORED (method 0): the payload is the content, byte for byte.

/// "Compresses" by copying.
pub fn compress(data: &[u8]) -> Vec<u8> {
    data.to_vec()
}

/// "Decompresses" by copying.
pub fn decompress(data: &[u8]) -> Vec<u8> {
    data.to_vec()
}
