//! Frame checksum
//!
//! The SERVO42C uses the low byte of the plain arithmetic sum. The same
//! function builds the trailer on send and checks it on receive.

/// Sum of `bytes`, truncated to 8 bits
#[inline]
#[must_use]
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |sum, &byte| sum.wrapping_add(byte))
}

/// Check that the last byte of `frame` is the checksum of the rest
///
/// Frames shorter than two bytes never verify.
#[must_use]
pub fn verify(frame: &[u8]) -> bool {
    match frame.split_last() {
        Some((&trailer, body)) if !body.is_empty() => checksum(body) == trailer,
        _ => false,
    }
}
