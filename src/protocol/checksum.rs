//! # Frame Checksums
//!
//! Single-byte integrity checks computed over a command payload.
//!
//! **XOR** (default): bitwise XOR of every payload byte, initial value 0x00.
//! **Sum**: wrapping 8-bit sum of every payload byte, initial value 0x00.
//!
//! Neither covers the header or the terminator.

/// Signature shared by every checksum the frame builder accepts
pub type ChecksumFn = fn(&[u8]) -> u8;

/// Calculate the XOR checksum of a byte sequence
///
/// XOR is associative and commutative, so the result does not depend on
/// byte order and the empty sequence yields 0.
///
/// # Examples
///
/// ```
/// use sensor_poller::protocol::checksum::xor_checksum;
///
/// assert_eq!(xor_checksum(&[0x00, 0x22, 0x00, 0x00]), 0x22);
/// assert_eq!(xor_checksum(&[]), 0x00);
/// ```
pub fn xor_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &byte| acc ^ byte)
}

/// Calculate the wrapping 8-bit sum of a byte sequence
///
/// Some module firmwares check frames with the low byte of the payload sum
/// instead of XOR.
pub fn sum_checksum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &byte| acc.wrapping_add(byte))
}
