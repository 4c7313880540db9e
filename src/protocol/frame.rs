//! # Command Frame Builder
//!
//! Builds outbound command frames:
//!
//! ```text
//! [HEADER][PAYLOAD ...][CHECKSUM][TERMINATOR]
//! ```
//!
//! The frame is always exactly `payload.len() + 3` bytes. The checksum and
//! terminator positions are derived from the payload length, never from a
//! buffer capacity.

use super::checksum::{xor_checksum, ChecksumFn};
use super::FRAME_OVERHEAD;

/// A complete outbound command frame
///
/// Immutable once built; the bytes are handed to the transmit channel as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    bytes: Vec<u8>,
}

impl CommandFrame {
    /// Raw frame bytes in wire order
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Total frame length (header + payload + checksum + terminator)
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; a frame carries at least its header, checksum and terminator
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn header(&self) -> u8 {
        self.bytes[0]
    }

    /// Payload bytes between the header and the checksum
    pub fn payload(&self) -> &[u8] {
        &self.bytes[1..self.bytes.len() - 2]
    }

    pub fn checksum(&self) -> u8 {
        self.bytes[self.bytes.len() - 2]
    }

    pub fn terminator(&self) -> u8 {
        self.bytes[self.bytes.len() - 1]
    }

    /// Consume the frame, returning its bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl AsRef<[u8]> for CommandFrame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Build a command frame using the XOR checksum
///
/// # Arguments
///
/// * `header` - Leading frame byte (0xBB for the sensor module)
/// * `payload` - Command payload; its length is validated by the caller
/// * `terminator` - Trailing frame byte (0x7E for the sensor module)
///
/// # Examples
///
/// ```
/// use sensor_poller::protocol::frame::build_frame;
///
/// let frame = build_frame(0xBB, &[0x00, 0x22, 0x00, 0x00], 0x7E);
/// assert_eq!(frame.as_bytes(), &[0xBB, 0x00, 0x22, 0x00, 0x00, 0x22, 0x7E]);
/// ```
pub fn build_frame(header: u8, payload: &[u8], terminator: u8) -> CommandFrame {
    build_frame_with(header, payload, terminator, xor_checksum)
}

/// Build a command frame with an explicit checksum function
///
/// An empty payload produces `[header, checksum(&[]), terminator]`.
pub fn build_frame_with(
    header: u8,
    payload: &[u8],
    terminator: u8,
    checksum: ChecksumFn,
) -> CommandFrame {
    let mut bytes = Vec::with_capacity(payload.len() + FRAME_OVERHEAD);
    bytes.push(header);
    bytes.extend_from_slice(payload);
    bytes.push(checksum(payload));
    bytes.push(terminator);

    debug_assert_eq!(bytes.len(), payload.len() + FRAME_OVERHEAD);
    CommandFrame { bytes }
}
