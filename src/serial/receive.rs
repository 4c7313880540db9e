//! # Receive Channel
//!
//! Exclusive owner of the serial read half and of the receive buffer.

use std::time::Duration;
use tokio::time::{sleep_until, timeout_at, Instant};

use super::port_trait::SerialReader;
use crate::error::ReceiveError;

/// Smallest buffer that still leaves one usable byte
pub const MIN_RX_BUFFER_SIZE: usize = 2;

/// Pause between retries when the peripheral returns zero bytes at once
const EMPTY_READ_BACKOFF: Duration = Duration::from_millis(10);

/// Read side of the sensor link
///
/// The buffer is allocated once and overwritten from offset 0 on every read.
/// One byte of capacity is held back, so a single read never yields more
/// than `capacity - 1` bytes.
pub struct ReceiveChannel<R> {
    reader: R,
    buffer: Box<[u8]>,
}

impl<R: SerialReader> ReceiveChannel<R> {
    /// Create a channel with a buffer of `capacity` bytes
    ///
    /// `capacity` is raised to [`MIN_RX_BUFFER_SIZE`] if smaller.
    pub fn new(reader: R, capacity: usize) -> Self {
        let capacity = capacity.max(MIN_RX_BUFFER_SIZE);
        Self {
            reader,
            buffer: vec![0u8; capacity].into_boxed_slice(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Maximum number of bytes a single read can return
    pub fn max_read_len(&self) -> usize {
        self.buffer.len() - 1
    }

    /// Wait up to `wait` for bytes and return what arrived
    ///
    /// Returns early as soon as any bytes are available. Zero-length reads from
    /// the peripheral are retried after a short pause until `wait` runs out.
    /// An empty slice means nothing arrived yet; it is not an error and not
    /// end-of-stream. The slice borrows the channel's buffer and is invalidated
    /// by the next read.
    ///
    /// # Errors
    ///
    /// Returns `ReceiveError::PeripheralUnavailable` if the peripheral reports a fault.
    pub async fn read(&mut self, wait: Duration) -> Result<&[u8], ReceiveError> {
        let usable = self.buffer.len() - 1;
        let deadline = Instant::now() + wait;

        loop {
            let result = timeout_at(deadline, self.reader.read(&mut self.buffer[..usable])).await;
            match result {
                Ok(Ok(0)) => {
                    // Hung-up ttys report EOF as an immediate zero-length read
                    if Instant::now() >= deadline {
                        return Ok(&[]);
                    }
                    sleep_until((Instant::now() + EMPTY_READ_BACKOFF).min(deadline)).await;
                }
                Ok(Ok(n)) => return Ok(&self.buffer[..n.min(usable)]),
                Ok(Err(e)) => return Err(ReceiveError::PeripheralUnavailable(e)),
                Err(_elapsed) => return Ok(&[]),
            }
        }
    }
}
