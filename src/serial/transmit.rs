//! # Transmit Channel
//!
//! Exclusive owner of the serial write half.

use tracing::{debug, info};

use super::port_trait::SerialWriter;
use crate::error::TransmitError;
use crate::protocol::frame::CommandFrame;

/// Write side of the sensor link
pub struct TransmitChannel<W> {
    writer: W,
}

impl<W: SerialWriter> TransmitChannel<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Send a frame to the peripheral
    ///
    /// Issues a single write and reports how many bytes the peripheral
    /// accepted. A short write is returned as `Ok` with the reduced count and
    /// is not retried; the poller sends a fresh frame next period anyway.
    ///
    /// # Errors
    ///
    /// Returns `TransmitError::PeripheralUnavailable` if the write or the
    /// following flush fails.
    pub async fn send(&mut self, frame: &CommandFrame) -> Result<usize, TransmitError> {
        self.send_bytes(frame.as_bytes()).await
    }

    /// Send raw bytes; same contract as [`send`](Self::send)
    pub async fn send_bytes(&mut self, bytes: &[u8]) -> Result<usize, TransmitError> {
        let written = self
            .writer
            .write(bytes)
            .await
            .map_err(TransmitError::PeripheralUnavailable)?;

        self.writer
            .flush()
            .await
            .map_err(TransmitError::PeripheralUnavailable)?;

        info!(target: "tx", "Wrote {} bytes", written);
        if written < bytes.len() {
            debug!(target: "tx", "Short write: {} of {} bytes accepted", written, bytes.len());
        }

        Ok(written)
    }
}
