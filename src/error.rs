//! # Error Types
//!
//! Custom error types for the sensor poller using `thiserror`.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Main error type for the sensor poller
#[derive(Debug, Error)]
pub enum PollerError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serial port could not be opened or configured
    #[error("Serial error: {0}")]
    Serial(String),

    /// None of the candidate serial devices could be opened
    #[error("No serial device found (tried: {0})")]
    SerialPortNotFound(String),

    /// GPIO line could not be exported or driven
    #[error("GPIO error: {0}")]
    Gpio(String),

    /// Command name not known to the protocol table
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Checksum name other than `xor` or `sum`
    #[error("Unknown checksum: {0}")]
    UnknownChecksum(String),
}

/// Failure on the write side of the serial peripheral
#[derive(Debug, Error)]
pub enum TransmitError {
    #[error("serial peripheral unavailable for transmit: {0}")]
    PeripheralUnavailable(#[source] io::Error),
}

/// Failure on the read side of the serial peripheral
///
/// An empty read is not an error; the sensor stream never ends.
#[derive(Debug, Error)]
pub enum ReceiveError {
    #[error("serial peripheral unavailable for receive: {0}")]
    PeripheralUnavailable(#[source] io::Error),

    /// Nothing has arrived for longer than the configured silence bound
    #[error("no data received for {}ms", .silent_for.as_millis())]
    Timeout { silent_for: Duration },
}

/// Result type alias for the sensor poller
pub type Result<T> = std::result::Result<T, PollerError>;
