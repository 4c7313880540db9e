//! # Serial Communication Module
//!
//! Handles the UART link to the sensor module.
//!
//! This module handles:
//! - Opening the serial port at 115200 baud, 8N1, no flow control
//! - Splitting the port into owned transmit and receive halves
//! - Single-write frame transmission with short-write reporting
//! - Time-bounded reads into a reusable receive buffer

pub mod port_trait;
pub mod receive;
pub mod transmit;

use tokio::io::{ReadHalf, WriteHalf};
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

use crate::error::{PollerError, Result};
use port_trait::{TokioSerialReader, TokioSerialWriter};
pub use receive::ReceiveChannel;
pub use transmit::TransmitChannel;

/// Sensor module baud rate
pub const SENSOR_BAUD_RATE: u32 = 115_200;

/// Default device paths to try (in order of preference)
pub const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyUSB0", // USB-to-serial adapters
    "/dev/ttyACM0", // USB CDC devices
];

/// Transmit channel over the write half of a real serial port
pub type SerialTransmit = TransmitChannel<TokioSerialWriter<WriteHalf<tokio_serial::SerialStream>>>;

/// Receive channel over the read half of a real serial port
pub type SerialReceive = ReceiveChannel<TokioSerialReader<ReadHalf<tokio_serial::SerialStream>>>;

/// Sensor serial port handle
///
/// Sole owner of the port until [`split`](SensorSerial::split) hands the two
/// halves to their channels.
pub struct SensorSerial {
    /// Serial port handle
    port: tokio_serial::SerialStream,
    /// Device path (e.g., /dev/ttyUSB0)
    device_path: String,
}

impl std::fmt::Debug for SensorSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorSerial")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl SensorSerial {
    /// Open connection to the sensor module
    ///
    /// Auto-detects the device by trying common paths.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sensor_poller::serial::SensorSerial;
    ///
    /// fn main() -> anyhow::Result<()> {
    ///     let serial = SensorSerial::open()?;
    ///     Ok(())
    /// }
    /// ```
    pub fn open() -> Result<Self> {
        Self::open_with_paths(DEFAULT_DEVICE_PATHS, SENSOR_BAUD_RATE)
    }

    /// Open connection to the sensor module with custom device paths
    ///
    /// # Arguments
    ///
    /// * `paths` - Device paths to try, in order
    /// * `baud_rate` - Line speed
    ///
    /// # Errors
    ///
    /// Returns `SerialPortNotFound` listing every path if none could be opened
    pub fn open_with_paths<S: AsRef<str>>(paths: &[S], baud_rate: u32) -> Result<Self> {
        for path in paths {
            let path = path.as_ref();
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate) {
                Ok(port) => {
                    info!("Successfully opened sensor device at {} ({} baud)", path, baud_rate);
                    return Ok(Self {
                        port,
                        device_path: path.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        let tried: Vec<&str> = paths.iter().map(|p| p.as_ref()).collect();
        Err(PollerError::SerialPortNotFound(tried.join(", ")))
    }

    /// Open a specific serial port with 8N1 settings
    fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .open_native_async()
            .map_err(|e| PollerError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }

    /// Split the port into its transmit and receive channels
    ///
    /// # Arguments
    ///
    /// * `rx_buffer_size` - Capacity of the receive buffer
    pub fn split(self, rx_buffer_size: usize) -> (SerialTransmit, SerialReceive) {
        let (read_half, write_half) = tokio::io::split(self.port);
        (
            TransmitChannel::new(TokioSerialWriter::new(write_half)),
            ReceiveChannel::new(TokioSerialReader::new(read_half), rx_buffer_size),
        )
    }

    /// Get the device path of the opened serial port
    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}
