//! # Receive Loop
//!
//! Drains the receive channel for the lifetime of the process, logs every
//! non-empty span, and optionally hands a copy to a consumer.
//!
//! Received bytes are opaque. They are never decoded and never assumed to be
//! terminated.

use bytes::Bytes;
use std::fmt::Write as _;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::SerialConfig;
use crate::error::ReceiveError;
use crate::serial::port_trait::SerialReader;
use crate::serial::ReceiveChannel;

/// Bytes per hex dump row
const HEX_DUMP_WIDTH: usize = 16;

/// Counters kept across reads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiveStats {
    pub reads: u64,
    pub bytes: u64,
    pub faults: u64,
    pub dropped_spans: u64,
}

/// Long-running consumer of the receive channel
pub struct Receiver<R> {
    rx: ReceiveChannel<R>,
    read_timeout: Duration,
    silence_warn: Option<Duration>,
    sink: Option<mpsc::Sender<Bytes>>,
    last_data: Instant,
    silence_reported: bool,
    stats: ReceiveStats,
}

impl<R: SerialReader> Receiver<R> {
    pub fn new(rx: ReceiveChannel<R>, read_timeout: Duration, silence_warn: Option<Duration>) -> Self {
        Self {
            rx,
            read_timeout,
            silence_warn,
            sink: None,
            last_data: Instant::now(),
            silence_reported: false,
            stats: ReceiveStats::default(),
        }
    }

    /// Create a receiver from the `[serial]` config section
    pub fn from_config(rx: ReceiveChannel<R>, config: &SerialConfig) -> Self {
        Self::new(rx, config.read_timeout(), config.silence_warn())
    }

    /// Forward a copy of every non-empty span to `sink`
    ///
    /// Spans are offered with `try_send`; when the consumer falls behind they
    /// are dropped rather than stalling the read loop.
    pub fn with_sink(mut self, sink: mpsc::Sender<Bytes>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn stats(&self) -> ReceiveStats {
        self.stats
    }

    /// Perform one bounded read, log it and forward it
    ///
    /// Returns the number of bytes received, which may be zero.
    ///
    /// # Errors
    ///
    /// - `PeripheralUnavailable` if the read failed
    /// - `Timeout` once per silent stretch longer than the silence bound
    pub async fn receive_once(&mut self) -> Result<usize, ReceiveError> {
        let data = match self.rx.read(self.read_timeout).await {
            Ok(data) => data,
            Err(e) => {
                self.stats.faults += 1;
                return Err(e);
            }
        };
        self.stats.reads += 1;

        if data.is_empty() {
            return self.check_silence().map(|_| 0);
        }

        let len = data.len();
        self.stats.bytes += len as u64;
        info!(target: "rx", "Read {} bytes: {}", len, hex_string(data));
        debug!(target: "rx", "\n{}", hex_dump(data));

        if let Some(sink) = &self.sink {
            if sink.try_send(Bytes::copy_from_slice(data)).is_err() {
                self.stats.dropped_spans += 1;
                debug!(target: "rx", "Consumer not keeping up, dropped {} bytes", len);
            }
        }

        self.last_data = Instant::now();
        self.silence_reported = false;
        Ok(len)
    }

    fn check_silence(&mut self) -> Result<(), ReceiveError> {
        let Some(bound) = self.silence_warn else {
            return Ok(());
        };

        let silent_for = self.last_data.elapsed();
        if silent_for >= bound && !self.silence_reported {
            self.silence_reported = true;
            return Err(ReceiveError::Timeout { silent_for });
        }
        Ok(())
    }

    /// Receive forever
    pub async fn run(mut self) {
        info!(target: "rx", "Receiving with {}ms read timeout, {} byte buffer",
            self.read_timeout.as_millis(), self.rx.capacity());
        loop {
            match self.receive_once().await {
                Ok(_) => {}
                Err(e @ ReceiveError::Timeout { .. }) => {
                    warn!(target: "rx", "{}", e);
                }
                Err(e) => {
                    error!(target: "rx", "{}", e);
                    // A faulted port usually fails immediately; don't spin on it
                    tokio::time::sleep(self.read_timeout).await;
                }
            }
        }
    }
}

/// Format bytes as space-separated uppercase hex, e.g. `BB 01 7E`
pub fn hex_string(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 3);
    for (i, byte) in data.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{:02X}", byte);
    }
    out
}

/// Format bytes as a multi-line hex dump
///
/// Each row holds up to 16 bytes: an offset column, the hex bytes, and the
/// printable ASCII characters (`.` for everything else).
///
/// ```text
/// 0x0000   bb 00 22 00 00 22 7e                              |..".."~|
/// ```
pub fn hex_dump(data: &[u8]) -> String {
    let mut out = String::new();
    for (row, chunk) in data.chunks(HEX_DUMP_WIDTH).enumerate() {
        if row > 0 {
            out.push('\n');
        }
        let _ = write!(out, "0x{:04x}  ", row * HEX_DUMP_WIDTH);
        for i in 0..HEX_DUMP_WIDTH {
            match chunk.get(i) {
                Some(byte) => {
                    let _ = write!(out, " {:02x}", byte);
                }
                None => out.push_str("   "),
            }
        }
        out.push_str("  |");
        out.extend(chunk.iter().map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '.'
            }
        }));
        out.push('|');
    }
    out
}
