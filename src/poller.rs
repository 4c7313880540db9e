//! # Poller
//!
//! Sends the configured command to the sensor on a fixed period.
//!
//! ```text
//!   Idle ──(period)──> Sending ──(send returns)──> Waiting ──(interval)──> Idle
//! ```
//!
//! The cycle has no terminal state. A failed or short send is logged and the
//! next period sends a fresh frame; nothing is queued.

use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::PollerConfig;
use crate::error::{Result, TransmitError};
use crate::protocol::checksum::ChecksumFn;
use crate::protocol::command::Command;
use crate::protocol::ChecksumKind;
use crate::serial::port_trait::SerialWriter;
use crate::serial::TransmitChannel;

/// Number of cycles between status log messages
const STATUS_LOG_INTERVAL: u64 = 60;

/// Position of the poller within one cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Sending,
    Waiting,
}

/// Counters kept across cycles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollStats {
    pub cycles: u64,
    pub frames_sent: u64,
    pub short_writes: u64,
    pub failures: u64,
}

/// Periodic command sender
pub struct Poller<W> {
    tx: TransmitChannel<W>,
    command: Command,
    checksum: ChecksumFn,
    interval: Duration,
    state: PollerState,
    stats: PollStats,
}

impl<W: SerialWriter> Poller<W> {
    pub fn new(tx: TransmitChannel<W>, command: Command, checksum: ChecksumKind, interval: Duration) -> Self {
        Self {
            tx,
            command,
            checksum: checksum.function(),
            interval,
            state: PollerState::Idle,
            stats: PollStats::default(),
        }
    }

    /// Create a poller from the `[poller]` config section
    ///
    /// # Errors
    ///
    /// Returns error if the command or checksum name is unknown
    pub fn from_config(tx: TransmitChannel<W>, config: &PollerConfig) -> Result<Self> {
        Ok(Self::new(tx, config.command()?, config.checksum()?, config.interval()))
    }

    pub fn state(&self) -> PollerState {
        self.state
    }

    pub fn stats(&self) -> PollStats {
        self.stats
    }

    pub fn command(&self) -> Command {
        self.command
    }

    /// Build a fresh frame for `command` and send it once
    ///
    /// Usable outside the periodic loop, e.g. to send `stop_read` on demand.
    pub async fn send_command(&mut self, command: Command) -> std::result::Result<usize, TransmitError> {
        let frame = command.frame(self.checksum);
        debug!(target: "tx", "Sending {} frame: {:02X?}", command, frame.as_bytes());

        let result = self.tx.send(&frame).await;
        match &result {
            Ok(written) => {
                self.stats.frames_sent += 1;
                if *written < frame.len() {
                    self.stats.short_writes += 1;
                    warn!(target: "tx", "Short write for {}: {} of {} bytes", command, written, frame.len());
                }
            }
            Err(e) => {
                self.stats.failures += 1;
                warn!(target: "tx", "Failed to send {}: {}", command, e);
            }
        }
        result
    }

    /// Run one full cycle: send the configured command, then wait one interval
    ///
    /// Returns the send result; failures have already been logged.
    pub async fn poll_once(&mut self) -> std::result::Result<usize, TransmitError> {
        self.state = PollerState::Sending;
        let result = self.send_command(self.command).await;

        self.state = PollerState::Waiting;
        self.stats.cycles += 1;
        if self.stats.cycles % STATUS_LOG_INTERVAL == 0 {
            info!(target: "tx",
                "Poll status: {} cycles, {} sent, {} short, {} failed",
                self.stats.cycles, self.stats.frames_sent, self.stats.short_writes, self.stats.failures
            );
        }
        tokio::time::sleep(self.interval).await;

        self.state = PollerState::Idle;
        result
    }

    /// Poll forever
    pub async fn run(mut self) {
        info!(target: "tx", "Polling with {} every {}ms", self.command, self.interval.as_millis());
        loop {
            // Errors are logged in send_command; the next cycle retries
            let _ = self.poll_once().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serial::port_trait::mocks::MockSerialWriter;
    use std::io;

    const SINGLE_READ_FRAME: [u8; 7] = [0xBB, 0x00, 0x22, 0x00, 0x00, 0x22, 0x7E];

    fn poller(mock: &MockSerialWriter, interval_ms: u64) -> Poller<MockSerialWriter> {
        Poller::new(
            TransmitChannel::new(mock.clone()),
            Command::SingleRead,
            ChecksumKind::Xor,
            Duration::from_millis(interval_ms),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_cycles_write_identical_frames_on_schedule() {
        let mock = MockSerialWriter::new();
        let mut poller = poller(&mock, 1000);

        for _ in 0..3 {
            poller.poll_once().await.unwrap();
        }

        let writes = mock.get_written_data();
        assert_eq!(writes.len(), 3);
        for write in &writes {
            assert_eq!(write.len(), 7);
            assert_eq!(write.as_slice(), &SINGLE_READ_FRAME);
        }

        let times = mock.get_write_times();
        for pair in times.windows(2) {
            let gap = pair[1] - pair[0];
            assert!(gap >= Duration::from_millis(1000), "Gap too short: {:?}", gap);
            assert!(gap <= Duration::from_millis(1001), "Gap too long: {:?}", gap);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_keeps_period_in_background() {
        let mock = MockSerialWriter::new();
        let poller = poller(&mock, 1000);

        let handle = tokio::spawn(poller.run());
        // First frame goes out immediately, then one per second
        tokio::time::sleep(Duration::from_millis(2500)).await;
        handle.abort();

        assert_eq!(mock.get_written_data().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_does_not_stop_cycle() {
        let mock = MockSerialWriter::new();
        mock.set_write_error(io::ErrorKind::BrokenPipe);
        let mut poller = poller(&mock, 100);

        assert!(poller.poll_once().await.is_err());
        assert_eq!(poller.state(), PollerState::Idle);

        mock.clear_write_error();
        assert_eq!(poller.poll_once().await.unwrap(), 7);

        let stats = poller.stats();
        assert_eq!(stats.cycles, 2);
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.frames_sent, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_cycle_still_waits_full_interval() {
        let mock = MockSerialWriter::new();
        mock.set_write_error(io::ErrorKind::NotConnected);
        let mut poller = poller(&mock, 1000);

        let start = tokio::time::Instant::now();
        let _ = poller.poll_once().await;
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_write_counted_not_retried() {
        let mock = MockSerialWriter::new();
        mock.set_accept_limit(4);
        let mut poller = poller(&mock, 10);

        assert_eq!(poller.poll_once().await.unwrap(), 4);
        assert_eq!(mock.get_written_data().len(), 1);
        assert_eq!(poller.stats().short_writes, 1);
    }

    #[tokio::test]
    async fn test_send_named_command() {
        let mock = MockSerialWriter::new();
        let mut poller = poller(&mock, 1000);

        poller.send_command(Command::StopRead).await.unwrap();

        assert_eq!(
            mock.get_written_data(),
            vec![vec![0xBB, 0x00, 0x28, 0x00, 0x00, 0x28, 0x7E]]
        );
        // The configured command is unchanged
        assert_eq!(poller.command(), Command::SingleRead);
        assert_eq!(poller.state(), PollerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_frames_reach_the_wire() {
        use crate::serial::port_trait::{TokioSerialReader, TokioSerialWriter};
        use crate::serial::ReceiveChannel;

        let (host, device) = tokio::io::duplex(256);
        let mut poller = Poller::new(
            TransmitChannel::new(TokioSerialWriter::new(host)),
            Command::SingleRead,
            ChecksumKind::Xor,
            Duration::from_millis(1000),
        );
        let mut wire = ReceiveChannel::new(TokioSerialReader::new(device), 64);

        for _ in 0..2 {
            poller.poll_once().await.unwrap();
            let bytes = wire.read(Duration::from_millis(10)).await.unwrap();
            assert_eq!(bytes, &SINGLE_READ_FRAME);
        }
    }

    #[test]
    fn test_from_config() {
        let mock = MockSerialWriter::new();
        let mut config = PollerConfig::default();
        config.command = "multi_read".to_string();
        config.checksum = "sum".to_string();

        let poller = Poller::from_config(TransmitChannel::new(mock), &config).unwrap();
        assert_eq!(poller.command(), Command::MultiRead);
    }

    #[test]
    fn test_from_config_unknown_command() {
        let mock = MockSerialWriter::new();
        let mut config = PollerConfig::default();
        config.command = "bogus".to_string();

        assert!(Poller::from_config(TransmitChannel::new(mock), &config).is_err());
    }
}
