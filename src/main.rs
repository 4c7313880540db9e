//! # Sensor Poller
//!
//! Polls a UART-attached sensor module once per interval and logs whatever
//! it sends back.

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use sensor_poller::capture::CaptureWriter;
use sensor_poller::config::{Config, LoggingConfig};
use sensor_poller::gpio::{self, Indicator};
use sensor_poller::poller::Poller;
use sensor_poller::receiver::Receiver;
use sensor_poller::serial::SensorSerial;

/// Spans buffered between the receive loop and the capture writer
const CAPTURE_QUEUE_DEPTH: usize = 64;

/// Main entry point for the sensor poller
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first argument, or built-in defaults)
///    - Set up logging with tracing subscriber
///    - Configure the indicator and power-enable lines, assert power, let the module settle
///    - Open the serial port and split it into transmit and receive channels
///
/// 2. **Tasks**
///    - Poller: send the configured command, sleep one interval, repeat
///    - Receiver: bounded reads, log and forward every span
///    - Indicator: toggle the status line
///    - Capture (optional): append received spans to a JSONL file
///
/// 3. **Shutdown**
///    - Ctrl+C ends the process; the tasks have no other exit
///
/// # Errors
///
/// Returns error if the configuration is invalid, a GPIO line cannot be
/// configured, or the serial port cannot be opened.
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/sensor-poller.toml
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path).with_context(|| format!("Failed to load config from {}", path))?,
        None => Config::default(),
    };

    let _log_guard = init_logging(&config.logging);
    info!("Sensor Poller v{} starting...", env!("CARGO_PKG_VERSION"));

    let indicator_line = gpio::open_line(&config.gpio, config.gpio.indicator_pin, "indicator").await?;
    let mut power_line = gpio::open_line(&config.gpio, config.gpio.power_enable_pin, "power_enable").await?;
    gpio::enable_power(&mut power_line, config.gpio.power_settle()).await?;

    let serial = SensorSerial::open_with_paths(&[config.serial.port.as_str()], config.serial.baud_rate)?;
    info!("Sensor serial port opened at: {}", serial.device_path());
    let (tx, rx) = serial.split(config.serial.rx_buffer_size);

    let poller = Poller::from_config(tx, &config.poller)?;
    let mut receiver = Receiver::from_config(rx, &config.serial);

    if config.capture.enabled {
        let writer = CaptureWriter::open(&config.capture.path).await?;
        let (sink, spans) = mpsc::channel(CAPTURE_QUEUE_DEPTH);
        receiver = receiver.with_sink(sink);
        tokio::spawn(writer.run(spans));
    }

    tokio::spawn(poller.run());
    tokio::spawn(receiver.run());
    tokio::spawn(Indicator::new(indicator_line, config.gpio.indicator_interval()).run());

    info!("Press Ctrl+C to exit");
    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C, shutting down...");

    // Power stays asserted until the process is gone
    drop(power_line);
    Ok(())
}

/// Initialize the tracing subscriber
///
/// Logs go to stdout, or to a daily rolling file when `log_dir` is set. The
/// returned guard must be held for the file writer to keep flushing.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    if config.log_dir.is_empty() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return None;
    }

    let appender = tracing_appender::rolling::daily(&config.log_dir, "sensor-poller.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Some(guard)
}
