//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{PollerError, Result};
use crate::protocol::command::Command;
use crate::protocol::ChecksumKind;
use crate::serial::receive::MIN_RX_BUFFER_SIZE;

/// Main configuration structure
///
/// Every section is optional; a missing section takes its defaults.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub gpio: GpioConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    #[serde(default = "default_rx_buffer_size")]
    pub rx_buffer_size: usize,

    /// 0 disables the silence warning
    #[serde(default = "default_silence_warn_ms")]
    pub silence_warn_ms: u64,
}

/// Poller configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PollerConfig {
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    #[serde(default = "default_command")]
    pub command: String,

    #[serde(default = "default_checksum")]
    pub checksum: String,
}

/// GPIO configuration
#[derive(Debug, Deserialize, Clone)]
pub struct GpioConfig {
    /// When false, lines are only logged
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_sysfs_root")]
    pub sysfs_root: String,

    #[serde(default = "default_indicator_pin")]
    pub indicator_pin: u32,

    #[serde(default = "default_power_enable_pin")]
    pub power_enable_pin: u32,

    #[serde(default = "default_indicator_interval_ms")]
    pub indicator_interval_ms: u64,

    #[serde(default = "default_power_settle_ms")]
    pub power_settle_ms: u64,
}

/// Capture configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CaptureConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_capture_path")]
    pub path: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct LoggingConfig {
    /// Empty logs to stdout only
    #[serde(default)]
    pub log_dir: String,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 115200 }
fn default_read_timeout_ms() -> u64 { 1000 }
fn default_rx_buffer_size() -> usize { 1024 }
fn default_silence_warn_ms() -> u64 { 5000 }

fn default_interval_ms() -> u64 { 1000 }
fn default_command() -> String { "single_read".to_string() }
fn default_checksum() -> String { "xor".to_string() }

fn default_sysfs_root() -> String { "/sys/class/gpio".to_string() }
fn default_indicator_pin() -> u32 { 12 }
fn default_power_enable_pin() -> u32 { 14 }
fn default_indicator_interval_ms() -> u64 { 250 }
fn default_power_settle_ms() -> u64 { 250 }

fn default_capture_path() -> String { "./capture.jsonl".to_string() }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout_ms(),
            rx_buffer_size: default_rx_buffer_size(),
            silence_warn_ms: default_silence_warn_ms(),
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            command: default_command(),
            checksum: default_checksum(),
        }
    }
}

impl Default for GpioConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sysfs_root: default_sysfs_root(),
            indicator_pin: default_indicator_pin(),
            power_enable_pin: default_power_enable_pin(),
            indicator_interval_ms: default_indicator_interval_ms(),
            power_settle_ms: default_power_settle_ms(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_capture_path(),
        }
    }
}

impl SerialConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// `None` when the silence warning is disabled
    pub fn silence_warn(&self) -> Option<Duration> {
        (self.silence_warn_ms > 0).then(|| Duration::from_millis(self.silence_warn_ms))
    }
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Resolve the configured command name
    pub fn command(&self) -> Result<Command> {
        self.command.parse()
    }

    /// Resolve the configured checksum name
    pub fn checksum(&self) -> Result<ChecksumKind> {
        self.checksum.parse()
    }
}

impl GpioConfig {
    pub fn indicator_interval(&self) -> Duration {
        Duration::from_millis(self.indicator_interval_ms)
    }

    pub fn power_settle(&self) -> Duration {
        Duration::from_millis(self.power_settle_ms)
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sensor_poller::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if ![9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600].contains(&self.serial.baud_rate) {
            return Err(invalid(
                "baud_rate must be one of: 9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600",
            ));
        }

        if self.serial.read_timeout_ms == 0 || self.serial.read_timeout_ms > 10000 {
            return Err(invalid("read_timeout_ms must be between 1 and 10000"));
        }

        if self.serial.rx_buffer_size < MIN_RX_BUFFER_SIZE || self.serial.rx_buffer_size > 65536 {
            return Err(invalid(format!(
                "rx_buffer_size must be between {} and 65536",
                MIN_RX_BUFFER_SIZE
            )));
        }

        if self.serial.silence_warn_ms != 0 && self.serial.silence_warn_ms < self.serial.read_timeout_ms {
            return Err(invalid("silence_warn_ms must be 0 or at least read_timeout_ms"));
        }

        if self.poller.interval_ms == 0 || self.poller.interval_ms > 60000 {
            return Err(invalid("interval_ms must be between 1 and 60000"));
        }

        if let Err(e) = self.poller.command() {
            return Err(invalid(e.to_string()));
        }

        if let Err(e) = self.poller.checksum() {
            return Err(invalid(e.to_string()));
        }

        if self.gpio.indicator_interval_ms == 0 || self.gpio.indicator_interval_ms > 60000 {
            return Err(invalid("indicator_interval_ms must be between 1 and 60000"));
        }

        if self.gpio.power_settle_ms > 10000 {
            return Err(invalid("power_settle_ms must be between 0 and 10000"));
        }

        if self.gpio.enabled {
            if self.gpio.sysfs_root.is_empty() {
                return Err(invalid("gpio sysfs_root cannot be empty when enabled"));
            }
            if self.gpio.indicator_pin == self.gpio.power_enable_pin {
                return Err(invalid("indicator_pin and power_enable_pin must differ"));
            }
        }

        if self.capture.enabled && self.capture.path.is_empty() {
            return Err(invalid("capture path cannot be empty when enabled"));
        }

        Ok(())
    }
}

fn invalid<T: std::fmt::Display>(msg: T) -> PollerError {
    PollerError::Config(toml::de::Error::custom(msg))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_valid_config() -> Config {
        Config::default()
    }

    #[test]
    fn test_default_config() {
        let config = create_valid_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.poller.command().unwrap(), Command::SingleRead);
        assert_eq!(config.poller.checksum().unwrap(), ChecksumKind::Xor);
        assert_eq!(config.poller.interval(), Duration::from_millis(1000));
        assert_eq!(config.serial.read_timeout(), Duration::from_millis(1000));
    }

    #[test]
    fn test_load_empty_config_uses_defaults() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert_eq!(config.serial.baud_rate, 115200);
        assert_eq!(config.serial.rx_buffer_size, 1024);
        assert!(!config.gpio.enabled);
        assert!(!config.capture.enabled);
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[serial]
port = "/dev/ttyAMA0"
read_timeout_ms = 500

[poller]
interval_ms = 250
command = "stop_read"
checksum = "sum"

[gpio]
enabled = true
indicator_pin = 5
power_enable_pin = 6

[capture]
enabled = true
path = "/tmp/rx.jsonl"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.serial.port, "/dev/ttyAMA0");
        assert_eq!(config.serial.read_timeout(), Duration::from_millis(500));
        assert_eq!(config.poller.command().unwrap(), Command::StopRead);
        assert_eq!(config.poller.checksum().unwrap(), ChecksumKind::Sum);
        assert_eq!(config.poller.interval(), Duration::from_millis(250));
        assert_eq!(config.gpio.indicator_pin, 5);
        assert_eq!(config.capture.path, "/tmp/rx.jsonl");
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/sensor-poller.toml");
        assert!(matches!(result, Err(PollerError::Io(_))));
    }

    #[test]
    fn test_malformed_toml() {
        let result = Config::from_toml_str("[serial\nport = ");
        assert!(matches!(result, Err(PollerError::Config(_))));
    }

    #[test]
    fn test_empty_serial_port() {
        let mut config = create_valid_config();
        config.serial.port = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_baud_rate() {
        let mut config = create_valid_config();
        config.serial.baud_rate = 420000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_read_timeout_bounds() {
        let mut config = create_valid_config();
        config.serial.read_timeout_ms = 0;
        assert!(config.validate().is_err());

        config.serial.read_timeout_ms = 10001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rx_buffer_size_bounds() {
        let mut config = create_valid_config();
        config.serial.rx_buffer_size = 1;
        assert!(config.validate().is_err());

        config.serial.rx_buffer_size = 2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_silence_warn_shorter_than_read_timeout() {
        let mut config = create_valid_config();
        config.serial.silence_warn_ms = 500;
        assert!(config.validate().is_err());

        config.serial.silence_warn_ms = 0;
        assert!(config.validate().is_ok());
        assert_eq!(config.serial.silence_warn(), None);
    }

    #[test]
    fn test_interval_zero() {
        let mut config = create_valid_config();
        config.poller.interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_command() {
        let mut config = create_valid_config();
        config.poller.command = "format_disk".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_checksum() {
        let mut config = create_valid_config();
        config.poller.checksum = "crc16".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, PollerError::Config(_)));
        assert!(err.to_string().contains("Unknown checksum: crc16"));
    }

    #[test]
    fn test_indicator_interval_zero() {
        let mut config = create_valid_config();
        config.gpio.indicator_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_same_gpio_pins_when_enabled() {
        let mut config = create_valid_config();
        config.gpio.power_enable_pin = config.gpio.indicator_pin;
        assert!(config.validate().is_ok());

        config.gpio.enabled = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_capture_path_when_enabled() {
        let mut config = create_valid_config();
        config.capture.path = String::new();
        assert!(config.validate().is_ok());

        config.capture.enabled = true;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_serial_port(), "/dev/ttyUSB0");
        assert_eq!(default_baud_rate(), 115200);
        assert_eq!(default_read_timeout_ms(), 1000);
        assert_eq!(default_rx_buffer_size(), 1024);
        assert_eq!(default_silence_warn_ms(), 5000);
        assert_eq!(default_interval_ms(), 1000);
        assert_eq!(default_command(), "single_read");
        assert_eq!(default_checksum(), "xor");
        assert_eq!(default_indicator_pin(), 12);
        assert_eq!(default_power_enable_pin(), 14);
        assert_eq!(default_indicator_interval_ms(), 250);
        assert_eq!(default_power_settle_ms(), 250);
    }
}
