//! # GPIO Output Lines
//!
//! The two digital outputs next to the sensor link:
//! - **Status indicator**: toggled on a fixed period while the process runs
//! - **Power enable**: asserted once at startup and held high
//!
//! Lines are driven through the Linux sysfs GPIO interface
//! (`/sys/class/gpio/gpioN/value`), or only logged when GPIO is disabled.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::GpioConfig;
use crate::error::{PollerError, Result};

/// A single digital output line
#[async_trait]
pub trait OutputLine: Send {
    /// Drive the line high (`true`) or low (`false`)
    async fn set_level(&mut self, high: bool) -> Result<()>;

    /// Human-readable line name for logs
    fn label(&self) -> &str;
}

#[async_trait]
impl<T: OutputLine + ?Sized> OutputLine for Box<T> {
    async fn set_level(&mut self, high: bool) -> Result<()> {
        (**self).set_level(high).await
    }

    fn label(&self) -> &str {
        (**self).label()
    }
}

/// Output line backed by sysfs
#[derive(Debug)]
pub struct SysfsLine {
    label: String,
    value_path: PathBuf,
}

impl SysfsLine {
    /// Export `pin` under `root` (if not already exported) and configure it as an output
    ///
    /// # Errors
    ///
    /// Returns `Gpio` if the export, direction or value files cannot be written
    pub async fn export<P: AsRef<Path>>(root: P, pin: u32, label: &str) -> Result<Self> {
        let root = root.as_ref();
        let pin_dir = root.join(format!("gpio{}", pin));

        if !tokio::fs::try_exists(&pin_dir).await.unwrap_or(false) {
            debug!(target: "gpio", "Exporting GPIO {} ({})", pin, label);
            write_attr(&root.join("export"), &pin.to_string()).await?;
        }

        write_attr(&pin_dir.join("direction"), "out").await?;
        info!(target: "gpio", "GPIO {} configured as output ({})", pin, label);

        Ok(Self {
            label: label.to_string(),
            value_path: pin_dir.join("value"),
        })
    }
}

#[async_trait]
impl OutputLine for SysfsLine {
    async fn set_level(&mut self, high: bool) -> Result<()> {
        write_attr(&self.value_path, if high { "1" } else { "0" }).await
    }

    fn label(&self) -> &str {
        &self.label
    }
}

async fn write_attr(path: &Path, value: &str) -> Result<()> {
    tokio::fs::write(path, value)
        .await
        .map_err(|e| PollerError::Gpio(format!("Failed to write {}: {}", path.display(), e)))
}

/// Output line that only logs level changes
#[derive(Debug)]
pub struct LogLine {
    label: String,
    level: bool,
}

impl LogLine {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            level: false,
        }
    }

    pub fn level(&self) -> bool {
        self.level
    }
}

#[async_trait]
impl OutputLine for LogLine {
    async fn set_level(&mut self, high: bool) -> Result<()> {
        self.level = high;
        debug!(target: "gpio", "{} -> {}", self.label, if high { "high" } else { "low" });
        Ok(())
    }

    fn label(&self) -> &str {
        &self.label
    }
}

/// Open one configured line: sysfs when GPIO is enabled, log-only otherwise
pub async fn open_line(config: &GpioConfig, pin: u32, label: &str) -> Result<Box<dyn OutputLine>> {
    if config.enabled {
        Ok(Box::new(SysfsLine::export(&config.sysfs_root, pin, label).await?))
    } else {
        Ok(Box::new(LogLine::new(label)))
    }
}

/// Assert the power-enable line and wait for the module to settle
///
/// The caller keeps `line` alive for as long as the module must stay powered.
pub async fn enable_power<L: OutputLine + ?Sized>(line: &mut L, settle: Duration) -> Result<()> {
    line.set_level(true).await?;
    info!(target: "gpio", "Power enabled on {}, settling {}ms", line.label(), settle.as_millis());
    tokio::time::sleep(settle).await;
    Ok(())
}

/// Status indicator blinking on a fixed period
pub struct Indicator<L> {
    line: L,
    interval: Duration,
    level: bool,
}

impl<L: OutputLine> Indicator<L> {
    /// The first toggle drives the line low, the next one high
    pub fn new(line: L, interval: Duration) -> Self {
        Self {
            line,
            interval,
            level: false,
        }
    }

    /// Apply the current level, flip it, and wait one interval
    pub async fn toggle_once(&mut self) {
        if let Err(e) = self.line.set_level(self.level).await {
            warn!(target: "gpio", "Failed to drive {}: {}", self.line.label(), e);
        }
        self.level = !self.level;
        tokio::time::sleep(self.interval).await;
    }

    /// Blink forever
    pub async fn run(mut self) {
        loop {
            self.toggle_once().await;
        }
    }
}
