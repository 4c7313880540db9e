//! # Receive Capture
//!
//! Appends every span handed off by the receive loop to a JSONL file.
//!
//! Each line is one span:
//!
//! ```text
//! {"timestamp":"2026-10-15T08:00:00.123+00:00","len":4,"hex":"BB 01 22 7E"}
//! ```

use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::Result;
use crate::receiver::hex_string;

/// One captured span
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptureRecord {
    /// RFC 3339 receive time
    pub timestamp: String,
    pub len: usize,
    pub hex: String,
}

impl CaptureRecord {
    pub fn new(data: &[u8]) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            len: data.len(),
            hex: hex_string(data),
        }
    }
}

/// Append-only JSONL writer
pub struct CaptureWriter {
    out: BufWriter<File>,
    records: u64,
}

impl CaptureWriter {
    /// Open `path` for appending, creating it if needed
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())
            .await?;
        info!(target: "rx", "Capturing received bytes to {}", path.as_ref().display());

        Ok(Self {
            out: BufWriter::new(file),
            records: 0,
        })
    }

    /// Write one record and flush it
    pub async fn write_record(&mut self, record: &CaptureRecord) -> Result<()> {
        let mut line = serde_json::to_vec(record).map_err(std::io::Error::from)?;
        line.push(b'\n');
        self.out.write_all(&line).await?;
        self.out.flush().await?;
        self.records += 1;
        Ok(())
    }

    pub fn records(&self) -> u64 {
        self.records
    }

    /// Drain `spans` until every sender is gone
    pub async fn run(mut self, mut spans: mpsc::Receiver<Bytes>) {
        while let Some(span) = spans.recv().await {
            if let Err(e) = self.write_record(&CaptureRecord::new(&span)).await {
                warn!(target: "rx", "Failed to write capture record: {}", e);
            }
        }
        info!(target: "rx", "Capture finished after {} records", self.records);
    }
}
