//! # Sensor Command Protocol
//!
//! Outbound framing for the UART sensor module.
//!
//! This module handles:
//! - Frame constants (header 0xBB, terminator 0x7E)
//! - XOR and sum checksums over the payload
//! - Building exactly-sized command frames
//! - The table of named commands
//!
//! Responses are not decoded; received bytes are surfaced raw.

pub mod checksum;
pub mod command;
pub mod frame;

use std::fmt;
use std::str::FromStr;

use crate::error::PollerError;
use checksum::{sum_checksum, xor_checksum, ChecksumFn};

/// Leading byte of every command frame
pub const FRAME_HEADER: u8 = 0xBB;

/// Trailing byte of every command frame
pub const FRAME_TERMINATOR: u8 = 0x7E;

/// Bytes a frame adds around its payload: header + checksum + terminator
pub const FRAME_OVERHEAD: usize = 3;

/// Checksum selected for outbound frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChecksumKind {
    #[default]
    Xor,
    Sum,
}

impl ChecksumKind {
    pub fn function(&self) -> ChecksumFn {
        match self {
            ChecksumKind::Xor => xor_checksum,
            ChecksumKind::Sum => sum_checksum,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChecksumKind::Xor => "xor",
            ChecksumKind::Sum => "sum",
        }
    }
}

impl fmt::Display for ChecksumKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChecksumKind {
    type Err = PollerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xor" => Ok(ChecksumKind::Xor),
            "sum" => Ok(ChecksumKind::Sum),
            other => Err(PollerError::UnknownChecksum(other.to_string())),
        }
    }
}
