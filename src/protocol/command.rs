//! # Sensor Commands
//!
//! Named commands understood by the sensor module and their fixed payloads.

use std::fmt;
use std::str::FromStr;

use super::checksum::ChecksumFn;
use super::frame::{build_frame_with, CommandFrame};
use super::{FRAME_HEADER, FRAME_TERMINATOR};
use crate::error::PollerError;

/// Payload of the single-inventory read command
pub const SINGLE_READ: [u8; 4] = [0x00, 0x22, 0x00, 0x00];

/// Payload of the stop-reading command
pub const STOP_READ: [u8; 4] = [0x00, 0x28, 0x00, 0x00];

/// Payload of the multi-inventory read command (repeat count 0xFFFF)
pub const MULTI_READ: [u8; 7] = [0x00, 0x27, 0x00, 0x03, 0x22, 0xFF, 0xFF];

/// A named sensor operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    SingleRead,
    StopRead,
    MultiRead,
}

impl Command {
    /// Every known command, in table order
    pub const ALL: [Command; 3] = [Command::SingleRead, Command::StopRead, Command::MultiRead];

    /// Configuration / log name of the command
    pub fn name(&self) -> &'static str {
        match self {
            Command::SingleRead => "single_read",
            Command::StopRead => "stop_read",
            Command::MultiRead => "multi_read",
        }
    }

    /// Fixed payload bytes for this command
    pub fn payload(&self) -> &'static [u8] {
        match self {
            Command::SingleRead => &SINGLE_READ,
            Command::StopRead => &STOP_READ,
            Command::MultiRead => &MULTI_READ,
        }
    }

    /// Build a fresh frame for this command
    pub fn frame(&self, checksum: ChecksumFn) -> CommandFrame {
        build_frame_with(FRAME_HEADER, self.payload(), FRAME_TERMINATOR, checksum)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Command {
    type Err = PollerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .iter()
            .copied()
            .find(|command| command.name() == s)
            .ok_or_else(|| PollerError::UnknownCommand(s.to_string()))
    }
}
