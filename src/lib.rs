//! # Sensor Poller Library
//!
//! Poll a UART-attached sensor module and log its raw responses.
//!
//! This library provides command framing (header, payload, checksum,
//! terminator), owned transmit and receive channels over a serial port, the
//! periodic poller, the receive loop, and the GPIO lines that power the
//! module and show liveness.

pub mod capture;
pub mod config;
pub mod error;
pub mod gpio;
pub mod poller;
pub mod protocol;
pub mod receiver;
pub mod serial;
