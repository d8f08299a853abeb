//! Platform-agnostic holoprojector transport, framing, and scheduling.
//!
//! This crate drives a holoprojector peripheral over whatever link the board
//! provides, without any platform-specific dependencies. Links are built from
//! `embedded-io` serial ports or `embedded-hal` I2C buses, so the same code
//! runs on target and on host for testing.
//!
//! # Overview
//!
//! - [`link`]: Transport selection ([`Link`], [`SerialLink`], [`BusLink`], [`BusGuard`])
//! - [`transport`]: Byte capability shared by all links ([`Transport`], [`BusStatus`])
//! - [`transmit`]: Frame writes with a single bus retry ([`Transmitter`], [`Delivery`])
//! - [`receive`]: Response framing ([`FrameAssembler`], [`ResponseHandler`])
//! - [`schedule`]: Periodic status queries ([`Schedule`], [`Clock`])
//! - [`device`]: Everything above behind one facade ([`Holoprojector`])
//!
//! # Example
//!
//! ```rust
//! use holo_core::{FrameAssembler, Link, Transmitter, Delivery};
//! use holo_proto::Command;
//!
//! # struct NoDelay;
//! # impl embedded_hal::delay::DelayNs for NoDelay {
//! #     fn delay_ns(&mut self, _ns: u32) {}
//! # }
//! let frame = Command::pulse("f", 3, Some(5)).unwrap().to_frame().unwrap();
//! assert_eq!(frame.as_bytes(), b"FO33|5\n");
//!
//! // Nothing is wired up, so the frame goes nowhere
//! let mut link = Link::unconfigured();
//! let mut tx = Transmitter::new(NoDelay);
//! assert_eq!(tx.send(&mut link, frame.as_bytes()), Delivery::NoLink);
//!
//! // Responses are collected 32 bytes at a time
//! let asm: FrameAssembler = FrameAssembler::new();
//! assert_eq!(asm.capacity(), 32);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Log through defmt (for embedded logging)
//! - **`log`**: Log through the `log` facade
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations,
//! making it suitable for embedded systems with limited resources.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

// Must come first so the logging macros are visible to every module
mod macros;

pub mod device;
pub mod link;
pub mod receive;
pub mod schedule;
pub mod transmit;
pub mod transport;

#[cfg(test)]
mod testing;

// Re-export main types at crate root
pub use device::{HoloConfig, Holoprojector};
pub use link::{
    BusConfig, BusGuard, BusLink, Detached, Link, SerialLink, Unguarded, BUS_BUFFER_LEN,
    BUS_TIMEOUT_US, DEFAULT_BUS_CLOCK_HZ, DEFAULT_SERIAL_BAUD, MAX_BUS_REQUEST,
};
pub use receive::{
    poll, FrameAssembler, Framing, LogResponses, PollOutcome, ResponseHandler,
    DEFAULT_BUS_REQUEST_LEN, RX_BUFFER_SIZE,
};
pub use schedule::{Clock, Schedule, DEFAULT_REFRESH_MS};
pub use transmit::{Delivery, Transmitter, DEFAULT_RETRY_DELAY_MS};
pub use transport::{BusStatus, LinkMode, Transport, WriteStatus};

pub use holo_proto;
