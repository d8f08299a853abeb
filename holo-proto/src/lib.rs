//! Wire protocol types, validation, and serialization for holoprojector commands.
//!
//! This crate provides everything needed to talk to the holoprojector controller
//! at the protocol level:
//!
//! - **Types**: What a command can say
//!   - [`Target`] - Front / rear / top / all selector
//!   - [`Opcode`] - Requested behavior and its fixed wire code
//!   - [`Color`] - Named color codes
//!
//! - **Validation**: Turn raw input into a [`Command`]
//!   - [`validate_command()`] - The single validation entry point
//!   - [`CommandBuilder`] - Fluent builder API
//!   - [`ValidationError`] - Why input was rejected
//!
//! - **Serialization**: Produce outgoing frames
//!   - [`Serialize`] trait - Extension trait for serialization
//!   - [`WireFrame`] - Owned, newline-terminated frame
//!
//! - **Responses**: Read incoming frames
//!   - [`Response`] - Comma-separated field access
//!
//! # Protocol Format
//!
//! One command per line, ASCII, newline-terminated:
//!
//! ```text
//! <TARGET><OPCODE>[<COLOR>][|<DURATION>]\n
//! ```
//!
//! - `TARGET` - `F`, `R`, `T` or `A` (only for targeted opcodes)
//! - `OPCODE` - `O6` color, `O3` pulse, `007` rainbow, `S1` Leia,
//!   `S4` stop all, `S5` stop lights, `S7` stop servos
//! - `COLOR` - Color `0-9` (0 = random), for color and pulse
//! - `DURATION` - Seconds, always after `|` (`A007|12` is rainbow for 12 s)
//!
//! The periodic status query is sent bracketed and untargeted: `<QD>\n`.
//!
//! # Examples
//!
//! ```
//! use holo_proto::{Command, ValidationError};
//!
//! let frame = Command::set_color("a", 5, Some(10)).unwrap().to_frame().unwrap();
//! assert_eq!(frame.as_str(), "AO65|10\n");
//!
//! // Out-of-range input never produces a frame
//! assert_eq!(Command::set_color("a", 11, None), Err(ValidationError::ColorOutOfRange));
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//! - **`embedded-io`**: Enable `serialize_io()` for I/O peripherals
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations,
//! making it suitable for embedded systems with limited resources.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod builder;
pub mod command;
mod fmt;
pub mod response;
pub mod serialize;
pub mod types;

// Re-export types at crate root for convenience
pub use builder::CommandBuilder;
pub use command::{validate_command, Command, Params, ValidationError};
pub use response::{Response, FIELD_SEPARATOR};
pub use serialize::{
    Serialize, SerializeError, WireFrame, FRAME_DELIMITER, MAX_FRAME_SIZE, PARAM_SEPARATOR,
};
pub use types::{Color, Opcode, ParamKind, Target, MAX_COLOR, MAX_PARAMS};
