//! Protocol serialization for holoprojector commands.
//!
//! This module provides the [`Serialize`] trait for turning a [`Command`]
//! into its wire form, and [`WireFrame`], the fixed-capacity owned result.
//!
//! # Protocol Format
//!
//! ```text
//! <TARGET><OPCODE>[<COLOR>][|<DURATION>]\n
//! ```
//!
//! A duration is always preceded by `|`, so rainbow with a duration is
//! `A007|12\n`. Global opcodes carry no target letter (`S4\n`). The status
//! query is bracketed: `<QD>\n`.
//!
//! # Example
//!
//! ```
//! use holo_proto::{Command, Serialize};
//!
//! let cmd = Command::pulse("f", 3, Some(5)).unwrap();
//! let mut buf = [0u8; 32];
//! let len = cmd.serialize(&mut buf).unwrap();
//! assert_eq!(&buf[..len], b"FO33|5\n");
//! ```

use heapless::Vec;

use crate::command::Command;
use crate::fmt::{decimal_len, write_u32};
use crate::types::{Opcode, ParamKind};

/// Maximum size of a serialized command.
///
/// Breakdown: target(1) + opcode(3) + p1(10) + |(1) + p2(10) + \n(1) = 26
/// We use 32 for safety margin.
pub const MAX_FRAME_SIZE: usize = 32;

/// Line delimiter terminating every frame.
pub const FRAME_DELIMITER: u8 = b'\n';

/// Prefix written before every duration parameter.
pub const PARAM_SEPARATOR: u8 = b'|';

/// Error type for serialization operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerializeError {
    /// The output buffer is too small to hold the serialized message.
    BufferTooSmall,
    /// A write operation failed (for I/O adapters).
    WriteError,
}

impl core::fmt::Display for SerializeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::WriteError => write!(f, "write error"),
        }
    }
}

/// Cursor over an output buffer.
///
/// Callers check the total length up front, so individual writes index
/// directly.
struct SerializeBuf<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> SerializeBuf<'a> {
    #[inline]
    fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    #[inline]
    fn write(&mut self, byte: u8) {
        self.buf[self.pos] = byte;
        self.pos += 1;
    }

    #[inline]
    fn write_slice(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    #[inline]
    fn write_u32(&mut self, value: u32) {
        self.pos += write_u32(&mut self.buf[self.pos..], value);
    }

    /// Terminate the frame and return its total length.
    #[inline]
    fn finalize(mut self) -> usize {
        self.write(FRAME_DELIMITER);
        self.pos
    }
}

/// Extension trait for serializing protocol messages.
pub trait Serialize {
    /// Exact number of bytes [`Serialize::serialize`] will write.
    fn encoded_len(&self) -> usize;

    /// Serialize to the provided buffer.
    ///
    /// Returns the number of bytes written on success.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::BufferTooSmall`] if the buffer is not large enough.
    fn serialize(&self, buf: &mut [u8]) -> Result<usize, SerializeError>;

    /// Serialize to a `heapless::Vec`.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::BufferTooSmall`] if `N` is not large enough.
    fn serialize_to_vec<const N: usize>(&self) -> Result<Vec<u8, N>, SerializeError> {
        let mut vec = Vec::new();
        // Resize to full capacity to allow serialize() to write
        vec.resize(N, 0)
            .map_err(|_| SerializeError::BufferTooSmall)?;
        let len = self.serialize(&mut vec)?;
        vec.truncate(len);
        Ok(vec)
    }

    /// Serialize to a `core::fmt::Write` implementation.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::WriteError`] if the write fails.
    fn serialize_fmt<W: core::fmt::Write>(&self, writer: &mut W) -> Result<(), SerializeError>;

    /// Serialize to an `embedded_io::Write` implementation.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError::WriteError`] if the write fails.
    #[cfg(feature = "embedded-io")]
    fn serialize_io<W: embedded_io::Write>(&self, writer: &mut W) -> Result<(), SerializeError>;
}

impl Serialize for Command {
    fn encoded_len(&self) -> usize {
        let brackets = if self.opcode() == Opcode::StatusQuery { 2 } else { 0 };
        let target = usize::from(self.target().is_some());
        let params: usize = self.params().iter().map(|&p| decimal_len(p)).sum();
        let separators = self.duration_params().count();
        brackets + target + self.opcode().code().len() + params + separators + 1
    }

    fn serialize(&self, buf: &mut [u8]) -> Result<usize, SerializeError> {
        if buf.len() < self.encoded_len() {
            return Err(SerializeError::BufferTooSmall);
        }

        let mut sb = SerializeBuf::new(buf);

        if self.opcode() == Opcode::StatusQuery {
            sb.write(b'<');
            sb.write_slice(self.opcode().code().as_bytes());
            sb.write(b'>');
            return Ok(sb.finalize());
        }

        if let Some(target) = self.target() {
            sb.write(target.as_byte());
        }
        sb.write_slice(self.opcode().code().as_bytes());

        for (&kind, &param) in self.opcode().schema().iter().zip(self.params()) {
            if kind == ParamKind::Duration {
                sb.write(PARAM_SEPARATOR);
            }
            sb.write_u32(param);
        }

        Ok(sb.finalize())
    }

    fn serialize_fmt<W: core::fmt::Write>(&self, writer: &mut W) -> Result<(), SerializeError> {
        let frame = self.to_frame()?;
        writer
            .write_str(frame.as_str())
            .map_err(|_| SerializeError::WriteError)
    }

    #[cfg(feature = "embedded-io")]
    fn serialize_io<W: embedded_io::Write>(&self, writer: &mut W) -> Result<(), SerializeError> {
        let frame = self.to_frame()?;
        writer
            .write_all(frame.as_bytes())
            .map_err(|_| SerializeError::WriteError)
    }
}

impl Command {
    /// Parameters that go on the wire with a leading separator.
    fn duration_params(&self) -> impl Iterator<Item = &u32> + '_ {
        self.opcode()
            .schema()
            .iter()
            .zip(self.params())
            .filter(|(kind, _)| **kind == ParamKind::Duration)
            .map(|(_, param)| param)
    }

    /// Serialize into an owned [`WireFrame`].
    ///
    /// Every valid command fits in [`MAX_FRAME_SIZE`], so this only fails
    /// if that invariant is broken.
    pub fn to_frame(&self) -> Result<WireFrame, SerializeError> {
        let bytes = self.serialize_to_vec::<MAX_FRAME_SIZE>()?;
        Ok(WireFrame { bytes })
    }
}

impl core::fmt::Display for Command {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let frame = self.to_frame().map_err(|_| core::fmt::Error)?;
        f.write_str(frame.payload_str())
    }
}

/// Serialized, newline-terminated command text.
///
/// Frames are immutable once produced; they are only ever read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireFrame {
    bytes: Vec<u8, MAX_FRAME_SIZE>,
}

impl WireFrame {
    /// Full frame bytes including the trailing newline.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Full frame as text including the trailing newline.
    #[must_use]
    pub fn as_str(&self) -> &str {
        // Only ASCII is ever written into a frame
        core::str::from_utf8(&self.bytes).unwrap_or("")
    }

    /// Frame bytes without the trailing newline.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        self.bytes
            .strip_suffix(&[FRAME_DELIMITER])
            .unwrap_or(self.bytes.as_slice())
    }

    /// Frame text without the trailing newline.
    #[must_use]
    pub fn payload_str(&self) -> &str {
        core::str::from_utf8(self.payload()).unwrap_or("")
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl AsRef<[u8]> for WireFrame {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}
