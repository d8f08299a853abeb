//! Inbound byte collection and response framing.
//!
//! Bytes from the link are appended to a fixed-capacity [`FrameAssembler`].
//! When the buffer fills, its contents are handed to a [`ResponseHandler`]
//! and the buffer starts over. An optional delimiter can end frames early.

use heapless::Vec;

use crate::transport::{LinkMode, Transport};

/// Default response buffer capacity.
pub const RX_BUFFER_SIZE: usize = 32;

/// Bytes requested from a bus peripheral on every poll.
pub const DEFAULT_BUS_REQUEST_LEN: usize = 8;

/// When the assembler considers a frame complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Framing {
    /// Dispatch only when the buffer is full.
    #[default]
    CapacityOnly,
    /// Also dispatch on this byte, which is not included in the frame.
    Delimited(u8),
}

/// Receives completed response frames.
///
/// The slice is only valid for the duration of the call.
pub trait ResponseHandler {
    fn on_frame(&mut self, frame: &[u8]);
}

impl<F: FnMut(&[u8])> ResponseHandler for F {
    fn on_frame(&mut self, frame: &[u8]) {
        self(frame)
    }
}

/// Handler that logs each frame and otherwise discards it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogResponses;

impl ResponseHandler for LogResponses {
    fn on_frame(&mut self, frame: &[u8]) {
        match core::str::from_utf8(frame) {
            Ok(text) => info!("response: {}", text),
            Err(_) => info!("response: {} bytes", frame.len()),
        }
    }
}

/// Bounded receive buffer with a write cursor.
///
/// The cursor never passes `N`; reaching it dispatches the whole buffer and
/// resets, so each `N` bytes of input produce exactly one dispatch.
#[derive(Debug, Clone)]
pub struct FrameAssembler<const N: usize = RX_BUFFER_SIZE> {
    buf: Vec<u8, N>,
    framing: Framing,
}

impl<const N: usize> Default for FrameAssembler<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> FrameAssembler<N> {
    #[must_use]
    pub const fn new() -> Self {
        Self::with_framing(Framing::CapacityOnly)
    }

    #[must_use]
    pub const fn with_framing(framing: Framing) -> Self {
        Self {
            buf: Vec::new(),
            framing,
        }
    }

    #[inline]
    #[must_use]
    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn set_framing(&mut self, framing: Framing) {
        self.framing = framing;
        self.buf.clear();
    }

    /// Bytes collected since the last dispatch.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }

    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        N
    }

    /// Drop any partial frame.
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Append one byte, dispatching to `handler` when a frame completes.
    ///
    /// Returns `true` if a frame was dispatched.
    pub fn push<H: ResponseHandler + ?Sized>(&mut self, byte: u8, handler: &mut H) -> bool {
        if let Framing::Delimited(delimiter) = self.framing {
            if byte == delimiter {
                handler.on_frame(&self.buf);
                self.buf.clear();
                return true;
            }
        }

        // A zero-capacity buffer can hold nothing and never dispatches
        if self.buf.push(byte).is_err() {
            return false;
        }
        if self.buf.is_full() {
            trace!("receive buffer full, dispatching {} bytes", N);
            handler.on_frame(&self.buf);
            self.buf.clear();
            return true;
        }
        false
    }
}

/// Result of one receive poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollOutcome {
    /// Nothing pending on a stream link, or no link.
    Idle,
    /// Fed this many bytes, dispatching `frames` complete frames.
    Received { bytes: usize, frames: usize },
    /// A bus peripheral returned nothing.
    NoResponse,
}

/// Pulls bytes off a link and feeds them to an assembler.
///
/// Stream links are read one byte per poll. Bus links are asked for
/// `request_len` bytes every poll and fully drained.
pub fn poll<T, H, const N: usize>(
    link: &mut T,
    assembler: &mut FrameAssembler<N>,
    handler: &mut H,
    request_len: usize,
) -> PollOutcome
where
    T: Transport,
    H: ResponseHandler + ?Sized,
{
    match link.mode() {
        LinkMode::Detached => PollOutcome::Idle,
        LinkMode::Stream => {
            let byte = if link.available() { link.read_byte() } else { None };
            match byte {
                Some(byte) => {
                    let frames = usize::from(assembler.push(byte, handler));
                    PollOutcome::Received { bytes: 1, frames }
                }
                None => PollOutcome::Idle,
            }
        }
        LinkMode::Transaction => {
            link.request(request_len);
            if !link.available() {
                debug!("no response");
                return PollOutcome::NoResponse;
            }
            let mut bytes = 0;
            let mut frames = 0;
            while let Some(byte) = link.read_byte() {
                bytes += 1;
                frames += usize::from(assembler.push(byte, handler));
            }
            PollOutcome::Received { bytes, frames }
        }
    }
}
