//! Field access for frames received from the peripheral.
//!
//! Responses are comma-separated ASCII fields. Bus reads are fixed-size, so a
//! frame may carry trailing padding (`0x00` or `0xFF`) or a line ending; both
//! are stripped before the fields are split.

use crate::fmt::parse_u32;

/// Field separator inside a response frame.
pub const FIELD_SEPARATOR: u8 = b',';

/// Borrowed view of one response frame.
///
/// # Example
///
/// ```
/// use holo_proto::Response;
///
/// let resp = Response::new(b"QD,1,0,42\n\xff\xff");
/// assert_eq!(resp.code(), Some(&b"QD"[..]));
/// assert_eq!(resp.field_u32(3), Some(42));
/// assert_eq!(resp.fields().count(), 4);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response<'a> {
    body: &'a [u8],
}

impl<'a> Response<'a> {
    /// Wrap a raw frame, trimming padding and line endings.
    #[must_use]
    pub fn new(frame: &'a [u8]) -> Self {
        let end = frame
            .iter()
            .rposition(|&b| !matches!(b, b'\r' | b'\n' | 0x00 | 0xFF))
            .map_or(0, |i| i + 1);
        Self { body: &frame[..end] }
    }

    /// Trimmed frame bytes.
    #[inline]
    #[must_use]
    pub fn body(&self) -> &'a [u8] {
        self.body
    }

    /// Trimmed frame as text, if it is valid UTF-8.
    #[must_use]
    pub fn as_str(&self) -> Option<&'a str> {
        core::str::from_utf8(self.body).ok()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Iterate over comma-separated fields.
    ///
    /// An empty body yields no fields.
    pub fn fields(&self) -> impl Iterator<Item = &'a [u8]> {
        let body = self.body;
        body.split(|&b| b == FIELD_SEPARATOR)
            .take(if body.is_empty() { 0 } else { usize::MAX })
    }

    /// Field at `index`, if present.
    #[must_use]
    pub fn field(&self, index: usize) -> Option<&'a [u8]> {
        self.fields().nth(index)
    }

    /// First field, the response code.
    #[must_use]
    pub fn code(&self) -> Option<&'a [u8]> {
        self.field(0).filter(|f| !f.is_empty())
    }

    /// Field at `index` parsed as an unsigned decimal.
    #[must_use]
    pub fn field_u32(&self, index: usize) -> Option<u32> {
        self.field(index).and_then(parse_u32)
    }
}
