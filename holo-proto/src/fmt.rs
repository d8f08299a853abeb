//! No-std decimal formatting and parsing helpers for protocol fields.
//!
//! These write straight into byte buffers so serialization needs neither
//! heap allocation nor `core::fmt` machinery.

/// Maximum decimal digits of a `u32`.
pub const MAX_U32_DIGITS: usize = 10;

/// Number of decimal digits needed to print `value`.
#[inline]
pub fn decimal_len(value: u32) -> usize {
    let mut n = value;
    let mut len = 1;
    while n >= 10 {
        n /= 10;
        len += 1;
    }
    len
}

/// Write a u32 as an unsigned decimal string.
///
/// Returns the number of bytes written (1-10 bytes).
///
/// # Panics
///
/// Panics if `buf` is shorter than [`decimal_len`] of `value`.
#[inline]
pub fn write_u32(buf: &mut [u8], value: u32) -> usize {
    debug_assert!(buf.len() >= decimal_len(value), "buffer too small for u32");

    if value == 0 {
        buf[0] = b'0';
        return 1;
    }

    // Write digits in reverse order to temporary buffer
    let mut temp = [0u8; MAX_U32_DIGITS];
    let mut n = value;
    let mut len = 0;
    while n > 0 {
        temp[len] = b'0' + (n % 10) as u8;
        n /= 10;
        len += 1;
    }

    for i in 0..len {
        buf[i] = temp[len - 1 - i];
    }

    len
}

/// Parse an unsigned decimal field.
///
/// Returns `None` for empty input, non-digits, or overflow.
#[inline]
pub fn parse_u32(s: &[u8]) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    s.iter().try_fold(0u32, |acc, &b| {
        if !b.is_ascii_digit() {
            return None;
        }
        acc.checked_mul(10)?.checked_add(u32::from(b - b'0'))
    })
}
