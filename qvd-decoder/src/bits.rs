//! Bit-field extraction from packed records.
//!
//! A record is read as one little-endian bit stream: stream bit `i` is bit
//! `i % 8` (LSB = 0) of byte `i / 8`. This is the same as loading the whole
//! record as a little-endian integer and shifting right by the field's
//! offset.

use qvd_core::FormatError;

/// Extract `bit_width` bits starting at `bit_offset` as an unsigned value.
///
/// A width of 0 yields 0. Widths above 64, or ranges running past the end
/// of `bytes`, are a [`FormatError::BitRange`].
#[inline]
pub fn extract_bits(bytes: &[u8], bit_offset: usize, bit_width: usize) -> Result<u64, FormatError> {
    let available_bits = bytes.len().saturating_mul(8);
    let out_of_range = || FormatError::BitRange {
        bit_offset,
        bit_width,
        available_bits,
    };

    if bit_width > 64 {
        return Err(out_of_range());
    }
    let bit_end = bit_offset.checked_add(bit_width).ok_or_else(out_of_range)?;
    if bit_end > available_bits {
        return Err(out_of_range());
    }
    if bit_width == 0 {
        return Ok(0);
    }

    // At most 9 bytes: 64 bits plus a 7-bit lead-in
    let first = bit_offset / 8;
    let last = (bit_end - 1) / 8;
    let mut acc: u128 = 0;
    for (i, &byte) in bytes[first..=last].iter().enumerate() {
        acc |= (byte as u128) << (8 * i);
    }

    let mask = if bit_width == 64 { u64::MAX } else { (1u64 << bit_width) - 1 };
    Ok((acc >> (bit_offset % 8)) as u64 & mask)
}
