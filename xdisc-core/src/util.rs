//! Bounds-checked byte readers shared by the format parsers.
//!
//! Disc images come from anywhere, so every offset read out of a header is
//! validated against the buffer instead of indexing directly.

use crate::error::AnalysisError;

/// Borrow `len` bytes at `offset`, or fail with `TooSmall`.
pub fn slice_at(buf: &[u8], offset: usize, len: usize) -> Result<&[u8], AnalysisError> {
    let end = offset.checked_add(len).ok_or(AnalysisError::TooSmall {
        expected: u64::MAX,
        actual: buf.len() as u64,
    })?;
    buf.get(offset..end).ok_or(AnalysisError::TooSmall {
        expected: end as u64,
        actual: buf.len() as u64,
    })
}

pub fn read_u16_le(buf: &[u8], offset: usize) -> Result<u16, AnalysisError> {
    let b = slice_at(buf, offset, 2)?;
    Ok(u16::from_le_bytes([b[0], b[1]]))
}

pub fn read_u32_le(buf: &[u8], offset: usize) -> Result<u32, AnalysisError> {
    let b = slice_at(buf, offset, 4)?;
    Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

pub fn read_u32_be(buf: &[u8], offset: usize) -> Result<u32, AnalysisError> {
    let b = slice_at(buf, offset, 4)?;
    Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

/// Read a null-terminated ASCII string from a byte slice.
///
/// Stops at the first null byte, filters out non-printable characters,
/// and returns the result. No trimming is performed.
pub fn read_ascii(buf: &[u8]) -> String {
    buf.iter()
        .take_while(|&&b| b != 0)
        .filter(|&&b| (0x20..0x7F).contains(&b))
        .map(|&b| b as char)
        .collect()
}

/// Read a null-terminated UTF-16LE string from a fixed-size field.
///
/// Unpaired surrogates become U+FFFD. A trailing odd byte is ignored.
pub fn read_utf16_le(buf: &[u8]) -> String {
    let units = buf
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .take_while(|&u| u != 0);
    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
