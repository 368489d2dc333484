//! Locating offset-like values within a byte source.
//!
//! Every function here is stateless. The previous match used by
//! [`find_again`] belongs to the caller.

use memchr::memmem;

use crate::buffer::ByteSource;
use crate::error::{Error, Result};
use crate::value::{self, Endian};

/// Bounds-checked read of `length` bytes at `start`.
pub fn read<S: ByteSource + ?Sized>(source: &S, start: usize, length: usize) -> Result<&[u8]> {
    source.read(start, length)
}

/// Interpret bytes of any length as an unsigned offset.
pub fn decode_offset(bytes: &[u8], endian: Endian) -> Result<usize> {
    let value = value::decode_unsigned(bytes, endian)?;
    usize::try_from(value).map_err(|_| Error::OffsetTooWide { len: bytes.len() })
}

/// First occurrence of `needle` starting at or after `from`.
pub fn find<S: ByteSource + ?Sized>(source: &S, needle: &[u8], from: usize) -> Option<usize> {
    let data = source.as_bytes();
    if needle.is_empty() || from >= data.len() {
        return None;
    }
    memmem::find(&data[from..], needle).map(|pos| pos + from)
}

/// Next occurrence strictly after a previous match.
pub fn find_again<S: ByteSource + ?Sized>(
    source: &S,
    needle: &[u8],
    previous: usize,
) -> Option<usize> {
    find(source, needle, previous.checked_add(1)?)
}

/// Last occurrence starting strictly before `before`.
pub fn find_prev<S: ByteSource + ?Sized>(source: &S, needle: &[u8], before: usize) -> Option<usize> {
    let data = source.as_bytes();
    if needle.is_empty() || before == 0 {
        return None;
    }
    let end = (before - 1).saturating_add(needle.len()).min(data.len());
    memmem::rfind(&data[..end], needle)
}

/// Every occurrence of `needle`, in order, overlapping matches included.
pub fn occurrences<'a, S: ByteSource + ?Sized>(
    source: &'a S,
    needle: &'a [u8],
) -> impl Iterator<Item = usize> + 'a {
    let mut next = find(source, needle, 0);
    std::iter::from_fn(move || {
        let current = next?;
        next = find_again(source, needle, current);
        Some(current)
    })
}
