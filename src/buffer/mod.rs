mod document;

pub use document::Document;

use crate::error::{Error, Result};

/// Immutable, randomly addressable bytes.
pub trait ByteSource {
    /// The whole buffer.
    fn as_bytes(&self) -> &[u8];

    fn len(&self) -> usize {
        self.as_bytes().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `count` bytes starting at `offset`.
    fn read(&self, offset: usize, count: usize) -> Result<&[u8]> {
        let data = self.as_bytes();
        match offset.checked_add(count) {
            Some(end) if end <= data.len() => Ok(&data[offset..end]),
            _ => Err(Error::OutOfRange {
                offset,
                count,
                len: data.len(),
            }),
        }
    }
}

impl ByteSource for [u8] {
    fn as_bytes(&self) -> &[u8] {
        self
    }
}

impl ByteSource for Vec<u8> {
    fn as_bytes(&self) -> &[u8] {
        self
    }
}

impl<const N: usize> ByteSource for [u8; N] {
    fn as_bytes(&self) -> &[u8] {
        self
    }
}
