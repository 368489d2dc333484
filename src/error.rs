use thiserror::Error;

use crate::tag::FieldKey;

/// Errors reported by the annotation engine.
#[derive(Debug, Error)]
pub enum Error {
    /// A position into a `TagStore` is outside the valid range.
    #[error("index {index} out of range (size {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// A byte window extends past the end of the source.
    #[error("read of {count} bytes at offset {offset:#x} exceeds source length {len}")]
    OutOfRange {
        offset: usize,
        count: usize,
        len: usize,
    },

    /// A fixed-width decode was given the wrong number of bytes.
    #[error("{kind} needs {expected} bytes, got {actual}")]
    LengthMismatch {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    /// The bytes encode an unsigned value wider than 64 bits.
    #[error("{len} bytes do not fit in a 64-bit offset")]
    OffsetTooWide { len: usize },

    /// A field value could not be interpreted for the given field.
    #[error("invalid value for {key}: {value:?}")]
    InvalidField { key: FieldKey, value: String },

    #[error("malformed tag document: {0}")]
    MalformedDocument(String),

    /// Tags could not be written as a document.
    #[error("failed to write tag document: {0}")]
    Encode(#[source] serde_yaml::Error),

    /// Saving without a path before any tag file was loaded or saved.
    #[error("no tag file path set")]
    NoTagPath,

    /// The session has no byte source loaded.
    #[error("no file is open")]
    NoSource,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
