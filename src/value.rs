//! Decoding of raw bytes into typed scalars.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::tag::TagType;

/// Byte order used when decoding multi-byte integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Endian {
    #[default]
    Little,
    Big,
}

impl Endian {
    pub fn name(self) -> &'static str {
        match self {
            Endian::Little => "little",
            Endian::Big => "big",
        }
    }
}

impl fmt::Display for Endian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Endian {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "little" | "le" => Ok(Endian::Little),
            "big" | "be" => Ok(Endian::Big),
            _ => Err(format!("unknown byte order {s:?} (expected little or big)")),
        }
    }
}

/// A decoded value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Char(u8),
    Unsigned(u64),
    Signed(i64),
    /// String, Array and Unknown ranges: the bytes as they are.
    Bytes(Vec<u8>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Char(b) if b.is_ascii_graphic() || *b == b' ' => write!(f, "'{}'", *b as char),
            Value::Char(b) => write!(f, "'\\x{b:02x}'"),
            Value::Unsigned(v) => write!(f, "{v} ({v:#x})"),
            Value::Signed(v) => write!(f, "{v}"),
            Value::Bytes(bytes) => {
                let text: String = bytes
                    .iter()
                    .map(|&b| if (0x20..=0x7e).contains(&b) { b as char } else { '.' })
                    .collect();
                write!(f, "\"{text}\"")
            }
        }
    }
}

/// Decode `bytes` as a value of `kind`.
///
/// One-byte kinds use the first byte; wider integers require exactly
/// their width.
pub fn decode(bytes: &[u8], kind: TagType, endian: Endian) -> Result<Value> {
    let value = match kind {
        TagType::Char => Value::Char(first_byte(bytes, kind)?),
        TagType::Uint8 => Value::Unsigned(first_byte(bytes, kind)? as u64),
        TagType::Int8 => Value::Signed(first_byte(bytes, kind)? as i8 as i64),
        TagType::Uint16 => Value::Unsigned(u16::from_ne_bytes(fixed(bytes, kind, endian)?) as u64),
        TagType::Uint32 => Value::Unsigned(u32::from_ne_bytes(fixed(bytes, kind, endian)?) as u64),
        TagType::Uint64 => Value::Unsigned(u64::from_ne_bytes(fixed(bytes, kind, endian)?)),
        TagType::Int16 => Value::Signed(i16::from_ne_bytes(fixed(bytes, kind, endian)?) as i64),
        TagType::Int32 => Value::Signed(i32::from_ne_bytes(fixed(bytes, kind, endian)?) as i64),
        TagType::Int64 => Value::Signed(i64::from_ne_bytes(fixed(bytes, kind, endian)?)),
        TagType::String | TagType::Array | TagType::Unknown => Value::Bytes(bytes.to_vec()),
    };
    Ok(value)
}

/// Interpret any number of bytes as an unsigned integer.
///
/// Leading zero bytes beyond eight are accepted; anything that does not
/// fit in 64 bits fails with `OffsetTooWide`.
pub fn decode_unsigned(bytes: &[u8], endian: Endian) -> Result<u64> {
    let mut value: u64 = 0;
    let mut push = |b: u8| -> Result<()> {
        value = value
            .checked_mul(256)
            .map(|v| v | b as u64)
            .ok_or(Error::OffsetTooWide { len: bytes.len() })?;
        Ok(())
    };
    match endian {
        Endian::Big => bytes.iter().try_for_each(|&b| push(b))?,
        Endian::Little => bytes.iter().rev().try_for_each(|&b| push(b))?,
    }
    Ok(value)
}

/// Encode `value` as exactly `width` bytes.
pub fn encode_unsigned(value: u64, width: usize, endian: Endian) -> Result<Vec<u8>> {
    let needed = (u64::BITS - value.leading_zeros()).div_ceil(8) as usize;
    if width == 0 || needed > width {
        return Err(Error::LengthMismatch {
            kind: "offset",
            expected: needed.max(1),
            actual: width,
        });
    }
    let mut bytes = vec![0u8; width];
    let le = value.to_le_bytes();
    let n = width.min(le.len());
    bytes[..n].copy_from_slice(&le[..n]);
    if endian == Endian::Big {
        bytes.reverse();
    }
    Ok(bytes)
}

fn first_byte(bytes: &[u8], kind: TagType) -> Result<u8> {
    bytes.first().copied().ok_or(Error::LengthMismatch {
        kind: kind.name(),
        expected: 1,
        actual: 0,
    })
}

/// Copy `bytes` into a native-order array of width `N`.
fn fixed<const N: usize>(bytes: &[u8], kind: TagType, endian: Endian) -> Result<[u8; N]> {
    let mut out: [u8; N] = bytes.try_into().map_err(|_| Error::LengthMismatch {
        kind: kind.name(),
        expected: N,
        actual: bytes.len(),
    })?;
    let native = if cfg!(target_endian = "little") {
        Endian::Little
    } else {
        Endian::Big
    };
    if endian != native {
        out.reverse();
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uint16_respects_endianness() {
        assert_eq!(
            decode(&[0x01, 0x00], TagType::Uint16, Endian::Little).unwrap(),
            Value::Unsigned(1)
        );
        assert_eq!(
            decode(&[0x01, 0x00], TagType::Uint16, Endian::Big).unwrap(),
            Value::Unsigned(256)
        );
    }

    #[test]
    fn int8_is_signed_regardless_of_endianness() {
        for endian in [Endian::Little, Endian::Big] {
            assert_eq!(decode(&[0xff], TagType::Int8, endian).unwrap(), Value::Signed(-1));
        }
        assert_eq!(decode(&[0xff], TagType::Uint8, Endian::Big).unwrap(), Value::Unsigned(255));
        assert_eq!(decode(&[0xff], TagType::Char, Endian::Big).unwrap(), Value::Char(0xff));
    }

    #[test]
    fn wide_integers() {
        let bytes = [0xfe, 0xff, 0xff, 0xff];
        assert_eq!(decode(&bytes, TagType::Int32, Endian::Little).unwrap(), Value::Signed(-2));
        assert_eq!(
            decode(&bytes, TagType::Uint32, Endian::Big).unwrap(),
            Value::Unsigned(0xfeff_ffff)
        );
        let bytes = [0, 0, 0, 0, 0, 0, 0, 0x80];
        assert_eq!(decode(&bytes, TagType::Int64, Endian::Little).unwrap(), Value::Signed(i64::MIN));
        assert_eq!(
            decode(&[0x80, 0x00], TagType::Int16, Endian::Big).unwrap(),
            Value::Signed(i16::MIN as i64)
        );
    }

    #[test]
    fn length_mismatch() {
        let err = decode(&[1, 2, 3], TagType::Uint32, Endian::Little).unwrap_err();
        assert!(matches!(
            err,
            Error::LengthMismatch { expected: 4, actual: 3, .. }
        ));
        assert!(decode(&[], TagType::Uint8, Endian::Little).is_err());
    }

    #[test]
    fn strings_and_arrays_are_opaque() {
        let bytes = b"PK\x03\x04";
        assert_eq!(
            decode(bytes, TagType::String, Endian::Big).unwrap(),
            Value::Bytes(bytes.to_vec())
        );
        assert_eq!(
            decode(bytes, TagType::Array, Endian::Little).unwrap(),
            decode(bytes, TagType::String, Endian::Little).unwrap()
        );
        assert_eq!(Value::Bytes(bytes.to_vec()).to_string(), "\"PK..\"");
    }

    #[test]
    fn unsigned_of_odd_width() {
        assert_eq!(decode_unsigned(&[0x01, 0x02, 0x03], Endian::Little).unwrap(), 0x030201);
        assert_eq!(decode_unsigned(&[0x01, 0x02, 0x03], Endian::Big).unwrap(), 0x010203);
        assert_eq!(decode_unsigned(&[], Endian::Big).unwrap(), 0);
        let mut wide = vec![0u8; 12];
        wide[0] = 0x10;
        assert_eq!(decode_unsigned(&wide, Endian::Little).unwrap(), 0x10);
        wide[11] = 1;
        assert!(matches!(
            decode_unsigned(&wide, Endian::Little),
            Err(Error::OffsetTooWide { len: 12 })
        ));
    }

    #[test]
    fn encode_fixed_width() {
        assert_eq!(encode_unsigned(8, 4, Endian::Little).unwrap(), vec![8, 0, 0, 0]);
        assert_eq!(encode_unsigned(0x0102, 4, Endian::Big).unwrap(), vec![0, 0, 1, 2]);
        assert_eq!(encode_unsigned(0, 1, Endian::Big).unwrap(), vec![0]);
        assert!(encode_unsigned(0x1_0000, 2, Endian::Little).is_err());
    }

    #[test]
    fn endian_from_str() {
        assert_eq!("BE".parse::<Endian>().unwrap(), Endian::Big);
        assert_eq!("little".parse::<Endian>().unwrap(), Endian::Little);
        assert!("middle".parse::<Endian>().is_err());
    }
}
