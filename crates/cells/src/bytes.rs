//! Value encoding helpers.
//!
//! Numbers are stored big-endian so that their byte order sorts the same way
//! as their numeric order for non-negative values.

use byteorder::{BigEndian, ByteOrder};

use crate::CellError;

pub fn encode_i32(v: i32) -> Vec<u8> {
    let mut buf = vec![0u8; 4];
    BigEndian::write_i32(&mut buf, v);
    buf
}

pub fn decode_i32(bytes: &[u8]) -> Result<i32, CellError> {
    if bytes.len() != 4 {
        return Err(CellError::ValueWidth {
            expected: 4,
            actual: bytes.len(),
        });
    }
    Ok(BigEndian::read_i32(bytes))
}

pub fn encode_i64(v: i64) -> Vec<u8> {
    let mut buf = vec![0u8; 8];
    BigEndian::write_i64(&mut buf, v);
    buf
}

pub fn decode_i64(bytes: &[u8]) -> Result<i64, CellError> {
    if bytes.len() != 8 {
        return Err(CellError::ValueWidth {
            expected: 8,
            actual: bytes.len(),
        });
    }
    Ok(BigEndian::read_i64(bytes))
}

/// Renders bytes for display: printable ASCII as-is, everything else as
/// `\xNN`. An `i32` value of 10 renders as `\x00\x00\x00\x0A`.
pub fn to_string_binary(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        if (b.is_ascii_graphic() || b == b' ') && b != b'\\' {
            out.push(b as char);
        } else {
            out.push_str(&format!("\\x{:02X}", b));
        }
    }
    out
}
