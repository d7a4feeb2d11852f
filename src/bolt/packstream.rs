//! PackStream v1 binary encoding.
//!
//! # Responsibilities
//! - Encode query parameters (null, bool, int, float, bytes, string, list, map)
//! - Decode every value the server returns, including structures
//! - Bounds-check all reads; malformed input is an error, never a panic

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::bolt::value::{BoltMap, BoltValue};

/// Marker bytes.
pub mod marker {
    pub const NULL: u8 = 0xC0;
    pub const FLOAT_64: u8 = 0xC1;
    pub const FALSE: u8 = 0xC2;
    pub const TRUE: u8 = 0xC3;
    pub const INT_8: u8 = 0xC8;
    pub const INT_16: u8 = 0xC9;
    pub const INT_32: u8 = 0xCA;
    pub const INT_64: u8 = 0xCB;
    pub const BYTES_8: u8 = 0xCC;
    pub const BYTES_16: u8 = 0xCD;
    pub const BYTES_32: u8 = 0xCE;
    pub const STRING_8: u8 = 0xD0;
    pub const STRING_16: u8 = 0xD1;
    pub const STRING_32: u8 = 0xD2;
    pub const LIST_8: u8 = 0xD4;
    pub const LIST_16: u8 = 0xD5;
    pub const LIST_32: u8 = 0xD6;
    pub const MAP_8: u8 = 0xD8;
    pub const MAP_16: u8 = 0xD9;
    pub const MAP_32: u8 = 0xDA;
    pub const TINY_STRING: u8 = 0x80;
    pub const TINY_LIST: u8 = 0x90;
    pub const TINY_MAP: u8 = 0xA0;
    pub const TINY_STRUCT: u8 = 0xB0;
}

/// Nesting limit for decoded containers.
const MAX_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackStreamError {
    #[error("unexpected end of data")]
    UnexpectedEof,

    #[error("unknown marker byte 0x{0:02X}")]
    UnknownMarker(u8),

    #[error("expected a structure, found marker 0x{0:02X}")]
    NotAStructure(u8),

    #[error("invalid UTF-8 in string")]
    InvalidUtf8,

    #[error("map key is not a string")]
    NonStringKey,

    #[error("{0} values cannot be sent as parameters")]
    Unencodable(&'static str),

    #[error("value too large to encode")]
    TooLarge,

    #[error("nesting deeper than 256 levels")]
    TooDeep,
}

type PackResult<T> = Result<T, PackStreamError>;

// ── Encoding ───────────────────────────────────────────────────────────

/// Append the encoding of `value` to `buf`.
pub fn encode(value: &BoltValue, buf: &mut BytesMut) -> PackResult<()> {
    match value {
        BoltValue::Null => buf.put_u8(marker::NULL),
        BoltValue::Boolean(true) => buf.put_u8(marker::TRUE),
        BoltValue::Boolean(false) => buf.put_u8(marker::FALSE),
        BoltValue::Integer(i) => write_int(*i, buf),
        BoltValue::Float(f) => {
            buf.put_u8(marker::FLOAT_64);
            buf.put_f64(*f);
        }
        BoltValue::Bytes(bytes) => {
            write_header(bytes.len(), None, [marker::BYTES_8, marker::BYTES_16, marker::BYTES_32], buf)?;
            buf.put_slice(bytes);
        }
        BoltValue::String(s) => write_string(s, buf)?,
        BoltValue::List(items) => {
            write_list_header(items.len(), buf)?;
            for item in items {
                encode(item, buf)?;
            }
        }
        BoltValue::Map(map) => {
            write_map_header(map.len(), buf)?;
            for (key, value) in map {
                write_string(key, buf)?;
                encode(value, buf)?;
            }
        }
        BoltValue::Node(_) => return Err(PackStreamError::Unencodable("node")),
        BoltValue::Relationship(_) => return Err(PackStreamError::Unencodable("relationship")),
        BoltValue::Path(_) => return Err(PackStreamError::Unencodable("path")),
        BoltValue::Date(_)
        | BoltValue::Time { .. }
        | BoltValue::LocalTime(_)
        | BoltValue::DateTime { .. }
        | BoltValue::LocalDateTime(_)
        | BoltValue::Duration { .. } => return Err(PackStreamError::Unencodable("temporal")),
        BoltValue::Point { .. } => return Err(PackStreamError::Unencodable("point")),
        BoltValue::Structure { tag, fields } => {
            write_struct_header(*tag, fields.len(), buf)?;
            for field in fields {
                encode(field, buf)?;
            }
        }
    }
    Ok(())
}

/// Smallest integer representation.
pub fn write_int(i: i64, buf: &mut BytesMut) {
    if (-16..=127).contains(&i) {
        buf.put_i8(i as i8);
    } else if i8::try_from(i).is_ok() {
        buf.put_u8(marker::INT_8);
        buf.put_i8(i as i8);
    } else if i16::try_from(i).is_ok() {
        buf.put_u8(marker::INT_16);
        buf.put_i16(i as i16);
    } else if i32::try_from(i).is_ok() {
        buf.put_u8(marker::INT_32);
        buf.put_i32(i as i32);
    } else {
        buf.put_u8(marker::INT_64);
        buf.put_i64(i);
    }
}

pub fn write_string(s: &str, buf: &mut BytesMut) -> PackResult<()> {
    write_header(
        s.len(),
        Some(marker::TINY_STRING),
        [marker::STRING_8, marker::STRING_16, marker::STRING_32],
        buf,
    )?;
    buf.put_slice(s.as_bytes());
    Ok(())
}

pub fn write_list_header(len: usize, buf: &mut BytesMut) -> PackResult<()> {
    write_header(
        len,
        Some(marker::TINY_LIST),
        [marker::LIST_8, marker::LIST_16, marker::LIST_32],
        buf,
    )
}

pub fn write_map_header(len: usize, buf: &mut BytesMut) -> PackResult<()> {
    write_header(
        len,
        Some(marker::TINY_MAP),
        [marker::MAP_8, marker::MAP_16, marker::MAP_32],
        buf,
    )
}

pub fn write_struct_header(tag: u8, fields: usize, buf: &mut BytesMut) -> PackResult<()> {
    if fields > 0x0F {
        return Err(PackStreamError::TooLarge);
    }
    buf.put_u8(marker::TINY_STRUCT | fields as u8);
    buf.put_u8(tag);
    Ok(())
}

fn write_header(len: usize, tiny: Option<u8>, sized: [u8; 3], buf: &mut BytesMut) -> PackResult<()> {
    match tiny {
        Some(tiny) if len < 0x10 => buf.put_u8(tiny | len as u8),
        _ if len <= u8::MAX as usize => {
            buf.put_u8(sized[0]);
            buf.put_u8(len as u8);
        }
        _ if len <= u16::MAX as usize => {
            buf.put_u8(sized[1]);
            buf.put_u16(len as u16);
        }
        _ if len <= u32::MAX as usize => {
            buf.put_u8(sized[2]);
            buf.put_u32(len as u32);
        }
        _ => return Err(PackStreamError::TooLarge),
    }
    Ok(())
}

// ── Decoding ───────────────────────────────────────────────────────────

/// Decode one value from the front of `buf`.
pub fn decode(buf: &mut Bytes) -> PackResult<BoltValue> {
    decode_value(buf, 0)
}

/// Read a structure header, returning `(field_count, tag)`.
pub fn read_struct_header(buf: &mut Bytes) -> PackResult<(usize, u8)> {
    let m = take_u8(buf)?;
    if m & 0xF0 != marker::TINY_STRUCT {
        return Err(PackStreamError::NotAStructure(m));
    }
    let tag = take_u8(buf)?;
    Ok(((m & 0x0F) as usize, tag))
}

fn decode_value(buf: &mut Bytes, depth: usize) -> PackResult<BoltValue> {
    if depth > MAX_DEPTH {
        return Err(PackStreamError::TooDeep);
    }

    let m = take_u8(buf)?;
    let value = match m {
        0x00..=0x7F => BoltValue::Integer(i64::from(m)),
        0xF0..=0xFF => BoltValue::Integer(i64::from(m as i8)),
        0x80..=0x8F => BoltValue::String(read_string((m & 0x0F) as usize, buf)?),
        0x90..=0x9F => BoltValue::List(read_list((m & 0x0F) as usize, buf, depth)?),
        0xA0..=0xAF => BoltValue::Map(read_map((m & 0x0F) as usize, buf, depth)?),
        0xB0..=0xBF => {
            let tag = take_u8(buf)?;
            let fields = read_list((m & 0x0F) as usize, buf, depth)?;
            BoltValue::from_structure(tag, fields)
        }
        marker::NULL => BoltValue::Null,
        marker::FALSE => BoltValue::Boolean(false),
        marker::TRUE => BoltValue::Boolean(true),
        marker::FLOAT_64 => {
            need(buf, 8)?;
            BoltValue::Float(buf.get_f64())
        }
        marker::INT_8 => {
            need(buf, 1)?;
            BoltValue::Integer(i64::from(buf.get_i8()))
        }
        marker::INT_16 => {
            need(buf, 2)?;
            BoltValue::Integer(i64::from(buf.get_i16()))
        }
        marker::INT_32 => {
            need(buf, 4)?;
            BoltValue::Integer(i64::from(buf.get_i32()))
        }
        marker::INT_64 => {
            need(buf, 8)?;
            BoltValue::Integer(buf.get_i64())
        }
        marker::BYTES_8 | marker::BYTES_16 | marker::BYTES_32 => {
            let len = read_len(m - marker::BYTES_8, buf)?;
            need(buf, len)?;
            BoltValue::Bytes(buf.split_to(len).to_vec())
        }
        marker::STRING_8 | marker::STRING_16 | marker::STRING_32 => {
            let len = read_len(m - marker::STRING_8, buf)?;
            BoltValue::String(read_string(len, buf)?)
        }
        marker::LIST_8 | marker::LIST_16 | marker::LIST_32 => {
            let len = read_len(m - marker::LIST_8, buf)?;
            BoltValue::List(read_list(len, buf, depth)?)
        }
        marker::MAP_8 | marker::MAP_16 | marker::MAP_32 => {
            let len = read_len(m - marker::MAP_8, buf)?;
            BoltValue::Map(read_map(len, buf, depth)?)
        }
        other => return Err(PackStreamError::UnknownMarker(other)),
    };
    Ok(value)
}

/// Length prefix: width 0 = u8, 1 = u16, 2 = u32.
fn read_len(width: u8, buf: &mut Bytes) -> PackResult<usize> {
    match width {
        0 => Ok(take_u8(buf)? as usize),
        1 => {
            need(buf, 2)?;
            Ok(buf.get_u16() as usize)
        }
        _ => {
            need(buf, 4)?;
            Ok(buf.get_u32() as usize)
        }
    }
}

fn read_string(len: usize, buf: &mut Bytes) -> PackResult<String> {
    need(buf, len)?;
    let raw = buf.split_to(len);
    String::from_utf8(raw.to_vec()).map_err(|_| PackStreamError::InvalidUtf8)
}

fn read_list(len: usize, buf: &mut Bytes, depth: usize) -> PackResult<Vec<BoltValue>> {
    // Every element takes at least one byte.
    let mut items = Vec::with_capacity(len.min(buf.remaining()));
    for _ in 0..len {
        items.push(decode_value(buf, depth + 1)?);
    }
    Ok(items)
}

fn read_map(len: usize, buf: &mut Bytes, depth: usize) -> PackResult<BoltMap> {
    let mut map = BoltMap::new();
    for _ in 0..len {
        let key = match decode_value(buf, depth + 1)? {
            BoltValue::String(key) => key,
            _ => return Err(PackStreamError::NonStringKey),
        };
        let value = decode_value(buf, depth + 1)?;
        map.insert(key, value);
    }
    Ok(map)
}

fn take_u8(buf: &mut Bytes) -> PackResult<u8> {
    need(buf, 1)?;
    Ok(buf.get_u8())
}

fn need(buf: &Bytes, n: usize) -> PackResult<()> {
    if buf.remaining() < n {
        Err(PackStreamError::UnexpectedEof)
    } else {
        Ok(())
    }
}
