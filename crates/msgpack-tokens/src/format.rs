//! `MessagePack` wire primitives.
//!
//! Decoding reads one header (marker plus any fixed-size payload) from a
//! [`ByteSource`]; variable-length payloads are read separately so the reader
//! can decide whether to materialize or skip them. Encoding appends to a
//! growable `Vec<u8>`.
//!
//! | Marker        | Meaning                        |
//! |---------------|--------------------------------|
//! | `0x00..=0x7f` | positive fixint                |
//! | `0x80..=0x8f` | fixmap                         |
//! | `0x90..=0x9f` | fixarray                       |
//! | `0xa0..=0xbf` | fixstr                         |
//! | `0xc0`        | nil                            |
//! | `0xc1`        | never used                     |
//! | `0xc2/0xc3`   | false / true                   |
//! | `0xc4..=0xc6` | bin 8/16/32                    |
//! | `0xc7..=0xc9` | ext 8/16/32                    |
//! | `0xca/0xcb`   | float 32/64                    |
//! | `0xcc..=0xcf` | uint 8/16/32/64                |
//! | `0xd0..=0xd3` | int 8/16/32/64                 |
//! | `0xd4..=0xd8` | fixext 1/2/4/8/16              |
//! | `0xd9..=0xdb` | str 8/16/32                    |
//! | `0xdc/0xdd`   | array 16/32                    |
//! | `0xde/0xdf`   | map 16/32                      |
//! | `0xe0..=0xff` | negative fixint                |
use alloc::{string::String, vec::Vec};

use crate::{
    error::{MalformedError, ReaderError},
    source::ByteSource,
    token::{Integer, Timestamp},
};

pub(crate) const NIL: u8 = 0xc0;
pub(crate) const NEVER_USED: u8 = 0xc1;
pub(crate) const FALSE: u8 = 0xc2;
pub(crate) const TRUE: u8 = 0xc3;
pub(crate) const FIXMAP: u8 = 0x80;
pub(crate) const FIXARRAY: u8 = 0x90;
pub(crate) const FIXSTR: u8 = 0xa0;
pub(crate) const BIN_8: u8 = 0xc4;
pub(crate) const BIN_16: u8 = 0xc5;
pub(crate) const BIN_32: u8 = 0xc6;
pub(crate) const EXT_8: u8 = 0xc7;
pub(crate) const EXT_16: u8 = 0xc8;
pub(crate) const EXT_32: u8 = 0xc9;
pub(crate) const FLOAT_32: u8 = 0xca;
pub(crate) const FLOAT_64: u8 = 0xcb;
pub(crate) const UINT_8: u8 = 0xcc;
pub(crate) const UINT_16: u8 = 0xcd;
pub(crate) const UINT_32: u8 = 0xce;
pub(crate) const UINT_64: u8 = 0xcf;
pub(crate) const INT_8: u8 = 0xd0;
pub(crate) const INT_16: u8 = 0xd1;
pub(crate) const INT_32: u8 = 0xd2;
pub(crate) const INT_64: u8 = 0xd3;
pub(crate) const FIXEXT_1: u8 = 0xd4;
pub(crate) const FIXEXT_2: u8 = 0xd5;
pub(crate) const FIXEXT_4: u8 = 0xd6;
pub(crate) const FIXEXT_8: u8 = 0xd7;
pub(crate) const FIXEXT_16: u8 = 0xd8;
pub(crate) const STR_8: u8 = 0xd9;
pub(crate) const STR_16: u8 = 0xda;
pub(crate) const STR_32: u8 = 0xdb;
pub(crate) const ARRAY_16: u8 = 0xdc;
pub(crate) const ARRAY_32: u8 = 0xdd;
pub(crate) const MAP_16: u8 = 0xde;
pub(crate) const MAP_32: u8 = 0xdf;

const MAX_FIXMAP: u32 = 0x0f;
const MAX_FIXARRAY: u32 = 0x0f;
const MAX_FIXSTR: u32 = 0x1f;
const MAX_POSFIXINT: u64 = 0x7f;
const MIN_NEGFIXINT: i64 = -32;

/// The reserved extension type for timestamps.
pub const TIMESTAMP_EXT: i8 = -1;

/// The family a marker byte belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum WireType {
    Nil,
    Boolean,
    Integer,
    Float,
    String,
    Binary,
    Array,
    Map,
    Extension,
    /// `0xc1`, which no valid document contains.
    NeverUsed,
}

impl WireType {
    /// Classifies a marker byte.
    #[must_use]
    pub fn of(marker: u8) -> Self {
        match marker {
            0x00..=0x7f | 0xe0..=0xff | UINT_8..=INT_64 => Self::Integer,
            0x80..=0x8f | MAP_16 | MAP_32 => Self::Map,
            0x90..=0x9f | ARRAY_16 | ARRAY_32 => Self::Array,
            0xa0..=0xbf | STR_8..=STR_32 => Self::String,
            NIL => Self::Nil,
            FALSE | TRUE => Self::Boolean,
            BIN_8..=BIN_32 => Self::Binary,
            EXT_8..=EXT_32 | FIXEXT_1..=FIXEXT_16 => Self::Extension,
            FLOAT_32 | FLOAT_64 => Self::Float,
            NEVER_USED => Self::NeverUsed,
        }
    }
}

/// One decoded header. Lengths of strings, blobs and extensions count
/// payload bytes still to be read; container lengths count children.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Header {
    Nil,
    Boolean(bool),
    Integer(Integer),
    F32(f32),
    F64(f64),
    Str(usize),
    Bin(usize),
    Array(usize),
    Map(usize),
    Ext { ty: i8, len: usize },
}

macro_rules! read_be {
    ($src:expr, $t:ty) => {{
        let mut buf = [0u8; core::mem::size_of::<$t>()];
        $src.read_exact(&mut buf)?;
        <$t>::from_be_bytes(buf)
    }};
}

fn length(len: u32, at: usize) -> Result<usize, ReaderError> {
    usize::try_from(len)
        .map_err(|_| ReaderError::new(MalformedError::LengthOverflow(u64::from(len)), at))
}

/// Reads a marker and its fixed-size payload.
pub(crate) fn read_header<S: ByteSource>(src: &mut S) -> Result<Header, ReaderError> {
    let at = src.position();
    let marker = src.read_byte()?;
    let header = match marker {
        0x00..=0x7f => Header::Integer(Integer::from(marker)),
        0xe0..=0xff => Header::Integer(Integer::from(i8::from_be_bytes([marker]))),
        0x80..=0x8f => Header::Map(usize::from(marker & 0x0f)),
        0x90..=0x9f => Header::Array(usize::from(marker & 0x0f)),
        0xa0..=0xbf => Header::Str(usize::from(marker & 0x1f)),
        NIL => Header::Nil,
        FALSE => Header::Boolean(false),
        TRUE => Header::Boolean(true),
        UINT_8 => Header::Integer(Integer::from(read_be!(src, u8))),
        UINT_16 => Header::Integer(Integer::from(read_be!(src, u16))),
        UINT_32 => Header::Integer(Integer::from(read_be!(src, u32))),
        UINT_64 => Header::Integer(Integer::from(read_be!(src, u64))),
        INT_8 => Header::Integer(Integer::from(read_be!(src, i8))),
        INT_16 => Header::Integer(Integer::from(read_be!(src, i16))),
        INT_32 => Header::Integer(Integer::from(read_be!(src, i32))),
        INT_64 => Header::Integer(Integer::from(read_be!(src, i64))),
        FLOAT_32 => Header::F32(read_be!(src, f32)),
        FLOAT_64 => Header::F64(read_be!(src, f64)),
        STR_8 => Header::Str(usize::from(read_be!(src, u8))),
        STR_16 => Header::Str(usize::from(read_be!(src, u16))),
        STR_32 => Header::Str(length(read_be!(src, u32), at)?),
        BIN_8 => Header::Bin(usize::from(read_be!(src, u8))),
        BIN_16 => Header::Bin(usize::from(read_be!(src, u16))),
        BIN_32 => Header::Bin(length(read_be!(src, u32), at)?),
        ARRAY_16 => Header::Array(usize::from(read_be!(src, u16))),
        ARRAY_32 => Header::Array(length(read_be!(src, u32), at)?),
        MAP_16 => Header::Map(usize::from(read_be!(src, u16))),
        MAP_32 => Header::Map(length(read_be!(src, u32), at)?),
        FIXEXT_1 | FIXEXT_2 | FIXEXT_4 | FIXEXT_8 | FIXEXT_16 => {
            let len = 1usize << (marker - FIXEXT_1);
            Header::Ext {
                ty: read_be!(src, i8),
                len,
            }
        }
        EXT_8 => {
            let len = usize::from(read_be!(src, u8));
            Header::Ext {
                ty: read_be!(src, i8),
                len,
            }
        }
        EXT_16 => {
            let len = usize::from(read_be!(src, u16));
            Header::Ext {
                ty: read_be!(src, i8),
                len,
            }
        }
        EXT_32 => {
            let len = length(read_be!(src, u32), at)?;
            Header::Ext {
                ty: read_be!(src, i8),
                len,
            }
        }
        NEVER_USED => {
            return Err(ReaderError::new(MalformedError::InvalidMarker(marker), at));
        }
    };
    Ok(header)
}

/// Reads `len` bytes of string payload.
pub(crate) fn read_str<S: ByteSource>(src: &mut S, len: usize) -> Result<String, ReaderError> {
    let at = src.position();
    let bytes = src.read_vec(len)?;
    String::from_utf8(bytes).map_err(|_| ReaderError::new(MalformedError::InvalidUtf8, at))
}

/// Decodes a timestamp extension payload of `len` bytes.
pub(crate) fn read_timestamp<S: ByteSource>(
    src: &mut S,
    len: usize,
) -> Result<Timestamp, ReaderError> {
    let at = src.position();
    let (seconds, nanos) = match len {
        4 => (i64::from(read_be!(src, u32)), 0),
        8 => {
            let data = read_be!(src, u64);
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let (nanos, seconds) = ((data >> 34) as u32, (data & 0x0000_0003_ffff_ffff) as i64);
            (seconds, nanos)
        }
        12 => {
            let nanos = read_be!(src, u32);
            (read_be!(src, i64), nanos)
        }
        other => {
            let len = u32::try_from(other).unwrap_or(u32::MAX);
            return Err(ReaderError::new(
                MalformedError::InvalidTimestampLength(len),
                at,
            ));
        }
    };
    Timestamp::new(seconds, nanos)
        .ok_or_else(|| ReaderError::new(MalformedError::InvalidTimestampNanos(nanos), at))
}

/// Returns the type and payload length of the extension at the cursor
/// without consuming it.
pub(crate) fn peek_ext_header<S: ByteSource>(
    src: &mut S,
) -> Result<(i8, usize), ReaderError> {
    let start = src.position();
    let header = read_header(src)?;
    let consumed = src.position() - start;
    src.rewind(consumed)?;
    match header {
        Header::Ext { ty, len } => Ok((ty, len)),
        _ => Err(ReaderError::new(MalformedError::Truncated, start)),
    }
}

/// Consumes `count` complete values, descending into containers.
pub(crate) fn skip_values<S: ByteSource>(src: &mut S, count: usize) -> Result<(), ReaderError> {
    let mut pending = count;
    while pending > 0 {
        pending -= 1;
        match read_header(src)? {
            Header::Str(len) | Header::Bin(len) | Header::Ext { len, .. } => src.skip(len)?,
            Header::Array(len) => pending = pending.saturating_add(len),
            Header::Map(len) => pending = pending.saturating_add(len.saturating_mul(2)),
            Header::Nil
            | Header::Boolean(_)
            | Header::Integer(_)
            | Header::F32(_)
            | Header::F64(_) => {}
        }
    }
    Ok(())
}

// ------------------------------------------------------------------------------------------------
// Encoding
// ------------------------------------------------------------------------------------------------

/// A length that does not fit in a 32-bit prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LengthOverflow(pub(crate) usize);

fn len32(len: usize) -> Result<u32, LengthOverflow> {
    u32::try_from(len).map_err(|_| LengthOverflow(len))
}

pub(crate) fn write_nil(out: &mut Vec<u8>) {
    out.push(NIL);
}

pub(crate) fn write_bool(out: &mut Vec<u8>, v: bool) {
    out.push(if v { TRUE } else { FALSE });
}

/// Writes `v` in its smallest unsigned encoding.
#[allow(clippy::cast_possible_truncation)]
pub(crate) fn write_uint(out: &mut Vec<u8>, v: u64) {
    if v <= MAX_POSFIXINT {
        out.push(v as u8);
    } else if let Ok(v) = u8::try_from(v) {
        out.push(UINT_8);
        out.push(v);
    } else if let Ok(v) = u16::try_from(v) {
        out.push(UINT_16);
        out.extend_from_slice(&v.to_be_bytes());
    } else if let Ok(v) = u32::try_from(v) {
        out.push(UINT_32);
        out.extend_from_slice(&v.to_be_bytes());
    } else {
        out.push(UINT_64);
        out.extend_from_slice(&v.to_be_bytes());
    }
}

/// Writes `v` in its smallest encoding; non-negative values use the
/// unsigned forms.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn write_sint(out: &mut Vec<u8>, v: i64) {
    if let Ok(u) = u64::try_from(v) {
        write_uint(out, u);
    } else if v >= MIN_NEGFIXINT {
        out.push(v as u8);
    } else if let Ok(v) = i8::try_from(v) {
        out.push(INT_8);
        out.push(v as u8);
    } else if let Ok(v) = i16::try_from(v) {
        out.push(INT_16);
        out.extend_from_slice(&v.to_be_bytes());
    } else if let Ok(v) = i32::try_from(v) {
        out.push(INT_32);
        out.extend_from_slice(&v.to_be_bytes());
    } else {
        out.push(INT_64);
        out.extend_from_slice(&v.to_be_bytes());
    }
}

pub(crate) fn write_integer(out: &mut Vec<u8>, v: Integer) {
    match v {
        Integer::PosInt(u) => write_uint(out, u),
        Integer::NegInt(i) => write_sint(out, i),
    }
}

pub(crate) fn write_f32(out: &mut Vec<u8>, v: f32) {
    out.push(FLOAT_32);
    out.extend_from_slice(&v.to_be_bytes());
}

pub(crate) fn write_f64(out: &mut Vec<u8>, v: f64) {
    out.push(FLOAT_64);
    out.extend_from_slice(&v.to_be_bytes());
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn write_str(out: &mut Vec<u8>, v: &str) -> Result<(), LengthOverflow> {
    let len = len32(v.len())?;
    if len <= MAX_FIXSTR {
        out.push(FIXSTR | len as u8);
    } else if let Ok(len) = u8::try_from(len) {
        out.push(STR_8);
        out.push(len);
    } else if let Ok(len) = u16::try_from(len) {
        out.push(STR_16);
        out.extend_from_slice(&len.to_be_bytes());
    } else {
        out.push(STR_32);
        out.extend_from_slice(&len.to_be_bytes());
    }
    out.extend_from_slice(v.as_bytes());
    Ok(())
}

pub(crate) fn write_bin(out: &mut Vec<u8>, v: &[u8]) -> Result<(), LengthOverflow> {
    let len = len32(v.len())?;
    if let Ok(len) = u8::try_from(len) {
        out.push(BIN_8);
        out.push(len);
    } else if let Ok(len) = u16::try_from(len) {
        out.push(BIN_16);
        out.extend_from_slice(&len.to_be_bytes());
    } else {
        out.push(BIN_32);
        out.extend_from_slice(&len.to_be_bytes());
    }
    out.extend_from_slice(v);
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn write_array_len(out: &mut Vec<u8>, len: usize) -> Result<(), LengthOverflow> {
    let len = len32(len)?;
    if len <= MAX_FIXARRAY {
        out.push(FIXARRAY | len as u8);
    } else if let Ok(len) = u16::try_from(len) {
        out.push(ARRAY_16);
        out.extend_from_slice(&len.to_be_bytes());
    } else {
        out.push(ARRAY_32);
        out.extend_from_slice(&len.to_be_bytes());
    }
    Ok(())
}

#[allow(clippy::cast_possible_truncation)]
pub(crate) fn write_map_len(out: &mut Vec<u8>, len: usize) -> Result<(), LengthOverflow> {
    let len = len32(len)?;
    if len <= MAX_FIXMAP {
        out.push(FIXMAP | len as u8);
    } else if let Ok(len) = u16::try_from(len) {
        out.push(MAP_16);
        out.extend_from_slice(&len.to_be_bytes());
    } else {
        out.push(MAP_32);
        out.extend_from_slice(&len.to_be_bytes());
    }
    Ok(())
}

/// Writes a timestamp extension in the smallest of the three layouts.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
pub(crate) fn write_timestamp(out: &mut Vec<u8>, ts: Timestamp) {
    let [ty] = TIMESTAMP_EXT.to_be_bytes();
    if ts.seconds >> 34 == 0 {
        let data = (u64::from(ts.nanos) << 34) | ts.seconds as u64;
        if data & 0xffff_ffff_0000_0000 == 0 {
            out.extend_from_slice(&[FIXEXT_4, ty]);
            out.extend_from_slice(&(data as u32).to_be_bytes());
        } else {
            out.extend_from_slice(&[FIXEXT_8, ty]);
            out.extend_from_slice(&data.to_be_bytes());
        }
    } else {
        out.extend_from_slice(&[EXT_8, 12, ty]);
        out.extend_from_slice(&ts.nanos.to_be_bytes());
        out.extend_from_slice(&ts.seconds.to_be_bytes());
    }
}
