//! Scalar values accepted by the [`Writer`](crate::Writer).
//!
//! Besides the native `MessagePack` scalars, a few domain types have no wire
//! representation of their own and are written in a fixed fallback shape.
//! A reader gets back the fallback shape, so the caller must know the
//! intended type out of band:
//!
//! | Variant                   | Written as                                   |
//! |---------------------------|----------------------------------------------|
//! | [`Scalar::BigInteger`]    | bin, minimal little-endian two's complement  |
//! | [`Scalar::Uuid`]          | bin, 16 bytes in RFC 4122 order              |
//! | [`Scalar::Duration`]      | int, signed count of 100 ns ticks            |
//! | [`Scalar::Decimal`]       | str                                          |
//! | [`Scalar::Uri`]           | str                                          |
//! | [`Scalar::Char`]          | uint, the Unicode scalar value               |
//! | [`Scalar::Date`] + offset | fixarray(2) `[timestamp, offset minutes]`    |
use alloc::{string::String, vec::Vec};

use crate::{
    format::{self, LengthOverflow},
    options::{FloatWidth, WriterOptions},
    token::{Date, Integer, Timestamp},
};

/// A single value written by [`Writer::write_value`](crate::Writer::write_value).
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// `nil`.
    Null,
    /// `true` or `false`.
    Boolean(bool),
    /// Written in its smallest encoding.
    Integer(Integer),
    /// A single-precision float.
    F32(f32),
    /// A double-precision float.
    F64(f64),
    /// A UTF-8 string.
    String(String),
    /// A binary blob.
    Binary(Vec<u8>),
    /// A timestamp, with the offset array form when an offset is present.
    Date(Date),
    /// An integer too wide for the native encodings.
    BigInteger(i128),
    /// A UUID.
    Uuid(uuid::Uuid),
    /// A signed span of time.
    Duration(time::Duration),
    /// Decimal number text, such as `"12.50"`.
    Decimal(String),
    /// URI text.
    Uri(String),
    /// A single character.
    Char(char),
}

impl Scalar {
    pub(crate) fn encode(
        &self,
        out: &mut Vec<u8>,
        options: WriterOptions,
    ) -> Result<(), LengthOverflow> {
        match self {
            Self::Null => format::write_nil(out),
            Self::Boolean(b) => format::write_bool(out, *b),
            Self::Integer(i) => format::write_integer(out, *i),
            #[allow(clippy::cast_possible_truncation)]
            Self::F32(f) => match options.float_width {
                FloatWidth::Double => format::write_f64(out, f64::from(*f)),
                FloatWidth::Preserve | FloatWidth::Single => format::write_f32(out, *f),
            },
            #[allow(clippy::cast_possible_truncation)]
            Self::F64(f) => match options.float_width {
                FloatWidth::Single => format::write_f32(out, *f as f32),
                FloatWidth::Preserve | FloatWidth::Double => format::write_f64(out, *f),
            },
            Self::String(s) | Self::Decimal(s) | Self::Uri(s) => format::write_str(out, s)?,
            Self::Binary(b) => format::write_bin(out, b)?,
            Self::Date(date) => match date.offset_minutes {
                None => format::write_timestamp(out, date.timestamp),
                Some(minutes) => {
                    format::write_array_len(out, 2)?;
                    let clock = date.timestamp.shift_seconds(i64::from(minutes) * 60);
                    format::write_timestamp(out, clock);
                    format::write_sint(out, i64::from(minutes));
                }
            },
            Self::BigInteger(v) => format::write_bin(out, &big_integer_bytes(*v))?,
            Self::Uuid(u) => format::write_bin(out, u.as_bytes())?,
            Self::Duration(d) => format::write_sint(out, duration_ticks(*d)),
            Self::Char(c) => format::write_uint(out, u64::from(u32::from(*c))),
        }
        Ok(())
    }
}

/// The shortest little-endian two's-complement bytes that still carry the
/// sign of `v`.
pub(crate) fn big_integer_bytes(v: i128) -> Vec<u8> {
    let bytes = v.to_le_bytes();
    let mut len = bytes.len();
    while len > 1 {
        let last = bytes[len - 1];
        let sign_of_next = bytes[len - 2] & 0x80;
        let redundant = (last == 0x00 && sign_of_next == 0) || (last == 0xff && sign_of_next != 0);
        if !redundant {
            break;
        }
        len -= 1;
    }
    bytes[..len].to_vec()
}

/// Whole 100 ns ticks in `d`, saturating at the `i64` range.
pub(crate) fn duration_ticks(d: time::Duration) -> i64 {
    let ticks = d.whole_nanoseconds() / 100;
    i64::try_from(ticks).unwrap_or(if ticks < 0 { i64::MIN } else { i64::MAX })
}

impl From<bool> for Scalar {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

macro_rules! impl_from_int_for_scalar {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Scalar {
                fn from(v: $t) -> Self {
                    Self::Integer(Integer::from(v))
                }
            }
        )*
    };
}

impl_from_int_for_scalar!(u8, u16, u32, u64, i8, i16, i32, i64);

impl From<Integer> for Scalar {
    fn from(v: Integer) -> Self {
        Self::Integer(v)
    }
}

impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Self::F32(v)
    }
}

impl From<f64> for Scalar {
    fn from(v: f64) -> Self {
        Self::F64(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Self::String(v.into())
    }
}

impl From<String> for Scalar {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&[u8]> for Scalar {
    fn from(v: &[u8]) -> Self {
        Self::Binary(v.to_vec())
    }
}

impl From<Vec<u8>> for Scalar {
    fn from(v: Vec<u8>) -> Self {
        Self::Binary(v)
    }
}

impl From<Timestamp> for Scalar {
    fn from(v: Timestamp) -> Self {
        Self::Date(Date::utc(v))
    }
}

impl From<Date> for Scalar {
    fn from(v: Date) -> Self {
        Self::Date(v)
    }
}

impl From<time::OffsetDateTime> for Scalar {
    fn from(v: time::OffsetDateTime) -> Self {
        let ts = Timestamp::from(v);
        if v.offset().is_utc() {
            Self::Date(Date::utc(ts))
        } else {
            Self::Date(Date::with_offset(ts, v.offset().whole_minutes()))
        }
    }
}

impl From<i128> for Scalar {
    fn from(v: i128) -> Self {
        Self::BigInteger(v)
    }
}

impl From<uuid::Uuid> for Scalar {
    fn from(v: uuid::Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<time::Duration> for Scalar {
    fn from(v: time::Duration) -> Self {
        Self::Duration(v)
    }
}

impl From<char> for Scalar {
    fn from(v: char) -> Self {
        Self::Char(v)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
