//! Tokens produced by the reader and consumed by the writer.
//!
//! A `MessagePack` document is presented as a flat sequence of [`Token`]s:
//! container starts and ends, property names inside maps, and scalars.
//!
//! # Examples
//!
//! ```
//! use msgpack_tokens::{Integer, SliceReader, Token};
//!
//! // {"a": 1}
//! let bytes = [0x81, 0xa1, b'a', 0x01];
//! let tokens: Vec<_> = SliceReader::new(&bytes).collect::<Result<_, _>>().unwrap();
//! assert_eq!(
//!     tokens,
//!     vec![
//!         Token::StartObject,
//!         Token::PropertyName("a".to_string()),
//!         Token::Integer(Integer::from(1u8)),
//!         Token::EndObject,
//!     ]
//! );
//! ```
use alloc::{string::String, vec::Vec};
use core::fmt;

/// An integer as it appears on the wire.
///
/// `MessagePack` distinguishes signed and unsigned encodings, but the same
/// number may be written either way. `Integer` normalizes on construction:
/// non-negative values are always held as [`Integer::PosInt`], so equality
/// compares numeric values rather than encodings.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Integer {
    /// A non-negative value.
    PosInt(u64),
    /// A strictly negative value.
    NegInt(i64),
}

impl Integer {
    /// Returns the value as `i64` if it fits.
    #[must_use]
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Self::PosInt(v) => i64::try_from(v).ok(),
            Self::NegInt(v) => Some(v),
        }
    }

    /// Returns the value as `u64` if it is non-negative.
    #[must_use]
    pub fn as_u64(self) -> Option<u64> {
        match self {
            Self::PosInt(v) => Some(v),
            Self::NegInt(_) => None,
        }
    }

    /// Returns the value as `i32` if it fits.
    #[must_use]
    pub fn as_i32(self) -> Option<i32> {
        self.as_i64().and_then(|v| i32::try_from(v).ok())
    }

    /// Returns the value widened to `i128`.
    #[must_use]
    pub fn as_i128(self) -> i128 {
        match self {
            Self::PosInt(v) => i128::from(v),
            Self::NegInt(v) => i128::from(v),
        }
    }

    /// Returns the value as the nearest `f64`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(self) -> f64 {
        match self {
            Self::PosInt(v) => v as f64,
            Self::NegInt(v) => v as f64,
        }
    }
}

macro_rules! impl_from_unsigned_for_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Integer {
                fn from(v: $t) -> Self {
                    Integer::PosInt(u64::from(v))
                }
            }
        )*
    };
}

macro_rules! impl_from_signed_for_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Integer {
                fn from(v: $t) -> Self {
                    let v = i64::from(v);
                    match u64::try_from(v) {
                        Ok(u) => Integer::PosInt(u),
                        Err(_) => Integer::NegInt(v),
                    }
                }
            }
        )*
    };
}

impl_from_unsigned_for_integer!(u8, u16, u32, u64);
impl_from_signed_for_integer!(i8, i16, i32, i64);

impl fmt::Display for Integer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PosInt(v) => v.fmt(f),
            Self::NegInt(v) => v.fmt(f),
        }
    }
}

/// A point in time carried by the timestamp extension (type `-1`).
///
/// `seconds` counts from the Unix epoch and may be negative; `nanos` is
/// always below one billion.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    /// Seconds since 1970-01-01T00:00:00Z.
    pub seconds: i64,
    /// Nanoseconds within the second, `0..1_000_000_000`.
    pub nanos: u32,
}

impl Timestamp {
    /// The Unix epoch.
    pub const UNIX_EPOCH: Timestamp = Timestamp {
        seconds: 0,
        nanos: 0,
    };

    /// Creates a timestamp, returning `None` when `nanos` is out of range.
    #[must_use]
    pub fn new(seconds: i64, nanos: u32) -> Option<Self> {
        (nanos < 1_000_000_000).then_some(Self { seconds, nanos })
    }

    /// Converts to a [`time::OffsetDateTime`] in UTC.
    #[must_use]
    pub fn to_offset_date_time(self) -> Option<time::OffsetDateTime> {
        let nanos = i128::from(self.seconds) * 1_000_000_000 + i128::from(self.nanos);
        time::OffsetDateTime::from_unix_timestamp_nanos(nanos).ok()
    }

    /// Moves the timestamp by `seconds`, saturating at the ends of the range.
    #[must_use]
    pub(crate) fn shift_seconds(self, seconds: i64) -> Self {
        Self {
            seconds: self.seconds.saturating_add(seconds),
            nanos: self.nanos,
        }
    }
}

impl From<time::OffsetDateTime> for Timestamp {
    fn from(dt: time::OffsetDateTime) -> Self {
        Self {
            seconds: dt.unix_timestamp(),
            nanos: dt.nanosecond(),
        }
    }
}

/// A date token: an instant plus, when known, the UTC offset it was
/// recorded with.
///
/// `timestamp` is always the UTC instant. On the wire an offset date is
/// the pair `[local clock time, offset minutes]`, where the clock time is
/// the instant shifted forward by the offset.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Date {
    /// The instant, in UTC.
    pub timestamp: Timestamp,
    /// Offset from UTC in minutes, if the encoding carried one.
    pub offset_minutes: Option<i16>,
}

impl Date {
    /// A date with no offset information.
    #[must_use]
    pub fn utc(timestamp: Timestamp) -> Self {
        Self {
            timestamp,
            offset_minutes: None,
        }
    }

    /// A date recorded with the given UTC offset.
    #[must_use]
    pub fn with_offset(timestamp: Timestamp, offset_minutes: i16) -> Self {
        Self {
            timestamp,
            offset_minutes: Some(offset_minutes),
        }
    }
}

/// One structural or scalar unit of a document.
///
/// `Token` values are produced one per [`Reader::advance`] call, and can be
/// replayed into a [`Writer`] with [`Writer::write_token`].
///
/// [`Reader::advance`]: crate::Reader::advance
/// [`Writer`]: crate::Writer
/// [`Writer::write_token`]: crate::Writer::write_token
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `nil`.
    Null,
    /// `true` or `false`.
    Boolean(bool),
    /// Any integer encoding.
    Integer(Integer),
    /// A 32- or 64-bit float, widened to `f64`.
    Float(f64),
    /// A UTF-8 string value.
    String(String),
    /// A binary blob.
    Binary(Vec<u8>),
    /// A timestamp extension, or a date decoded by a demand read.
    Date(Date),
    /// Start of a map.
    StartObject,
    /// A map key. The value follows as the next token.
    PropertyName(String),
    /// End of a map.
    EndObject,
    /// Start of an array.
    StartArray,
    /// End of an array.
    EndArray,
}

impl Token {
    /// Returns the payload-free kind of this token.
    #[must_use]
    pub fn kind(&self) -> TokenKind {
        match self {
            Self::Null => TokenKind::Null,
            Self::Boolean(_) => TokenKind::Boolean,
            Self::Integer(_) => TokenKind::Integer,
            Self::Float(_) => TokenKind::Float,
            Self::String(_) => TokenKind::String,
            Self::Binary(_) => TokenKind::Binary,
            Self::Date(_) => TokenKind::Date,
            Self::StartObject => TokenKind::StartObject,
            Self::PropertyName(_) => TokenKind::PropertyName,
            Self::EndObject => TokenKind::EndObject,
            Self::StartArray => TokenKind::StartArray,
            Self::EndArray => TokenKind::EndArray,
        }
    }

    /// Returns `true` for tokens that carry a complete value.
    #[must_use]
    pub fn is_scalar(&self) -> bool {
        self.kind().is_scalar()
    }
}

/// The kind of a [`Token`] without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum TokenKind {
    Null,
    Boolean,
    Integer,
    Float,
    String,
    Binary,
    Date,
    StartObject,
    PropertyName,
    EndObject,
    StartArray,
    EndArray,
}

impl TokenKind {
    /// Returns `true` for scalar kinds.
    #[must_use]
    pub fn is_scalar(self) -> bool {
        !matches!(
            self,
            Self::StartObject
                | Self::PropertyName
                | Self::EndObject
                | Self::StartArray
                | Self::EndArray
        )
    }
}

// Compact one-line rendering used by snapshots and diagnostics.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Boolean(b) => write!(f, "Boolean({b})"),
            Self::Integer(i) => write!(f, "Integer({i})"),
            Self::Float(x) => write!(f, "Float({x:?})"),
            Self::String(s) => write!(f, "String({s:?})"),
            Self::Binary(b) => {
                f.write_str("Binary(")?;
                for byte in b {
                    write!(f, "{byte:02x}")?;
                }
                f.write_str(")")
            }
            Self::Date(d) => match d.offset_minutes {
                Some(off) => write!(
                    f,
                    "Date({}.{:09}{off:+})",
                    d.timestamp.seconds, d.timestamp.nanos
                ),
                None => write!(f, "Date({}.{:09})", d.timestamp.seconds, d.timestamp.nanos),
            },
            Self::StartObject => f.write_str("StartObject"),
            Self::PropertyName(s) => write!(f, "PropertyName({s:?})"),
            Self::EndObject => f.write_str("EndObject"),
            Self::StartArray => f.write_str("StartArray"),
            Self::EndArray => f.write_str("EndArray"),
        }
    }
}
