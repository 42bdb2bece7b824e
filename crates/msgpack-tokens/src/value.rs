//! `MessagePack` value trees.
//!
//! [`Value`] is a fully materialized document. It is built from a
//! [`Reader`] with [`Value::from_reader`] and replayed into a [`Writer`]
//! with [`Value::write_to`].
use alloc::{string::String, vec::Vec};

use crate::{
    error::{ErrorSource, ReaderError, WriterError},
    reader::Reader,
    source::ByteSource,
    token::{Date, Integer, Token},
    writer::{Sink, Writer},
};

/// Map entries in document order. Keys are not deduplicated.
pub type Map = Vec<(String, Value)>;
/// Array elements in document order.
pub type Array = Vec<Value>;

/// Any `MessagePack` value the reader can produce.
///
/// # Examples
///
/// ```
/// use msgpack_tokens::{SliceReader, Value, Writer};
///
/// let value = Value::Map(vec![("n".to_string(), Value::from(7))]);
/// let mut writer = Writer::new(Vec::new());
/// value.write_to(&mut writer).unwrap();
/// let bytes = writer.into_inner();
///
/// let mut reader = SliceReader::new(&bytes);
/// assert_eq!(Value::from_reader(&mut reader).unwrap(), Some(value));
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Default)]
#[allow(missing_docs)]
pub enum Value {
    #[default]
    Nil,
    Boolean(bool),
    Integer(Integer),
    Float(f64),
    String(String),
    Binary(Vec<u8>),
    Date(Date),
    Array(Array),
    Map(Map),
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(Integer::from(v))
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::Integer(Integer::from(v))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(Integer::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.into())
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Self::Array(v)
    }
}

impl Value {
    /// Returns `true` if the value is `nil`.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Returns `true` if the value is an array.
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    /// Returns `true` if the value is a map.
    #[must_use]
    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    /// Returns the string payload, if this is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Looks up the first entry named `key` in a map.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Reads one complete value, starting at a value boundary.
    ///
    /// Returns `Ok(None)` when the reader has no more values.
    ///
    /// # Errors
    ///
    /// Any error from the reader.
    pub fn from_reader<S: ByteSource>(reader: &mut Reader<S>) -> Result<Option<Self>, ReaderError> {
        enum Partial {
            Array(Array),
            Map(Map, Option<String>),
        }

        let mut stack: Vec<Partial> = Vec::new();
        while let Some(token) = reader.advance()? {
            let value = match token {
                Token::StartArray => {
                    stack.push(Partial::Array(Vec::new()));
                    continue;
                }
                Token::StartObject => {
                    stack.push(Partial::Map(Vec::new(), None));
                    continue;
                }
                Token::PropertyName(name) => {
                    if let Some(Partial::Map(_, key)) = stack.last_mut() {
                        *key = Some(name);
                    }
                    continue;
                }
                Token::EndArray | Token::EndObject => match stack.pop() {
                    Some(Partial::Array(items)) => Self::Array(items),
                    Some(Partial::Map(entries, _)) => Self::Map(entries),
                    None => {
                        return Err(ReaderError::new(
                            ErrorSource::StackUnderflow,
                            reader.byte_offset(),
                        ));
                    }
                },
                Token::Null => Self::Nil,
                Token::Boolean(b) => Self::Boolean(b),
                Token::Integer(i) => Self::Integer(i),
                Token::Float(f) => Self::Float(f),
                Token::String(s) => Self::String(s),
                Token::Binary(b) => Self::Binary(b),
                Token::Date(d) => Self::Date(d),
            };
            match stack.last_mut() {
                None => return Ok(Some(value)),
                Some(Partial::Array(items)) => items.push(value),
                Some(Partial::Map(entries, key)) => {
                    entries.push((key.take().unwrap_or_default(), value));
                }
            }
        }
        Ok(None)
    }

    /// Writes this value through `writer`.
    ///
    /// At the top level this produces one complete document.
    ///
    /// # Errors
    ///
    /// Any error from the writer.
    pub fn write_to<W: Sink>(&self, writer: &mut Writer<W>) -> Result<(), WriterError<W::Error>> {
        match self {
            Self::Nil => writer.write_null(),
            Self::Boolean(b) => writer.write_value(*b),
            Self::Integer(i) => writer.write_value(*i),
            Self::Float(f) => writer.write_value(*f),
            Self::String(s) => writer.write_value(s.as_str()),
            Self::Binary(b) => writer.write_value(b.as_slice()),
            Self::Date(d) => writer.write_value(*d),
            Self::Array(items) => {
                writer.write_start_array()?;
                for item in items {
                    item.write_to(writer)?;
                }
                writer.write_end_array()
            }
            Self::Map(entries) => {
                writer.write_start_object()?;
                for (key, value) in entries {
                    writer.write_property_name(key.as_str())?;
                    value.write_to(writer)?;
                }
                writer.write_end_object()
            }
        }
    }
}
