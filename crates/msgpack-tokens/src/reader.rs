//! The pull-based token reader.
//!
//! [`Reader`] walks a `MessagePack` document and yields exactly one [`Token`]
//! per [`advance`](Reader::advance) call. Container context lives on an
//! explicit stack; inside a map the reader alternates between a key phase,
//! which emits [`Token::PropertyName`], and a value phase.
//!
//! The state machine is shared by both transports. [`SliceReader`] reads an
//! in-memory buffer and [`StreamReader`] (feature `std`) reads a seekable
//! stream.
//!
//! # Demand reads
//!
//! The `read_as_*` methods decode the next value as a specific shape. They
//! never fail on a type mismatch: instead the rest of the enclosing container
//! is skipped, its end token is emitted, and `Ok(None)` is returned.
//!
//! ```rust
//! use msgpack_tokens::{ReadState, SliceReader};
//!
//! // [1, "two", 3]
//! let bytes = [0x93, 0x01, 0xa3, b't', b'w', b'o', 0x03];
//! let mut reader = SliceReader::new(&bytes);
//! reader.advance().unwrap();
//! assert_eq!(reader.read_as_i32().unwrap(), Some(1));
//! assert_eq!(reader.read_as_i32().unwrap(), None);
//! assert_eq!(reader.state(), ReadState::Complete);
//! ```
#![allow(clippy::enum_glob_use)]

use alloc::{string::String, vec::Vec};

use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing::{debug, trace, warn};

use crate::{
    error::{ErrorSource, MalformedError, ReaderError},
    format::{self, Header, TIMESTAMP_EXT, WireType},
    options::ReaderOptions,
    source::{ByteSource, SliceSource},
    token::{Date, Integer, Timestamp, Token, TokenKind},
};

/// Where the reader is in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    /// Before the first token of a document.
    Start,
    /// Just after [`Token::StartObject`].
    ObjectStart,
    /// Just after [`Token::StartArray`].
    ArrayStart,
    /// Just after [`Token::PropertyName`]; the map value comes next.
    Property,
    /// After a value or container end, inside an enclosing container.
    PostValue,
    /// The document is finished.
    Complete,
    /// A fatal error occurred. No further tokens are produced.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerKind {
    Map,
    Array,
}

/// One open container: its declared child count (pairs for maps) and how
/// many children have been started.
#[derive(Debug, Clone, Copy)]
struct Frame {
    kind: ContainerKind,
    len: usize,
    cursor: usize,
}

/// What a demand read finds at the cursor.
enum Position {
    /// Nothing to read: the document or the enclosing container ended.
    Ended,
    /// A map key.
    Key,
    /// A value, with its marker byte.
    Value(u8),
}

/// The result of a type-specific decode.
enum Demanded<T> {
    Value(T, TokenKind),
    /// The value has the wrong shape. `pending` counts the values of the
    /// mismatching item that are still unread.
    Mismatch { pending: usize },
}

/// A token reader generic over its [`ByteSource`].
#[derive(Debug)]
pub struct Reader<S> {
    source: S,
    state: ReadState,
    stack: Vec<Frame>,
    token: Option<TokenKind>,
    options: ReaderOptions,
}

/// A reader over an in-memory buffer.
pub type SliceReader<'a> = Reader<SliceSource<'a>>;

/// A reader over a `Read + Seek` stream.
#[cfg(feature = "std")]
pub type StreamReader<R> = Reader<crate::source::StreamSource<R>>;

impl<'a> Reader<SliceSource<'a>> {
    /// Reads a document from `bytes`.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::from_source(SliceSource::new(bytes), ReaderOptions::default())
    }

    /// Reads from `bytes` with the given options.
    #[must_use]
    pub fn with_options(bytes: &'a [u8], options: ReaderOptions) -> Self {
        Self::from_source(SliceSource::new(bytes), options)
    }
}

#[cfg(feature = "std")]
impl<R: std::io::Read + std::io::Seek> Reader<crate::source::StreamSource<R>> {
    /// Reads a document from `stream`, starting at its current position.
    pub fn new(stream: R) -> Self {
        Self::from_source(crate::source::StreamSource::new(stream), ReaderOptions::default())
    }

    /// Reads from `stream` with the given options.
    pub fn with_options(stream: R, options: ReaderOptions) -> Self {
        Self::from_source(crate::source::StreamSource::new(stream), options)
    }
}

impl<S: ByteSource> Reader<S> {
    /// Creates a reader over any byte source.
    pub fn from_source(source: S, options: ReaderOptions) -> Self {
        Self {
            source,
            state: ReadState::Start,
            stack: Vec::new(),
            token: None,
            options,
        }
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> ReadState {
        self.state
    }

    /// The kind of the most recently produced token.
    #[must_use]
    pub fn token_kind(&self) -> Option<TokenKind> {
        self.token
    }

    /// Number of open containers.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Bytes consumed so far.
    #[must_use]
    pub fn byte_offset(&self) -> usize {
        self.source.position()
    }

    /// The underlying byte source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Consumes the reader, returning its byte source.
    pub fn into_source(self) -> S {
        self.source
    }

    /// Decodes the next token.
    ///
    /// Returns `Ok(None)` once the document is complete, or after a fatal
    /// error has been reported.
    ///
    /// # Errors
    ///
    /// Returns a [`ReaderError`] if the input is malformed or the transport
    /// fails. The reader then enters [`ReadState::Error`].
    pub fn advance(&mut self) -> Result<Option<Token>, ReaderError> {
        match self.step() {
            Ok(token) => {
                if let Some(token) = &token {
                    self.token = Some(token.kind());
                }
                Ok(token)
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    fn step(&mut self) -> Result<Option<Token>, ReaderError> {
        use ReadState::*;
        loop {
            match self.state {
                Error => return Ok(None),
                Complete => {
                    if !self.restart()? {
                        return Ok(None);
                    }
                }
                Start => {
                    if self.source.peek_byte()?.is_none() {
                        self.state = Complete;
                        return Ok(None);
                    }
                    return self.read_value().map(Some);
                }
                Property => {
                    self.consume_child()?;
                    return self.read_value().map(Some);
                }
                ObjectStart | ArrayStart | PostValue => {
                    let frame = self.top()?;
                    if frame.cursor == frame.len {
                        return self.end_container().map(Some);
                    }
                    return match frame.kind {
                        ContainerKind::Array => {
                            self.consume_child()?;
                            self.read_value().map(Some)
                        }
                        ContainerKind::Map => {
                            let key = self.read_key()?;
                            self.state = Property;
                            Ok(Some(Token::PropertyName(key)))
                        }
                    };
                }
            }
        }
    }

    /// Starts the next concatenated document, if enabled and present.
    fn restart(&mut self) -> Result<bool, ReaderError> {
        if self.options.allow_multiple_values && self.source.peek_byte()?.is_some() {
            trace!(position = self.source.position(), "next document");
            self.state = ReadState::Start;
            self.stack.clear();
            return Ok(true);
        }
        Ok(false)
    }

    fn fail(&mut self, err: ReaderError) -> ReaderError {
        #[cfg(any(test, feature = "fuzzing"))]
        assert!(!self.options.panic_on_error, "decode error: {err}");
        warn!(position = err.position, error = %err, "reader entering error state");
        self.state = ReadState::Error;
        err
    }

    fn top(&self) -> Result<Frame, ReaderError> {
        self.stack
            .last()
            .copied()
            .ok_or_else(|| ReaderError::new(ErrorSource::StackUnderflow, self.source.position()))
    }

    /// Counts one more child of the enclosing container, if any.
    fn consume_child(&mut self) -> Result<(), ReaderError> {
        let position = self.source.position();
        if let Some(frame) = self.stack.last_mut() {
            if frame.cursor >= frame.len {
                return Err(ReaderError::new(MalformedError::PastContainerEnd, position));
            }
            frame.cursor += 1;
        }
        Ok(())
    }

    fn after_value(&mut self) {
        self.state = if self.stack.is_empty() {
            ReadState::Complete
        } else {
            ReadState::PostValue
        };
    }

    fn push(&mut self, kind: ContainerKind, len: usize, at: usize) -> Result<(), ReaderError> {
        if let Some(max) = self.options.max_depth {
            if self.stack.len() >= max {
                return Err(ReaderError::new(MalformedError::DepthLimitExceeded(max), at));
            }
        }
        self.stack.push(Frame {
            kind,
            len,
            cursor: 0,
        });
        trace!(depth = self.stack.len(), len, ?kind, "container start");
        self.state = match kind {
            ContainerKind::Map => ReadState::ObjectStart,
            ContainerKind::Array => ReadState::ArrayStart,
        };
        Ok(())
    }

    fn end_container(&mut self) -> Result<Token, ReaderError> {
        let frame = self
            .stack
            .pop()
            .ok_or_else(|| ReaderError::new(ErrorSource::StackUnderflow, self.source.position()))?;
        trace!(depth = self.stack.len(), len = frame.len, kind = ?frame.kind, "container end");
        self.after_value();
        Ok(match frame.kind {
            ContainerKind::Map => Token::EndObject,
            ContainerKind::Array => Token::EndArray,
        })
    }

    /// Decodes the value at the cursor and updates the state.
    fn read_value(&mut self) -> Result<Token, ReaderError> {
        let at = self.source.position();
        let token = match format::read_header(&mut self.source)? {
            Header::Nil => Token::Null,
            Header::Boolean(b) => Token::Boolean(b),
            Header::Integer(i) => Token::Integer(i),
            Header::F32(f) => Token::Float(f64::from(f)),
            Header::F64(f) => Token::Float(f),
            Header::Str(len) => Token::String(format::read_str(&mut self.source, len)?),
            Header::Bin(len) => Token::Binary(self.source.read_vec(len)?),
            Header::Ext {
                ty: TIMESTAMP_EXT,
                len,
            } => Token::Date(Date::utc(format::read_timestamp(&mut self.source, len)?)),
            Header::Ext { ty, .. } => {
                return Err(ReaderError::new(MalformedError::UnsupportedExtension(ty), at));
            }
            Header::Array(len) => {
                self.push(ContainerKind::Array, len, at)?;
                return Ok(Token::StartArray);
            }
            Header::Map(len) => {
                self.push(ContainerKind::Map, len, at)?;
                return Ok(Token::StartObject);
            }
        };
        self.after_value();
        Ok(token)
    }

    fn peek_marker(&mut self) -> Result<u8, ReaderError> {
        self.source
            .peek_byte()?
            .ok_or_else(|| self.source.truncated())
    }

    fn read_key(&mut self) -> Result<String, ReaderError> {
        let at = self.source.position();
        let marker = self.peek_marker()?;
        match format::read_header(&mut self.source)? {
            Header::Str(len) => format::read_str(&mut self.source, len),
            _ => Err(ReaderError::new(MalformedError::NonStringKey(marker), at)),
        }
    }

    // --------------------------------------------------------------------------------------------
    // Demand reads
    // --------------------------------------------------------------------------------------------

    /// Locates the next thing a demand read would consume, closing an
    /// exhausted container on the way.
    fn demand_position(&mut self) -> Result<Position, ReaderError> {
        use ReadState::*;
        loop {
            match self.state {
                Error => return Ok(Position::Ended),
                Complete => {
                    if !self.restart()? {
                        return Ok(Position::Ended);
                    }
                }
                Start => {
                    if let Some(marker) = self.source.peek_byte()? {
                        return Ok(Position::Value(marker));
                    }
                    self.state = Complete;
                    return Ok(Position::Ended);
                }
                Property => return Ok(Position::Value(self.peek_marker()?)),
                ObjectStart | ArrayStart | PostValue => {
                    let frame = self.top()?;
                    if frame.cursor == frame.len {
                        let end = self.end_container()?;
                        self.token = Some(end.kind());
                        return Ok(Position::Ended);
                    }
                    return Ok(match frame.kind {
                        ContainerKind::Map => Position::Key,
                        ContainerKind::Array => Position::Value(self.peek_marker()?),
                    });
                }
            }
        }
    }

    fn demand<T>(
        &mut self,
        what: &'static str,
        decode: impl FnOnce(&mut Self, u8) -> Result<Demanded<T>, ReaderError>,
    ) -> Result<Option<T>, ReaderError> {
        let result = self
            .demand_position()
            .and_then(|position| self.demand_value(what, position, decode));
        result.map_err(|err| self.fail(err))
    }

    fn demand_value<T>(
        &mut self,
        what: &'static str,
        position: Position,
        decode: impl FnOnce(&mut Self, u8) -> Result<Demanded<T>, ReaderError>,
    ) -> Result<Option<T>, ReaderError> {
        let marker = match position {
            Position::Ended => return Ok(None),
            Position::Key => {
                self.mismatch(what, 1)?;
                return Ok(None);
            }
            Position::Value(marker) => marker,
        };
        if marker == format::NIL {
            self.consume_child()?;
            self.source.skip(1)?;
            self.after_value();
            self.token = Some(TokenKind::Null);
            return Ok(None);
        }
        match decode(self, marker)? {
            Demanded::Value(value, kind) => {
                self.consume_child()?;
                self.after_value();
                self.token = Some(kind);
                Ok(Some(value))
            }
            Demanded::Mismatch { pending } => {
                self.mismatch(what, pending)?;
                Ok(None)
            }
        }
    }

    /// Abandons the enclosing container: skips the `pending` unread values
    /// of the current item plus every later child, then closes it.
    fn mismatch(&mut self, what: &'static str, pending: usize) -> Result<(), ReaderError> {
        let remainder = match (self.state, self.stack.last()) {
            (_, None) => 0,
            (ReadState::Property, Some(f)) => 2 * f.len.saturating_sub(f.cursor + 1),
            (_, Some(f)) if f.kind == ContainerKind::Map => {
                (2 * f.len.saturating_sub(f.cursor)).saturating_sub(1)
            }
            (_, Some(f)) => f.len.saturating_sub(f.cursor + 1),
        };
        let skipped = pending + remainder;
        debug!(what, skipped, depth = self.stack.len(), "demand read mismatch");
        format::skip_values(&mut self.source, skipped)?;
        if self.stack.is_empty() {
            self.state = ReadState::Complete;
        } else {
            let end = self.end_container()?;
            self.token = Some(end.kind());
        }
        Ok(())
    }

    fn demand_integer(&mut self, marker: u8) -> Result<Demanded<Integer>, ReaderError> {
        if WireType::of(marker) != WireType::Integer {
            return Ok(Demanded::Mismatch { pending: 1 });
        }
        match format::read_header(&mut self.source)? {
            Header::Integer(i) => Ok(Demanded::Value(i, TokenKind::Integer)),
            _ => Ok(Demanded::Mismatch { pending: 0 }),
        }
    }

    /// Reads the next value as an integer of any width.
    ///
    /// # Errors
    ///
    /// Only for malformed input; a non-integer value yields `Ok(None)`.
    pub fn read_as_integer(&mut self) -> Result<Option<Integer>, ReaderError> {
        self.demand("integer", Self::demand_integer)
    }

    /// Reads the next value as an `i64`.
    ///
    /// Integers outside the `i64` range count as a mismatch.
    ///
    /// # Errors
    ///
    /// Only for malformed input.
    pub fn read_as_i64(&mut self) -> Result<Option<i64>, ReaderError> {
        self.demand("i64", |r, marker| {
            Ok(match r.demand_integer(marker)? {
                Demanded::Value(i, kind) => match i.as_i64() {
                    Some(v) => Demanded::Value(v, kind),
                    None => Demanded::Mismatch { pending: 0 },
                },
                Demanded::Mismatch { pending } => Demanded::Mismatch { pending },
            })
        })
    }

    /// Reads the next value as an `i32`.
    ///
    /// Integers outside the `i32` range count as a mismatch.
    ///
    /// # Errors
    ///
    /// Only for malformed input.
    pub fn read_as_i32(&mut self) -> Result<Option<i32>, ReaderError> {
        self.demand("i32", |r, marker| {
            Ok(match r.demand_integer(marker)? {
                Demanded::Value(i, kind) => match i.as_i32() {
                    Some(v) => Demanded::Value(v, kind),
                    None => Demanded::Mismatch { pending: 0 },
                },
                Demanded::Mismatch { pending } => Demanded::Mismatch { pending },
            })
        })
    }

    /// Reads the next value as an `f64`, accepting any integer or float
    /// encoding.
    ///
    /// # Errors
    ///
    /// Only for malformed input.
    pub fn read_as_f64(&mut self) -> Result<Option<f64>, ReaderError> {
        self.demand("f64", |r, marker| {
            if !matches!(WireType::of(marker), WireType::Integer | WireType::Float) {
                return Ok(Demanded::Mismatch { pending: 1 });
            }
            Ok(match format::read_header(&mut r.source)? {
                Header::Integer(i) => Demanded::Value(i.as_f64(), TokenKind::Integer),
                Header::F32(f) => Demanded::Value(f64::from(f), TokenKind::Float),
                Header::F64(f) => Demanded::Value(f, TokenKind::Float),
                _ => Demanded::Mismatch { pending: 0 },
            })
        })
    }

    /// Reads the next value as a boolean.
    ///
    /// # Errors
    ///
    /// Only for malformed input.
    pub fn read_as_boolean(&mut self) -> Result<Option<bool>, ReaderError> {
        self.demand("boolean", |r, marker| {
            if WireType::of(marker) != WireType::Boolean {
                return Ok(Demanded::Mismatch { pending: 1 });
            }
            r.source.skip(1)?;
            Ok(Demanded::Value(marker == format::TRUE, TokenKind::Boolean))
        })
    }

    /// Reads the next value as a binary blob.
    ///
    /// # Errors
    ///
    /// Only for malformed input.
    pub fn read_as_bytes(&mut self) -> Result<Option<Vec<u8>>, ReaderError> {
        self.demand("bytes", |r, marker| {
            if WireType::of(marker) != WireType::Binary {
                return Ok(Demanded::Mismatch { pending: 1 });
            }
            Ok(match format::read_header(&mut r.source)? {
                Header::Bin(len) => Demanded::Value(r.source.read_vec(len)?, TokenKind::Binary),
                _ => Demanded::Mismatch { pending: 0 },
            })
        })
    }

    /// Reads the next value as a string.
    ///
    /// In a map's key phase this reads the key itself, produces
    /// [`TokenKind::PropertyName`] and moves to the value phase, exactly as
    /// [`advance`](Self::advance) would.
    ///
    /// # Errors
    ///
    /// Only for malformed input, including a non-string map key.
    pub fn read_as_string(&mut self) -> Result<Option<String>, ReaderError> {
        let result = self.demand_string();
        result.map_err(|err| self.fail(err))
    }

    fn demand_string(&mut self) -> Result<Option<String>, ReaderError> {
        let position = self.demand_position()?;
        if let Position::Key = position {
            let key = self.read_key()?;
            self.state = ReadState::Property;
            self.token = Some(TokenKind::PropertyName);
            return Ok(Some(key));
        }
        self.demand_value("string", position, |r, marker| {
            if WireType::of(marker) != WireType::String {
                return Ok(Demanded::Mismatch { pending: 1 });
            }
            Ok(match format::read_header(&mut r.source)? {
                Header::Str(len) => {
                    Demanded::Value(format::read_str(&mut r.source, len)?, TokenKind::String)
                }
                _ => Demanded::Mismatch { pending: 0 },
            })
        })
    }

    /// Decodes a timestamp extension or an RFC 3339 string, and with
    /// `with_offset` also the `[timestamp, offset minutes]` pair.
    fn demand_date(&mut self, marker: u8, with_offset: bool) -> Result<Demanded<Date>, ReaderError> {
        match WireType::of(marker) {
            WireType::Extension => {
                let (ty, _) = format::peek_ext_header(&mut self.source)?;
                if ty != TIMESTAMP_EXT {
                    return Ok(Demanded::Mismatch { pending: 1 });
                }
                let Header::Ext { len, .. } = format::read_header(&mut self.source)? else {
                    return Ok(Demanded::Mismatch { pending: 0 });
                };
                let ts = format::read_timestamp(&mut self.source, len)?;
                let date = if with_offset {
                    Date::with_offset(ts, 0)
                } else {
                    Date::utc(ts)
                };
                Ok(Demanded::Value(date, TokenKind::Date))
            }
            WireType::String => {
                let Header::Str(len) = format::read_header(&mut self.source)? else {
                    return Ok(Demanded::Mismatch { pending: 0 });
                };
                let text = format::read_str(&mut self.source, len)?;
                Ok(match OffsetDateTime::parse(&text, &Rfc3339) {
                    Ok(dt) => {
                        let ts = Timestamp::from(dt);
                        let date = if with_offset {
                            Date::with_offset(ts, dt.offset().whole_minutes())
                        } else {
                            Date::utc(ts)
                        };
                        Demanded::Value(date, TokenKind::Date)
                    }
                    Err(_) => Demanded::Mismatch { pending: 0 },
                })
            }
            WireType::Array if with_offset && marker == (format::FIXARRAY | 2) => {
                self.source.skip(1)?;
                let next = self.peek_marker()?;
                if WireType::of(next) != WireType::Extension {
                    return Ok(Demanded::Mismatch { pending: 2 });
                }
                let (ty, _) = format::peek_ext_header(&mut self.source)?;
                if ty != TIMESTAMP_EXT {
                    return Ok(Demanded::Mismatch { pending: 2 });
                }
                let Header::Ext { len, .. } = format::read_header(&mut self.source)? else {
                    return Ok(Demanded::Mismatch { pending: 1 });
                };
                let clock = format::read_timestamp(&mut self.source, len)?;
                if WireType::of(self.peek_marker()?) != WireType::Integer {
                    return Ok(Demanded::Mismatch { pending: 1 });
                }
                let offset = match format::read_header(&mut self.source)? {
                    Header::Integer(i) => i.as_i64().and_then(|v| i16::try_from(v).ok()),
                    _ => None,
                };
                Ok(match offset {
                    Some(minutes) => {
                        let ts = clock.shift_seconds(-i64::from(minutes) * 60);
                        Demanded::Value(Date::with_offset(ts, minutes), TokenKind::Date)
                    }
                    None => Demanded::Mismatch { pending: 0 },
                })
            }
            _ => Ok(Demanded::Mismatch { pending: 1 }),
        }
    }

    /// Reads the next value as an instant: a timestamp extension or an
    /// RFC 3339 string.
    ///
    /// # Errors
    ///
    /// Only for malformed input.
    pub fn read_as_date(&mut self) -> Result<Option<Timestamp>, ReaderError> {
        self.demand("date", |r, marker| {
            Ok(match r.demand_date(marker, false)? {
                Demanded::Value(date, kind) => Demanded::Value(date.timestamp, kind),
                Demanded::Mismatch { pending } => Demanded::Mismatch { pending },
            })
        })
    }

    /// Reads the next value as a date with a UTC offset.
    ///
    /// Accepts everything [`read_as_date`](Self::read_as_date) does (a bare
    /// timestamp gets offset zero) plus the two-element array
    /// `[clock time, offset minutes]` written for offset dates. The returned
    /// timestamp is the UTC instant.
    ///
    /// # Errors
    ///
    /// Only for malformed input.
    pub fn read_as_date_with_offset(&mut self) -> Result<Option<Date>, ReaderError> {
        self.demand("date with offset", |r, marker| r.demand_date(marker, true))
    }
}

impl<S: ByteSource> Iterator for Reader<S> {
    type Item = Result<Token, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance().transpose()
    }
}
