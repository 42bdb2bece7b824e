//! The push-based tree writer.
//!
//! Write calls build a tree in memory. When the outermost container closes,
//! the whole tree is serialized in one pass, so every map and array header
//! carries its exact child count, and the bytes are handed to the [`Sink`].
//! A scalar written with no open container is a complete document by itself
//! and is written immediately.
//!
//! ```rust
//! use msgpack_tokens::Writer;
//!
//! let mut writer = Writer::new(Vec::new());
//! writer.write_start_object().unwrap();
//! writer.write_property_name("a").unwrap();
//! writer.write_value(1).unwrap();
//! writer.write_end_object().unwrap();
//! assert_eq!(writer.into_inner(), [0x81, 0xa1, b'a', 0x01]);
//! ```
use alloc::{string::String, vec::Vec};

use tracing::{debug, warn};

use crate::{
    error::{NestingError, WriterError},
    options::WriterOptions,
    scalar::Scalar,
    token::Token,
    tree::{Node, TreeBuilder},
};

/// Destination for serialized documents.
///
/// With the `std` feature every [`std::io::Write`] is a sink. Without it,
/// `Vec<u8>` is.
pub trait Sink {
    /// The error returned by a failed write.
    type Error;

    /// Writes all of `bytes`.
    ///
    /// # Errors
    ///
    /// Whatever the destination reports.
    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Flushes buffered output.
    ///
    /// # Errors
    ///
    /// Whatever the destination reports.
    fn flush(&mut self) -> Result<(), Self::Error>;
}

#[cfg(feature = "std")]
impl<W: std::io::Write> Sink for W {
    type Error = std::io::Error;

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        std::io::Write::write_all(self, bytes)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        std::io::Write::flush(self)
    }
}

#[cfg(not(feature = "std"))]
impl Sink for Vec<u8> {
    type Error = core::convert::Infallible;

    fn write_all(&mut self, bytes: &[u8]) -> Result<(), Self::Error> {
        self.extend_from_slice(bytes);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Builds documents from push-style calls and writes them to a [`Sink`].
///
/// Every call checks that the calls so far describe a well-formed tree. The
/// first violation returns [`WriterError::InvalidNesting`] and poisons the
/// writer: all later calls fail with [`NestingError::Poisoned`].
#[derive(Debug)]
pub struct Writer<W> {
    sink: W,
    tree: TreeBuilder,
    buffer: Vec<u8>,
    options: WriterOptions,
    poisoned: bool,
}

impl<W: Sink> Writer<W> {
    /// Creates a writer with default options.
    pub fn new(sink: W) -> Self {
        Self::with_options(sink, WriterOptions::default())
    }

    /// Creates a writer with the given options.
    pub fn with_options(sink: W, options: WriterOptions) -> Self {
        Self {
            sink,
            tree: TreeBuilder::default(),
            buffer: Vec::new(),
            options,
            poisoned: false,
        }
    }

    /// Number of open containers.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.tree.depth()
    }

    /// Returns `true` after a failed call.
    #[must_use]
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// A reference to the sink.
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Consumes the writer, returning the sink. A document still under
    /// construction is discarded.
    pub fn into_inner(self) -> W {
        self.sink
    }

    fn guard<T>(
        &mut self,
        op: impl FnOnce(&mut TreeBuilder) -> Result<T, NestingError>,
    ) -> Result<T, WriterError<W::Error>> {
        if self.poisoned {
            return Err(NestingError::Poisoned.into());
        }
        op(&mut self.tree).map_err(|err| {
            warn!(error = %err, depth = self.tree.depth(), "writer entering error state");
            self.poisoned = true;
            err.into()
        })
    }

    fn emit(&mut self, root: Option<&Node>) -> Result<(), WriterError<W::Error>> {
        let Some(root) = root else {
            return Ok(());
        };
        self.buffer.clear();
        if let Err(overflow) = root.encode(&mut self.buffer, self.options) {
            self.poisoned = true;
            return Err(WriterError::LengthOverflow(overflow.0));
        }
        debug!(bytes = self.buffer.len(), "document serialized");
        self.sink.write_all(&self.buffer).map_err(|err| {
            self.poisoned = true;
            WriterError::Sink(err)
        })
    }

    /// Opens a map.
    ///
    /// # Errors
    ///
    /// Inside a map without a pending property name.
    pub fn write_start_object(&mut self) -> Result<(), WriterError<W::Error>> {
        self.guard(TreeBuilder::start_object)
    }

    /// Sets the key for the next value in the current map.
    ///
    /// # Errors
    ///
    /// Outside a map, or when a property name is already pending.
    pub fn write_property_name(
        &mut self,
        name: impl Into<String>,
    ) -> Result<(), WriterError<W::Error>> {
        let name = name.into();
        self.guard(|tree| tree.property_name(name))
    }

    /// Closes the current map, writing the document if it was the root.
    ///
    /// # Errors
    ///
    /// When the current container is not a map or a property name is
    /// dangling, or when the sink fails.
    pub fn write_end_object(&mut self) -> Result<(), WriterError<W::Error>> {
        let root = self.guard(TreeBuilder::end_object)?;
        self.emit(root.as_ref())
    }

    /// Opens an array.
    ///
    /// # Errors
    ///
    /// Inside a map without a pending property name.
    pub fn write_start_array(&mut self) -> Result<(), WriterError<W::Error>> {
        self.guard(TreeBuilder::start_array)
    }

    /// Closes the current array, writing the document if it was the root.
    ///
    /// # Errors
    ///
    /// When the current container is not an array, or when the sink fails.
    pub fn write_end_array(&mut self) -> Result<(), WriterError<W::Error>> {
        let root = self.guard(TreeBuilder::end_array)?;
        self.emit(root.as_ref())
    }

    /// Writes `nil`.
    ///
    /// # Errors
    ///
    /// See [`write_value`](Self::write_value).
    pub fn write_null(&mut self) -> Result<(), WriterError<W::Error>> {
        self.write_value(Scalar::Null)
    }

    /// Writes a scalar.
    ///
    /// # Errors
    ///
    /// Inside a map without a pending property name, or when a top-level
    /// scalar cannot be written to the sink.
    pub fn write_value(&mut self, value: impl Into<Scalar>) -> Result<(), WriterError<W::Error>> {
        let value = value.into();
        let root = self.guard(|tree| tree.value(value))?;
        self.emit(root.as_ref())
    }

    /// Replays one token produced by a [`Reader`](crate::Reader).
    ///
    /// # Errors
    ///
    /// As the corresponding `write_*` call.
    pub fn write_token(&mut self, token: Token) -> Result<(), WriterError<W::Error>> {
        match token {
            Token::Null => self.write_null(),
            Token::Boolean(b) => self.write_value(b),
            Token::Integer(i) => self.write_value(i),
            Token::Float(f) => self.write_value(f),
            Token::String(s) => self.write_value(s),
            Token::Binary(b) => self.write_value(b),
            Token::Date(d) => self.write_value(d),
            Token::StartObject => self.write_start_object(),
            Token::PropertyName(name) => self.write_property_name(name),
            Token::EndObject => self.write_end_object(),
            Token::StartArray => self.write_start_array(),
            Token::EndArray => self.write_end_array(),
        }
    }

    /// Flushes the sink.
    ///
    /// # Errors
    ///
    /// Whatever the sink reports. A failed flush poisons the writer.
    pub fn flush(&mut self) -> Result<(), WriterError<W::Error>> {
        self.sink.flush().map_err(|err| {
            self.poisoned = true;
            WriterError::Sink(err)
        })
    }
}
