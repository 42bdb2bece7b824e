//! A pull-based token reader and push-based tree writer for `MessagePack`.
//!
//! [`Reader`] presents a binary document as a flat sequence of [`Token`]s
//! without materializing the tree, over either an in-memory buffer
//! ([`SliceReader`]) or a seekable stream ([`StreamReader`]). Its
//! `read_as_*` methods decode the next value as a requested shape and fail
//! softly on a mismatch.
//!
//! [`Writer`] is the inverse: write calls build a tree in memory, and the
//! finished document is serialized in one pass when its outermost container
//! closes.
//!
//! ```rust
//! use msgpack_tokens::{SliceReader, Token, Writer};
//!
//! let mut writer = Writer::new(Vec::new());
//! writer.write_start_array().unwrap();
//! writer.write_value(true).unwrap();
//! writer.write_null().unwrap();
//! writer.write_end_array().unwrap();
//! let bytes = writer.into_inner();
//! assert_eq!(bytes, [0x92, 0xc3, 0xc0]);
//!
//! let tokens: Vec<Token> = SliceReader::new(&bytes).map(Result::unwrap).collect();
//! assert_eq!(
//!     tokens,
//!     [Token::StartArray, Token::Boolean(true), Token::Null, Token::EndArray]
//! );
//! ```

#![no_std]
extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

mod error;
mod format;
mod options;
mod reader;
mod scalar;
mod source;
mod token;
mod tree;
mod value;
mod writer;

#[cfg(test)]
mod tests;

pub use error::{ErrorSource, MalformedError, NestingError, ReaderError, WriterError};
pub use format::{TIMESTAMP_EXT, WireType};
pub use options::{FloatWidth, ReaderOptions, WriterOptions};
#[cfg(feature = "std")]
pub use reader::StreamReader;
pub use reader::{ReadState, Reader, SliceReader};
pub use scalar::Scalar;
#[cfg(feature = "std")]
pub use source::StreamSource;
pub use source::{ByteSource, SliceSource};
pub use token::{Date, Integer, Timestamp, Token, TokenKind};
pub use value::{Array, Map, Value};
pub use writer::{Sink, Writer};
