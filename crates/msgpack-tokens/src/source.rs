//! Byte acquisition for the reader.
//!
//! The reader's state machine is transport-agnostic. Everything it needs
//! from the input goes through [`ByteSource`]: a one-byte lookahead, exact
//! reads, skips, and a short rewind used to re-read an extension header.
//!
//! Two transports are provided:
//!
//! - [`SliceSource`] walks an immutable byte slice of known length and peeks
//!   by indexing.
//! - [`StreamSource`] (feature `std`) wraps a `Read + Seek` stream. It has no
//!   notion of total length: it peeks by reading one byte and seeking back,
//!   and detects exhaustion when a read returns no bytes.
use alloc::vec::Vec;

use crate::error::{MalformedError, ReaderError};

/// A forward-only byte source with bounded rewind.
pub trait ByteSource {
    /// Returns the next byte without consuming it, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Fails only if the underlying transport fails.
    fn peek_byte(&mut self) -> Result<Option<u8>, ReaderError>;

    /// Fills `buf` completely.
    ///
    /// # Errors
    ///
    /// [`MalformedError::Truncated`] if fewer than `buf.len()` bytes remain.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), ReaderError>;

    /// Reads exactly `len` bytes into a new vector.
    ///
    /// # Errors
    ///
    /// [`MalformedError::Truncated`] if fewer than `len` bytes remain.
    fn read_vec(&mut self, len: usize) -> Result<Vec<u8>, ReaderError>;

    /// Discards exactly `len` bytes.
    ///
    /// # Errors
    ///
    /// [`MalformedError::Truncated`] if fewer than `len` bytes remain.
    fn skip(&mut self, len: usize) -> Result<(), ReaderError>;

    /// Steps back over the last `len` consumed bytes.
    ///
    /// # Errors
    ///
    /// Fails if the transport cannot reposition.
    fn rewind(&mut self, len: usize) -> Result<(), ReaderError>;

    /// Number of bytes consumed so far.
    fn position(&self) -> usize;

    /// Consumes one byte.
    ///
    /// # Errors
    ///
    /// [`MalformedError::Truncated`] at end of input.
    fn read_byte(&mut self) -> Result<u8, ReaderError> {
        let mut b = [0u8; 1];
        self.read_exact(&mut b)?;
        Ok(b[0])
    }

    /// Shorthand for a truncation error at the current position.
    #[doc(hidden)]
    fn truncated(&self) -> ReaderError {
        ReaderError::new(MalformedError::Truncated, self.position())
    }
}

/// A [`ByteSource`] over an in-memory buffer.
#[derive(Debug, Clone)]
pub struct SliceSource<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> SliceSource<'a> {
    /// Starts reading at the beginning of `bytes`.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Total length of the underlying buffer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if the underlying buffer is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The unread tail of the buffer.
    #[must_use]
    pub fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.offset..]
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], ReaderError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|&end| end <= self.bytes.len())
            .ok_or_else(|| self.truncated())?;
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }
}

impl ByteSource for SliceSource<'_> {
    #[inline]
    fn peek_byte(&mut self) -> Result<Option<u8>, ReaderError> {
        Ok(self.bytes.get(self.offset).copied())
    }

    #[inline]
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), ReaderError> {
        buf.copy_from_slice(self.take(buf.len())?);
        Ok(())
    }

    fn read_vec(&mut self, len: usize) -> Result<Vec<u8>, ReaderError> {
        // The length check in `take` runs before any allocation, so a bogus
        // length prefix cannot reserve more than the buffer holds.
        Ok(self.take(len)?.to_vec())
    }

    fn skip(&mut self, len: usize) -> Result<(), ReaderError> {
        self.take(len).map(|_| ())
    }

    fn rewind(&mut self, len: usize) -> Result<(), ReaderError> {
        self.offset = self.offset.saturating_sub(len);
        Ok(())
    }

    #[inline]
    fn position(&self) -> usize {
        self.offset
    }
}

#[cfg(feature = "std")]
pub use stream::StreamSource;

#[cfg(feature = "std")]
mod stream {
    use alloc::vec::Vec;
    use std::io::{self, Read, Seek, SeekFrom};

    use super::ByteSource;
    use crate::error::{ErrorSource, ReaderError};

    /// A [`ByteSource`] over a seekable stream.
    ///
    /// Only the one-byte peek and the extension-header re-read ever seek,
    /// and only backwards over bytes this source has just read.
    #[derive(Debug)]
    pub struct StreamSource<R> {
        inner: R,
        consumed: usize,
    }

    impl<R: Read + Seek> StreamSource<R> {
        /// Wraps `inner`, reading from its current position.
        pub fn new(inner: R) -> Self {
            Self { inner, consumed: 0 }
        }

        /// Returns the wrapped stream.
        pub fn into_inner(self) -> R {
            self.inner
        }

        fn io_error(&self, err: io::Error) -> ReaderError {
            ReaderError::new(ErrorSource::from(err), self.consumed)
        }

        fn seek_back(&mut self, len: usize) -> Result<(), ReaderError> {
            let delta = i64::try_from(len).unwrap_or(i64::MAX);
            self.inner
                .seek(SeekFrom::Current(-delta))
                .map_err(|e| self.io_error(e))?;
            Ok(())
        }
    }

    impl<R: Read + Seek> ByteSource for StreamSource<R> {
        fn peek_byte(&mut self) -> Result<Option<u8>, ReaderError> {
            let mut b = [0u8; 1];
            loop {
                match self.inner.read(&mut b) {
                    Ok(0) => return Ok(None),
                    Ok(_) => break,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                    Err(e) => return Err(self.io_error(e)),
                }
            }
            self.seek_back(1)?;
            Ok(Some(b[0]))
        }

        fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), ReaderError> {
            self.inner.read_exact(buf).map_err(|e| self.io_error(e))?;
            self.consumed += buf.len();
            Ok(())
        }

        fn read_vec(&mut self, len: usize) -> Result<Vec<u8>, ReaderError> {
            // Grow with the data actually present instead of trusting the
            // length prefix for the allocation size.
            let mut out = Vec::new();
            let limit = u64::try_from(len).unwrap_or(u64::MAX);
            let result = (&mut self.inner).take(limit).read_to_end(&mut out);
            let read = result.map_err(|e| self.io_error(e))?;
            self.consumed += read;
            if read < len {
                return Err(self.truncated());
            }
            Ok(out)
        }

        fn skip(&mut self, len: usize) -> Result<(), ReaderError> {
            let limit = u64::try_from(len).unwrap_or(u64::MAX);
            let result = io::copy(&mut (&mut self.inner).take(limit), &mut io::sink());
            let skipped = result.map_err(|e| self.io_error(e))?;
            let skipped = usize::try_from(skipped).unwrap_or(usize::MAX);
            self.consumed += skipped;
            if skipped < len {
                return Err(self.truncated());
            }
            Ok(())
        }

        fn rewind(&mut self, len: usize) -> Result<(), ReaderError> {
            self.seek_back(len)?;
            self.consumed = self.consumed.saturating_sub(len);
            Ok(())
        }

        fn position(&self) -> usize {
            self.consumed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_peek_does_not_consume() {
        let mut src = SliceSource::new(&[1, 2, 3]);
        assert_eq!(src.peek_byte().unwrap(), Some(1));
        assert_eq!(src.peek_byte().unwrap(), Some(1));
        assert_eq!(src.read_byte().unwrap(), 1);
        assert_eq!(src.position(), 1);
        assert_eq!(src.remaining(), &[2, 3]);
    }

    #[test]
    fn slice_truncation_reports_position() {
        let mut src = SliceSource::new(&[1, 2]);
        src.skip(1).unwrap();
        let err = src.read_vec(5).unwrap_err();
        assert_eq!(err.as_malformed(), Some(MalformedError::Truncated));
        assert_eq!(err.position(), 1);
    }

    #[test]
    fn slice_rewind_restores_offset() {
        let mut src = SliceSource::new(&[9, 8, 7]);
        src.skip(2).unwrap();
        src.rewind(2).unwrap();
        assert_eq!(src.peek_byte().unwrap(), Some(9));
    }

    #[cfg(feature = "std")]
    #[test]
    fn stream_peek_rewinds_one_byte() {
        let mut src = StreamSource::new(std::io::Cursor::new(alloc::vec![4u8, 5]));
        assert_eq!(src.peek_byte().unwrap(), Some(4));
        assert_eq!(src.read_byte().unwrap(), 4);
        assert_eq!(src.peek_byte().unwrap(), Some(5));
        assert_eq!(src.position(), 1);
        src.skip(1).unwrap();
        assert_eq!(src.peek_byte().unwrap(), None);
    }

    #[cfg(feature = "std")]
    #[test]
    fn stream_short_read_is_truncation() {
        let mut src = StreamSource::new(std::io::Cursor::new(alloc::vec![1u8, 2, 3]));
        let err = src.read_vec(10).unwrap_err();
        assert_eq!(err.as_malformed(), Some(MalformedError::Truncated));
        assert_eq!(err.position(), 3);
    }
}
