use thiserror::Error;

/// A fatal error raised while reading a document.
///
/// After a `ReaderError` the reader is in its error state and produces no
/// further tokens.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{source} at byte {position}")]
pub struct ReaderError {
    pub(crate) source: ErrorSource,
    pub(crate) position: usize,
}

impl ReaderError {
    pub(crate) fn new(source: impl Into<ErrorSource>, position: usize) -> Self {
        Self {
            source: source.into(),
            position,
        }
    }

    /// The byte offset at which the error was detected.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// What went wrong.
    #[must_use]
    pub fn kind(&self) -> &ErrorSource {
        &self.source
    }

    /// Returns the malformed-stream detail, if that is the cause.
    #[must_use]
    pub fn as_malformed(&self) -> Option<MalformedError> {
        match self.source {
            ErrorSource::Malformed(m) => Some(m),
            _ => None,
        }
    }
}

/// The cause of a [`ReaderError`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSource {
    /// The bytes are not a valid document.
    #[error("malformed stream: {0}")]
    Malformed(#[from] MalformedError),
    /// A container end was requested with no open container.
    #[error("container stack underflow")]
    StackUnderflow,
    /// The underlying stream failed.
    #[cfg(feature = "std")]
    #[error("i/o error: {0}")]
    Io(std::io::ErrorKind),
}

/// Ways a byte sequence can fail to be a document.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedError {
    /// The reserved marker `0xc1`.
    #[error("invalid marker 0x{0:02x}")]
    InvalidMarker(u8),
    /// The input ended inside a value.
    #[error("unexpected end of input")]
    Truncated,
    /// A string payload is not UTF-8.
    #[error("string is not valid UTF-8")]
    InvalidUtf8,
    /// A map key is encoded with something other than a string marker.
    #[error("map key must be a string, found marker 0x{0:02x}")]
    NonStringKey(u8),
    /// An extension other than the timestamp extension appeared as a value.
    #[error("unsupported extension type {0}")]
    UnsupportedExtension(i8),
    /// A timestamp extension with a payload length other than 4, 8 or 12.
    #[error("invalid timestamp payload length {0}")]
    InvalidTimestampLength(u32),
    /// A timestamp whose nanosecond field is out of range.
    #[error("timestamp nanoseconds out of range: {0}")]
    InvalidTimestampNanos(u32),
    /// A container yielded more children than its header declared.
    #[error("read past end of current container context")]
    PastContainerEnd,
    /// Nesting went deeper than `ReaderOptions::max_depth`.
    #[error("nesting depth limit of {0} exceeded")]
    DepthLimitExceeded(usize),
    /// A length does not fit in this platform's `usize`.
    #[error("length {0} does not fit in memory")]
    LengthOverflow(u64),
}

#[cfg(feature = "std")]
impl From<std::io::Error> for ErrorSource {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::UnexpectedEof => Self::Malformed(MalformedError::Truncated),
            kind => Self::Io(kind),
        }
    }
}

/// A fatal error raised by the [`Writer`](crate::Writer).
#[derive(Error, Debug)]
pub enum WriterError<E> {
    /// The write calls do not describe a well-formed tree.
    #[error("invalid nesting: {0}")]
    InvalidNesting(#[from] NestingError),
    /// A string, blob or container is too long for a 32-bit length prefix.
    #[error("length {0} exceeds the largest encodable length")]
    LengthOverflow(usize),
    /// The sink failed while receiving a serialized document.
    #[error("sink error: {0}")]
    Sink(E),
}

impl<E: PartialEq> PartialEq for WriterError<E> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidNesting(a), Self::InvalidNesting(b)) => a == b,
            (Self::LengthOverflow(a), Self::LengthOverflow(b)) => a == b,
            (Self::Sink(a), Self::Sink(b)) => a == b,
            _ => false,
        }
    }
}

/// A caller protocol violation detected by the writer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NestingError {
    /// A value or container start inside an object with no property name.
    #[error("value written inside an object without a property name")]
    MissingPropertyName,
    /// A property name outside of an object.
    #[error("property name written outside of an object")]
    PropertyNameOutsideObject,
    /// Two property names in a row.
    #[error("property name written while another is pending")]
    DuplicatePropertyName,
    /// An end token with no open container.
    #[error("end written with no open container")]
    NoOpenContainer,
    /// `write_end_array` closing an object, or the reverse.
    #[error("end does not match the open container")]
    MismatchedEnd,
    /// An object closed while a property name still awaits its value.
    #[error("object closed with a dangling property name")]
    DanglingPropertyName,
    /// The writer already failed and rejects further calls.
    #[error("writer is in an error state")]
    Poisoned,
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn reader_error_renders_position() {
        let err = ReaderError::new(MalformedError::InvalidMarker(0xc1), 7);
        assert_eq!(err.to_string(), "malformed stream: invalid marker 0xc1 at byte 7");
        assert_eq!(err.as_malformed(), Some(MalformedError::InvalidMarker(0xc1)));
    }

    #[cfg(feature = "std")]
    #[test]
    fn unexpected_eof_maps_to_truncated() {
        let io = std::io::Error::from(std::io::ErrorKind::UnexpectedEof);
        assert_eq!(
            ErrorSource::from(io),
            ErrorSource::Malformed(MalformedError::Truncated)
        );
    }
}
