/// Configuration options for the token reader.
///
/// # Examples
///
/// ```rust
/// use msgpack_tokens::{ReaderOptions, SliceReader};
///
/// let options = ReaderOptions {
///     allow_multiple_values: true,
///     ..Default::default()
/// };
/// // Two documents: 1, then 2.
/// let reader = SliceReader::with_options(&[0x01, 0x02], options);
/// assert_eq!(reader.count(), 2);
/// ```
///
/// # Default
///
/// Single document, unlimited nesting.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReaderOptions {
    /// Whether to read multiple concatenated documents from one input.
    ///
    /// When `false`, the reader stops after the first complete document and
    /// ignores any trailing bytes. When `true`, it starts over at the next
    /// byte and keeps producing tokens until the input is exhausted.
    ///
    /// # Default
    ///
    /// `false`
    pub allow_multiple_values: bool,

    /// Maximum container nesting depth.
    ///
    /// Opening a container deeper than this fails with
    /// [`MalformedError::DepthLimitExceeded`](crate::MalformedError::DepthLimitExceeded).
    ///
    /// # Default
    ///
    /// `None` (unlimited)
    pub max_depth: Option<usize>,

    #[cfg(any(test, feature = "fuzzing"))]
    /// Panic on fatal errors instead of returning them.
    ///
    /// Enabled only in test builds to produce backtraces on decode failures.
    pub panic_on_error: bool,
}

/// How the writer encodes floating-point scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FloatWidth {
    /// Keep each value's width: `f32` as float 32, `f64` as float 64.
    #[default]
    Preserve,
    /// Narrow every float to float 32.
    Single,
    /// Widen every float to float 64.
    Double,
}

/// Configuration options for the [`Writer`](crate::Writer).
///
/// # Default
///
/// Floats keep their width.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriterOptions {
    /// Float encoding width.
    ///
    /// # Default
    ///
    /// [`FloatWidth::Preserve`]
    pub float_width: FloatWidth,
}
