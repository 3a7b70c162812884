//! Extraction Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Only the [`MarkupParser`](crate::MarkupParser) seam is
//! fallible; [`Extractor`](crate::Extractor) swallows these and degrades to
//! best-effort text.

use derive_more::{Display, Error};

/// An extraction error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for extraction operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The markup is not well-formed for the requested
    /// [`MarkupKind`](crate::MarkupKind); try a more permissive parser.
    #[display("malformed markup: {_0}")]
    MalformedMarkup(#[error(not(source))] String),
    /// The markup parsed, but contains no document element at all.
    #[display("document has no root element")]
    MissingRoot,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Markup is either well-formed or it isn't; retrying the same parser
        // on the same input never helps.
        false
    }
}
