//! Search Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Only cache store failures (and cancellation) ever reach
//! the caller of an index build; malformed chapters degrade to missing text.

use derive_more::{Display, Error};

/// A search error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The cache store could not be read or written.
    #[display("search cache store failure")]
    Cache,
    /// A book could not produce the content of a chapter.
    #[display("failed to load chapter: {_0}")]
    ChapterLoad(#[error(not(source))] String),
    /// The build was cancelled before it finished; nothing was cached.
    #[display("index build cancelled")]
    Cancelled,
    /// The index event stream ended without producing an index.
    #[display("index build ended unexpectedly")]
    Incomplete,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Cache | Self::ChapterLoad(_))
    }
}
