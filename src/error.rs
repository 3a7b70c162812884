//! CLI Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A CLI error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The book directory (or a file inside it) could not be read.
    #[display("unable to read book: {}", _0.display())]
    Book(#[error(not(source))] PathBuf),
    #[display("unable to load configuration")]
    Config,
    #[display("unable to open search cache")]
    Cache,
    #[display("search failed")]
    Search,
    #[display("unable to initialise logging")]
    Logging,
    #[display("unable to start async runtime")]
    Runtime,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Cache)
    }
}
