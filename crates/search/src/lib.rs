//! Offline full-text search over a book's chapters.
//!
//! A [`SearchSession`] builds a [`SearchIndex`] for a [`Book`], reusing the
//! text cached by an earlier session when it is still valid and extracting
//! every chapter of the spine otherwise. Queries ([`search`]) run against the
//! extracted text and return ranked [`SearchHit`]s with context snippets.

mod book;
pub mod error;
mod index;
mod query;
mod session;
mod settings;
mod yielder;

#[cfg(any(test, feature = "mock"))]
pub use crate::book::MockBook;
pub use crate::book::{Book, SpineItem};
pub use crate::index::PrefixIndex;
pub use crate::query::{SearchHit, search, snippet};
pub use crate::session::{IndexEvent, Progress, SearchIndex, SearchSession};
pub use crate::settings::Settings;
pub use crate::yielder::{TokioYielder, Yielder};
