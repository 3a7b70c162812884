//! Plain-text extraction from EPUB chapter documents.
//!
//! A chapter arrives either as raw markup or as a document an EPUB engine has
//! already parsed ([`RawContent`]). The [`Extractor`] turns it into a single
//! line of whitespace-normalized text suitable for substring search.

mod consts;
pub mod error;
mod extractor;
mod normalize;
mod parse;

pub use crate::extractor::{Extractor, RawContent, extract_plain_text};
pub use crate::normalize::normalize;
pub use crate::parse::{DefaultParser, MarkupKind, MarkupParser, ParsedDocument};
