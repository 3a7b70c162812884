//! Document parsing capability.
//!
//! The [`Extractor`](crate::Extractor) never reaches for an ambient parser;
//! it is handed a [`MarkupParser`] so that chapter extraction can be driven
//! without a live rendering engine (and swapped out in tests).

mod html;
mod xhtml;

use crate::error::Result;
use derive_more::Display;
use tracing::instrument;

/// Which grammar a chapter document should be parsed with.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkupKind {
    /// Strict XML serialization of HTML; any well-formedness error is fatal.
    #[display("application/xhtml+xml")]
    Xhtml,
    /// Permissive HTML5 parsing; never fails.
    #[display("text/html")]
    Html,
}

/// The text content of a parsed chapter document.
///
/// Only the parts of a document that text extraction cares about are kept:
/// the text content of the `<body>` element (if the document had one) and the
/// text content of the whole document element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDocument {
    body: Option<String>,
    document: String,
}
impl ParsedDocument {
    pub fn new(body: Option<String>, document: impl Into<String>) -> Self {
        Self { body, document: document.into() }
    }

    /// Text content of the `<body>` element, if the document has one.
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// Text content of the entire document element.
    pub fn document(&self) -> &str {
        &self.document
    }

    /// The text extraction should use: the body's text content, falling back
    /// to the whole document when there is no body or the body is empty.
    pub fn text_content(&self) -> &str {
        self.body.as_deref().filter(|body| !body.is_empty()).unwrap_or(&self.document)
    }
}
impl From<&scraper::Html> for ParsedDocument {
    fn from(html: &scraper::Html) -> Self {
        html::text_content(html)
    }
}

/// Capability to turn chapter markup into a [`ParsedDocument`].
///
/// Implementations report structural problems as
/// [`MalformedMarkup`](crate::error::ErrorKind::MalformedMarkup) so that the
/// caller can retry with a more forgiving [`MarkupKind`].
pub trait MarkupParser: Send + Sync {
    fn parse(&self, kind: MarkupKind, markup: &str) -> Result<ParsedDocument>;
}

/// The parser used unless another one is injected.
///
/// - [`MarkupKind::Xhtml`] runs a strict well-formedness pass with `quick-xml`.
/// - [`MarkupKind::Html`] runs `html5ever` (via `scraper`), which recovers
///   from anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultParser;
impl MarkupParser for DefaultParser {
    #[instrument(level = "trace", skip(self, markup), fields(markup_size = markup.len()))]
    fn parse(&self, kind: MarkupKind, markup: &str) -> Result<ParsedDocument> {
        match kind {
            MarkupKind::Xhtml => xhtml::parse(markup),
            MarkupKind::Html => Ok(html::parse(markup)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rstest::rstest;

    #[test]
    fn test_text_content_prefers_body() {
        let doc = ParsedDocument::new(Some("body text".to_string()), "title body text");
        assert_eq!(doc.text_content(), "body text");
    }

    #[rstest]
    #[case(None)]
    #[case(Some(String::new()))]
    fn test_text_content_falls_back_to_document(#[case] body: Option<String>) {
        let doc = ParsedDocument::new(body, "whole document");
        assert_eq!(doc.text_content(), "whole document");
    }

    #[test]
    fn test_default_parser_xhtml() {
        let doc = DefaultParser
            .parse(MarkupKind::Xhtml, r#"<html xmlns="http://www.w3.org/1999/xhtml"><body><p>Hi</p></body></html>"#)
            .unwrap();
        assert_eq!(doc.body(), Some("Hi"));
    }

    #[test]
    fn test_default_parser_rejects_html_as_xhtml() {
        let err = DefaultParser.parse(MarkupKind::Xhtml, "<p>one<br>two</p>").unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedMarkup(_)));
    }

    #[test]
    fn test_default_parser_html_never_fails() {
        let doc = DefaultParser.parse(MarkupKind::Html, "<p>one<br>two</p>").unwrap();
        assert_eq!(doc.text_content(), "onetwo");
    }

    #[test]
    fn test_from_scraper_html() {
        let html = scraper::Html::parse_document("<title>T</title><p>Body</p>");
        let doc = ParsedDocument::from(&html);
        assert_eq!(doc.body(), Some("Body"));
        assert_eq!(doc.document(), "TBody");
    }
}
