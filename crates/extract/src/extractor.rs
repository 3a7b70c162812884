//! Chapter document to plain text.

use crate::normalize::normalize;
use crate::parse::{DefaultParser, MarkupKind, MarkupParser, ParsedDocument};
use std::sync::Arc;
use tracing::instrument;

/// Raw chapter content, as handed over by an EPUB engine.
///
/// Engines either return the chapter's markup verbatim, or a document they
/// have already parsed themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawContent {
    /// Unparsed XHTML or HTML markup.
    Markup(String),
    /// A document the engine already parsed.
    Document(ParsedDocument),
}
impl From<String> for RawContent {
    fn from(markup: String) -> Self {
        Self::Markup(markup)
    }
}
impl From<&str> for RawContent {
    fn from(markup: &str) -> Self {
        Self::Markup(markup.to_string())
    }
}
impl From<Vec<u8>> for RawContent {
    /// Invalid byte sequences are replaced with U+FFFD.
    fn from(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(markup) => Self::Markup(markup),
            Err(err) => Self::Markup(String::from_utf8_lossy(err.as_bytes()).into_owned()),
        }
    }
}
impl From<ParsedDocument> for RawContent {
    fn from(document: ParsedDocument) -> Self {
        Self::Document(document)
    }
}
impl From<&scraper::Html> for RawContent {
    fn from(html: &scraper::Html) -> Self {
        Self::Document(html.into())
    }
}

/// Converts chapter content into normalized plain text.
///
/// Extraction never fails: markup that is not well-formed XHTML is re-parsed
/// as HTML, and if the injected parser rejects even that, the chapter simply
/// has no text.
///
/// # Examples
///
/// ```rust
/// use folio_extract::Extractor;
///
/// let extractor = Extractor::default();
/// let text = extractor.extract("<html><body><p>The fox\n  jumps.</p></body></html>");
/// assert_eq!(text, "The fox jumps.");
///
/// // HTML-only entities are not valid XHTML; the HTML parser picks it up.
/// let text = extractor.extract("<p>fish&nbsp;chips<br>and peas</p>");
/// assert_eq!(text, "fish chipsand peas");
/// ```
#[derive(Clone)]
pub struct Extractor {
    parser: Arc<dyn MarkupParser>,
}
impl Extractor {
    pub fn new(parser: impl MarkupParser + 'static) -> Self {
        Self { parser: Arc::new(parser) }
    }

    #[instrument(level = "trace", skip_all)]
    pub fn extract(&self, raw: impl Into<RawContent>) -> String {
        match raw.into() {
            RawContent::Document(document) => normalize(document.text_content()),
            RawContent::Markup(markup) => self
                .parse(&markup)
                .map(|document| normalize(document.text_content()))
                .unwrap_or_default(),
        }
    }

    fn parse(&self, markup: &str) -> Option<ParsedDocument> {
        let xhtml_error = match self.parser.parse(MarkupKind::Xhtml, markup) {
            Ok(document) => return Some(document),
            Err(err) => err,
        };
        tracing::trace!(error = %*xhtml_error, "Not well-formed XHTML; re-parsing as HTML");
        match self.parser.parse(MarkupKind::Html, markup) {
            Ok(document) => Some(document),
            Err(err) => {
                tracing::debug!(error = ?err, "Markup rejected by both parsers; treating as empty");
                None
            },
        }
    }
}
impl Default for Extractor {
    fn default() -> Self {
        Self::new(DefaultParser)
    }
}
impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor").finish_non_exhaustive()
    }
}

/// Convenience wrapper around [`Extractor::default`].
pub fn extract_plain_text(raw: impl Into<RawContent>) -> String {
    Extractor::default().extract(raw)
}
