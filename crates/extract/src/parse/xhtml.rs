//! Strict XHTML parsing via `quick-xml`.
//!
//! A well-formedness pass that collects text content as it goes. Anything an
//! XML parser would reject (HTML-only named entities, unclosed void elements,
//! unquoted attributes) is an error, and the caller re-parses as HTML.

use super::ParsedDocument;
use crate::consts;
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

/// Running text content while walking the event stream.
#[derive(Default)]
struct TextWalker {
    depth: usize,
    seen_root: bool,
    root_closed: bool,
    /// Depth at which the first `<body>` opened, while still inside it.
    body_depth: Option<usize>,
    body: Option<String>,
    document: String,
}
impl TextWalker {
    fn open(&mut self, element: &BytesStart, empty: bool) -> Result<()> {
        if self.root_closed {
            exn::bail!(ErrorKind::MalformedMarkup("content after the document element".to_string()));
        }
        for attribute in element.attributes() {
            attribute.or_raise(|| ErrorKind::MalformedMarkup("invalid attribute".to_string()))?;
        }
        self.seen_root = true;
        if empty {
            // `<body/>` is still a body, just an empty one.
            if self.body.is_none() && element.local_name().as_ref() == consts::BODY_TAG {
                self.body = Some(String::new());
            }
            self.root_closed = self.depth == 0;
            return Ok(());
        }
        self.depth += 1;
        if self.body.is_none() && element.local_name().as_ref() == consts::BODY_TAG {
            self.body = Some(String::new());
            self.body_depth = Some(self.depth);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        if self.body_depth == Some(self.depth) {
            self.body_depth = None;
        }
        self.depth = match self.depth.checked_sub(1) {
            Some(depth) => depth,
            None => exn::bail!(ErrorKind::MalformedMarkup("unexpected closing tag".to_string())),
        };
        self.root_closed = self.depth == 0;
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<()> {
        if self.depth == 0 {
            // Whitespace around the document element is fine, anything else isn't.
            if !text.trim().is_empty() {
                exn::bail!(ErrorKind::MalformedMarkup("text outside the document element".to_string()));
            }
            return Ok(());
        }
        self.document.push_str(text);
        if self.body_depth.is_some()
            && let Some(body) = self.body.as_mut()
        {
            body.push_str(text);
        }
        Ok(())
    }

    fn finish(self) -> Result<ParsedDocument> {
        if self.depth > 0 {
            exn::bail!(ErrorKind::MalformedMarkup(format!("{} unclosed element(s)", self.depth)));
        }
        if !self.seen_root {
            exn::bail!(ErrorKind::MissingRoot);
        }
        Ok(ParsedDocument::new(self.body, self.document))
    }
}

pub(super) fn parse(markup: &str) -> Result<ParsedDocument> {
    let mut reader = Reader::from_str(markup);
    reader.config_mut().trim_text(false);
    let mut walker = TextWalker::default();
    let mut entity = String::with_capacity(16);
    loop {
        let position = reader.buffer_position();
        let malformed = || ErrorKind::MalformedMarkup(format!("XML error near byte {position}"));
        match reader.read_event().or_raise(malformed)? {
            Event::Start(element) => walker.open(&element, false)?,
            Event::Empty(element) => walker.open(&element, true)?,
            Event::End(_) => walker.close()?,
            Event::Text(text) => walker.text(&text.decode().or_raise(malformed)?)?,
            Event::CData(cdata) => walker.text(&reader.decoder().decode(&cdata).or_raise(malformed)?)?,
            Event::GeneralRef(reference) => {
                entity.clear();
                entity.push('&');
                entity.push_str(&reference.decode().or_raise(malformed)?);
                entity.push(';');
                // Only the five XML entities and character references resolve;
                // `&nbsp;` and friends are an error in XHTML without a DTD.
                walker.text(&unescape(&entity).or_raise(malformed)?)?;
            },
            Event::Eof => break,
            // Declarations, comments, processing instructions and doctypes
            // contribute nothing to text content.
            _ => {},
        }
    }
    walker.finish()
}
