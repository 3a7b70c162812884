//! Permissive HTML parsing via `html5ever`.

use super::ParsedDocument;
use crate::consts;
use scraper::Html;

pub(super) fn parse(markup: &str) -> ParsedDocument {
    let document = Html::parse_document(markup);
    text_content(&document)
}

pub(super) fn text_content(document: &Html) -> ParsedDocument {
    let body = document.select(&consts::BODY_SELECTOR).next().map(|body| body.text().collect::<String>());
    let root = document.root_element().text().collect::<String>();
    ParsedDocument::new(body, root)
}
