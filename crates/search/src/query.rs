//! Ranked substring search over extracted chapter text.

use folio_cache::HrefText;
use folio_extract::normalize;
use regex::{Regex, RegexBuilder};
use tracing::instrument;

/// Characters of context kept before the first match.
const CONTEXT_BEFORE: usize = 60;
/// Characters of context kept after the first match, on top of the query.
const CONTEXT_AFTER: usize = 100;
/// Length of the leading excerpt used when there is no match to centre on.
const FALLBACK_LEN: usize = 180;
const ELLIPSIS: char = '…';

/// One chapter matching a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub href: String,
    /// Excerpt of the chapter's text around the first match.
    pub snippet: String,
    /// Number of non-overlapping occurrences; always at least 1.
    pub count: usize,
}

fn matcher(query: &str) -> Option<Regex> {
    RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
        .inspect_err(|err| tracing::warn!(error = %err, "Unable to build matcher for query"))
        .ok()
}

/// Search every chapter for `query`, most occurrences first.
///
/// The query and each chapter's text are whitespace-normalized, then matched
/// case-insensitively as a literal substring. Chapters with equal counts
/// keep their `href_text` order.
///
/// # Examples
///
/// ```rust
/// use folio_cache::HrefText;
/// use folio_search::search;
///
/// let href_text = HrefText::from([
///     ("c1.xhtml".to_string(), "One fox.".to_string()),
///     ("c2.xhtml".to_string(), "Fox after fox.".to_string()),
/// ]);
/// let hits = search(&href_text, "  FOX ");
/// assert_eq!(hits.iter().map(|h| (h.href.as_str(), h.count)).collect::<Vec<_>>(), [("c2.xhtml", 2), ("c1.xhtml", 1)]);
/// assert!(search(&href_text, " \n").is_empty());
/// ```
#[instrument(level = "debug", skip(href_text), fields(chapters = href_text.len()))]
pub fn search(href_text: &HrefText, query: &str) -> Vec<SearchHit> {
    let query = normalize(query);
    if query.is_empty() {
        return Vec::new();
    }
    let Some(matcher) = matcher(&query) else {
        return Vec::new();
    };
    let query_len = query.chars().count();
    let mut hits = href_text
        .iter()
        .map(|(href, text)| (href, normalize(text)))
        .filter(|(_, text)| !text.is_empty())
        .filter_map(|(href, text)| {
            let mut matches = matcher.find_iter(&text);
            let first = matches.next()?;
            let count = 1 + matches.count();
            let first = text[..first.start()].chars().count();
            Some(SearchHit {
                href: href.clone(),
                snippet: snippet(&text, Some(first), query_len),
                count,
            })
        })
        .collect::<Vec<_>>();
    // `sort_by` is stable, which keeps equal counts in chapter order.
    hits.sort_by(|a, b| b.count.cmp(&a.count));
    tracing::debug!(hits = hits.len(), "Search complete");
    hits
}

/// Excerpt of `text` around the match starting at character offset `first`.
///
/// Keeps up to 60 characters before the match and `query_len + 100`
/// characters from its start, marking either cut with `…`. Without a match,
/// the first 180 characters are used instead.
pub fn snippet(text: &str, first: Option<usize>, query_len: usize) -> String {
    let len = text.chars().count();
    let Some(first) = first else {
        let mut excerpt = text.chars().take(FALLBACK_LEN).collect::<String>();
        if len > FALLBACK_LEN {
            excerpt.push(ELLIPSIS);
        }
        return excerpt;
    };
    let start = first.saturating_sub(CONTEXT_BEFORE);
    let end = first.saturating_add(query_len).saturating_add(CONTEXT_AFTER).min(len);
    let mut excerpt = String::new();
    if start > 0 {
        excerpt.push(ELLIPSIS);
    }
    excerpt.extend(text.chars().skip(start).take(end.saturating_sub(start)));
    if end < len {
        excerpt.push(ELLIPSIS);
    }
    excerpt
}
