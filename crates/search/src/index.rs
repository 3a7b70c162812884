//! Additive prefix index over chapter text.
//!
//! Tokens are maximal runs of alphanumeric characters, lowercased. A query
//! term matches every indexed token it is a prefix of. Ranking never goes
//! through this index; it only answers "which chapters could contain this".

use std::collections::{BTreeMap, BTreeSet, HashMap};

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric()).filter(|token| !token.is_empty()).map(str::to_lowercase)
}

#[derive(Debug, Clone, Default)]
pub struct PrefixIndex {
    hrefs: Vec<String>,
    ids: HashMap<String, usize>,
    tokens: BTreeMap<String, BTreeSet<usize>>,
}

impl PrefixIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the text of one chapter.
    ///
    /// Returns `false` (and changes nothing) if `href` was already indexed.
    pub fn add(&mut self, href: impl Into<String>, text: &str) -> bool {
        let href = href.into();
        if self.ids.contains_key(&href) {
            return false;
        }
        let id = self.hrefs.len();
        for token in tokenize(text) {
            self.tokens.entry(token).or_default().insert(id);
        }
        self.ids.insert(href.clone(), id);
        self.hrefs.push(href);
        true
    }

    /// Hrefs, in insertion order, that contain a prefix match for every
    /// term of `query`. A query without any terms matches nothing.
    pub fn lookup(&self, query: &str) -> Vec<&str> {
        let mut matched: Option<BTreeSet<usize>> = None;
        for term in tokenize(query) {
            let ids = self
                .tokens
                .range(term.clone()..)
                .take_while(|(token, _)| token.starts_with(&term))
                .flat_map(|(_, ids)| ids.iter().copied())
                .collect::<BTreeSet<_>>();
            let ids = match matched {
                Some(previous) => previous.intersection(&ids).copied().collect(),
                None => ids,
            };
            if ids.is_empty() {
                return Vec::new();
            }
            matched = Some(ids);
        }
        matched.unwrap_or_default().into_iter().map(|id| self.hrefs[id].as_str()).collect()
    }

    pub fn contains(&self, href: &str) -> bool {
        self.ids.contains_key(href)
    }

    /// Number of indexed chapters.
    pub fn len(&self) -> usize {
        self.hrefs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hrefs.is_empty()
    }
}
