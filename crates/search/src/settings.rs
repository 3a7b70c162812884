use serde::{Deserialize, Serialize};

/// Tunables for index builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Cached records with fewer characters of text than this are assumed
    /// to come from a broken extraction and are rebuilt.
    pub min_cached_chars: usize,
    /// Yield to the scheduler after every n-th loaded chapter.
    pub yield_every: usize,
}
impl Default for Settings {
    fn default() -> Self {
        Self {
            min_cached_chars: 500,
            yield_every: 3,
        }
    }
}
