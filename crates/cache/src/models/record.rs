use indexmap::IndexMap;
use time::UtcDateTime;

/// Bump whenever text extraction changes in a way that invalidates previously
/// cached text; records with any other version are discarded on load.
pub const SEARCH_CACHE_VERSION: u32 = 3;

/// Normalized plain text per chapter href, in spine order.
///
/// Only chapters that loaded successfully and produced non-empty text are
/// present.
pub type HrefText = IndexMap<String, String>;

/// The persisted extracted text of one book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCacheRecord {
    pub version: u32,
    pub href_text: HrefText,
    pub updated_at: UtcDateTime,
}
impl SearchCacheRecord {
    /// A record stamped with the current schema version and time.
    pub fn new(href_text: HrefText) -> Self {
        Self {
            version: SEARCH_CACHE_VERSION,
            href_text,
            updated_at: UtcDateTime::now(),
        }
    }

    /// Total number of characters across every cached chapter.
    pub fn total_chars(&self) -> usize {
        self.href_text.values().map(|text| text.chars().count()).sum()
    }

    /// Whether the record was written by the current extraction schema.
    pub fn is_current(&self) -> bool {
        self.version == SEARCH_CACHE_VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_current() {
        let record = SearchCacheRecord::new(HrefText::new());
        assert!(record.is_current());
        assert_eq!(record.total_chars(), 0);
    }

    #[test]
    fn test_total_chars_counts_characters_not_bytes() {
        let record = SearchCacheRecord::new(HrefText::from([
            ("c1.xhtml".to_string(), "naïve".to_string()),
            ("c2.xhtml".to_string(), "café au lait".to_string()),
        ]));
        assert_eq!(record.total_chars(), 5 + 12);
    }

    #[test]
    fn test_stale_version() {
        let record = SearchCacheRecord {
            version: SEARCH_CACHE_VERSION - 1,
            ..SearchCacheRecord::new(HrefText::new())
        };
        assert!(!record.is_current());
    }
}
