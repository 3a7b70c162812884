use crate::error::Result;
use async_trait::async_trait;
use folio_extract::RawContent;

/// One document in a book's reading order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpineItem {
    pub href: Option<String>,
}
impl SpineItem {
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: Some(href.into()) }
    }

    /// A spine entry without a usable href.
    pub fn missing() -> Self {
        Self::default()
    }

    /// The href, if present and non-empty.
    pub fn href(&self) -> Option<&str> {
        self.href.as_deref().filter(|href| !href.is_empty())
    }
}
impl From<&str> for SpineItem {
    fn from(href: &str) -> Self {
        Self::new(href)
    }
}
impl From<String> for SpineItem {
    fn from(href: String) -> Self {
        Self::new(href)
    }
}

/// An opened book, as exposed by an EPUB engine.
///
/// Only the spine and chapter loading are needed to build a search index;
/// container parsing and rendering stay with the engine.
#[async_trait]
pub trait Book: Send + Sync {
    /// The reading order.
    fn spine(&self) -> Vec<SpineItem>;

    /// Load the raw content of the chapter at `href`.
    ///
    /// Failures are reported as [`ChapterLoad`](crate::error::ErrorKind::ChapterLoad)
    /// and cause that chapter to be skipped.
    async fn load(&self, href: &str) -> Result<RawContent>;
}

#[cfg(any(test, feature = "mock"))]
pub use self::mock::MockBook;

#[cfg(any(test, feature = "mock"))]
mod mock {
    use super::{Book, SpineItem};
    use crate::error::{ErrorKind, Result};
    use async_trait::async_trait;
    use folio_extract::RawContent;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory [`Book`] for testing.
    ///
    /// Chapters added with [`chapter`](Self::chapter) load successfully,
    /// chapters added with [`failing`](Self::failing) fail to load, and
    /// [`missing`](Self::missing) appends a spine item without an href. Every
    /// `load` call is recorded.
    #[derive(Debug, Default)]
    pub struct MockBook {
        spine: Vec<SpineItem>,
        chapters: HashMap<String, RawContent>,
        loads: Mutex<Vec<String>>,
    }

    impl MockBook {
        pub fn chapter(mut self, href: impl Into<String>, content: impl Into<RawContent>) -> Self {
            let href = href.into();
            self.chapters.insert(href.clone(), content.into());
            self.spine.push(SpineItem::new(href));
            self
        }

        pub fn failing(mut self, href: impl Into<String>) -> Self {
            self.spine.push(SpineItem::new(href));
            self
        }

        pub fn missing(mut self) -> Self {
            self.spine.push(SpineItem::missing());
            self
        }

        /// Hrefs passed to [`Book::load`], in call order.
        pub fn loads(&self) -> Vec<String> {
            self.loads.lock().map(|loads| loads.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl Book for MockBook {
        fn spine(&self) -> Vec<SpineItem> {
            self.spine.clone()
        }

        async fn load(&self, href: &str) -> Result<RawContent> {
            if let Ok(mut loads) = self.loads.lock() {
                loads.push(href.to_string());
            }
            match self.chapters.get(href) {
                Some(content) => Ok(content.clone()),
                None => exn::bail!(ErrorKind::ChapterLoad(href.to_string())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(SpineItem::new("c1.xhtml"), Some("c1.xhtml"))]
    #[case(SpineItem::new(""), None)]
    #[case(SpineItem::missing(), None)]
    fn test_href(#[case] item: SpineItem, #[case] expected: Option<&str>) {
        assert_eq!(item.href(), expected);
    }

    #[tokio::test]
    async fn test_mock_book() {
        let book = MockBook::default().chapter("c1", "<p>One</p>").missing().failing("c2");
        assert_eq!(book.spine().len(), 3);
        assert_eq!(book.load("c1").await.unwrap(), RawContent::from("<p>One</p>"));
        assert!(book.load("c2").await.is_err());
        assert_eq!(book.loads(), ["c1", "c2"]);
    }
}
