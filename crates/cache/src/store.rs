use crate::error::Result;
use crate::models::SearchCacheRecord;
use async_trait::async_trait;
use std::sync::Arc;

/// Shared handle to a cache store, as held by search sessions.
pub type StoreHandle = Arc<dyn CacheStore>;

/// Durable key-value storage of [`SearchCacheRecord`]s, keyed by book id.
///
/// Writes are whole-record overwrites; the last write wins. A record that
/// exists but cannot be decoded is reported as
/// [`InvalidData`](crate::error::ErrorKind::InvalidData), which is distinct
/// from the store itself being unreachable.
///
/// # Examples
///
/// ```
/// use folio_cache::{CacheStore, error::Result};
///
/// async fn cached_chapters(store: &dyn CacheStore, book_id: &str) -> Result<usize> {
///     let record = store.load(book_id).await?;
///     Ok(record.map(|r| r.href_text.len()).unwrap_or_default())
/// }
/// ```
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch the record for a book, if one has been written.
    async fn load(&self, book_id: &str) -> Result<Option<SearchCacheRecord>>;

    /// Overwrite the record for a book.
    async fn save(&self, book_id: &str, record: &SearchCacheRecord) -> Result<()>;

    /// Remove the record for a book. Returns `true` if a record existed.
    async fn delete(&self, book_id: &str) -> Result<bool>;
}
