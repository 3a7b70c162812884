//! In-memory cache store for testing.

use crate::error::{ErrorKind, Result};
use crate::models::SearchCacheRecord;
use crate::store::CacheStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
enum Entry {
    Record(SearchCacheRecord),
    /// A record that exists but does not decode.
    Corrupt,
}

/// In-memory [`CacheStore`] for testing.
///
/// Records live in a `HashMap` behind a [`RwLock`]. Besides storing records,
/// the store counts writes, can hold undecodable entries, and can be switched
/// into an outage where every call fails with
/// [`ErrorKind::Unavailable`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Entry>>,
    saves: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryStore {
    /// Pre-populate the store with a record (not counted as a save).
    pub fn with_record(mut self, book_id: impl Into<String>, record: SearchCacheRecord) -> Self {
        self.entries.get_mut().insert(book_id.into(), Entry::Record(record));
        self
    }

    /// Pre-populate the store with a record that fails to decode.
    pub fn with_corrupt(mut self, book_id: impl Into<String>) -> Self {
        self.entries.get_mut().insert(book_id.into(), Entry::Corrupt);
        self
    }

    /// A store that fails every call.
    pub fn unavailable() -> Self {
        let store = Self::default();
        store.set_unavailable(true);
        store
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of successful [`save`](CacheStore::save) calls.
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            exn::bail!(ErrorKind::Unavailable);
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn load(&self, book_id: &str) -> Result<Option<SearchCacheRecord>> {
        self.check()?;
        match self.entries.read().await.get(book_id) {
            None => Ok(None),
            Some(Entry::Record(record)) => Ok(Some(record.clone())),
            Some(Entry::Corrupt) => Err(exn::Exn::from(ErrorKind::InvalidData("href text"))),
        }
    }

    async fn save(&self, book_id: &str, record: &SearchCacheRecord) -> Result<()> {
        self.check()?;
        self.entries.write().await.insert(book_id.to_string(), Entry::Record(record.clone()));
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, book_id: &str) -> Result<bool> {
        self.check()?;
        Ok(self.entries.write().await.remove(book_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HrefText;

    #[tokio::test]
    async fn test_round_trip_and_delete() {
        let store = MemoryStore::default();
        let record = SearchCacheRecord::new(HrefText::from([("a".to_string(), "Alpha".to_string())]));
        store.save("book", &record).await.unwrap();
        assert_eq!(store.load("book").await.unwrap(), Some(record));
        assert!(store.delete("book").await.unwrap());
        assert!(!store.delete("book").await.unwrap());
        assert_eq!(store.saves(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_entry() {
        let store = MemoryStore::default().with_corrupt("book");
        let err = store.load("book").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidData(_)));
    }

    #[tokio::test]
    async fn test_outage() {
        let store = MemoryStore::unavailable();
        let err = store.load("book").await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Unavailable));
        assert!(err.is_retryable());
        store.set_unavailable(false);
        assert_eq!(store.load("book").await.unwrap(), None);
    }
}
