//! Search session state machine.
//!
//! A session turns a book into a [`SearchIndex`], preferring the cached text
//! of a previous session over re-extracting every chapter:
//!
//! ```text
//! CheckingCache ──► CacheHit ──────────────┐
//!       │                                  ▼
//!       └─────────► ColdBuild ─► Progress* ─► Ready
//! ```

use crate::book::Book;
use crate::error::{ErrorKind, Result};
use crate::index::PrefixIndex;
use crate::query::{SearchHit, search};
use crate::settings::Settings;
use crate::yielder::{TokioYielder, Yielder};
use async_stream::stream;
use exn::ResultExt;
use folio_cache::error::ErrorKind as CacheErrorKind;
use folio_cache::{HrefText, SearchCacheRecord, StoreHandle};
use folio_extract::Extractor;
use futures::{Stream, StreamExt};
use std::collections::HashSet;
use std::pin::pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Index build progress, as reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
    /// `true` when the index was rebuilt from cached text.
    pub from_cache: bool,
}

/// Events emitted by [`SearchSession::index`].
///
/// Events follow a strict ordering:
/// 1. [`CheckingCache`](Self::CheckingCache), exactly once.
/// 2. Either [`CacheHit`](Self::CacheHit) or [`ColdBuild`](Self::ColdBuild),
///    exactly once.
/// 3. [`Progress`](Self::Progress): once for a cache hit, once per spine item
///    for a cold build.
/// 4. [`Ready`](Self::Ready), exactly once.
///
/// An error terminates the stream early, in which case [`Ready`](Self::Ready)
/// is never emitted.
#[derive(Debug)]
pub enum IndexEvent {
    CheckingCache,
    /// A valid cached record holds text for this many chapters.
    CacheHit { chapters: usize },
    /// No usable cache; every one of `total` spine items will be visited.
    ColdBuild { total: usize },
    Progress(Progress),
    Ready(SearchIndex),
}

/// A ready-to-query book.
#[derive(Debug, Clone)]
pub struct SearchIndex {
    pub index: PrefixIndex,
    pub href_text: HrefText,
    pub from_cache: bool,
}
impl SearchIndex {
    pub fn search(&self, query: &str) -> Vec<SearchHit> {
        search(&self.href_text, query)
    }
}

/// Builds search indexes for books, backed by a cache store.
///
/// Sessions share no mutable state between books; one session can index any
/// number of books, one at a time or concurrently.
#[derive(Clone)]
pub struct SearchSession {
    store: StoreHandle,
    extractor: Extractor,
    settings: Settings,
    yielder: Arc<dyn Yielder>,
    cancel: CancellationToken,
}

impl SearchSession {
    pub fn new(store: StoreHandle) -> Self {
        Self {
            store,
            extractor: Extractor::default(),
            settings: Settings::default(),
            yielder: Arc::new(TokioYielder),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_yielder(mut self, yielder: impl Yielder + 'static) -> Self {
        self.yielder = Arc::new(yielder);
        self
    }

    /// Cold builds check `token` at every yield point and stop with
    /// [`ErrorKind::Cancelled`] once it is cancelled, without caching
    /// anything.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Ensure a book is indexed, reporting progress along the way.
    ///
    /// Only a cache store failure or cancellation is an error; chapters that
    /// fail to load or parse are skipped.
    #[instrument(skip(self, book, on_progress))]
    pub async fn ensure_index(
        &self,
        book_id: &str,
        book: &dyn Book,
        mut on_progress: impl FnMut(Progress),
    ) -> Result<SearchIndex> {
        let mut events = pin!(self.index(book_id, book));
        while let Some(event) = events.next().await {
            match event? {
                IndexEvent::Progress(progress) => on_progress(progress),
                IndexEvent::Ready(index) => return Ok(index),
                IndexEvent::CheckingCache | IndexEvent::CacheHit { .. } | IndexEvent::ColdBuild { .. } => {},
            }
        }
        exn::bail!(ErrorKind::Incomplete)
    }

    /// Stream the states of an index build as [`IndexEvent`]s.
    pub fn index<'a>(&'a self, book_id: &'a str, book: &'a dyn Book) -> impl Stream<Item = Result<IndexEvent>> + 'a {
        // `rustfmt` does not format macros that use braces. Wrap in parentheses!
        stream!({
            yield Ok(IndexEvent::CheckingCache);
            let cached = match self.cached_text(book_id).await {
                Ok(cached) => cached,
                Err(e) => {
                    yield Err(e);
                    return;
                },
            };

            if let Some(href_text) = cached {
                let chapters = href_text.len();
                tracing::info!(book_id, chapters, "Rebuilding search index from cache");
                yield Ok(IndexEvent::CacheHit { chapters });
                let mut index = PrefixIndex::new();
                for (href, text) in href_text.iter().filter(|(_, text)| !text.is_empty()) {
                    index.add(href.as_str(), &text.to_lowercase());
                }
                yield Ok(IndexEvent::Progress(Progress { done: chapters, total: chapters, from_cache: true }));
                yield Ok(IndexEvent::Ready(SearchIndex { index, href_text, from_cache: true }));
                return;
            }

            let spine = book.spine();
            let total = spine.len();
            tracing::info!(book_id, total, "Building search index from book");
            yield Ok(IndexEvent::ColdBuild { total });

            let yield_every = self.settings.yield_every.max(1);
            let mut index = PrefixIndex::new();
            let mut href_text = HrefText::new();
            let mut seen = HashSet::new();
            for (i, item) in spine.iter().enumerate() {
                let progress = Progress { done: i + 1, total, from_cache: false };
                let Some(href) = item.href() else {
                    yield Ok(IndexEvent::Progress(progress));
                    continue;
                };
                // Repeated hrefs are loaded once; the first extraction wins.
                if seen.insert(href) {
                    match book.load(href).await {
                        Ok(raw) => {
                            let text = self.extractor.extract(raw);
                            if !text.is_empty() {
                                index.add(href, &text.to_lowercase());
                                href_text.insert(href.to_string(), text);
                            }
                        },
                        Err(err) => tracing::debug!(href, error = ?err, "Skipping chapter that failed to load"),
                    }
                } else {
                    tracing::trace!(href, "Skipping repeated spine item");
                }
                yield Ok(IndexEvent::Progress(progress));
                if i % yield_every == 0 {
                    self.yielder.yield_now().await;
                    if self.cancel.is_cancelled() {
                        tracing::info!(book_id, done = i + 1, total, "Search index build cancelled");
                        yield Err(exn::Exn::from(ErrorKind::Cancelled));
                        return;
                    }
                }
            }
            if self.cancel.is_cancelled() {
                yield Err(exn::Exn::from(ErrorKind::Cancelled));
                return;
            }

            let record = SearchCacheRecord::new(href_text);
            if let Err(e) = self.store.save(book_id, &record).await.or_raise(|| ErrorKind::Cache) {
                yield Err(e);
                return;
            }
            tracing::debug!(book_id, chapters = record.href_text.len(), "Search cache updated");
            yield Ok(IndexEvent::Ready(SearchIndex { index, href_text: record.href_text, from_cache: false }));
        })
    }

    /// Delete the cached text of a book. Returns `true` if there was any.
    #[instrument(skip(self))]
    pub async fn forget(&self, book_id: &str) -> Result<bool> {
        self.store.delete(book_id).await.or_raise(|| ErrorKind::Cache)
    }

    /// The cached text for a book, if it is usable.
    ///
    /// Records from another cache version, with too little text, or that fail
    /// to decode are all discarded; only a store failure is an error.
    async fn cached_text(&self, book_id: &str) -> Result<Option<HrefText>> {
        let record = match self.store.load(book_id).await {
            Ok(record) => record,
            Err(err) if matches!(&*err, CacheErrorKind::InvalidData(_)) => {
                tracing::warn!(book_id, error = ?err, "Discarding undecodable search cache");
                None
            },
            Err(err) => return Err(err.raise(ErrorKind::Cache)),
        };
        let Some(record) = record else {
            tracing::debug!(book_id, "No search cache");
            return Ok(None);
        };
        if !record.is_current() {
            tracing::info!(book_id, version = record.version, "Discarding search cache from another version");
            return Ok(None);
        }
        let chars = record.total_chars();
        if chars < self.settings.min_cached_chars {
            tracing::info!(book_id, chars, "Discarding search cache with too little text");
            return Ok(None);
        }
        Ok(Some(record.href_text).filter(|href_text| !href_text.is_empty()))
    }
}
impl std::fmt::Debug for SearchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchSession")
            .field("settings", &self.settings)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests;
