use super::*;
use crate::book::MockBook;
use async_trait::async_trait;
use folio_cache::{CacheStore, MemoryStore, SEARCH_CACHE_VERSION};
use futures::TryStreamExt;
use rstest::rstest;
use std::sync::atomic::{AtomicUsize, Ordering};

const FOX: &str = "<html><body>The fox jumps.</body></html>";

/// Enough text to pass the minimum cached size on its own.
fn long_text(word: &str) -> String {
    vec![word; 120].join(" ")
}

fn cached_record(chapters: &[(&str, &str)]) -> SearchCacheRecord {
    SearchCacheRecord::new(chapters.iter().map(|(href, text)| (href.to_string(), text.to_string())).collect())
}

fn book_of(chapters: usize) -> MockBook {
    (0..chapters).fold(MockBook::default(), |book, i| {
        book.chapter(format!("c{i}.xhtml"), format!("<html><body>Chapter {i}</body></html>"))
    })
}

#[derive(Default)]
struct CountingYielder(Arc<AtomicUsize>);
#[async_trait]
impl Yielder for CountingYielder {
    async fn yield_now(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

struct CancellingYielder(CancellationToken);
#[async_trait]
impl Yielder for CancellingYielder {
    async fn yield_now(&self) {
        self.0.cancel();
    }
}

/// Takes the store down the first time the build yields.
struct OutageYielder(Arc<MemoryStore>);
#[async_trait]
impl Yielder for OutageYielder {
    async fn yield_now(&self) {
        self.0.set_unavailable(true);
    }
}

async fn ensure(session: &SearchSession, book: &MockBook) -> (Result<SearchIndex>, Vec<Progress>) {
    let mut progress = Vec::new();
    let result = session.ensure_index("book", book, |p| progress.push(p)).await;
    (result, progress)
}

#[tokio::test]
async fn test_end_to_end() {
    let store = Arc::new(MemoryStore::default());
    let session = SearchSession::new(store.clone());
    let book = MockBook::default().chapter("c1", FOX).failing("c2");

    let (result, progress) = ensure(&session, &book).await;
    let index = result.unwrap();
    assert!(!index.from_cache);
    assert_eq!(index.href_text, HrefText::from([("c1".to_string(), "The fox jumps.".to_string())]));
    assert_eq!(
        index.search("fox"),
        [SearchHit {
            href: "c1".to_string(),
            snippet: "The fox jumps.".to_string(),
            count: 1,
        }]
    );
    assert_eq!(index.index.lookup("jum"), ["c1"]);
    assert_eq!(progress.iter().map(|p| p.done).collect::<Vec<_>>(), [1, 2]);
    assert_eq!(book.loads(), ["c1", "c2"]);

    let saved = store.load("book").await.unwrap().unwrap();
    assert_eq!(saved.version, SEARCH_CACHE_VERSION);
    assert_eq!(saved.href_text, index.href_text);
    assert_eq!(store.saves(), 1);
}

#[tokio::test]
async fn test_cold_build_progress() {
    let session = SearchSession::new(Arc::new(MemoryStore::default()));
    let book = book_of(10);
    let (result, progress) = ensure(&session, &book).await;
    assert_eq!(result.unwrap().href_text.len(), 10);
    assert_eq!(progress.len(), 10);
    assert_eq!(progress.iter().map(|p| p.done).collect::<Vec<_>>(), (1..=10).collect::<Vec<_>>());
    assert!(progress.iter().all(|p| p.total == 10 && !p.from_cache));
    assert_eq!(progress.iter().filter(|p| p.done == p.total).count(), 1);
}

#[tokio::test]
async fn test_missing_and_failing_items_still_report_progress() {
    let session = SearchSession::new(Arc::new(MemoryStore::default()));
    let book = MockBook::default()
        .missing()
        .chapter("c1", FOX)
        .failing("c2")
        .chapter("c3", "<html><body>   </body></html>")
        .chapter("c4", "<p>Last<br>page</p>");
    let (result, progress) = ensure(&session, &book).await;
    let index = result.unwrap();
    assert_eq!(progress.iter().map(|p| p.done).collect::<Vec<_>>(), [1, 2, 3, 4, 5]);
    assert_eq!(index.href_text.keys().collect::<Vec<_>>(), ["c1", "c4"]);
    assert_eq!(index.href_text["c4"], "Lastpage");
    assert!(!index.index.contains("c3"));
}

#[tokio::test]
async fn test_repeated_hrefs_load_once() {
    let yields = Arc::new(AtomicUsize::new(0));
    let session = SearchSession::new(Arc::new(MemoryStore::default()))
        .with_settings(Settings { yield_every: 1, ..Settings::default() })
        .with_yielder(CountingYielder(yields.clone()));
    let book = MockBook::default().chapter("c1", FOX).failing("c2").chapter("c1", FOX).failing("c2");
    let (result, progress) = ensure(&session, &book).await;
    let index = result.unwrap();
    assert_eq!(book.loads(), ["c1", "c2"]);
    assert_eq!(progress.iter().map(|p| p.done).collect::<Vec<_>>(), [1, 2, 3, 4]);
    assert_eq!(yields.load(Ordering::SeqCst), 4);
    assert_eq!(index.href_text, HrefText::from([("c1".to_string(), "The fox jumps.".to_string())]));
    assert_eq!(index.index.len(), 1);
}

#[rstest]
#[case::every_third(3, 9, 3)]
#[case::every_item(1, 4, 4)]
#[case::zero_means_every_item(0, 4, 4)]
#[case::first_item_only(3, 1, 1)]
#[tokio::test]
async fn test_yields(#[case] yield_every: usize, #[case] chapters: usize, #[case] expected: usize) {
    let yields = Arc::new(AtomicUsize::new(0));
    let session = SearchSession::new(Arc::new(MemoryStore::default()))
        .with_settings(Settings { yield_every, ..Settings::default() })
        .with_yielder(CountingYielder(yields.clone()));
    let (result, _) = ensure(&session, &book_of(chapters)).await;
    result.unwrap();
    assert_eq!(yields.load(Ordering::SeqCst), expected);
}

#[tokio::test]
async fn test_missing_hrefs_do_not_yield() {
    let yields = Arc::new(AtomicUsize::new(0));
    let session = SearchSession::new(Arc::new(MemoryStore::default())).with_yielder(CountingYielder(yields.clone()));
    // Index 0 is missing, index 3 failing: only 3 (failing) and 6 yield.
    let book = MockBook::default()
        .missing()
        .chapter("c1", FOX)
        .chapter("c2", FOX)
        .failing("c3")
        .chapter("c4", FOX)
        .chapter("c5", FOX)
        .chapter("c6", FOX);
    let (result, _) = ensure(&session, &book).await;
    result.unwrap();
    assert_eq!(yields.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_cache_hit_is_idempotent_and_never_writes() {
    let record = cached_record(&[("c1", &long_text("cached")), ("c2", "The Fox")]);
    let store = Arc::new(MemoryStore::default().with_record("book", record.clone()));
    let session = SearchSession::new(store.clone());
    let book = MockBook::default().chapter("c1", FOX);

    let (first, first_progress) = ensure(&session, &book).await;
    let (second, _) = ensure(&session, &book).await;
    let (first, second) = (first.unwrap(), second.unwrap());
    assert!(first.from_cache && second.from_cache);
    assert_eq!(first.href_text, record.href_text);
    assert_eq!(first.href_text, second.href_text);
    assert_eq!(first_progress, [Progress { done: 2, total: 2, from_cache: true }]);
    assert_eq!(first.index.lookup("fox"), ["c2"]);
    assert!(book.loads().is_empty());
    assert_eq!(store.saves(), 0);
}

#[tokio::test]
async fn test_cache_hit_skips_empty_chapters() {
    let record = cached_record(&[("c1", &long_text("foxes")), ("c2", "")]);
    let session = SearchSession::new(Arc::new(MemoryStore::default().with_record("book", record.clone())));
    let (result, _) = ensure(&session, &MockBook::default()).await;
    let index = result.unwrap();
    assert!(index.from_cache);
    assert_eq!(index.href_text, record.href_text);
    assert_eq!(index.index.len(), 1);
    assert!(index.index.contains("c1"));
    assert!(!index.index.contains("c2"));
}

#[rstest]
#[case::old_version(SEARCH_CACHE_VERSION - 1, 120)]
#[case::newer_version(SEARCH_CACHE_VERSION + 1, 120)]
#[case::too_little_text(SEARCH_CACHE_VERSION, 10)]
#[tokio::test]
async fn test_invalid_cache_forces_rebuild(#[case] version: u32, #[case] words: usize) {
    let record = SearchCacheRecord {
        version,
        ..cached_record(&[("c1", &vec!["stale"; words].join(" "))])
    };
    let store = Arc::new(MemoryStore::default().with_record("book", record));
    let session = SearchSession::new(store.clone());
    let book = MockBook::default().chapter("c1", FOX);

    let (result, progress) = ensure(&session, &book).await;
    let index = result.unwrap();
    assert!(!index.from_cache);
    assert_eq!(index.href_text["c1"], "The fox jumps.");
    assert_eq!(progress, [Progress { done: 1, total: 1, from_cache: false }]);
    assert_eq!(store.saves(), 1);
    assert_eq!(store.load("book").await.unwrap().unwrap().version, SEARCH_CACHE_VERSION);
}

#[tokio::test]
async fn test_min_cached_chars_is_configurable() {
    let store = Arc::new(MemoryStore::default().with_record("book", cached_record(&[("c1", "tiny")])));
    let session = SearchSession::new(store).with_settings(Settings { min_cached_chars: 4, ..Settings::default() });
    let (result, _) = ensure(&session, &MockBook::default().chapter("c1", FOX)).await;
    assert!(result.unwrap().from_cache);
}

#[tokio::test]
async fn test_empty_cached_map_is_a_miss() {
    let store = Arc::new(MemoryStore::default().with_record("book", cached_record(&[])));
    let session = SearchSession::new(store).with_settings(Settings { min_cached_chars: 0, ..Settings::default() });
    let (result, _) = ensure(&session, &MockBook::default().chapter("c1", FOX)).await;
    assert!(!result.unwrap().from_cache);
}

#[tokio::test]
async fn test_corrupt_cache_forces_rebuild() {
    let store = Arc::new(MemoryStore::default().with_corrupt("book"));
    let session = SearchSession::new(store.clone());
    let (result, _) = ensure(&session, &MockBook::default().chapter("c1", FOX)).await;
    assert!(!result.unwrap().from_cache);
    assert_eq!(store.saves(), 1);
}

#[tokio::test]
async fn test_store_outage_on_load_is_fatal() {
    let session = SearchSession::new(Arc::new(MemoryStore::unavailable()));
    let book = MockBook::default().chapter("c1", FOX);
    let (result, progress) = ensure(&session, &book).await;
    let err = result.unwrap_err();
    assert!(matches!(&*err, ErrorKind::Cache));
    assert!(progress.is_empty());
    assert!(book.loads().is_empty());
}

#[tokio::test]
async fn test_store_outage_on_save_is_fatal() {
    let store = Arc::new(MemoryStore::default());
    let session = SearchSession::new(store.clone()).with_yielder(OutageYielder(store.clone()));
    let (result, progress) = ensure(&session, &book_of(2)).await;
    assert!(matches!(&*result.unwrap_err(), ErrorKind::Cache));
    assert_eq!(progress.len(), 2);
    assert_eq!(store.saves(), 0);
}

#[tokio::test]
async fn test_cancellation_writes_nothing() {
    let token = CancellationToken::new();
    let store = Arc::new(MemoryStore::default());
    let session = SearchSession::new(store.clone())
        .with_cancellation(token.clone())
        .with_yielder(CancellingYielder(token));
    let book = book_of(5);
    let (result, progress) = ensure(&session, &book).await;
    assert!(matches!(&*result.unwrap_err(), ErrorKind::Cancelled));
    assert_eq!(book.loads(), ["c0.xhtml"]);
    assert_eq!(progress.len(), 1);
    assert_eq!(store.saves(), 0);
    assert_eq!(store.load("book").await.unwrap(), None);
}

#[tokio::test]
async fn test_cancelled_before_save() {
    let token = CancellationToken::new();
    token.cancel();
    let store = Arc::new(MemoryStore::default());
    let session = SearchSession::new(store.clone()).with_cancellation(token);
    let (result, _) = ensure(&session, &MockBook::default().missing()).await;
    assert!(matches!(&*result.unwrap_err(), ErrorKind::Cancelled));
    assert_eq!(store.saves(), 0);
}

#[tokio::test]
async fn test_cancellation_does_not_affect_cache_hits() {
    let token = CancellationToken::new();
    token.cancel();
    let store = Arc::new(MemoryStore::default().with_record("book", cached_record(&[("c1", &long_text("foxes"))])));
    let session = SearchSession::new(store).with_cancellation(token);
    let (result, _) = ensure(&session, &MockBook::default()).await;
    assert!(result.unwrap().from_cache);
}

#[tokio::test]
async fn test_event_order_for_cache_hit() {
    let store = Arc::new(MemoryStore::default().with_record("book", cached_record(&[("c1", &long_text("foxes"))])));
    let session = SearchSession::new(store);
    let book = MockBook::default();
    let events = session.index("book", &book).try_collect::<Vec<_>>().await.unwrap();
    assert!(matches!(
        events.as_slice(),
        [
            IndexEvent::CheckingCache,
            IndexEvent::CacheHit { chapters: 1 },
            IndexEvent::Progress(Progress { done: 1, total: 1, from_cache: true }),
            IndexEvent::Ready(SearchIndex { from_cache: true, .. }),
        ]
    ));
}

#[tokio::test]
async fn test_event_order_for_cold_build() {
    let session = SearchSession::new(Arc::new(MemoryStore::default()));
    let book = book_of(2);
    let events = session.index("book", &book).try_collect::<Vec<_>>().await.unwrap();
    assert!(matches!(
        events.as_slice(),
        [
            IndexEvent::CheckingCache,
            IndexEvent::ColdBuild { total: 2 },
            IndexEvent::Progress(Progress { done: 1, .. }),
            IndexEvent::Progress(Progress { done: 2, .. }),
            IndexEvent::Ready(SearchIndex { from_cache: false, .. }),
        ]
    ));
}

#[tokio::test]
async fn test_empty_spine() {
    let store = Arc::new(MemoryStore::default());
    let session = SearchSession::new(store.clone());
    let (result, progress) = ensure(&session, &MockBook::default()).await;
    let index = result.unwrap();
    assert!(index.href_text.is_empty());
    assert!(index.index.is_empty());
    assert!(progress.is_empty());
    assert_eq!(store.saves(), 1);
}

#[tokio::test]
async fn test_books_are_independent() {
    let store = Arc::new(MemoryStore::default());
    let session = SearchSession::new(store.clone());
    let one = MockBook::default().chapter("c1", FOX);
    let two = MockBook::default().chapter("c1", "<p>A quiet dog.</p>");
    let (first, second) = futures::join!(
        session.ensure_index("one", &one, |_| {}),
        session.ensure_index("two", &two, |_| {}),
    );
    assert_eq!(first.unwrap().href_text["c1"], "The fox jumps.");
    assert_eq!(second.unwrap().href_text["c1"], "A quiet dog.");
    assert_eq!(store.saves(), 2);
}

#[tokio::test]
async fn test_forget() {
    let store = Arc::new(MemoryStore::default().with_record("book", cached_record(&[("c1", "text")])));
    let session = SearchSession::new(store.clone());
    assert!(session.forget("book").await.unwrap());
    assert!(!session.forget("book").await.unwrap());
    store.set_unavailable(true);
    assert!(matches!(&*session.forget("book").await.unwrap_err(), ErrorKind::Cache));
}
