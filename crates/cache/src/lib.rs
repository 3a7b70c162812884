//! Durable storage for extracted book text.
//!
//! Search sessions persist the plain text of every chapter they extract, so
//! later sessions can rebuild their index without touching the book again.
//! The cache is never the source of truth: a missing, stale or corrupt
//! record only costs a rebuild.
//!
//! - [`CacheStore`] is the seam search sessions depend on.
//! - [`Repository`] implements it on top of a SQLite [`Database`].
//! - `MemoryStore` (feature `mock`) implements it in memory for tests.

mod db;
pub mod error;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod models;
mod repo;
mod store;

pub use crate::db::Database;
#[cfg(any(test, feature = "mock"))]
pub use crate::mock::MemoryStore;
pub use crate::models::{HrefText, SEARCH_CACHE_VERSION, SearchCacheRecord};
pub use crate::repo::Repository;
pub use crate::store::{CacheStore, StoreHandle};
