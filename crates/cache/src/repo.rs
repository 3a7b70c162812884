//! SQLite-backed [`CacheStore`].

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{SearchCacheRecord, SearchCacheRow};
use crate::store::CacheStore;
use async_trait::async_trait;
use exn::ResultExt;
use sqlx::SqlitePool;
use tracing::instrument;

/// Repository for search cache records.
///
/// In dry-run mode reads go to the database as normal, but writes and
/// deletes are skipped (deletes still report whether a record exists).
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
    dry_run: bool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone(), dry_run: false }
    }
}
impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool, dry_run: bool) -> Self {
        Self { pool, dry_run }
    }

    async fn fetch_row(&self, book_id: &str) -> Result<Option<SearchCacheRow>> {
        sqlx::query_as(include_str!("../queries/get_search_cache.sql"))
            .bind(book_id)
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// List the ids of every book with a cached record, most recently
    /// updated first.
    pub async fn list_book_ids(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(include_str!("../queries/list_search_cache.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }
}

#[async_trait]
impl CacheStore for Repository {
    #[instrument(level = "debug", skip(self))]
    async fn load(&self, book_id: &str) -> Result<Option<SearchCacheRecord>> {
        self.fetch_row(book_id).await?.map(SearchCacheRecord::try_from).transpose()
    }

    #[instrument(level = "debug", skip(self, record), fields(chapters = record.href_text.len()))]
    async fn save(&self, book_id: &str, record: &SearchCacheRecord) -> Result<()> {
        let row = SearchCacheRow::new(book_id, record)?;
        if self.dry_run {
            tracing::info!("Dry run: skipping search cache write");
            return Ok(());
        }
        sqlx::query(include_str!("../queries/upsert_search_cache.sql"))
            .bind(row.book_id)
            .bind(row.version)
            .bind(row.href_text)
            .bind(row.updated_at)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    #[instrument(level = "debug", skip(self))]
    async fn delete(&self, book_id: &str) -> Result<bool> {
        if self.dry_run {
            tracing::info!("Dry run: skipping search cache delete");
            return Ok(self.fetch_row(book_id).await?.is_some());
        }
        let result = sqlx::query(include_str!("../queries/delete_search_cache.sql"))
            .bind(book_id)
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
