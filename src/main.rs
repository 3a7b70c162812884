//! folio - offline full-text search for unpacked EPUB books

mod book;
mod cli;
mod error;

use crate::book::DirectoryBook;
use crate::cli::{Cli, Command};
use crate::error::{ErrorKind, Result};
use clap::Parser;
use exn::ResultExt;
use folio_cache::{Database, Repository};
use folio_config::{Config, LogConfig};
use folio_search::{Progress, SearchIndex, SearchSession};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: u8, log: &LogConfig) -> Result<()> {
    // -v flags win over RUST_LOG, which wins over the configured level.
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&log.level))
            .or_raise(|| ErrorKind::Logging)?,
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(log.ansi)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|_| exn::Exn::from(ErrorKind::Logging))
}

fn report(err: exn::Exn<ErrorKind>) -> miette::Report {
    miette::miette!("{err:?}")
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config).map_err(report)?;
    init_tracing(cli.verbose, &config.log).map_err(report)?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .or_raise(|| ErrorKind::Runtime)
        .map_err(report)?;
    runtime.block_on(run(cli.command, config)).map_err(report)
}

async fn open_cache(path: &Path) -> Result<Database> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.or_raise(|| ErrorKind::Cache)?;
    }
    Database::connect(path).await.or_raise(|| ErrorKind::Cache)
}

/// Cancel `token` on Ctrl-C, so an interrupted build leaves the cache as it was.
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; stopping after the current chapter");
            token.cancel();
        }
    });
}

async fn run(command: Command, config: Config) -> Result<()> {
    let db = open_cache(&config.database).await?;
    let result = match command {
        Command::Index { dir, book_id, dry_run } => index(&db, &config, &dir, book_id, dry_run).await,
        Command::Search { dir, query, book_id, limit } => search(&db, &config, &dir, book_id, &query, limit).await,
        Command::List => list(&db).await,
        Command::Forget { book_id } => forget(&db, &book_id).await,
    };
    db.close().await;
    result
}

async fn ensure_index(
    db: &Database,
    config: &Config,
    dir: &Path,
    book_id: Option<String>,
    dry_run: bool,
    mut on_progress: impl FnMut(Progress),
) -> Result<(String, SearchIndex)> {
    let book = DirectoryBook::open(dir).await?;
    let book_id = match book_id {
        Some(book_id) => book_id,
        None => book.fingerprint().await?,
    };
    let token = CancellationToken::new();
    cancel_on_interrupt(token.clone());
    let session = SearchSession::new(Arc::new(Repository::new(db.pool().clone(), dry_run)))
        .with_settings(config.search)
        .with_cancellation(token);
    let index = session.ensure_index(&book_id, &book, &mut on_progress).await.or_raise(|| ErrorKind::Search)?;
    Ok((book_id, index))
}

async fn index(db: &Database, config: &Config, dir: &Path, book_id: Option<String>, dry_run: bool) -> Result<()> {
    let mut stderr = std::io::stderr();
    let (book_id, index) = ensure_index(db, config, dir, book_id, dry_run, |progress| {
        if !progress.from_cache {
            _ = write!(stderr, "\rExtracting chapter {}/{}", progress.done, progress.total);
            if progress.done == progress.total {
                _ = writeln!(stderr);
            }
        }
    })
    .await?;
    let chars = index.href_text.values().map(|text| text.chars().count()).sum::<usize>();
    let source = if index.from_cache { "cache" } else { "book" };
    println!("{book_id}");
    eprintln!("{} chapters, {chars} characters of text (from {source})", index.href_text.len());
    Ok(())
}

async fn search(
    db: &Database,
    config: &Config,
    dir: &Path,
    book_id: Option<String>,
    query: &str,
    limit: usize,
) -> Result<()> {
    let (_, index) = ensure_index(db, config, dir, book_id, false, |_| {}).await?;
    let hits = index.search(query);
    if hits.is_empty() {
        eprintln!("No matches for {query:?}");
        return Ok(());
    }
    let total = hits.iter().map(|hit| hit.count).sum::<usize>();
    eprintln!("{total} matches in {} chapters", hits.len());
    for hit in hits.iter().take(limit) {
        println!("{:>5}  {}", hit.count, hit.href);
        println!("       {}", hit.snippet);
    }
    Ok(())
}

async fn cached_books(db: &Database) -> Result<Vec<String>> {
    Repository::from(db).list_book_ids().await.or_raise(|| ErrorKind::Cache)
}

async fn list(db: &Database) -> Result<()> {
    let book_ids = cached_books(db).await?;
    if book_ids.is_empty() {
        eprintln!("No books cached");
    }
    for book_id in book_ids {
        println!("{book_id}");
    }
    Ok(())
}

async fn forget(db: &Database, book_id: &str) -> Result<()> {
    let session = SearchSession::new(Arc::new(Repository::from(db)));
    if session.forget(book_id).await.or_raise(|| ErrorKind::Search)? {
        eprintln!("Forgot {book_id}");
    } else {
        eprintln!("Nothing cached for {book_id}");
    }
    Ok(())
}
