//! A book made of a directory of already-unpacked chapter documents.

use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use folio_extract::RawContent;
use folio_search::error::{ErrorKind as SearchErrorKind, Result as SearchResult};
use folio_search::{Book, SpineItem};
use std::path::{Path, PathBuf};
use tracing::instrument;

const CHAPTER_EXTENSIONS: &[&str] = &["xhtml", "html", "htm", "xml"];

fn is_chapter(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| CHAPTER_EXTENSIONS.iter().any(|c| ext.eq_ignore_ascii_case(c)))
}

/// `/`-separated path of `path` relative to `root`, if it is valid UTF-8.
fn href(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts = relative.components().map(|c| c.as_os_str().to_str()).collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

/// Chapter documents under a directory, read in file name order.
///
/// Every `.xhtml`, `.html`, `.htm` or `.xml` file below the root (hidden files
/// and directories excluded) is a spine item; the spine is sorted by relative
/// path.
#[derive(Debug, Clone)]
pub struct DirectoryBook {
    root: PathBuf,
    hrefs: Vec<String>,
}

impl DirectoryBook {
    #[instrument(skip_all, fields(root = %root.as_ref().display()))]
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let mut hrefs = Vec::new();
        let mut pending = vec![root.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await.or_raise(|| ErrorKind::Book(dir.clone()))?;
            while let Some(entry) = entries.next_entry().await.or_raise(|| ErrorKind::Book(dir.clone()))? {
                let path = entry.path();
                if entry.file_name().to_string_lossy().starts_with('.') {
                    continue;
                }
                let file_type = entry.file_type().await.or_raise(|| ErrorKind::Book(path.clone()))?;
                if file_type.is_dir() {
                    pending.push(path);
                } else if is_chapter(&path) {
                    match href(&root, &path) {
                        Some(href) => hrefs.push(href),
                        None => tracing::warn!(path = %path.display(), "Skipping chapter with non UTF-8 path"),
                    }
                }
            }
        }
        hrefs.sort();
        tracing::debug!(chapters = hrefs.len(), "Opened directory book");
        Ok(Self { root, hrefs })
    }

    /// BLAKE3 fingerprint of every chapter's href and contents.
    ///
    /// Editing, adding, removing or renaming a chapter changes the
    /// fingerprint, so the old cache entry is simply never looked up again.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn fingerprint(&self) -> Result<String> {
        let mut hasher = blake3::Hasher::new();
        for href in &self.hrefs {
            let path = self.root.join(href);
            let bytes = tokio::fs::read(&path).await.or_raise(|| ErrorKind::Book(path))?;
            hasher.update(href.as_bytes());
            hasher.update(&[0]);
            hasher.update(&(bytes.len() as u64).to_le_bytes());
            hasher.update(&bytes);
        }
        Ok(hasher.finalize().to_hex().to_string())
    }
}

#[async_trait]
impl Book for DirectoryBook {
    fn spine(&self) -> Vec<SpineItem> {
        self.hrefs.iter().map(SpineItem::new).collect()
    }

    async fn load(&self, href: &str) -> SearchResult<RawContent> {
        let bytes = tokio::fs::read(self.root.join(href))
            .await
            .or_raise(|| SearchErrorKind::ChapterLoad(href.to_string()))?;
        Ok(RawContent::from(bytes))
    }
}
