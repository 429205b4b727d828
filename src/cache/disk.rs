//! File-per-URL cache backend.
//!
//! Entries live in `<root>/dom_cache_v1/<uuid-v5(url)>.html`, which keeps file
//! names short whatever the URL length. Writes land
//! in a uniquely named temp file that is renamed over the entry, so readers
//! never observe a partially written document. A `clear` that removes the
//! directory in the middle of a write makes that write start over once.

// ============================================================================
// Imports
// ============================================================================

use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::error::{Error, Result};

use super::{CACHE_NAME, CacheStore};

// ============================================================================
// DiskCache
// ============================================================================

/// Cache persisted as one file per URL.
#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    /// Creates a cache rooted at `root`. Nothing is touched until the first put.
    #[must_use]
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            dir: root.as_ref().join(CACHE_NAME),
        }
    }

    /// Returns the directory entries are stored in.
    #[inline]
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry for `url`.
    fn entry_path(&self, url: &str) -> PathBuf {
        let key = Uuid::new_v5(&Uuid::NAMESPACE_URL, url.as_bytes());
        self.dir.join(format!("{key}.html"))
    }

    /// Writes `markup` to a fresh temp file in the cache directory.
    async fn write_temp(&self, markup: &str) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.dir).await?;
        let tmp = self.dir.join(format!(".{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, markup).await?;
        Ok(tmp)
    }

    /// Moves a temp file over the entry for `url`.
    async fn commit(&self, tmp: &Path, url: &str) -> io::Result<()> {
        let result = fs::rename(tmp, self.entry_path(url)).await;
        if result.is_err() {
            let _ = fs::remove_file(tmp).await;
        }
        result
    }

    async fn store(&self, url: &str, markup: &str) -> io::Result<()> {
        let tmp = self.write_temp(markup).await?;
        self.commit(&tmp, url).await
    }
}

#[async_trait]
impl CacheStore for DiskCache {
    async fn get(&self, url: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.entry_path(url)).await {
            Ok(markup) => {
                trace!(url, "Disk cache hit");
                Ok(Some(markup))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::cache(format!("Failed to read entry for {url}: {e}"))),
        }
    }

    async fn put(&self, url: &str, markup: &str) -> Result<()> {
        let stored = match self.store(url, markup).await {
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(url, "Cache directory removed during write, retrying");
                self.store(url, markup).await
            }
            other => other,
        };
        stored.map_err(|e| Error::cache(format!("Failed to store entry for {url}: {e}")))?;

        trace!(url, bytes = markup.len(), "Disk cache entry stored");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        match fs::remove_dir_all(&self.dir).await {
            Ok(()) => {
                debug!(dir = %self.dir.display(), "Disk cache cleared");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::cache(format!(
                "Failed to clear {}: {e}",
                self.dir.display()
            ))),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
