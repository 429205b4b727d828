//! In-process cache backend.

use async_trait::async_trait;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::Result;

use super::CacheStore;

/// Cache held in a process-local map.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<FxHashMap<String, String>>,
}

impl MemoryCache {
    /// Creates an empty cache.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of cached URLs.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing is cached.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn get(&self, url: &str) -> Result<Option<String>> {
        Ok(self.entries.read().get(url).cloned())
    }

    async fn put(&self, url: &str, markup: &str) -> Result<()> {
        self.entries
            .write()
            .insert(url.to_string(), markup.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().clear();
        Ok(())
    }
}
