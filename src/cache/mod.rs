//! URL-keyed store of captured markup.
//!
//! The capture pipeline only needs `get`, `put` and `clear`; keys are the
//! exact URL strings callers asked for.
//!
//! | Backend | Storage |
//! |---------|---------|
//! | [`MemoryCache`] | Process-local map |
//! | [`DiskCache`] | One file per URL under `dom_cache_v1/` |
//! | [`RemoteCache`] | The extension's Cache Storage, over the WebSocket |
//!
//! Concurrent puts for the same key are last-write-wins in every backend.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

// ============================================================================
// Submodules
// ============================================================================

mod disk;
mod memory;
mod remote;

// ============================================================================
// Re-exports
// ============================================================================

pub use disk::DiskCache;
pub use memory::MemoryCache;
pub use remote::RemoteCache;

// ============================================================================
// Constants
// ============================================================================

/// Name of the cache bucket, shared with the extension.
pub const CACHE_NAME: &str = "dom_cache_v1";

// ============================================================================
// CacheStore
// ============================================================================

/// Key/value store mapping a URL to previously captured markup.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Returns the markup stored for `url`, if any.
    async fn get(&self, url: &str) -> Result<Option<String>>;

    /// Stores `markup` under `url`, replacing any previous entry.
    async fn put(&self, url: &str, markup: &str) -> Result<()>;

    /// Removes every entry.
    async fn clear(&self) -> Result<()>;
}

#[async_trait]
impl<C: CacheStore + ?Sized> CacheStore for Arc<C> {
    async fn get(&self, url: &str) -> Result<Option<String>> {
        (**self).get(url).await
    }

    async fn put(&self, url: &str, markup: &str) -> Result<()> {
        (**self).put(url, markup).await
    }

    async fn clear(&self) -> Result<()> {
        (**self).clear().await
    }
}
