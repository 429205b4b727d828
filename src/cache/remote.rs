//! Cache kept by the extension in its Cache Storage.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;
use tracing::trace;

use crate::error::{Error, Result};
use crate::protocol::{CacheCommand, Command};
use crate::transport::Connection;

use super::CacheStore;

// ============================================================================
// RemoteCache
// ============================================================================

/// Cache backed by the extension's `dom_cache_v1` Cache Storage bucket.
///
/// Entries survive restarts of the Rust side and are shared with anything
/// else the extension serves from that bucket.
#[derive(Debug, Clone)]
pub struct RemoteCache {
    connection: Connection,
}

impl RemoteCache {
    /// Creates a cache that forwards to the extension on `connection`.
    #[inline]
    #[must_use]
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    async fn execute(&self, command: CacheCommand) -> Result<Value> {
        self.connection
            .execute(Command::Cache(command))
            .await
            .map_err(|e| match e {
                Error::Protocol { message } => Error::cache(message),
                other => other,
            })
    }
}

// ============================================================================
// RemoteCache - CacheStore
// ============================================================================

#[async_trait]
impl CacheStore for RemoteCache {
    async fn get(&self, url: &str) -> Result<Option<String>> {
        let result = self
            .execute(CacheCommand::Get {
                url: url.to_string(),
            })
            .await?;

        let doc = match result.get("doc") {
            None | Some(Value::Null) => None,
            Some(Value::String(doc)) => Some(doc.clone()),
            Some(other) => {
                return Err(Error::cache(format!("Unexpected cached value: {other}")));
            }
        };

        trace!(url, hit = doc.is_some(), "Remote cache lookup");
        Ok(doc)
    }

    async fn put(&self, url: &str, markup: &str) -> Result<()> {
        self.execute(CacheCommand::Put {
            url: url.to_string(),
            doc: markup.to_string(),
        })
        .await?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.execute(CacheCommand::Clear).await?;
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
