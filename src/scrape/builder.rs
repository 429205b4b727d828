//! Builder pattern for scraper configuration.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use zombie_scraper::Scraper;
//! use zombie_scraper::browser::RemoteBrowser;
//! use zombie_scraper::cache::DiskCache;
//! use zombie_scraper::transport::PendingServer;
//!
//! # async fn example() -> zombie_scraper::Result<()> {
//! let browser = RemoteBrowser::accept(PendingServer::bind_localhost(0).await?).await?;
//!
//! let scraper = Scraper::builder()
//!     .remote(browser)
//!     .cache(DiskCache::new("./cache"))
//!     .load_timeout(Duration::from_secs(30))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::browser::{CaptureContext, PageTransport, RemoteBrowser, TabProvider};
use crate::cache::CacheStore;
use crate::capture::{Capturer, DEFAULT_LOAD_TIMEOUT};
use crate::error::{Error, Result};

use super::core::Scraper;

// ============================================================================
// ScraperBuilder
// ============================================================================

/// Builder for configuring a [`Scraper`] instance.
///
/// Use [`Scraper::builder()`] to create a new builder.
#[derive(Clone)]
pub struct ScraperBuilder {
    /// Opens and closes capture tabs.
    tabs: Option<Arc<dyn TabProvider>>,
    /// Serializes loaded pages.
    pages: Option<Arc<dyn PageTransport>>,
    /// Captured markup by URL.
    cache: Option<Arc<dyn CacheStore>>,
    /// Container and window for capture tabs.
    context: Option<CaptureContext>,
    /// Per-tab load timeout.
    load_timeout: Duration,
}

impl Default for ScraperBuilder {
    fn default() -> Self {
        Self {
            tabs: None,
            pages: None,
            cache: None,
            context: None,
            load_timeout: DEFAULT_LOAD_TIMEOUT,
        }
    }
}

impl fmt::Debug for ScraperBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScraperBuilder")
            .field("browser", &self.tabs.is_some())
            .field("transport", &self.pages.is_some())
            .field("cache", &self.cache.is_some())
            .field("context", &self.context)
            .field("load_timeout", &self.load_timeout)
            .finish()
    }
}

// ============================================================================
// ScraperBuilder Implementation
// ============================================================================

impl ScraperBuilder {
    /// Creates a new builder with no collaborators.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tab provider.
    #[inline]
    #[must_use]
    pub fn browser<B: TabProvider + 'static>(mut self, browser: Arc<B>) -> Self {
        self.tabs = Some(browser);
        self
    }

    /// Sets the page transport.
    #[inline]
    #[must_use]
    pub fn transport<P: PageTransport + 'static>(mut self, transport: Arc<P>) -> Self {
        self.pages = Some(transport);
        self
    }

    /// Sets the cache consulted before opening tabs.
    #[inline]
    #[must_use]
    pub fn cache<C: CacheStore + 'static>(mut self, cache: C) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    /// Sets the container and window capture tabs open in.
    #[inline]
    #[must_use]
    pub fn context(mut self, context: CaptureContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Uses an attached extension for tabs, page transport and context.
    ///
    /// Also uses the extension's cache unless one was set before.
    #[must_use]
    pub fn remote(mut self, browser: RemoteBrowser) -> Self {
        if self.cache.is_none() {
            self.cache = Some(Arc::new(browser.cache()));
        }
        self.context = Some(browser.context().clone());

        let browser = Arc::new(browser);
        self.tabs = Some(Arc::clone(&browser) as Arc<dyn TabProvider>);
        self.pages = Some(browser);
        self
    }

    /// Sets how long a tab may take to load (default 60 seconds).
    #[inline]
    #[must_use]
    pub fn load_timeout(mut self, load_timeout: Duration) -> Self {
        self.load_timeout = load_timeout;
        self
    }

    /// Builds the scraper.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if a collaborator or the context is missing
    /// - [`Error::Config`] if the load timeout is zero
    pub fn build(self) -> Result<Scraper> {
        let capturer = self.validate()?;
        Ok(Scraper::new(capturer))
    }
}

// ============================================================================
// Validation
// ============================================================================

impl ScraperBuilder {
    fn validate(self) -> Result<Capturer> {
        let tabs = self.tabs.ok_or_else(|| {
            Error::config(
                "Tab provider is required. Use .browser() or .remote() to set it.\n\
                 Example: Scraper::builder().remote(browser)",
            )
        })?;

        let pages = self.pages.ok_or_else(|| {
            Error::config("Page transport is required. Use .transport() or .remote() to set it.")
        })?;

        let cache = self.cache.ok_or_else(|| {
            Error::config(
                "Cache is required. Use .cache() to set it.\n\
                 Example: Scraper::builder().cache(MemoryCache::new())",
            )
        })?;

        let context = self.context.ok_or_else(|| {
            Error::config("Capture context is required. Use .context() or .remote() to set it.")
        })?;

        if self.load_timeout.is_zero() {
            return Err(Error::config("Load timeout must be greater than zero"));
        }

        Ok(Capturer::new(tabs, pages, cache, context).with_load_timeout(self.load_timeout))
    }
}

// ============================================================================
// Tests
// ============================================================================
