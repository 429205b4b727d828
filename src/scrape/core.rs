//! Scraping facade.
//!
//! [`Scraper`] is what host code and user scripts call. It queues one
//! capture per request, rebuilds the document on the caller's task and
//! runs the caller's extraction on it.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::browser::CaptureContext;
use crate::capture::{CaptureQueue, Capturer, Document};
use crate::error::{Error, Result};

use super::builder::ScraperBuilder;
use super::result::ScrapingResult;

// ============================================================================
// Scraper
// ============================================================================

/// Internal shared state.
struct ScraperInner {
    queue: CaptureQueue,
    capturer: Capturer,
}

/// Entry point for scraping pages through the bounded capture queue.
///
/// Cheap to clone; clones share the queue.
#[derive(Clone)]
pub struct Scraper {
    inner: Arc<ScraperInner>,
}

impl fmt::Debug for Scraper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scraper")
            .field("capturer", &self.inner.capturer)
            .field("queue", &self.inner.queue)
            .finish()
    }
}

impl Scraper {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> ScraperBuilder {
        ScraperBuilder::new()
    }

    pub(crate) fn new(capturer: Capturer) -> Self {
        let queue = CaptureQueue::new(Arc::new(capturer.clone()));
        Self {
            inner: Arc::new(ScraperInner { queue, capturer }),
        }
    }

    /// Scrapes `url` and applies `extract` to the captured document.
    ///
    /// An empty `url` is rejected before anything is queued.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyUrl`], or whatever the capture failed with.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example(scraper: zombie_scraper::Scraper) -> zombie_scraper::Result<()> {
    /// let scraped = scraper
    ///     .scrape("https://example.com", |doc| doc.select("h1"))
    ///     .await?;
    /// println!("{} at {}: {:?}", scraped.url, scraped.fetched_at, scraped.result?);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn scrape<T, F>(&self, url: &str, extract: F) -> Result<ScrapingResult<T>>
    where
        F: FnOnce(&Document) -> T,
    {
        if url.is_empty() {
            return Err(Error::EmptyUrl);
        }

        let page = self.inner.queue.capture(url).await?;
        let fetched_at = unix_now();

        let document = page.to_document();
        let result = extract(&document);

        debug!(url, fetched_at, cached = page.is_cached(), "Scraped");
        Ok(ScrapingResult::new(url, fetched_at, result))
    }

    /// Captures `url` through the queue and returns the document itself.
    ///
    /// # Errors
    ///
    /// Same as [`Self::scrape`].
    pub async fn capture(&self, url: &str) -> Result<Document> {
        if url.is_empty() {
            return Err(Error::EmptyUrl);
        }

        let page = self.inner.queue.capture(url).await?;
        Ok(page.to_document())
    }

    /// Removes every cached capture.
    ///
    /// # Errors
    ///
    /// Returns the cache backend's error.
    pub async fn clear_cache(&self) -> Result<()> {
        self.inner.capturer.cache().clear().await?;
        debug!("Cache cleared");
        Ok(())
    }

    /// Returns the context capture tabs open in.
    #[inline]
    #[must_use]
    pub fn context(&self) -> &CaptureContext {
        self.inner.capturer.context()
    }

    /// Returns the number of captures running right now.
    #[inline]
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.inner.queue.open_count()
    }

    /// Returns the number of captures waiting for a slot.
    #[inline]
    #[must_use]
    pub fn waiting_count(&self) -> usize {
        self.inner.queue.waiting_count()
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Current time in whole seconds since the Unix epoch.
fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}

// ============================================================================
// Tests
// ============================================================================
