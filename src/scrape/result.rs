//! Result envelope returned by [`Scraper::scrape`](super::Scraper::scrape).

use serde::{Deserialize, Serialize};

/// Caller-extracted value together with where and when it was captured.
///
/// Serializes as `{ "url", "fetchedAt", "result" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapingResult<T> {
    /// URL that was scraped.
    pub url: String,
    /// Capture completion time, seconds since the Unix epoch.
    pub fetched_at: u64,
    /// Output of the extraction function.
    pub result: T,
}

impl<T> ScrapingResult<T> {
    /// Creates an envelope.
    #[inline]
    #[must_use]
    pub fn new(url: impl Into<String>, fetched_at: u64, result: T) -> Self {
        Self {
            url: url.into(),
            fetched_at,
            result,
        }
    }

    /// Transforms the extracted value, keeping url and timestamp.
    pub fn map<U, F>(self, f: F) -> ScrapingResult<U>
    where
        F: FnOnce(T) -> U,
    {
        ScrapingResult {
            url: self.url,
            fetched_at: self.fetched_at,
            result: f(self.result),
        }
    }
}
