//! Markup produced by one capture.

use super::Document;

/// Where a capture's markup came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageSource {
    /// Served from the cache, no tab was opened.
    Cache,
    /// Serialized from a freshly loaded tab.
    Network,
}

/// Serialized markup for one URL.
///
/// This is what crosses task boundaries; turn it into a [`Document`] where
/// it is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPage {
    /// URL the capture was requested for.
    pub url: String,
    /// Serialized document markup.
    pub markup: String,
    /// Cache hit or fresh load.
    pub source: PageSource,
}

impl CapturedPage {
    /// Returns `true` if no tab was needed.
    #[inline]
    #[must_use]
    pub fn is_cached(&self) -> bool {
        self.source == PageSource::Cache
    }

    /// Parses the markup with its base URL fixed up.
    #[must_use]
    pub fn to_document(&self) -> Document {
        Document::reconstruct(&self.url, &self.markup)
    }
}
