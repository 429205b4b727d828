//! Tab lifecycle state machine for a single capture.
//!
//! ```text
//! CheckCache ──hit──────────────────────────────────────────────► Done
//!     │ miss
//!     ▼
//! OpeningTab ─► WaitingForLoad ─► RequestingDom ─► ClosingTab ─► Done
//!                     │                 │
//!                     │ closed/timeout  │ transport error
//!                     ▼                 ▼
//!                   Failed            Failed
//! ```
//!
//! Waiting for the load races three outcomes: the tab reports a finished
//! load of the real page, the tab is closed by someone else, or the load
//! timeout elapses. Whatever happens, the tab opened for the capture is
//! gone when [`Capturer::run`] returns.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::browser::{CaptureContext, PageTransport, TabEvent, TabEvents, TabProvider};
use crate::cache::CacheStore;
use crate::error::{Error, Result};
use crate::identifiers::TabId;

use super::{CapturedPage, PageCapture, PageSource};

// ============================================================================
// Constants
// ============================================================================

/// How long a tab may take to finish loading (60 seconds).
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(60);

// ============================================================================
// CaptureState
// ============================================================================

/// Steps of one capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    /// Looking the URL up in the cache.
    CheckCache,
    /// Opening an inactive tab in the capture context.
    OpeningTab,
    /// Racing load completion, user close and the timeout.
    WaitingForLoad,
    /// Asking the page to serialize itself.
    RequestingDom,
    /// Closing the tab after a successful serialization.
    ClosingTab,
    /// Markup produced.
    Done,
    /// Capture failed.
    Failed,
}

impl CaptureState {
    /// Returns the state name used in logs.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::CheckCache => "check_cache",
            Self::OpeningTab => "opening_tab",
            Self::WaitingForLoad => "waiting_for_load",
            Self::RequestingDom => "requesting_dom",
            Self::ClosingTab => "closing_tab",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Returns `true` for [`Self::Done`] and [`Self::Failed`].
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for CaptureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How waiting for the load ended, short of the timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadOutcome {
    Loaded,
    ClosedExternally,
}

// ============================================================================
// Capturer
// ============================================================================

/// Produces captured markup for a URL, from cache or from a real tab.
///
/// Cheap to clone; collaborators are shared.
#[derive(Clone)]
pub struct Capturer {
    tabs: Arc<dyn TabProvider>,
    pages: Arc<dyn PageTransport>,
    cache: Arc<dyn CacheStore>,
    context: CaptureContext,
    load_timeout: Duration,
}

impl fmt::Debug for Capturer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capturer")
            .field("context", &self.context)
            .field("load_timeout", &self.load_timeout)
            .finish_non_exhaustive()
    }
}

impl Capturer {
    /// Creates a capturer opening tabs in `context`.
    #[must_use]
    pub fn new(
        tabs: Arc<dyn TabProvider>,
        pages: Arc<dyn PageTransport>,
        cache: Arc<dyn CacheStore>,
        context: CaptureContext,
    ) -> Self {
        Self {
            tabs,
            pages,
            cache,
            context,
            load_timeout: DEFAULT_LOAD_TIMEOUT,
        }
    }

    /// Sets how long a tab may take to load.
    #[must_use]
    pub fn with_load_timeout(mut self, load_timeout: Duration) -> Self {
        self.load_timeout = load_timeout;
        self
    }

    /// Returns the context tabs are opened in.
    #[inline]
    #[must_use]
    pub fn context(&self) -> &CaptureContext {
        &self.context
    }

    /// Returns the load timeout.
    #[inline]
    #[must_use]
    pub fn load_timeout(&self) -> Duration {
        self.load_timeout
    }

    /// Returns the cache consulted before opening tabs.
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    /// Captures `url`.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyUrl`] if `url` is empty
    /// - [`Error::TabClosed`] if the tab was closed before it finished loading
    /// - [`Error::LoadTimeout`] if it did not finish within the load timeout
    /// - [`Error::Transport`] if the page's reply was unusable
    /// - any cache or browser error, unchanged
    pub async fn run(&self, url: &str) -> Result<CapturedPage> {
        if url.is_empty() {
            return Err(Error::EmptyUrl);
        }

        let mut state = CaptureState::CheckCache;
        let result = self.drive(url, &mut state).await;

        match &result {
            Ok(page) => {
                self.transition(&mut state, CaptureState::Done, url);
                debug!(url, cached = page.is_cached(), "Capture done");
            }
            Err(e) => {
                let failed_in = state;
                self.transition(&mut state, CaptureState::Failed, url);
                debug!(url, state = %failed_in, error = %e, "Capture failed");
            }
        }

        result
    }

    async fn drive(&self, url: &str, state: &mut CaptureState) -> Result<CapturedPage> {
        trace!(url, state = %state, "Capture started");

        if let Some(markup) = self.cache.get(url).await? {
            return Ok(CapturedPage {
                url: url.to_string(),
                markup,
                source: PageSource::Cache,
            });
        }

        self.transition(state, CaptureState::OpeningTab, url);
        // Subscribe first so a fast load cannot slip past
        let mut events = self.tabs.subscribe();
        let tab_id = self.tabs.create_tab(&self.context, url).await?;

        self.transition(state, CaptureState::WaitingForLoad, url);
        let waited = timeout(
            self.load_timeout,
            wait_for_load(self.tabs.as_ref(), &mut events, tab_id),
        ).await;
        drop(events);

        match waited {
            Ok(Ok(LoadOutcome::Loaded)) => {}
            Ok(Ok(LoadOutcome::ClosedExternally)) => {
                return Err(Error::tab_closed(tab_id));
            }
            Ok(Err(e)) => {
                self.close_after_failure(tab_id, url).await;
                return Err(e);
            }
            Err(_) => {
                self.close_after_failure(tab_id, url).await;
                return Err(Error::load_timeout(url, duration_ms(self.load_timeout)));
            }
        }

        self.transition(state, CaptureState::RequestingDom, url);
        let document = match self.pages.request_dom(tab_id).await {
            Ok(document) => document,
            Err(e) => {
                self.close_after_failure(tab_id, url).await;
                return Err(e);
            }
        };

        self.transition(state, CaptureState::ClosingTab, url);
        self.tabs.remove_tab(tab_id).await?;

        let markup = document.serialized_document;
        self.cache.put(url, &markup).await?;

        Ok(CapturedPage {
            url: url.to_string(),
            markup,
            source: PageSource::Network,
        })
    }

    /// Closes a tab the capture still owns on a failure path.
    ///
    /// A failure here is logged; the caller sees the primary error.
    async fn close_after_failure(&self, tab_id: TabId, url: &str) {
        if let Err(e) = self.tabs.remove_tab(tab_id).await {
            warn!(%tab_id, url, error = %e, "Failed to close capture tab");
        }
    }

    fn transition(&self, state: &mut CaptureState, next: CaptureState, url: &str) {
        debug_assert!(!state.is_terminal());
        trace!(url, from = %state, to = %next, "Capture state");
        *state = next;
    }
}

#[async_trait]
impl PageCapture for Capturer {
    async fn capture(&self, url: &str) -> Result<CapturedPage> {
        self.run(url).await
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Waits for the first decisive event about `tab_id`.
///
/// When events were dropped the tab's current state stands in for them.
async fn wait_for_load(
    tabs: &dyn TabProvider,
    events: &mut TabEvents,
    tab_id: TabId,
) -> Result<LoadOutcome> {
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(Error::EventsLagged { skipped }) => {
                debug!(%tab_id, skipped, "Re-checking tab after missed events");
                match tabs.last_event(tab_id) {
                    Some(event) => event,
                    None => continue,
                }
            }
            Err(e) => return Err(e),
        };
        if event.tab_id() != tab_id {
            continue;
        }

        match event {
            TabEvent::Removed { .. } => return Ok(LoadOutcome::ClosedExternally),
            ref updated if updated.is_load_complete() => return Ok(LoadOutcome::Loaded),
            _ => {}
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::browser::TabStatus;
    use crate::browser::testing::{FakeBrowser, LoadMode};
    use crate::cache::MemoryCache;

    const URL: &str = "https://example.test/page";

    fn setup(mode: LoadMode) -> (Capturer, Arc<FakeBrowser>, Arc<MemoryCache>) {
        setup_with(FakeBrowser::new(mode))
    }

    fn setup_with(browser: FakeBrowser) -> (Capturer, Arc<FakeBrowser>, Arc<MemoryCache>) {
        let browser = Arc::new(browser);
        let cache = Arc::new(MemoryCache::new());
        let capturer = Capturer::new(
            Arc::clone(&browser) as Arc<dyn TabProvider>,
            Arc::clone(&browser) as Arc<dyn PageTransport>,
            Arc::clone(&cache) as Arc<dyn CacheStore>,
            FakeBrowser::context(),
        );
        (capturer, browser, cache)
    }

    #[tokio::test]
    async fn test_empty_url() {
        let (capturer, browser, _) = setup(LoadMode::AutoComplete);
        assert!(matches!(capturer.run("").await, Err(Error::EmptyUrl)));
        assert!(browser.created().is_empty());
    }

    #[tokio::test]
    async fn test_cache_hit_opens_no_tab() {
        let (capturer, browser, cache) = setup(LoadMode::AutoComplete);
        cache.put(URL, "<p>cached</p>").await.expect("put");

        let page = capturer.run(URL).await.expect("captured");
        assert_eq!(page.markup, "<p>cached</p>");
        assert!(page.is_cached());
        assert!(browser.created().is_empty());
        assert_eq!(browser.peak_open(), 0);
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let (capturer, browser, cache) = setup(LoadMode::AutoComplete);

        let fresh = capturer.run(URL).await.expect("captured");
        assert_eq!(fresh.source, PageSource::Network);
        assert_eq!(fresh.markup, FakeBrowser::default_markup(URL));
        assert_eq!(cache.len(), 1);

        let cached = capturer.run(URL).await.expect("captured");
        assert!(cached.is_cached());
        assert_eq!(cached.markup, fresh.markup);

        assert_eq!(browser.created(), [URL]);
        assert_eq!(browser.removed().len(), 1);
        assert_eq!(browser.open_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_timeout_closes_tab() {
        let (capturer, browser, cache) = setup(LoadMode::Manual);

        let err = capturer.run(URL).await.expect_err("should time out");
        assert!(matches!(
            err,
            Error::LoadTimeout { ref url, timeout_ms: 60_000 } if url == URL
        ));

        assert_eq!(browser.created().len(), 1);
        assert_eq!(browser.removed().len(), 1);
        assert_eq!(browser.open_count(), 0);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_load_timeout() {
        let (capturer, _browser, _) = setup(LoadMode::Manual);
        let capturer = capturer.with_load_timeout(Duration::from_secs(5));

        let started = tokio::time::Instant::now();
        let err = capturer.run(URL).await.expect_err("should time out");
        assert!(err.is_timeout());
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(5));
        assert!(elapsed < Duration::from_secs(6));
    }

    #[tokio::test]
    async fn test_closed_by_user_is_not_closed_again() {
        let (capturer, browser, cache) = setup(LoadMode::Manual);

        let handle = tokio::spawn(async move { capturer.run(URL).await });
        browser.wait_for_tabs(1).await;
        let tab_id = browser.open_tabs()[0];
        browser.close_by_user(tab_id);

        let err = handle.await.expect("join").expect_err("should fail");
        assert!(matches!(err, Error::TabClosed { tab_id: t } if t == tab_id));
        assert!(browser.removed().is_empty());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_reply_closes_tab() {
        let (capturer, browser, cache) = setup(LoadMode::AutoComplete);
        browser.reply_with(URL, json!({ "status": "ok" }));

        let err = capturer.run(URL).await.expect_err("should fail");
        assert!(matches!(err, Error::Transport { .. }));
        assert_eq!(browser.removed().len(), 1);
        assert_eq!(browser.open_count(), 0);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_ignores_other_tabs() {
        let (capturer, browser, _) = setup(LoadMode::Manual);

        let first = tokio::spawn({
            let capturer = capturer.clone();
            async move { capturer.run("https://example.test/1").await }
        });
        browser.wait_for_tabs(1).await;

        let second = tokio::spawn({
            let capturer = capturer.clone();
            async move { capturer.run("https://example.test/2").await }
        });
        browser.wait_for_tabs(2).await;

        let tabs = browser.open_tabs();
        browser.complete(tabs[1]);
        let page = second.await.expect("join").expect("captured");
        assert_eq!(page.url, "https://example.test/2");
        assert!(!first.is_finished());

        browser.complete(tabs[0]);
        let page = first.await.expect("join").expect("captured");
        assert_eq!(page.url, "https://example.test/1");
        assert_eq!(browser.open_count(), 0);
    }

    #[tokio::test]
    async fn test_tab_gone_before_dom_request() {
        let (capturer, browser, cache) = setup(LoadMode::Manual);

        let handle = tokio::spawn(async move { capturer.run(URL).await });
        browser.wait_for_tabs(1).await;
        let tab_id = browser.open_tabs()[0];

        // Loads, then disappears before the capture gets to run again
        browser.complete(tab_id);
        browser.close_by_user(tab_id);

        let err = handle.await.expect("join").expect_err("should fail");
        assert!(matches!(err, Error::Transport { .. }));
        // The forced close was attempted and its failure swallowed
        assert_eq!(browser.removed(), [tab_id]);
        assert_eq!(browser.open_count(), 0);
        assert!(cache.is_empty());
    }

    /// Pushes `count` events about an unrelated tab.
    fn flood(browser: &FakeBrowser, count: usize) {
        let other = TabId::new(99).expect("valid tab id");
        for _ in 0..count {
            browser.publish(TabEvent::Updated {
                tab_id: other,
                status: TabStatus::Loading,
                url: "https://other.test/".to_string(),
            });
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_lost_to_lag_fails_fast() {
        let (capturer, browser, cache) =
            setup_with(FakeBrowser::with_event_capacity(LoadMode::Manual, 2));

        let handle = tokio::spawn(async move { capturer.run(URL).await });
        browser.wait_for_tabs(1).await;
        let tab_id = browser.open_tabs()[0];

        // Removed falls out of the buffer before the capture sees it
        browser.close_by_user(tab_id);
        flood(&browser, 4);

        let err = handle.await.expect("join").expect_err("should fail");
        assert!(matches!(err, Error::TabClosed { tab_id: t } if t == tab_id));
        assert!(browser.removed().is_empty());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_lost_to_lag_still_captures() {
        let (capturer, browser, cache) =
            setup_with(FakeBrowser::with_event_capacity(LoadMode::Manual, 2));

        let handle = tokio::spawn(async move { capturer.run(URL).await });
        browser.wait_for_tabs(1).await;
        let tab_id = browser.open_tabs()[0];

        browser.complete(tab_id);
        flood(&browser, 4);

        let page = handle.await.expect("join").expect("captured");
        assert_eq!(page.source, PageSource::Network);
        assert_eq!(browser.removed(), [tab_id]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(CaptureState::WaitingForLoad.to_string(), "waiting_for_load");
        assert!(CaptureState::Failed.is_terminal());
        assert!(!CaptureState::ClosingTab.is_terminal());
    }
}
