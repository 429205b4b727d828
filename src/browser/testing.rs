//! In-process browser for pipeline tests.
//!
//! [`FakeBrowser`] implements both collaborator contracts without a
//! WebSocket. Tabs either finish loading on their own or wait for the test
//! to drive them.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::{Value, json};
use tokio::sync::{broadcast, watch};
use url::Url;

use crate::error::{Error, Result};
use crate::identifiers::{CookieStoreId, TabId, WindowId};
use crate::protocol::CapturedDocument;

use super::{
    BLANK_PAGE_URL, CaptureContext, PageTransport, TabEvent, TabEvents, TabProvider, TabStatus,
};

// ============================================================================
// LoadMode
// ============================================================================

/// When tabs created by a [`FakeBrowser`] report completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoadMode {
    /// Completion events are published before `create_tab` returns.
    AutoComplete,
    /// Nothing happens until [`FakeBrowser::complete`] is called.
    Manual,
}

// ============================================================================
// FakeBrowser
// ============================================================================

#[derive(Default)]
struct FakeState {
    next_tab: u32,
    /// Open tabs and the URL each was opened with.
    open: FxHashMap<TabId, String>,
    /// URLs passed to `create_tab`, in call order.
    created: Vec<String>,
    /// Tabs passed to `remove_tab`, in call order.
    removed: Vec<TabId>,
    /// Canned `request_dom` replies by URL.
    replies: FxHashMap<String, Value>,
    /// Latest status update of each open tab.
    last: FxHashMap<TabId, TabEvent>,
    /// Most tabs open at the same time.
    peak_open: usize,
}

/// Tab provider and page transport backed by plain data.
pub(crate) struct FakeBrowser {
    mode: LoadMode,
    events: broadcast::Sender<TabEvent>,
    state: Mutex<FakeState>,
    created_tx: watch::Sender<usize>,
}

impl FakeBrowser {
    pub(crate) fn new(mode: LoadMode) -> Self {
        Self::with_event_capacity(mode, 1024)
    }

    /// Buffers at most `capacity` events per subscriber.
    pub(crate) fn with_event_capacity(mode: LoadMode, capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        let (created_tx, _) = watch::channel(0);
        Self {
            mode,
            events,
            state: Mutex::new(FakeState {
                next_tab: 1,
                ..FakeState::default()
            }),
            created_tx,
        }
    }

    /// Context every test uses.
    pub(crate) fn context() -> CaptureContext {
        CaptureContext::new(CookieStoreId::new("firefox-container-4"), WindowId::new(1))
    }

    /// Makes `request_dom` for `url` return `reply` instead of the default page.
    pub(crate) fn reply_with(&self, url: &str, reply: Value) {
        self.state.lock().replies.insert(url.to_string(), reply);
    }

    /// Reports the page as loading, then loaded.
    pub(crate) fn complete(&self, tab_id: TabId) {
        let Some(url) = self.state.lock().open.get(&tab_id).cloned() else {
            return;
        };
        self.publish(TabEvent::Updated {
            tab_id,
            status: TabStatus::Loading,
            url: url.clone(),
        });
        self.publish(TabEvent::Updated {
            tab_id,
            status: TabStatus::Complete,
            url,
        });
    }

    /// Closes a tab the way a user would, without going through `remove_tab`.
    pub(crate) fn close_by_user(&self, tab_id: TabId) {
        let removed = {
            let mut state = self.state.lock();
            state.last.remove(&tab_id);
            state.open.remove(&tab_id).is_some()
        };
        if removed {
            self.publish(TabEvent::Removed { tab_id });
        }
    }

    /// Waits until `create_tab` has been called at least `count` times.
    pub(crate) async fn wait_for_tabs(&self, count: usize) {
        let mut rx = self.created_tx.subscribe();
        let _ = rx.wait_for(|created| *created >= count).await;
    }

    pub(crate) fn open_tabs(&self) -> Vec<TabId> {
        let mut tabs: Vec<_> = self.state.lock().open.keys().copied().collect();
        tabs.sort_by_key(|tab| tab.as_u32());
        tabs
    }

    pub(crate) fn open_count(&self) -> usize {
        self.state.lock().open.len()
    }

    pub(crate) fn created(&self) -> Vec<String> {
        self.state.lock().created.clone()
    }

    pub(crate) fn removed(&self) -> Vec<TabId> {
        self.state.lock().removed.clone()
    }

    pub(crate) fn peak_open(&self) -> usize {
        self.state.lock().peak_open
    }

    /// Markup served for `url` when no reply was set.
    pub(crate) fn default_markup(url: &str) -> String {
        format!("<html><head><title>{url}</title></head><body><p>{url}</p></body></html>")
    }

    /// Publishes `event` to every subscriber.
    pub(crate) fn publish(&self, event: TabEvent) {
        if let TabEvent::Updated { tab_id, .. } = &event {
            let mut state = self.state.lock();
            if state.open.contains_key(tab_id) {
                state.last.insert(*tab_id, event.clone());
            }
        }
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl TabProvider for FakeBrowser {
    fn subscribe(&self) -> TabEvents {
        TabEvents::new(self.events.subscribe())
    }

    async fn create_tab(&self, _context: &CaptureContext, url: &str) -> Result<TabId> {
        let tab_id = {
            let mut state = self.state.lock();
            let tab_id = TabId::new(state.next_tab)
                .ok_or_else(|| Error::protocol("tab ids exhausted"))?;
            state.next_tab += 1;
            state.open.insert(tab_id, url.to_string());
            state.created.push(url.to_string());
            state.peak_open = state.peak_open.max(state.open.len());
            tab_id
        };

        if self.mode == LoadMode::AutoComplete {
            self.publish(TabEvent::Updated {
                tab_id,
                status: TabStatus::Complete,
                url: BLANK_PAGE_URL.to_string(),
            });
            self.complete(tab_id);
        }

        self.created_tx.send_modify(|created| *created += 1);
        Ok(tab_id)
    }

    async fn remove_tab(&self, tab_id: TabId) -> Result<()> {
        {
            let mut state = self.state.lock();
            state.removed.push(tab_id);
            state.last.remove(&tab_id);
            if state.open.remove(&tab_id).is_none() {
                return Err(Error::protocol(format!("No tab with id: {tab_id}")));
            }
        }
        self.publish(TabEvent::Removed { tab_id });
        Ok(())
    }

    fn last_event(&self, tab_id: TabId) -> Option<TabEvent> {
        let state = self.state.lock();
        if !state.open.contains_key(&tab_id) {
            return Some(TabEvent::Removed { tab_id });
        }
        state.last.get(&tab_id).cloned()
    }
}

#[async_trait]
impl PageTransport for FakeBrowser {
    async fn request_dom(&self, tab_id: TabId) -> Result<CapturedDocument> {
        let reply = {
            let state = self.state.lock();
            let url = state
                .open
                .get(&tab_id)
                .ok_or_else(|| Error::transport(format!("No page in tab {tab_id}")))?;

            match state.replies.get(url) {
                Some(reply) => reply.clone(),
                None => {
                    let origin = Url::parse(url)
                        .map(|u| u.origin().ascii_serialization())
                        .unwrap_or_default();
                    json!({
                        "serializedDocument": Self::default_markup(url),
                        "documentUrl": url,
                        "documentOrigin": origin,
                    })
                }
            }
        };

        CapturedDocument::from_reply(reply)
    }
}
