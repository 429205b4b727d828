//! Browser collaborators backed by the extension WebSocket.
//!
//! [`RemoteBrowser`] turns `tabs.*` commands and events into the
//! [`TabProvider`] and [`PageTransport`] contracts.
//!
//! # Example
//!
//! ```no_run
//! use zombie_scraper::browser::RemoteBrowser;
//! use zombie_scraper::transport::PendingServer;
//!
//! # async fn example() -> zombie_scraper::Result<()> {
//! let server = PendingServer::bind_localhost(0).await?;
//! println!("waiting for the extension on {}", server.ws_url());
//!
//! let browser = RemoteBrowser::accept(server).await?;
//! println!("attached to container {}", browser.context().label());
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use tokio::sync::broadcast;
use tracing::{debug, trace};

use crate::cache::RemoteCache;
use crate::error::{Error, Result};
use crate::identifiers::TabId;
use crate::protocol::{CapturedDocument, Command, Event, PageRequest, TabsCommand};
use crate::transport::{Connection, PendingServer, ReadyData};

use super::{CaptureContext, PageTransport, TabEvent, TabEvents, TabProvider};

// ============================================================================
// Constants
// ============================================================================

/// Buffered tab events per subscriber.
const EVENT_CAPACITY: usize = 256;

// ============================================================================
// Types
// ============================================================================

/// Tab bookkeeping fed by the event handler.
#[derive(Default)]
struct TabTable {
    /// Tabs we opened that are still alive.
    open: FxHashSet<TabId>,
    /// Latest status update of every live tab the extension reported.
    ///
    /// Not limited to `open`: updates can arrive before `tabs.create` replies.
    latest: FxHashMap<TabId, TabEvent>,
}

type OpenTabs = Arc<Mutex<TabTable>>;

/// Internal shared state.
struct RemoteInner {
    /// WebSocket connection to the extension.
    connection: Connection,
    /// Context reported in the READY handshake.
    context: CaptureContext,
    /// Tab event fan-out.
    events: broadcast::Sender<TabEvent>,
    /// Tabs we opened and their latest status.
    open_tabs: OpenTabs,
}

// ============================================================================
// RemoteBrowser
// ============================================================================

/// Tab provider and page transport speaking to the companion extension.
#[derive(Clone)]
pub struct RemoteBrowser {
    inner: Arc<RemoteInner>,
}

impl fmt::Debug for RemoteBrowser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteBrowser")
            .field("context", &self.inner.context)
            .field("open_tabs", &self.open_tab_count())
            .finish_non_exhaustive()
    }
}

impl RemoteBrowser {
    /// Waits for the extension to connect and wraps the connection.
    ///
    /// # Errors
    ///
    /// Same as [`PendingServer::accept`].
    pub async fn accept(server: PendingServer) -> Result<Self> {
        let (connection, ready) = server.accept().await?;
        Ok(Self::new(connection, ready))
    }

    /// Wraps an established connection.
    ///
    /// Installs the connection's event handler.
    #[must_use]
    pub fn new(connection: Connection, ready: ReadyData) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let open_tabs: OpenTabs = Arc::new(Mutex::new(TabTable::default()));

        let handler_events = events.clone();
        let handler_tabs = Arc::clone(&open_tabs);
        connection.set_event_handler(Box::new(move |event: Event| {
            let Some(event) = TabEvent::from_parsed(event.parse()) else {
                return;
            };

            {
                let mut table = handler_tabs.lock();
                match &event {
                    TabEvent::Removed { tab_id } => {
                        table.open.remove(tab_id);
                        table.latest.remove(tab_id);
                    }
                    TabEvent::Updated { tab_id, .. } => {
                        table.latest.insert(*tab_id, event.clone());
                    }
                }
            }

            trace!(?event, "Tab event");
            // No subscribers is fine
            let _ = handler_events.send(event);
        }));

        let context = CaptureContext::from(ready);
        debug!(context = %context.label(), "Remote browser attached");

        Self {
            inner: Arc::new(RemoteInner {
                connection,
                context,
                events,
                open_tabs,
            }),
        }
    }

    /// Returns the context the controlling panel lives in.
    #[inline]
    #[must_use]
    pub fn context(&self) -> &CaptureContext {
        &self.inner.context
    }

    /// Returns the underlying connection.
    #[inline]
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.inner.connection
    }

    /// Returns a cache backed by the extension's Cache Storage.
    #[must_use]
    pub fn cache(&self) -> RemoteCache {
        RemoteCache::new(self.inner.connection.clone())
    }

    /// Returns the number of tabs this browser opened that are still open.
    #[inline]
    #[must_use]
    pub fn open_tab_count(&self) -> usize {
        self.inner.open_tabs.lock().open.len()
    }

    /// Closes the connection to the extension.
    pub fn close(&self) {
        self.inner.connection.clear_event_handler();
        self.inner.connection.shutdown();
    }
}

// ============================================================================
// RemoteBrowser - TabProvider
// ============================================================================

#[async_trait]
impl TabProvider for RemoteBrowser {
    fn subscribe(&self) -> TabEvents {
        TabEvents::new(self.inner.events.subscribe())
    }

    async fn create_tab(&self, context: &CaptureContext, url: &str) -> Result<TabId> {
        let command = Command::Tabs(TabsCommand::Create {
            window_id: context.window_id,
            cookie_store_id: context.cookie_store_id.clone(),
            url: url.to_string(),
            active: false,
        });

        let result = self.inner.connection.execute(command).await?;

        let tab_id = result
            .get("tabId")
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
            .and_then(TabId::new)
            .ok_or_else(|| Error::protocol("Expected tabId in tabs.create response"))?;

        self.inner.open_tabs.lock().open.insert(tab_id);
        debug!(%tab_id, url, "Tab created");
        Ok(tab_id)
    }

    async fn remove_tab(&self, tab_id: TabId) -> Result<()> {
        let command = Command::Tabs(TabsCommand::Remove { tab_id });
        self.inner.connection.execute(command).await?;

        {
            let mut table = self.inner.open_tabs.lock();
            table.open.remove(&tab_id);
            table.latest.remove(&tab_id);
        }
        debug!(%tab_id, "Tab removed");
        Ok(())
    }

    fn last_event(&self, tab_id: TabId) -> Option<TabEvent> {
        let table = self.inner.open_tabs.lock();
        if !table.open.contains(&tab_id) {
            return Some(TabEvent::Removed { tab_id });
        }
        table.latest.get(&tab_id).cloned()
    }
}

// ============================================================================
// RemoteBrowser - PageTransport
// ============================================================================

#[async_trait]
impl PageTransport for RemoteBrowser {
    async fn request_dom(&self, tab_id: TabId) -> Result<CapturedDocument> {
        let command = Command::Tabs(TabsCommand::SendMessage {
            tab_id,
            message: PageRequest::get_dom(),
        });

        let reply = self
            .inner
            .connection
            .execute(command)
            .await
            .map_err(|e| match e {
                Error::Protocol { message } => Error::transport(message),
                other => other,
            })?;

        let document = CapturedDocument::from_reply(reply)?;
        trace!(%tab_id, bytes = document.serialized_document.len(), "DOM received");
        Ok(document)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicU32, Ordering};

    use serde_json::{Value, json};

    use crate::browser::TabStatus;
    use crate::identifiers::{CookieStoreId, WindowId};
    use crate::transport::testing::{EventSink, MockExtension, Reply};

    /// Extension that opens tabs, completes them immediately and serializes
    /// every page as `<p>{url}</p>`.
    fn browsing_extension() -> impl Fn(&Value, &EventSink) -> Reply + Send + Sync + 'static {
        let next_tab = AtomicU32::new(10);
        move |request: &Value, events: &EventSink| {
            let params = &request["params"];
            match request["method"].as_str() {
                Some("tabs.create") => {
                    let tab_id = next_tab.fetch_add(1, Ordering::SeqCst);
                    events.emit(
                        "tabs.updated",
                        json!({ "tabId": tab_id, "status": "complete", "url": "about:blank" }),
                    );
                    events.emit(
                        "tabs.updated",
                        json!({ "tabId": tab_id, "status": "complete", "url": params["url"] }),
                    );
                    Reply::Success(json!({ "tabId": tab_id }))
                }
                Some("tabs.remove") => {
                    events.emit("tabs.removed", json!({ "tabId": params["tabId"] }));
                    Reply::Success(Value::Null)
                }
                Some("tabs.sendMessage") if params["tabId"] == 99 => {
                    Reply::Error("Could not establish connection".into())
                }
                Some("tabs.sendMessage") => Reply::Success(json!({
                    "serializedDocument": format!("<p>{}</p>", params["tabId"]),
                    "documentUrl": "https://example.test/",
                    "documentOrigin": "https://example.test"
                })),
                _ => Reply::Error("unsupported".into()),
            }
        }
    }

    async fn attach() -> (RemoteBrowser, MockExtension) {
        let server = PendingServer::bind_localhost(0).await.expect("bind");
        let ws_url = server.ws_url();
        let (browser, extension) = tokio::join!(
            RemoteBrowser::accept(server),
            MockExtension::connect(&ws_url, MockExtension::default_ready(), browsing_extension())
        );
        (browser.expect("accept"), extension)
    }

    #[tokio::test]
    async fn test_context_from_ready() {
        let (browser, _extension) = attach().await;
        assert_eq!(
            browser.context(),
            &CaptureContext::new(CookieStoreId::new("firefox-container-2"), WindowId::new(1))
        );
    }

    #[tokio::test]
    async fn test_create_tab_sends_context_and_publishes_events() {
        let (browser, extension) = attach().await;
        let mut events = browser.subscribe();

        let tab_id = browser
            .create_tab(browser.context(), "https://example.test/a")
            .await
            .expect("create");
        assert_eq!(tab_id.as_u32(), 10);
        assert_eq!(browser.open_tab_count(), 1);

        let create = &extension.requests()[0];
        assert_eq!(create["params"]["cookieStoreId"], "firefox-container-2");
        assert_eq!(create["params"]["windowId"], 1);
        assert_eq!(create["params"]["active"], false);

        let first = events.recv().await.expect("event");
        assert!(!first.is_load_complete());
        let second = events.recv().await.expect("event");
        assert_eq!(
            second,
            TabEvent::Updated {
                tab_id,
                status: TabStatus::Complete,
                url: "https://example.test/a".into(),
            }
        );
    }

    #[tokio::test]
    async fn test_remove_tab_updates_open_set() {
        let (browser, _extension) = attach().await;
        let mut events = browser.subscribe();

        let tab_id = browser
            .create_tab(browser.context(), "https://example.test/")
            .await
            .expect("create");
        browser.remove_tab(tab_id).await.expect("remove");
        assert_eq!(browser.open_tab_count(), 0);

        loop {
            if events.recv().await.expect("event") == (TabEvent::Removed { tab_id }) {
                break;
            }
        }
    }

    #[tokio::test]
    async fn test_last_event_tracks_tab() {
        let (browser, _extension) = attach().await;
        let mut events = browser.subscribe();

        let tab_id = browser
            .create_tab(browser.context(), "https://example.test/b")
            .await
            .expect("create");

        // Both updates have gone through the handler once they are received
        events.recv().await.expect("event");
        events.recv().await.expect("event");
        assert_eq!(
            browser.last_event(tab_id),
            Some(TabEvent::Updated {
                tab_id,
                status: TabStatus::Complete,
                url: "https://example.test/b".into(),
            })
        );

        browser.remove_tab(tab_id).await.expect("remove");
        assert_eq!(
            browser.last_event(tab_id),
            Some(TabEvent::Removed { tab_id })
        );

        let never_opened = TabId::new(77).expect("valid tab id");
        assert_eq!(
            browser.last_event(never_opened),
            Some(TabEvent::Removed { tab_id: never_opened })
        );
    }

    #[tokio::test]
    async fn test_request_dom() {
        let (browser, extension) = attach().await;
        let tab_id = TabId::new(12).expect("valid tab id");

        let document = browser.request_dom(tab_id).await.expect("dom");
        assert_eq!(document.serialized_document, "<p>12</p>");
        assert_eq!(document.document_origin, "https://example.test");

        let message = &extension.requests()[0]["params"]["message"];
        assert_eq!(message["messageType"], "request");
        assert_eq!(message["commandType"], "getDom");
    }

    #[tokio::test]
    async fn test_request_dom_failure_is_transport_error() {
        let (browser, _extension) = attach().await;
        let tab_id = TabId::new(99).expect("valid tab id");

        let err = browser.request_dom(tab_id).await.expect_err("should fail");
        assert!(matches!(err, Error::Transport { .. }));
    }
}
