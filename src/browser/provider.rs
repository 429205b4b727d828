//! Contracts the capture pipeline needs from the browser.
//!
//! | Trait | Role |
//! |-------|------|
//! | [`TabProvider`] | Open/close tabs in an isolated context, publish lifecycle events |
//! | [`PageTransport`] | Ask a loaded page to serialize its DOM |
//!
//! [`RemoteBrowser`](super::RemoteBrowser) implements both over the
//! extension WebSocket.

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::warn;

use crate::error::{Error, Result};
use crate::identifiers::TabId;
use crate::protocol::{CapturedDocument, ParsedEvent};

use super::CaptureContext;

// ============================================================================
// Constants
// ============================================================================

/// URL of the placeholder page a new tab reports before navigating.
pub const BLANK_PAGE_URL: &str = "about:blank";

// ============================================================================
// TabStatus
// ============================================================================

/// Navigation status reported by `tabs.onUpdated`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabStatus {
    /// Navigation in progress.
    Loading,
    /// Navigation finished.
    Complete,
}

impl TabStatus {
    /// Parses the extension's status string.
    #[must_use]
    pub fn parse(status: &str) -> Option<Self> {
        match status {
            "loading" => Some(Self::Loading),
            "complete" => Some(Self::Complete),
            _ => None,
        }
    }

    /// Returns the wire representation.
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Complete => "complete",
        }
    }
}

// ============================================================================
// TabEvent
// ============================================================================

/// Tab lifecycle notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabEvent {
    /// Status of a tab changed.
    Updated {
        /// Affected tab.
        tab_id: TabId,
        /// New status.
        status: TabStatus,
        /// URL of the tab at that moment.
        url: String,
    },
    /// A tab was closed, by us or by anyone else.
    Removed {
        /// Affected tab.
        tab_id: TabId,
    },
}

impl TabEvent {
    /// Converts a wire event, ignoring anything that is not a tab event.
    #[must_use]
    pub fn from_parsed(event: ParsedEvent) -> Option<Self> {
        match event {
            ParsedEvent::TabUpdated {
                tab_id,
                status,
                url,
            } => Some(Self::Updated {
                tab_id: TabId::new(tab_id)?,
                status: TabStatus::parse(&status)?,
                url,
            }),
            ParsedEvent::TabRemoved { tab_id } => Some(Self::Removed {
                tab_id: TabId::new(tab_id)?,
            }),
            ParsedEvent::Unknown { .. } => None,
        }
    }

    /// Returns the affected tab.
    #[inline]
    #[must_use]
    pub fn tab_id(&self) -> TabId {
        match self {
            Self::Updated { tab_id, .. } | Self::Removed { tab_id } => *tab_id,
        }
    }

    /// Returns `true` if this reports a finished load of a real page.
    ///
    /// A new tab first completes on the blank placeholder, which does not count.
    #[must_use]
    pub fn is_load_complete(&self) -> bool {
        matches!(
            self,
            Self::Updated { status: TabStatus::Complete, url, .. } if url != BLANK_PAGE_URL
        )
    }
}

// ============================================================================
// TabEvents
// ============================================================================

/// Subscription to tab lifecycle notifications.
///
/// Dropping the subscription unsubscribes.
#[derive(Debug)]
pub struct TabEvents {
    rx: broadcast::Receiver<TabEvent>,
}

impl TabEvents {
    /// Wraps a broadcast receiver.
    #[inline]
    #[must_use]
    pub fn new(rx: broadcast::Receiver<TabEvent>) -> Self {
        Self { rx }
    }

    /// Waits for the next event.
    ///
    /// # Errors
    ///
    /// - [`Error::EventsLagged`] if events were dropped since the last call;
    ///   the subscription stays usable and resumes at the oldest buffered event
    /// - [`Error::ConnectionClosed`] once the publisher is gone
    pub async fn recv(&mut self) -> Result<TabEvent> {
        match self.rx.recv().await {
            Ok(event) => Ok(event),
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Tab event subscriber lagged");
                Err(Error::EventsLagged { skipped })
            }
            Err(RecvError::Closed) => Err(Error::ConnectionClosed),
        }
    }
}

// ============================================================================
// TabProvider
// ============================================================================

/// Creates and destroys tabs within an isolated browsing context.
#[async_trait]
pub trait TabProvider: Send + Sync {
    /// Subscribes to tab status-changed and tab-closed notifications.
    ///
    /// Events published before this call are not delivered.
    fn subscribe(&self) -> TabEvents;

    /// Opens a new, inactive tab in `context` navigated to `url`.
    async fn create_tab(&self, context: &CaptureContext, url: &str) -> Result<TabId>;

    /// Closes a tab.
    async fn remove_tab(&self, tab_id: TabId) -> Result<()>;

    /// Returns what is known about a tab without waiting for events.
    ///
    /// [`TabEvent::Removed`] once the tab is gone, otherwise its latest
    /// status update, or `None` if it has not reported one yet.
    fn last_event(&self, tab_id: TabId) -> Option<TabEvent>;
}

// ============================================================================
// PageTransport
// ============================================================================

/// Asks a loaded page to serialize itself.
#[async_trait]
pub trait PageTransport: Send + Sync {
    /// Sends the DOM request to `tab_id` and validates the reply.
    ///
    /// Replies without the expected shape are [`Error::Transport`].
    async fn request_dom(&self, tab_id: TabId) -> Result<CapturedDocument>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tab(id: u32) -> TabId {
        TabId::new(id).expect("valid tab id")
    }

    #[test]
    fn test_from_parsed() {
        let event = TabEvent::from_parsed(ParsedEvent::TabUpdated {
            tab_id: 3,
            status: "complete".into(),
            url: "https://example.com/".into(),
        });
        assert_eq!(
            event,
            Some(TabEvent::Updated {
                tab_id: tab(3),
                status: TabStatus::Complete,
                url: "https://example.com/".into(),
            })
        );

        assert_eq!(
            TabEvent::from_parsed(ParsedEvent::TabRemoved { tab_id: 3 }),
            Some(TabEvent::Removed { tab_id: tab(3) })
        );
    }

    #[test]
    fn test_from_parsed_rejects_garbage() {
        assert_eq!(
            TabEvent::from_parsed(ParsedEvent::TabRemoved { tab_id: 0 }),
            None
        );
        assert_eq!(
            TabEvent::from_parsed(ParsedEvent::TabUpdated {
                tab_id: 1,
                status: "unloaded".into(),
                url: String::new(),
            }),
            None
        );
    }

    #[test]
    fn test_is_load_complete() {
        let complete = |url: &str| TabEvent::Updated {
            tab_id: tab(1),
            status: TabStatus::Complete,
            url: url.into(),
        };

        assert!(complete("https://example.com/").is_load_complete());
        assert!(!complete(BLANK_PAGE_URL).is_load_complete());
        assert!(
            !TabEvent::Updated {
                tab_id: tab(1),
                status: TabStatus::Loading,
                url: "https://example.com/".into(),
            }
            .is_load_complete()
        );
        assert!(!TabEvent::Removed { tab_id: tab(1) }.is_load_complete());
    }

    #[tokio::test]
    async fn test_lag_is_reported_then_stream_resumes() {
        let (tx, rx) = broadcast::channel(2);
        let mut events = TabEvents::new(rx);

        for id in 1..=3 {
            tx.send(TabEvent::Removed { tab_id: tab(id) }).expect("subscribed");
        }

        assert!(matches!(
            events.recv().await,
            Err(Error::EventsLagged { skipped: 1 })
        ));
        assert_eq!(
            events.recv().await.expect("buffered event"),
            TabEvent::Removed { tab_id: tab(2) }
        );
        assert_eq!(
            events.recv().await.expect("buffered event"),
            TabEvent::Removed { tab_id: tab(3) }
        );
    }

    #[tokio::test]
    async fn test_subscription_ends_with_publisher() {
        let (tx, rx) = broadcast::channel(4);
        let mut events = TabEvents::new(rx);

        tx.send(TabEvent::Removed { tab_id: tab(2) }).expect("subscribed");
        drop(tx);

        assert_eq!(
            events.recv().await.expect("buffered event"),
            TabEvent::Removed { tab_id: tab(2) }
        );
        assert!(matches!(
            events.recv().await,
            Err(Error::ConnectionClosed)
        ));
    }
}
