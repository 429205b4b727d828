//! Browser collaborators of the capture pipeline.
//!
//! The pipeline never talks to Firefox directly. It goes through two
//! contracts:
//!
//! | Type | Description |
//! |------|-------------|
//! | [`TabProvider`] | Opens/closes tabs in a container, publishes [`TabEvent`]s |
//! | [`PageTransport`] | Asks a loaded tab for its serialized DOM |
//! | [`CaptureContext`] | Container and window the tabs belong to |
//! | [`RemoteBrowser`] | Both contracts over the extension WebSocket |
//!
//! # Example
//!
//! ```no_run
//! use zombie_scraper::browser::{RemoteBrowser, TabProvider};
//! use zombie_scraper::transport::PendingServer;
//!
//! # async fn example() -> zombie_scraper::Result<()> {
//! let browser = RemoteBrowser::accept(PendingServer::bind_localhost(0).await?).await?;
//! let mut events = browser.subscribe();
//!
//! let tab_id = browser.create_tab(browser.context(), "https://example.com").await?;
//! while let Ok(event) = events.recv().await {
//!     if event.tab_id() == tab_id && event.is_load_complete() {
//!         break;
//!     }
//! }
//! browser.remove_tab(tab_id).await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Container/window a capture runs in.
pub mod context;

/// Collaborator traits and tab events.
pub mod provider;

/// WebSocket-backed implementation.
pub mod remote;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use context::CaptureContext;
pub use provider::{BLANK_PAGE_URL, PageTransport, TabEvent, TabEvents, TabProvider, TabStatus};
pub use remote::RemoteBrowser;
