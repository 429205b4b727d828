//! Bounded, cache-backed DOM capture.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Capturer`] | Tab lifecycle for one URL ([`CaptureState`]) |
//! | [`CaptureQueue`] | FIFO admission, at most [`MAX_CONCURRENT`] running |
//! | [`CapturedPage`] | Markup produced by a capture |
//! | [`Document`] | Parsed markup with `<base href>` fixed up |
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use zombie_scraper::browser::RemoteBrowser;
//! use zombie_scraper::cache::MemoryCache;
//! use zombie_scraper::capture::{CaptureQueue, Capturer};
//!
//! # async fn example(browser: RemoteBrowser) -> zombie_scraper::Result<()> {
//! let browser = Arc::new(browser);
//! let capturer = Capturer::new(
//!     browser.clone(),
//!     browser.clone(),
//!     Arc::new(MemoryCache::new()),
//!     browser.context().clone(),
//! );
//!
//! let queue = CaptureQueue::new(Arc::new(capturer));
//! let page = queue.capture("https://example.com").await?;
//! println!("{:?}", page.to_document().title());
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Document reconstruction.
pub mod document;

/// Capture state machine.
pub mod operation;

/// Capture output.
pub mod page;

/// Admission control.
pub mod queue;

// ============================================================================
// Re-exports
// ============================================================================

pub use document::Document;
pub use operation::{CaptureState, Capturer, DEFAULT_LOAD_TIMEOUT};
pub use page::{CapturedPage, PageSource};
pub use queue::{CaptureQueue, CaptureReceiver, MAX_CONCURRENT, PageCapture};
