//! Zombie Scraper - bounded DOM capture through Firefox containers.
//!
//! This library captures the rendered DOM of pages opened in an isolated
//! Firefox container, caches it by URL and hands it to caller-supplied
//! extraction functions.
//!
//! # Architecture
//!
//! The scraper follows a client-server model:
//!
//! - **Local End (Rust)**: Queues captures, drives tab lifecycles, caches markup
//! - **Remote End (Extension)**: Opens/closes tabs, serializes pages, emits tab events
//!
//! Key design principles:
//!
//! - At most [`MAX_CONCURRENT`] capture tabs are open at once, admitted FIFO
//! - Every capture ends with its tab closed: loaded, timed out or closed by the user
//! - A URL is fetched from the network once, then served from the cache
//! - The capture context is resolved once from the extension handshake and passed explicitly
//!
//! # Quick Start
//!
//! ```no_run
//! use zombie_scraper::{Result, Scraper};
//! use zombie_scraper::browser::RemoteBrowser;
//! use zombie_scraper::transport::PendingServer;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Wait for the extension to connect from its container panel
//!     let server = PendingServer::bind_localhost(0).await?;
//!     println!("Point the extension at {}", server.ws_url());
//!     let browser = RemoteBrowser::accept(server).await?;
//!
//!     let scraper = Scraper::builder().remote(browser).build()?;
//!
//!     let scraped = scraper
//!         .scrape("https://example.com", |doc| doc.title())
//!         .await?;
//!     println!("{} -> {:?}", scraped.url, scraped.result);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`scrape`] | Scraping facade: [`Scraper`], [`ScrapingResult`] |
//! | [`capture`] | Capture state machine, admission queue, [`Document`] |
//! | [`cache`] | URL-keyed markup cache backends |
//! | [`browser`] | Tab provider / page transport contracts and [`RemoteBrowser`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | WebSocket message types (internal) |
//! | [`transport`] | WebSocket transport layer (internal) |

// ============================================================================
// Modules
// ============================================================================

/// Browser collaborators: tab provider, page transport, remote browser.
pub mod browser;

/// URL-keyed cache of captured markup.
///
/// [`MemoryCache`], [`DiskCache`] and [`RemoteCache`] implement [`CacheStore`].
pub mod cache;

/// Bounded, cache-backed DOM capture.
pub mod capture;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for browser entities.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// WebSocket protocol message types.
///
/// Internal module defining command/response/event structures.
pub mod protocol;

/// Scraping facade.
///
/// Use [`Scraper::builder()`] to create a configured scraper.
pub mod scrape;

/// WebSocket transport layer.
///
/// Internal module handling WebSocket server and connection management.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Browser types
pub use browser::{CaptureContext, PageTransport, RemoteBrowser, TabProvider};

// Cache types
pub use cache::{CacheStore, DiskCache, MemoryCache, RemoteCache};

// Capture types
pub use capture::{CaptureQueue, CapturedPage, Capturer, Document, MAX_CONCURRENT};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{CookieStoreId, RequestId, TabId, WindowId};

// Scrape types
pub use scrape::{Scraper, ScraperBuilder, ScrapingResult};
