//! Scraping facade module.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Scraper`] | `scrape(url, extract)` over the bounded capture queue |
//! | [`ScraperBuilder`] | Fluent configuration builder |
//! | [`ScrapingResult`] | `{ url, fetchedAt, result }` envelope |
//!
//! # Example
//!
//! ```no_run
//! use zombie_scraper::{Result, Scraper};
//! use zombie_scraper::browser::RemoteBrowser;
//! use zombie_scraper::transport::PendingServer;
//!
//! # async fn example() -> Result<()> {
//! let browser = RemoteBrowser::accept(PendingServer::bind_localhost(0).await?).await?;
//! let scraper = Scraper::builder().remote(browser).build()?;
//!
//! let scraped = scraper
//!     .scrape("https://example.com", |doc| doc.title())
//!     .await?;
//! println!("{}", serde_json::to_string(&scraped)?);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for scraper configuration.
pub mod builder;

/// Core scraper implementation.
pub mod core;

/// Result envelope.
pub mod result;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ScraperBuilder;
pub use core::Scraper;
pub use result::ScrapingResult;
