//! Error types for the scraping pipeline.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use zombie_scraper::{Error, Result, Scraper};
//!
//! async fn example(scraper: &Scraper) -> Result<()> {
//!     match scraper.scrape("https://example.com", |doc| doc.title()).await {
//!         Ok(result) => println!("{:?}", result.result),
//!         Err(Error::TabClosed { .. }) => println!("closed by the user"),
//!         Err(e) => return Err(e),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Capture | [`Error::EmptyUrl`], [`Error::TabClosed`], [`Error::LoadTimeout`], [`Error::Transport`] |
//! | Cache | [`Error::Cache`] |
//! | Document | [`Error::InvalidSelector`] |
//! | Configuration | [`Error::Config`] |
//! | Connection | [`Error::Connection`], [`Error::ConnectionTimeout`], [`Error::ConnectionClosed`], [`Error::EventsLagged`], [`Error::RequestTimeout`] |
//! | Protocol | [`Error::Protocol`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::WebSocket`], [`Error::ChannelClosed`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio::sync::oneshot::error::RecvError;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::{RequestId, TabId};

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Capture Errors
    // ========================================================================
    /// Caller passed an empty URL.
    ///
    /// Returned before anything is queued.
    #[error("Empty URL")]
    EmptyUrl,

    /// The capture tab was closed externally before loading finished.
    #[error("Tab closed: {tab_id}")]
    TabClosed {
        /// The tab that disappeared.
        tab_id: TabId,
    },

    /// The page did not finish loading in time.
    ///
    /// The tab has already been closed when this is returned.
    #[error("Timeout after {timeout_ms}ms loading {url}")]
    LoadTimeout {
        /// URL being captured.
        url: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// The page's serialization reply was malformed or absent.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    // ========================================================================
    // Cache Errors
    // ========================================================================
    /// Cache backend failure.
    #[error("Cache error: {message}")]
    Cache {
        /// Description of the cache failure.
        message: String,
    },

    // ========================================================================
    // Document Errors
    // ========================================================================
    /// CSS selector could not be parsed.
    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector {
        /// The selector as given.
        selector: String,
        /// Parser message.
        message: String,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when scraper configuration is incomplete or invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// WebSocket connection failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// Connection timeout waiting for extension.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// WebSocket connection closed unexpectedly.
    #[error("Connection closed")]
    ConnectionClosed,

    /// A tab event subscriber fell behind and events were dropped.
    #[error("Missed {skipped} tab events")]
    EventsLagged {
        /// Number of events dropped.
        skipped: u64,
    },

    /// Command request timeout.
    #[error("Request {request_id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The request ID that timed out.
        request_id: RequestId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Protocol violation or error reply from the extension.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),

    /// Channel receive error.
    #[error("Channel closed")]
    ChannelClosed(#[from] RecvError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a tab closed error.
    #[inline]
    pub fn tab_closed(tab_id: TabId) -> Self {
        Self::TabClosed { tab_id }
    }

    /// Creates a load timeout error.
    #[inline]
    pub fn load_timeout(url: impl Into<String>, timeout_ms: u64) -> Self {
        Self::LoadTimeout {
            url: url.into(),
            timeout_ms,
        }
    }

    /// Creates a transport error.
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a cache error.
    #[inline]
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Creates an invalid selector error.
    #[inline]
    pub fn invalid_selector(selector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSelector {
            selector: selector.into(),
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(request_id: RequestId, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            request_id,
            timeout_ms,
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::LoadTimeout { .. } | Self::ConnectionTimeout { .. } | Self::RequestTimeout { .. }
        )
    }

    /// Returns `true` if this error came out of the tab lifecycle itself.
    #[inline]
    #[must_use]
    pub fn is_capture_error(&self) -> bool {
        matches!(
            self,
            Self::EmptyUrl
                | Self::TabClosed { .. }
                | Self::LoadTimeout { .. }
                | Self::Transport { .. }
        )
    }

    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. }
                | Self::ConnectionTimeout { .. }
                | Self::ConnectionClosed
                | Self::WebSocket(_)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
