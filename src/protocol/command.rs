//! Command definitions organized by module.
//!
//! Commands follow `module.methodName` format.
//!
//! # Command Modules
//!
//! | Module | Commands |
//! |--------|----------|
//! | `tabs` | Create, remove, message a page |
//! | `cache` | Get, put, clear captured markup |

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::identifiers::{CookieStoreId, TabId, WindowId};

use super::page::PageRequest;

// ============================================================================
// Command Wrapper
// ============================================================================

/// All protocol commands organized by module.
///
/// This enum wraps module-specific command enums for unified serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Command {
    /// Tabs module commands.
    Tabs(TabsCommand),
    /// Cache module commands.
    Cache(CacheCommand),
}

// ============================================================================
// Tabs Commands
// ============================================================================

/// Tabs module commands for tab lifecycle and page messaging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum TabsCommand {
    /// Open a tab in a container window.
    #[serde(rename = "tabs.create")]
    Create {
        /// Window to open the tab in.
        #[serde(rename = "windowId")]
        window_id: WindowId,
        /// Container the tab belongs to.
        #[serde(rename = "cookieStoreId")]
        cookie_store_id: CookieStoreId,
        /// Initial URL.
        url: String,
        /// Whether the tab becomes the active tab.
        active: bool,
    },

    /// Close a tab.
    #[serde(rename = "tabs.remove")]
    Remove {
        /// Tab to close.
        #[serde(rename = "tabId")]
        tab_id: TabId,
    },

    /// Deliver a message to the content script of a tab.
    #[serde(rename = "tabs.sendMessage")]
    SendMessage {
        /// Target tab.
        #[serde(rename = "tabId")]
        tab_id: TabId,
        /// Message for the page.
        message: PageRequest,
    },
}

// ============================================================================
// Cache Commands
// ============================================================================

/// Cache module commands backed by the extension's Cache Storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", content = "params")]
pub enum CacheCommand {
    /// Look up captured markup.
    #[serde(rename = "cache.get")]
    Get {
        /// Cache key.
        url: String,
    },

    /// Store captured markup.
    #[serde(rename = "cache.put")]
    Put {
        /// Cache key.
        url: String,
        /// Serialized document.
        doc: String,
    },

    /// Drop every cached document.
    #[serde(rename = "cache.clear")]
    Clear,
}

// ============================================================================
// Tests
// ============================================================================
