//! WebSocket transport layer.
//!
//! This module handles communication between local end (Rust) and
//! remote end (the companion WebExtension) via WebSocket.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Scraper (Rust) │                              │  Extension      │
//! │                 │         WebSocket            │  (Background)   │
//! │  PendingServer  │◄────────────────────────────►│                 │
//! │  → Connection   │      localhost:PORT          │  tabs / caches  │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `PendingServer::bind` - Bind to localhost
//! 2. `PendingServer::accept` - Wait for extension to connect and send READY
//! 3. `Connection` - Send commands, receive responses/events
//! 4. `Connection::shutdown` - Close connection

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

/// WebSocket server for the extension.
pub mod server;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, EventHandler, ReadyData};
pub use server::PendingServer;
