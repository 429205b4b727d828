//! WebSocket protocol message types.
//!
//! This module defines the message format for communication between
//! local end (Rust) and remote end (Extension), and the message the
//! extension relays to a page's content script.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Local → Remote | Command request |
//! | `Response` | Remote → Local | Command response (nil id = READY) |
//! | `Event` | Remote → Local | Tab lifecycle notification |
//! | `PageRequest` | Remote → Page | DOM serialization request |
//! | `CapturedDocument` | Page → Remote → Local | Serialized DOM reply |
//!
//! # Command Naming
//!
//! Commands follow `module.methodName` format:
//!
//! - `tabs.create`
//! - `tabs.sendMessage`
//! - `cache.put`

// ============================================================================
// Submodules
// ============================================================================

/// Command definitions organized by module.
pub mod command;

/// Event message types.
pub mod event;

/// Page-level request and reply.
pub mod page;

/// Request and Response message types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{CacheCommand, Command, TabsCommand};
pub use event::{Event, ParsedEvent};
pub use page::{CapturedDocument, PageRequest};
pub use request::{Request, Response, ResponseType};
