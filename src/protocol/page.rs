//! Messages exchanged with the content script of a captured page.
//!
//! The page is asked to serialize itself with a [`PageRequest`] and answers
//! with a [`CapturedDocument`].
//!
//! # Format
//!
//! Request:
//! ```json
//! {
//!   "messageType": "request",
//!   "commandType": "getDom",
//!   "requestId": "uuid",
//!   "payload": {}
//! }
//! ```
//!
//! Reply:
//! ```json
//! {
//!   "serializedDocument": "<html>...</html>",
//!   "documentUrl": "https://example.com/",
//!   "documentOrigin": "https://example.com"
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::identifiers::RequestId;

// ============================================================================
// PageRequest
// ============================================================================

/// A request delivered to the page's content script.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    /// Always `"request"`.
    pub message_type: String,
    /// Page command, e.g. `"getDom"`.
    pub command_type: String,
    /// Correlation ID.
    pub request_id: RequestId,
    /// Command payload.
    pub payload: Value,
}

impl PageRequest {
    /// Creates a DOM serialization request.
    #[must_use]
    pub fn get_dom() -> Self {
        Self {
            message_type: "request".to_string(),
            command_type: "getDom".to_string(),
            request_id: RequestId::generate(),
            payload: Value::Object(Map::new()),
        }
    }
}

// ============================================================================
// CapturedDocument
// ============================================================================

/// The serialized DOM of a loaded page together with its origin metadata.
///
/// Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapturedDocument {
    /// Serialized markup.
    pub serialized_document: String,
    /// `location.href` of the page when it was serialized.
    pub document_url: String,
    /// Security origin of the page.
    pub document_origin: String,
}

impl CapturedDocument {
    /// Validates a raw page reply.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Transport`] if the reply does not have the expected shape.
    pub fn from_reply(reply: Value) -> Result<Self> {
        if !reply.is_object() {
            return Err(Error::transport(format!(
                "Malformed page reply: expected object, got {reply}"
            )));
        }

        serde_json::from_value(reply)
            .map_err(|e| Error::transport(format!("Malformed page reply: {e}")))
    }
}

// ============================================================================
// Tests
// ============================================================================
