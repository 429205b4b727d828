//! Scripted stand-in for the companion extension.
//!
//! Connects to a [`PendingServer`](super::PendingServer) like the real
//! background script would, answers every request through a closure and
//! can push events at any time.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use crate::identifiers::RequestId;

// ============================================================================
// Reply
// ============================================================================

/// How the mock answers one request.
pub(crate) enum Reply {
    /// `type: success` with this result.
    Success(Value),
    /// `type: error` with this message.
    Error(String),
    /// No answer at all.
    Silent,
}

// ============================================================================
// EventSink
// ============================================================================

/// Pushes raw messages from the extension side.
#[derive(Clone)]
pub(crate) struct EventSink {
    tx: mpsc::UnboundedSender<Value>,
}

impl EventSink {
    /// Emits an event in `module.eventName` form.
    pub(crate) fn emit(&self, method: &str, params: Value) {
        let _ = self.tx.send(json!({
            "id": RequestId::generate(),
            "type": "event",
            "method": method,
            "params": params,
        }));
    }
}

// ============================================================================
// MockExtension
// ============================================================================

/// A connected fake extension.
pub(crate) struct MockExtension {
    sink: EventSink,
    requests: Arc<Mutex<Vec<Value>>>,
}

impl MockExtension {
    /// READY payload for a container-2 panel in window 1.
    pub(crate) fn default_ready() -> Value {
        json!({ "cookieStoreId": "firefox-container-2", "windowId": 1 })
    }

    /// Connects, sends READY and starts answering requests.
    pub(crate) async fn connect<H>(ws_url: &str, ready: Value, handler: H) -> Self
    where
        H: Fn(&Value, &EventSink) -> Reply + Send + Sync + 'static,
    {
        let (ws_stream, _) = connect_async(ws_url).await.expect("mock connect");
        let (mut write, mut read) = ws_stream.split();

        let (tx, mut rx) = mpsc::unbounded_channel::<Value>();
        let sink = EventSink { tx };
        let requests = Arc::new(Mutex::new(Vec::new()));

        let _ = sink.tx.send(json!({
            "id": RequestId::ready(),
            "type": "success",
            "result": ready,
        }));

        let loop_sink = sink.clone();
        let loop_requests = Arc::clone(&requests);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    outgoing = rx.recv() => {
                        let Some(value) = outgoing else { break };
                        if write.send(Message::Text(value.to_string().into())).await.is_err() {
                            break;
                        }
                    }

                    incoming = read.next() => {
                        let Some(Ok(Message::Text(text))) = incoming else { break };
                        let Ok(request) = serde_json::from_str::<Value>(&text) else { continue };
                        loop_requests.lock().push(request.clone());

                        let id = request["id"].clone();
                        let response = match handler(&request, &loop_sink) {
                            Reply::Success(result) => json!({ "id": id, "type": "success", "result": result }),
                            Reply::Error(message) => json!({ "id": id, "type": "error", "error": "unknown error", "message": message }),
                            Reply::Silent => continue,
                        };
                        let _ = loop_sink.tx.send(response);
                    }
                }
            }
        });

        Self { sink, requests }
    }

    /// Emits an event.
    pub(crate) fn emit(&self, method: &str, params: Value) {
        self.sink.emit(method, params);
    }

    /// Returns every request received so far.
    pub(crate) fn requests(&self) -> Vec<Value> {
        self.requests.lock().clone()
    }

    /// Returns the methods of every request received so far.
    pub(crate) fn methods(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|r| r["method"].as_str().unwrap_or_default().to_string())
            .collect()
    }
}
