//! Admission-controlled capture queue.
//!
//! At most [`MAX_CONCURRENT`] captures run at once. Everything else waits
//! in strict arrival order and is admitted only when a running capture
//! finishes, successfully or not.
//!
//! # Admission
//!
//! ```text
//! enqueue ──► waiting (FIFO) ──try_admit──► running (≤ MAX_CONCURRENT)
//!                  ▲                              │
//!                  └──────── slot released ◄──────┘
//! ```
//!
//! Each admitted capture runs on its own task holding an admission slot.
//! Dropping the slot, on completion or on panic, frees capacity and admits
//! the head of the line.

// ============================================================================
// Imports
// ============================================================================

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, trace};

use crate::error::{Error, Result};

use super::CapturedPage;

// ============================================================================
// Constants
// ============================================================================

/// Maximum number of captures running at the same time.
pub const MAX_CONCURRENT: usize = 3;

// ============================================================================
// PageCapture
// ============================================================================

/// One capture operation, as run by the queue.
#[async_trait]
pub trait PageCapture: Send + Sync + 'static {
    /// Produces the markup for `url`.
    async fn capture(&self, url: &str) -> Result<CapturedPage>;
}

// ============================================================================
// Types
// ============================================================================

/// Completion signal handed to the caller of [`CaptureQueue::enqueue`].
pub type CaptureReceiver = oneshot::Receiver<Result<CapturedPage>>;

/// A request that has not been admitted yet.
struct PendingCapture {
    url: String,
    reply: oneshot::Sender<Result<CapturedPage>>,
}

/// Running count and waiting line, always mutated together.
#[derive(Default)]
struct AdmissionState {
    open_count: usize,
    waiting: VecDeque<PendingCapture>,
}

/// Internal shared state.
struct QueueInner {
    state: Mutex<AdmissionState>,
    capture: Arc<dyn PageCapture>,
}

// ============================================================================
// CaptureQueue
// ============================================================================

/// FIFO queue admitting at most [`MAX_CONCURRENT`] running captures.
#[derive(Clone)]
pub struct CaptureQueue {
    inner: Arc<QueueInner>,
}

impl fmt::Debug for CaptureQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("CaptureQueue")
            .field("open_count", &state.open_count)
            .field("waiting", &state.waiting.len())
            .finish()
    }
}

impl CaptureQueue {
    /// Creates a queue running `capture` for each admitted request.
    #[must_use]
    pub fn new(capture: Arc<dyn PageCapture>) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                state: Mutex::new(AdmissionState::default()),
                capture,
            }),
        }
    }

    /// Appends a request to the waiting line and admits what capacity allows.
    ///
    /// The returned receiver resolves exactly once. Requests cannot be
    /// withdrawn; dropping the receiver only discards the outcome.
    pub fn enqueue(&self, url: impl Into<String>) -> CaptureReceiver {
        let (reply, rx) = oneshot::channel();
        let url = url.into();

        {
            let mut state = self.inner.state.lock();
            state.waiting.push_back(PendingCapture {
                url: url.clone(),
                reply,
            });
            trace!(
                url = %url,
                open = state.open_count,
                waiting = state.waiting.len(),
                "Capture enqueued"
            );
        }

        self.inner.try_admit();
        rx
    }

    /// Enqueues `url` and waits for its outcome.
    ///
    /// # Errors
    ///
    /// The capture's own error, or [`Error::ChannelClosed`] if the capture
    /// task died without answering.
    pub async fn capture(&self, url: impl Into<String>) -> Result<CapturedPage> {
        self.enqueue(url).await?
    }

    /// Returns the number of running captures.
    #[inline]
    #[must_use]
    pub fn open_count(&self) -> usize {
        self.inner.state.lock().open_count
    }

    /// Returns the number of requests waiting for admission.
    #[inline]
    #[must_use]
    pub fn waiting_count(&self) -> usize {
        self.inner.state.lock().waiting.len()
    }
}

// ============================================================================
// QueueInner - Admission
// ============================================================================

impl QueueInner {
    /// Admits waiting requests, head first, while capacity is free.
    fn try_admit(self: &Arc<Self>) {
        let admitted: Vec<PendingCapture> = {
            let mut state = self.state.lock();
            let mut admitted = Vec::new();

            while state.open_count < MAX_CONCURRENT {
                let Some(next) = state.waiting.pop_front() else {
                    break;
                };
                state.open_count += 1;
                admitted.push(next);
            }

            debug_assert!(state.open_count <= MAX_CONCURRENT);
            admitted
        };

        for pending in admitted {
            self.start(pending);
        }
    }

    /// Runs one admitted request on its own task.
    fn start(self: &Arc<Self>, pending: PendingCapture) {
        let slot = AdmissionSlot {
            queue: Arc::clone(self),
        };

        let Ok(handle) = Handle::try_current() else {
            let _ = pending
                .reply
                .send(Err(Error::config("Capture queue used outside a Tokio runtime")));
            drop(slot);
            return;
        };

        debug!(url = %pending.url, "Capture admitted");
        let capture = Arc::clone(&self.capture);

        handle.spawn(async move {
            // Released after the reply is sent
            let _slot = slot;
            let result = capture.capture(&pending.url).await;
            let _ = pending.reply.send(result);
        });
    }
}

// ============================================================================
// AdmissionSlot
// ============================================================================

/// One unit of running capacity.
struct AdmissionSlot {
    queue: Arc<QueueInner>,
}

impl Drop for AdmissionSlot {
    fn drop(&mut self) {
        {
            let mut state = self.queue.state.lock();
            state.open_count -= 1;
            trace!(
                open = state.open_count,
                waiting = state.waiting.len(),
                "Admission slot released"
            );
        }
        self.queue.try_admit();
    }
}

// ============================================================================
// Tests
// ============================================================================
