//! Where capture tabs are opened.

use crate::identifiers::{CookieStoreId, WindowId};
use crate::transport::ReadyData;

/// The isolated browsing context (container) and window capture tabs open in.
///
/// Resolved once per session and handed to the capture pipeline explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureContext {
    /// Container cookie store.
    pub cookie_store_id: CookieStoreId,
    /// Window the tabs are attached to.
    pub window_id: WindowId,
}

impl CaptureContext {
    /// Creates a context.
    #[inline]
    #[must_use]
    pub fn new(cookie_store_id: CookieStoreId, window_id: WindowId) -> Self {
        Self {
            cookie_store_id,
            window_id,
        }
    }

    /// Short label for the panel title, e.g. `#12`.
    #[must_use]
    pub fn label(&self) -> String {
        match self.cookie_store_id.user_context_id() {
            Some(id) => format!("#{id}"),
            None => self.cookie_store_id.to_string(),
        }
    }
}

impl From<ReadyData> for CaptureContext {
    fn from(ready: ReadyData) -> Self {
        Self::new(ready.cookie_store_id, ready.window_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label() {
        let context = CaptureContext::new(CookieStoreId::new("firefox-container-12"), WindowId::new(1));
        assert_eq!(context.label(), "#12");

        let context = CaptureContext::new(CookieStoreId::new("firefox-default"), WindowId::new(1));
        assert_eq!(context.label(), "firefox-default");
    }

    #[test]
    fn test_from_ready() {
        let ready = ReadyData {
            cookie_store_id: CookieStoreId::new("firefox-container-3"),
            window_id: WindowId::new(8),
        };
        let context = CaptureContext::from(ready);
        assert_eq!(context.window_id, WindowId::new(8));
        assert_eq!(context.cookie_store_id.as_str(), "firefox-container-3");
    }
}
