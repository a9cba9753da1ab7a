//! Visibility Store - the single "is a loading indicator shown" signal
//!
//! Holds the current [`VisibilitySession`] and notifies subscribers on every
//! state change through a tokio broadcast channel. There is no batching or
//! debouncing here: each transition produces exactly one event.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;

/// Message shown when a caller doesn't supply one
pub const DEFAULT_MESSAGE: &str = "Loading...";

/// Default broadcast capacity for visibility events
pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Largest accepted broadcast capacity for visibility events
pub const MAX_EVENT_CAPACITY: usize = 65_536;

/// Current state of the loading indicator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibilitySession {
    /// Whether the indicator is currently shown
    pub is_visible: bool,

    /// Text for the current (or most recent) session
    pub message: String,
}

impl VisibilitySession {
    /// A hidden session carrying the given message
    pub fn hidden(message: impl Into<String>) -> Self {
        Self {
            is_visible: false,
            message: message.into(),
        }
    }
}

impl Default for VisibilitySession {
    fn default() -> Self {
        Self::hidden(DEFAULT_MESSAGE)
    }
}

/// Notification sent to subscribers on each state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum VisibilityEvent {
    /// Indicator went from hidden to shown
    Shown { message: String },
    /// Indicator stayed shown but its message changed
    MessageChanged { message: String },
    /// Indicator went from shown to hidden
    Hidden,
}

impl VisibilityEvent {
    /// Short name of the event variant, for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Shown { .. } => "Shown",
            Self::MessageChanged { .. } => "MessageChanged",
            Self::Hidden => "Hidden",
        }
    }
}

/// Holds the visibility state and fans out change notifications
pub struct VisibilityStore {
    session: VisibilitySession,
    tx: broadcast::Sender<VisibilityEvent>,
}

impl VisibilityStore {
    /// Create a hidden store with the given default message and channel capacity
    pub fn new(default_message: impl Into<String>, capacity: usize) -> Self {
        let default_message = default_message.into();
        debug!(%default_message, capacity, "VisibilityStore::new: called");
        // broadcast::channel panics on zero or oversized capacity
        let (tx, _) = broadcast::channel(capacity.clamp(1, MAX_EVENT_CAPACITY));
        Self {
            session: VisibilitySession::hidden(default_message),
            tx,
        }
    }

    /// Show the indicator with `message`
    ///
    /// Calling this while already visible only updates the message. Returns
    /// true if anything changed.
    pub fn show(&mut self, message: &str) -> bool {
        debug!(%message, was_visible = self.session.is_visible, "VisibilityStore::show: called");
        if self.session.is_visible {
            if self.session.message == message {
                return false;
            }
            self.session.message = message.to_string();
            self.notify(VisibilityEvent::MessageChanged {
                message: message.to_string(),
            });
            return true;
        }

        self.session.is_visible = true;
        self.session.message = message.to_string();
        self.notify(VisibilityEvent::Shown {
            message: message.to_string(),
        });
        true
    }

    /// Hide the indicator, keeping the last message
    ///
    /// No-op when already hidden. Returns true if the state changed.
    pub fn hide(&mut self) -> bool {
        debug!(was_visible = self.session.is_visible, "VisibilityStore::hide: called");
        if !self.session.is_visible {
            return false;
        }
        self.session.is_visible = false;
        self.notify(VisibilityEvent::Hidden);
        true
    }

    pub fn is_visible(&self) -> bool {
        self.session.is_visible
    }

    pub fn session(&self) -> &VisibilitySession {
        &self.session
    }

    /// Subscribe to state changes made after this call
    pub fn subscribe(&self) -> broadcast::Receiver<VisibilityEvent> {
        debug!("VisibilityStore::subscribe: new subscriber");
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    fn notify(&self, event: VisibilityEvent) {
        debug!(event_type = event.event_type(), "VisibilityStore::notify");
        // No subscribers is fine
        let _ = self.tx.send(event);
    }
}

impl Default for VisibilityStore {
    fn default() -> Self {
        Self::new(DEFAULT_MESSAGE, DEFAULT_EVENT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    #[test]
    fn test_store_starts_hidden() {
        let store = VisibilityStore::default();
        assert!(!store.is_visible());
        assert_eq!(store.session().message, DEFAULT_MESSAGE);
    }

    #[test]
    fn test_capacity_is_clamped() {
        let mut store = VisibilityStore::new("msg", usize::MAX);
        let mut rx = store.subscribe();
        assert!(store.show("msg"));
        assert!(rx.try_recv().is_ok());

        let zero = VisibilityStore::new("msg", 0);
        assert!(!zero.is_visible());
    }

    #[test]
    fn test_show_then_hide_notifies_once_each() {
        let mut store = VisibilityStore::default();
        let mut rx = store.subscribe();

        assert!(store.show("Fetching reports"));
        assert!(store.hide());

        assert_eq!(
            rx.try_recv().unwrap(),
            VisibilityEvent::Shown {
                message: "Fetching reports".to_string()
            }
        );
        assert_eq!(rx.try_recv().unwrap(), VisibilityEvent::Hidden);
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_show_while_visible_updates_message() {
        let mut store = VisibilityStore::default();
        let mut rx = store.subscribe();

        store.show("first");
        assert!(store.show("second"));
        assert!(!store.show("second"));

        assert_eq!(store.session().message, "second");
        assert_eq!(rx.try_recv().unwrap().event_type(), "Shown");
        assert_eq!(
            rx.try_recv().unwrap(),
            VisibilityEvent::MessageChanged {
                message: "second".to_string()
            }
        );
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_hide_when_hidden_is_noop() {
        let mut store = VisibilityStore::default();
        let mut rx = store.subscribe();

        assert!(!store.hide());
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[test]
    fn test_hide_retains_message() {
        let mut store = VisibilityStore::default();
        store.show("Exporting CSV");
        store.hide();
        assert_eq!(store.session(), &VisibilitySession::hidden("Exporting CSV"));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let store = VisibilityStore::new("x", 0);
        let _rx = store.subscribe();
        assert_eq!(store.subscriber_count(), 1);
    }

    #[test]
    fn test_event_serializes_with_tag() {
        let json = serde_json::to_string(&VisibilityEvent::Hidden).unwrap();
        assert_eq!(json, r#"{"type":"hidden"}"#);
    }
}
