//! Notification broadcasting for session observers.
//!
//! Provides a broadcast channel for lifecycle events so any number of
//! external observers (status bars, symbol views, tests) can follow what
//! the session does without being wired into it.

use std::path::PathBuf;

use tokio::sync::broadcast;

use crate::document::DocumentId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    ProjectOpened { base_dir: PathBuf },
    ProjectClosed,
    ProjectSaved,
    DocumentAdded { id: DocumentId, path: PathBuf },
    DocumentRemoved { id: DocumentId },
    /// Fresh semantic data is available and every helper has been refreshed.
    DocumentUpdated { id: DocumentId },
    /// A reparse failed; helpers keep showing the previous snapshot.
    DocumentStale { id: DocumentId },
    CurrentDocumentChanged { id: Option<DocumentId> },
}

/// Fans session events out to every subscriber.
#[derive(Clone)]
pub struct NotificationBroadcaster {
    sender: broadcast::Sender<SessionEvent>,
}

impl NotificationBroadcaster {
    /// Create a new broadcaster with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Send an event to all subscribers
    pub fn send(&self, event: SessionEvent) {
        match self.sender.send(event.clone()) {
            Ok(count) => {
                crate::debug_event!("broadcast", "sent", "{event:?} to {count} subscribers");
            }
            Err(_) => {
                // No receivers, this is fine
                crate::debug_event!("broadcast", "dropped", "no subscribers for {event:?}");
            }
        }
    }

    /// Subscribe to receive notifications
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}

impl Default for NotificationBroadcaster {
    fn default() -> Self {
        Self::new(256)
    }
}
