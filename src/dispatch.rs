//! Fan-out of a fresh snapshot to everything that depends on it.
//!
//! The order is fixed: completer, highlighter, diagnostics, then the
//! document-level "updated" event for external observers. A helper that
//! fails is logged and skipped; the remaining steps still run.

use crate::document::{Document, DocumentEntry, DocumentId};
use crate::error::CdkError;
use crate::frontend::CompilerFrontend;
use crate::helpers::HelperContext;
use crate::notifications::{NotificationBroadcaster, SessionEvent};

/// What per-document observers are told.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryEvent {
    Refreshed { helper: &'static str },
    RefreshFailed { helper: &'static str, reason: String },
    /// All helpers have seen the new snapshot.
    Updated,
}

type Listener = Box<dyn FnMut(DocumentId, &EntryEvent) + Send>;

/// Callbacks registered against a single entry.
#[derive(Default)]
pub struct Observers {
    listeners: Vec<Listener>,
}

impl Observers {
    pub fn subscribe(&mut self, listener: impl FnMut(DocumentId, &EntryEvent) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn notify(&mut self, id: DocumentId, event: &EntryEvent) {
        for listener in &mut self.listeners {
            listener(id, event);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }
}

/// Outcome of one dispatch.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub refreshed: Vec<&'static str>,
    pub failed: Vec<(&'static str, String)>,
    /// Whether the external "updated" event went out.
    pub announced: bool,
}

impl DispatchReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct UpdateDispatcher;

impl UpdateDispatcher {
    /// Refresh every helper of `entry` from its current snapshot, then
    /// announce the update.
    ///
    /// Does nothing when the entry has no live unit.
    pub fn dispatch(
        entry: &mut DocumentEntry,
        document: &dyn Document,
        frontend: &mut dyn CompilerFrontend,
        broadcaster: &NotificationBroadcaster,
    ) -> DispatchReport {
        let mut report = DispatchReport::default();
        let Some(unit) = entry.unit.handle() else {
            return report;
        };
        let id = entry.id();
        let path = entry.path().to_path_buf();

        for helper in entry.helpers.in_dispatch_order() {
            let name = helper.name();
            let mut ctx = HelperContext {
                document,
                path: &path,
                unit,
                frontend: &mut *frontend,
            };
            let event = match helper.updated(&mut ctx) {
                Ok(()) => {
                    report.refreshed.push(name);
                    EntryEvent::Refreshed { helper: name }
                }
                Err(err) => {
                    let err = CdkError::ConsumerRefresh {
                        helper: name.to_string(),
                        path: path.clone(),
                        reason: err.to_string(),
                    };
                    tracing::warn!("[dispatch] {err}");
                    let reason = err.to_string();
                    report.failed.push((name, reason.clone()));
                    EntryEvent::RefreshFailed {
                        helper: name,
                        reason,
                    }
                }
            };
            entry.observers.notify(id, &event);
        }

        entry.observers.notify(id, &EntryEvent::Updated);
        broadcaster.send(SessionEvent::DocumentUpdated { id });
        report.announced = true;

        crate::debug_event!(
            "dispatch",
            "updated",
            "{id}: {} refreshed, {} failed",
            report.refreshed.len(),
            report.failed.len()
        );
        report
    }
}
