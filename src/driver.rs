//! Async event loop around a [`Session`].
//!
//! Host events arrive on an mpsc channel and are applied to the session in
//! order; a periodic tick fires due reparse and highlight timers in
//! between. Everything runs on the loop's task, so the session itself
//! needs no locking.

use std::ops::Range;
use std::path::PathBuf;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior, interval};

use crate::document::{DocumentId, DocumentProvider};
use crate::project::ProjectConfig;
use crate::session::Session;

/// A host lifecycle event.
#[derive(Debug)]
pub enum HostEvent {
    ProjectOpened {
        base_dir: PathBuf,
        config: ProjectConfig,
    },
    ProjectClosed,
    /// Reply with the configuration to persist.
    ProjectSaved {
        reply: oneshot::Sender<Option<ProjectConfig>>,
    },
    Reconfigure {
        cflags: String,
        files: Vec<PathBuf>,
    },
    DocumentOpened(DocumentId),
    DocumentClosed(DocumentId),
    DocumentSaved(DocumentId),
    DocumentActivated(DocumentId),
    FiletypeChanged(DocumentId),
    TextModified(DocumentId),
    StyleNeeded {
        id: DocumentId,
        range: Range<usize>,
    },
    Shutdown,
}

/// Drives a session from host events.
pub struct EventLoop {
    session: Session,
    tick: Duration,
}

impl EventLoop {
    pub fn new(session: Session) -> Self {
        let tick = session.settings().timing.tick();
        Self { session, tick }
    }

    /// Override the tick period.
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick.max(Duration::from_millis(1));
        self
    }

    /// Run until [`HostEvent::Shutdown`] arrives or every sender is gone.
    ///
    /// The project is closed before the session is handed back.
    pub async fn run<P>(mut self, mut events: mpsc::Receiver<HostEvent>, provider: P) -> Session
    where
        P: DocumentProvider,
    {
        let mut ticker = interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        crate::log_event!("driver", "started", "tick {:?}", self.tick);

        loop {
            tokio::select! {
                event = events.recv() => {
                    match event {
                        Some(HostEvent::Shutdown) | None => break,
                        Some(event) => self.handle(event, &provider),
                    }
                }

                now = ticker.tick() => {
                    let report = self.session.tick(now.into_std(), &provider);
                    if !report.is_idle() {
                        crate::debug_event!("driver", "tick", "{report:?}");
                    }
                }
            }
        }

        self.session.close_project();
        crate::log_event!("driver", "stopped");
        self.session
    }

    fn handle(&mut self, event: HostEvent, provider: &dyn DocumentProvider) {
        crate::debug_event!("driver", "event", "{event:?}");

        match event {
            HostEvent::ProjectOpened { base_dir, config } => {
                match self.session.open_project(&base_dir, &config) {
                    Ok(()) => {
                        self.session.add_open_documents(provider);
                    }
                    Err(e) => tracing::error!("[driver] failed to open project: {e}"),
                }
            }
            HostEvent::ProjectClosed => self.session.close_project(),
            HostEvent::ProjectSaved { reply } => {
                // Receiver may have given up waiting.
                let _ = reply.send(self.session.save_project());
            }
            HostEvent::Reconfigure { cflags, files } => {
                if let Err(e) = self.session.reconfigure(&cflags, &files, provider) {
                    tracing::error!("[driver] reconfigure failed: {e}");
                }
            }
            HostEvent::DocumentOpened(id) => {
                if let Some(doc) = provider.document(id) {
                    self.session.document_opened(doc);
                }
            }
            HostEvent::DocumentClosed(id) => {
                self.session.document_closed(id);
            }
            HostEvent::DocumentSaved(id) => {
                if let Some(doc) = provider.document(id) {
                    self.session.document_saved(doc);
                }
            }
            HostEvent::DocumentActivated(id) => {
                if let Some(doc) = provider.document(id) {
                    self.session.document_activated(doc);
                }
            }
            HostEvent::FiletypeChanged(id) => {
                if let Some(doc) = provider.document(id) {
                    self.session.document_filetype_changed(doc);
                }
            }
            HostEvent::TextModified(id) => {
                self.session.text_modified_at(id, Instant::now().into_std());
            }
            HostEvent::StyleNeeded { id, range } => {
                self.session
                    .style_needed_at(id, range, Instant::now().into_std());
            }
            HostEvent::Shutdown => {}
        }
    }
}
