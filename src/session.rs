//! The semantic tracking session.
//!
//! A `Session` wires together the source index, the open project, the
//! document registry and the reparse timers. Host lifecycle events map
//! one-to-one onto its methods; nothing is looked up globally.
//!
//! # Timers
//!
//! Reparse timers live in a [`Debouncer`] keyed by document identity and
//! stamped with the entry [`Generation`]. Highlight timers live inside each
//! entry's highlighter and die with it. Every teardown path (document
//! close, re-add, project close) cancels the document's reparse timer
//! before its unit is disposed, and a timer that still fires for a
//! replaced entry is dropped by the generation check in [`Session::tick`].

use std::ops::Range;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tokio::sync::broadcast;

use crate::config::Settings;
use crate::debouncer::Debouncer;
use crate::dispatch::{DispatchReport, EntryEvent, UpdateDispatcher};
use crate::document::entry::Generation;
use crate::document::{
    Document, DocumentEntry, DocumentId, DocumentProvider, DocumentRegistry,
    TranslationUnitManager,
};
use crate::error::CdkResult;
use crate::frontend::{CompilerFrontend, UnitHandle};
use crate::helpers::{HelperContext, HelperSet};
use crate::index::SourceIndex;
use crate::notifications::{NotificationBroadcaster, SessionEvent};
use crate::project::{CompilerFlagSet, Project, ProjectConfig};

/// Work performed by one [`Session::tick`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Documents reparsed because their timer fired.
    pub reparsed: Vec<DocumentId>,
    /// Timers dropped because their entry was gone or replaced.
    pub dropped: Vec<DocumentId>,
    /// Documents whose coalesced highlight range was processed.
    pub highlighted: Vec<DocumentId>,
}

impl TickReport {
    pub fn is_idle(&self) -> bool {
        self.reparsed.is_empty() && self.dropped.is_empty() && self.highlighted.is_empty()
    }
}

pub struct Session {
    settings: Settings,
    frontend: Box<dyn CompilerFrontend>,
    index: SourceIndex,
    project: Option<Project>,
    registry: DocumentRegistry,
    reparse_timers: Debouncer,
    current: Option<DocumentId>,
    broadcaster: NotificationBroadcaster,
}

impl Session {
    pub fn new(settings: Settings, frontend: Box<dyn CompilerFrontend>) -> Self {
        let reparse_timers = Debouncer::new(settings.timing.reparse_delay());
        Self {
            settings,
            frontend,
            index: SourceIndex::new(),
            project: None,
            registry: DocumentRegistry::new(),
            reparse_timers,
            current: None,
            broadcaster: NotificationBroadcaster::default(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    // ---- project lifecycle ----

    /// Open a project rooted at `base_dir`.
    ///
    /// A project already open is closed first. Failure to create the source
    /// index aborts the open and leaves the session without a project.
    pub fn open_project(&mut self, base_dir: &Path, config: &ProjectConfig) -> CdkResult<()> {
        if self.is_project_open() {
            self.close_project();
        }

        self.index.open(self.frontend.as_mut())?;

        let project = Project::from_config(base_dir, config);
        crate::log_event!(
            "session",
            "project opened",
            "{} ({} files, {} flags)",
            base_dir.display(),
            project.files.len(),
            project.flags.args().len()
        );
        self.project = Some(project);
        self.broadcaster.send(SessionEvent::ProjectOpened {
            base_dir: base_dir.to_path_buf(),
        });
        Ok(())
    }

    /// Drop every tracked document, cancel their timers and release the
    /// source index, in one step.
    pub fn close_project(&mut self) {
        if self.project.is_none() && !self.index.is_open() {
            return;
        }

        self.reparse_timers.clear();
        let removed = self.registry.clear(self.frontend.as_mut());
        for id in &removed {
            self.broadcaster.send(SessionEvent::DocumentRemoved { id: *id });
        }
        self.index.close(self.frontend.as_mut());
        self.project = None;
        self.current = None;

        crate::log_event!("session", "project closed", "{} documents released", removed.len());
        self.broadcaster.send(SessionEvent::ProjectClosed);
    }

    /// Configuration to persist for the open project.
    pub fn save_project(&self) -> Option<ProjectConfig> {
        let config = self.project.as_ref()?.to_config();
        self.broadcaster.send(SessionEvent::ProjectSaved);
        Some(config)
    }

    /// Apply new flags and membership, then re-track every open document.
    ///
    /// Flags that fail to tokenize are ignored and the previous ones stay
    /// in effect. Returns how many documents are tracked afterwards.
    pub fn reconfigure(
        &mut self,
        cflags: &str,
        files: &[PathBuf],
        provider: &dyn DocumentProvider,
    ) -> CdkResult<usize> {
        let Some(project) = self.project.as_ref() else {
            return Err(crate::error::CdkError::ProjectClosed);
        };
        let base_dir = project.base_dir().to_path_buf();

        let cflags = match CompilerFlagSet::parse(cflags) {
            Ok(_) => cflags.to_string(),
            Err(e) => {
                tracing::warn!("[session] {e}; keeping previous flags");
                project.flags.to_command_line()
            }
        };
        let config = ProjectConfig::new(cflags, files.to_vec());

        self.close_project();
        self.open_project(&base_dir, &config)?;
        Ok(self.add_open_documents(provider))
    }

    /// Try to track every document the host has open.
    pub fn add_open_documents(&mut self, provider: &dyn DocumentProvider) -> usize {
        provider
            .open_documents()
            .into_iter()
            .filter_map(|id| provider.document(id))
            .filter(|doc| self.add(*doc))
            .count()
    }

    pub fn is_project_open(&self) -> bool {
        self.project.is_some()
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    /// Tokenized flags of the open project.
    pub fn cflags(&self) -> &[String] {
        self.project
            .as_ref()
            .map(|project| project.flags.args())
            .unwrap_or_default()
    }

    /// Member paths of the open project, in order.
    pub fn files(&self) -> Vec<&Path> {
        self.project
            .as_ref()
            .map(|project| project.files.iter().collect())
            .unwrap_or_default()
    }

    // ---- registry operations ----

    /// Path under which `doc` would be tracked, if it qualifies.
    fn eligible_path(&self, doc: &dyn Document) -> Option<PathBuf> {
        let project = self.project.as_ref()?;
        if !self.index.is_open() || !doc.is_valid() {
            return None;
        }
        let path = doc.path()?;
        let language = doc.language();
        if !self.settings.languages.is_supported(&language) {
            crate::debug_event!("session", "skipped", "{} unsupported {language:?}", doc.id());
            return None;
        }
        if !project.files.contains(path) {
            crate::debug_event!("session", "skipped", "{} not a project member", path.display());
            return None;
        }
        Some(path.to_path_buf())
    }

    /// Start tracking `doc`.
    ///
    /// Rejected unless a project is open, the document is valid, has a
    /// backing path, a supported language, and its path is a project
    /// member. An existing entry for the same document is torn down before
    /// the new unit is parsed. If parsing fails nothing is tracked.
    pub fn add(&mut self, doc: &dyn Document) -> bool {
        let Some(path) = self.eligible_path(doc) else {
            return false;
        };
        let id = doc.id();

        if self.registry.contains(id) {
            self.release(id);
        }

        let Some(project) = self.project.as_ref() else {
            return false;
        };
        let created = TranslationUnitManager::new(self.frontend.as_mut()).create(
            &path,
            &project.flags,
            &self.index,
        );
        let unit = match created {
            Ok(unit) => unit,
            Err(e) => {
                tracing::warn!("[session] {e}");
                return false;
            }
        };

        let mut helpers = HelperSet::new(&self.settings);
        helpers.initialize(doc);
        let generation = self.registry.next_generation();
        self.registry.insert(
            DocumentEntry::new(id, generation, unit, helpers),
            self.frontend.as_mut(),
        );

        crate::log_event!("session", "tracking", "{id} {}", path.display());
        self.broadcaster.send(SessionEvent::DocumentAdded { id, path });
        self.update(doc);
        true
    }

    /// Stop tracking `id`. Returns whether it was tracked.
    pub fn remove(&mut self, id: DocumentId) -> bool {
        if !self.registry.contains(id) {
            return false;
        }
        self.release(id);
        if self.current == Some(id) {
            self.set_current(None);
        }
        true
    }

    /// Cancel the timer, then tear the entry down.
    fn release(&mut self, id: DocumentId) {
        self.reparse_timers.cancel(id);
        if self.registry.remove(id, self.frontend.as_mut()) {
            self.broadcaster.send(SessionEvent::DocumentRemoved { id });
        }
    }

    /// Reparse `doc` and, on success, refresh everything that depends on it.
    ///
    /// Unsaved buffer contents are used when the document is modified.
    /// Returns `false` for untracked documents and failed reparses; a
    /// failed reparse keeps the previous snapshot.
    pub fn update(&mut self, doc: &dyn Document) -> bool {
        self.update_with_report(doc).is_some()
    }

    /// Like [`Session::update`], returning the dispatch outcome.
    pub fn update_with_report(&mut self, doc: &dyn Document) -> Option<DispatchReport> {
        let id = doc.id();
        let entry = self.registry.get_mut(id)?;

        let reparsed = TranslationUnitManager::new(self.frontend.as_mut()).reparse(
            &mut entry.unit,
            doc.is_modified(),
            || doc.contents(),
        );
        if let Err(e) = reparsed {
            tracing::warn!("[session] {e}; keeping previous snapshot");
            self.broadcaster.send(SessionEvent::DocumentStale { id });
            return None;
        }

        Some(UpdateDispatcher::dispatch(
            entry,
            doc,
            self.frontend.as_mut(),
            &self.broadcaster,
        ))
    }

    /// Live translation unit of `id`.
    pub fn get_translation_unit(&self, id: DocumentId) -> Option<UnitHandle> {
        self.registry.get_translation_unit(id)
    }

    pub fn is_tracked(&self, id: DocumentId) -> bool {
        self.registry.contains(id)
    }

    pub fn entry(&self, id: DocumentId) -> Option<&DocumentEntry> {
        self.registry.get(id)
    }

    pub fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    // ---- host events ----

    pub fn document_opened(&mut self, doc: &dyn Document) -> bool {
        self.add(doc)
    }

    pub fn document_closed(&mut self, id: DocumentId) -> bool {
        self.remove(id)
    }

    /// A save may give an untracked document its first project path.
    pub fn document_saved(&mut self, doc: &dyn Document) -> bool {
        if self.registry.contains(doc.id()) {
            self.update(doc)
        } else {
            self.add(doc)
        }
    }

    pub fn document_activated(&mut self, doc: &dyn Document) -> bool {
        if !self.set_current(Some(doc.id())) {
            return false;
        }
        self.update(doc)
    }

    pub fn document_filetype_changed(&mut self, doc: &dyn Document) -> bool {
        self.remove(doc.id());
        self.add(doc)
    }

    /// Schedule a reparse of `id`. A pending timer is not extended.
    pub fn text_modified(&mut self, id: DocumentId) -> bool {
        self.text_modified_at(id, Instant::now())
    }

    pub fn text_modified_at(&mut self, id: DocumentId, now: Instant) -> bool {
        let Some(entry) = self.registry.get(id) else {
            return false;
        };
        if self.reparse_timers.record_at(id, entry.generation(), now) {
            crate::debug_event!("session", "reparse scheduled", "{id}");
        }
        true
    }

    /// Queue `range` of `id` for re-highlighting.
    pub fn style_needed(&mut self, id: DocumentId, range: Range<usize>) -> bool {
        self.style_needed_at(id, range, Instant::now())
    }

    pub fn style_needed_at(&mut self, id: DocumentId, range: Range<usize>, now: Instant) -> bool {
        match self.registry.get_mut(id) {
            Some(entry) => {
                entry.helpers.highlighter.queue_highlight_at(range, now);
                true
            }
            None => false,
        }
    }

    /// Fire every reparse and highlight timer due at `now`.
    pub fn tick(&mut self, now: Instant, provider: &dyn DocumentProvider) -> TickReport {
        let mut report = TickReport::default();

        for (id, generation) in self.reparse_timers.take_ready(now) {
            if !self.is_live(id, generation) {
                crate::debug_event!("session", "stale timer dropped", "{id}");
                report.dropped.push(id);
                continue;
            }
            match provider.document(id) {
                Some(doc) => {
                    self.update(doc);
                    report.reparsed.push(id);
                }
                None => {
                    // The host destroyed the document without telling us.
                    self.remove(id);
                    report.dropped.push(id);
                }
            }
        }

        let mut ids: Vec<DocumentId> = self.registry.ids().collect();
        ids.sort();
        for id in ids {
            if self.highlight_due(id, now, provider) {
                report.highlighted.push(id);
            }
        }

        report
    }

    fn is_live(&self, id: DocumentId, generation: Generation) -> bool {
        self.registry
            .get(id)
            .is_some_and(|entry| entry.generation() == generation)
    }

    fn highlight_due(&mut self, id: DocumentId, now: Instant, provider: &dyn DocumentProvider) -> bool {
        let Some(entry) = self.registry.get_mut(id) else {
            return false;
        };
        let Some(range) = entry.helpers.highlighter.take_due(now) else {
            return false;
        };
        let (Some(unit), Some(document)) = (entry.unit.handle(), provider.document(id)) else {
            return false;
        };

        let path = entry.path().to_path_buf();
        let mut ctx = HelperContext {
            document,
            path: &path,
            unit,
            frontend: self.frontend.as_mut(),
        };
        if let Err(e) = entry.helpers.highlighter.highlight(&mut ctx, range) {
            tracing::warn!("[session] highlight of {id} failed: {e}");
        }
        true
    }

    /// Whether a reparse is pending for `id`.
    pub fn reparse_pending(&self, id: DocumentId) -> bool {
        self.reparse_timers.is_pending(id)
    }

    /// Earliest reparse deadline, if any timer is armed.
    pub fn next_reparse_deadline(&self) -> Option<Instant> {
        self.reparse_timers.next_deadline()
    }

    /// Completions at byte `offset` of `doc`, if it is tracked and the
    /// cursor is at a completion point.
    pub fn complete(&mut self, doc: &dyn Document, offset: usize) -> Option<Vec<String>> {
        let entry = self.registry.get_mut(doc.id())?;
        let unit = entry.unit.handle()?;
        let path = entry.path().to_path_buf();
        let mut ctx = HelperContext {
            document: doc,
            path: &path,
            unit,
            frontend: self.frontend.as_mut(),
        };
        entry.helpers.completer.complete(&mut ctx, offset)
    }

    // ---- current document and observers ----

    /// Make `id` the current document. Only tracked documents or `None`
    /// are accepted.
    pub fn set_current(&mut self, id: Option<DocumentId>) -> bool {
        if let Some(id) = id
            && !self.registry.contains(id)
        {
            return false;
        }
        if self.current != id {
            self.current = id;
            self.broadcaster
                .send(SessionEvent::CurrentDocumentChanged { id });
        }
        true
    }

    pub fn current(&self) -> Option<DocumentId> {
        self.current
    }

    /// Register a callback for `id`'s helper and update events. The
    /// callback is dropped with the entry.
    pub fn observe(
        &mut self,
        id: DocumentId,
        listener: impl FnMut(DocumentId, &EntryEvent) + Send + 'static,
    ) -> bool {
        match self.registry.get_mut(id) {
            Some(entry) => {
                entry.observers_mut().subscribe(listener);
                true
            }
            None => false,
        }
    }

    /// Receive session-wide events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.broadcaster.subscribe()
    }

    pub fn broadcaster(&self) -> &NotificationBroadcaster {
        &self.broadcaster
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close_project();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("project", &self.project.as_ref().map(Project::base_dir))
            .field("index", &self.index)
            .field("tracked", &self.registry.len())
            .field("pending_reparses", &self.reparse_timers.pending_count())
            .field("current", &self.current)
            .finish()
    }
}
