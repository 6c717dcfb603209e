//! Identity-keyed table of tracked documents.
//!
//! Holds at most one entry per document. Removing an entry always tears it
//! down completely: helpers first, then the translation unit.

use std::collections::HashMap;

use crate::frontend::{CompilerFrontend, UnitHandle};

use super::DocumentId;
use super::entry::{DocumentEntry, Generation};
use super::unit::TranslationUnitManager;

#[derive(Debug, Default)]
pub struct DocumentRegistry {
    entries: HashMap<DocumentId, DocumentEntry>,
    next_generation: u64,
}

impl DocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp for the next entry created.
    pub(crate) fn next_generation(&mut self) -> Generation {
        self.next_generation += 1;
        Generation(self.next_generation)
    }

    /// Insert a freshly built entry.
    ///
    /// Callers remove any previous entry for the same document before
    /// building the new one; an entry still present here is torn down.
    pub(crate) fn insert(&mut self, entry: DocumentEntry, frontend: &mut dyn CompilerFrontend) {
        if let Some(stale) = self.entries.insert(entry.id(), entry) {
            tracing::warn!("[registry] replaced live entry for {}", stale.id());
            Self::teardown(stale, frontend);
        }
    }

    /// Remove and tear down the entry for `id`. Returns whether one existed.
    pub fn remove(&mut self, id: DocumentId, frontend: &mut dyn CompilerFrontend) -> bool {
        match self.entries.remove(&id) {
            Some(entry) => {
                Self::teardown(entry, frontend);
                true
            }
            None => false,
        }
    }

    /// Tear down every entry, returning the identities that were tracked.
    pub fn clear(&mut self, frontend: &mut dyn CompilerFrontend) -> Vec<DocumentId> {
        let mut removed: Vec<DocumentId> = self.entries.keys().copied().collect();
        removed.sort();
        for (_, entry) in self.entries.drain() {
            Self::teardown(entry, frontend);
        }
        removed
    }

    fn teardown(mut entry: DocumentEntry, frontend: &mut dyn CompilerFrontend) {
        entry.helpers.teardown();
        entry.observers.clear();
        TranslationUnitManager::new(frontend).dispose(&mut entry.unit);
        crate::debug_event!("registry", "removed", "{} {}", entry.id(), entry.path().display());
    }

    pub fn get(&self, id: DocumentId) -> Option<&DocumentEntry> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: DocumentId) -> Option<&mut DocumentEntry> {
        self.entries.get_mut(&id)
    }

    pub fn contains(&self, id: DocumentId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Live handle of the document's translation unit.
    pub fn get_translation_unit(&self, id: DocumentId) -> Option<UnitHandle> {
        self.entries.get(&id)?.unit.handle()
    }

    pub fn ids(&self) -> impl Iterator<Item = DocumentId> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
