//! One tracked document: its translation unit and the helpers fed by it.

use std::path::{Path, PathBuf};

use crate::dispatch::Observers;
use crate::helpers::HelperSet;

use super::DocumentId;
use super::unit::TranslationUnit;

/// Monotonic stamp distinguishing successive entries for the same document.
///
/// Timers capture the generation of the entry they were scheduled for and
/// are ignored when it no longer matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(pub u64);

pub struct DocumentEntry {
    id: DocumentId,
    path: PathBuf,
    generation: Generation,
    pub(crate) unit: TranslationUnit,
    pub(crate) helpers: HelperSet,
    pub(crate) observers: Observers,
}

impl DocumentEntry {
    pub(crate) fn new(
        id: DocumentId,
        generation: Generation,
        unit: TranslationUnit,
        helpers: HelperSet,
    ) -> Self {
        Self {
            id,
            path: unit.path().to_path_buf(),
            generation,
            unit,
            helpers,
            observers: Observers::default(),
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn unit(&self) -> &TranslationUnit {
        &self.unit
    }

    pub fn helpers(&self) -> &HelperSet {
        &self.helpers
    }

    pub fn helpers_mut(&mut self) -> &mut HelperSet {
        &mut self.helpers
    }

    pub fn observers_mut(&mut self) -> &mut Observers {
        &mut self.observers
    }
}

impl std::fmt::Debug for DocumentEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentEntry")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("generation", &self.generation)
            .field("unit", &self.unit.handle())
            .field("observers", &self.observers.len())
            .finish()
    }
}
