//! The parsing context shared by every translation unit of a project.

use crate::error::{CdkError, CdkResult};
use crate::frontend::{CompilerFrontend, IndexHandle};

/// Owns at most one live frontend index.
///
/// Closing the index invalidates every translation unit created from it,
/// so callers must drop all tracked documents in the same step.
#[derive(Debug, Default)]
pub struct SourceIndex {
    handle: Option<IndexHandle>,
}

impl SourceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh context, disposing any previous one first.
    pub fn open(&mut self, frontend: &mut dyn CompilerFrontend) -> CdkResult<IndexHandle> {
        self.close(frontend);

        match frontend.create_index() {
            Ok(handle) => {
                crate::debug_event!("index", "created", "{handle:?}");
                self.handle = Some(handle);
                Ok(handle)
            }
            Err(code) => Err(CdkError::IndexCreation { code }),
        }
    }

    /// Dispose the context. No-op when nothing is open.
    pub fn close(&mut self, frontend: &mut dyn CompilerFrontend) {
        if let Some(handle) = self.handle.take() {
            frontend.dispose_index(handle);
            crate::debug_event!("index", "disposed", "{handle:?}");
        }
    }

    pub fn handle(&self) -> Option<IndexHandle> {
        self.handle
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }
}
