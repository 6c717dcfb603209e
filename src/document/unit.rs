//! Translation unit handles and the operations that create, refresh and
//! release them.
//!
//! A unit moves through `Parsed -> Stale -> Parsed -> ... -> Disposed`.
//! There is no half-built state: `create` either hands back a parsed unit
//! or nothing at all.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::error::{CdkError, CdkResult};
use crate::frontend::{CompilerFrontend, UnitHandle, UnsavedFile};
use crate::index::SourceIndex;
use crate::project::CompilerFlagSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
    /// Last parse or reparse succeeded.
    Parsed,
    /// Last reparse failed; the handle still holds the previous snapshot.
    Stale,
    /// Released. The handle must not be used.
    Disposed,
}

/// One parsed snapshot of a source file, exclusively owned by its entry.
#[derive(Debug)]
pub struct TranslationUnit {
    path: PathBuf,
    handle: Option<UnitHandle>,
    state: UnitState,
}

impl TranslationUnit {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The live handle, or `None` once disposed.
    pub fn handle(&self) -> Option<UnitHandle> {
        self.handle
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    pub fn is_disposed(&self) -> bool {
        self.state == UnitState::Disposed
    }
}

impl Drop for TranslationUnit {
    fn drop(&mut self) {
        if let Some(handle) = self.handle {
            tracing::warn!(
                "[unit] {} dropped without dispose, leaking {handle:?}",
                self.path.display()
            );
        }
    }
}

/// Creates, reparses and disposes translation units through the frontend.
pub struct TranslationUnitManager<'a> {
    frontend: &'a mut dyn CompilerFrontend,
}

impl<'a> TranslationUnitManager<'a> {
    pub fn new(frontend: &'a mut dyn CompilerFrontend) -> Self {
        Self { frontend }
    }

    /// Parse `path` from disk with the project flags.
    ///
    /// The frontend may return a broken handle together with an error; that
    /// handle is disposed before the error is returned.
    pub fn create(
        &mut self,
        path: &Path,
        flags: &CompilerFlagSet,
        index: &SourceIndex,
    ) -> CdkResult<TranslationUnit> {
        let index = index.handle().ok_or(CdkError::ProjectClosed)?;
        let (handle, code) = self.frontend.parse(index, path, flags.args());

        match handle {
            Some(handle) if code.is_success() => {
                crate::debug_event!("unit", "parsed", "{} -> {handle:?}", path.display());
                Ok(TranslationUnit {
                    path: path.to_path_buf(),
                    handle: Some(handle),
                    state: UnitState::Parsed,
                })
            }
            broken => {
                if let Some(handle) = broken {
                    self.frontend.dispose_unit(handle);
                }
                // A null handle with a success code is still a failure.
                let code = if code.is_success() {
                    crate::frontend::ErrorCode::Failure
                } else {
                    code
                };
                Err(CdkError::Parse {
                    path: path.to_path_buf(),
                    code,
                })
            }
        }
    }

    /// Refresh `unit`.
    ///
    /// When the document is dirty its buffer replaces the file on disk for
    /// this reparse; otherwise the file is read from disk. On failure the
    /// previous snapshot is kept and the unit is marked stale.
    pub fn reparse<'c>(
        &mut self,
        unit: &mut TranslationUnit,
        doc_is_dirty: bool,
        unsaved_contents: impl FnOnce() -> Cow<'c, [u8]>,
    ) -> CdkResult<()> {
        let handle = unit.handle.ok_or_else(|| CdkError::Disposed {
            path: unit.path.clone(),
        })?;

        let code = if doc_is_dirty {
            let contents = unsaved_contents();
            let unsaved = [UnsavedFile {
                path: &unit.path,
                contents: &contents,
            }];
            self.frontend.reparse(handle, &unsaved)
        } else {
            self.frontend.reparse(handle, &[])
        };

        if code.is_success() {
            unit.state = UnitState::Parsed;
            Ok(())
        } else {
            unit.state = UnitState::Stale;
            Err(CdkError::Reparse {
                path: unit.path.clone(),
                code,
            })
        }
    }

    /// Release `unit`. Disposing twice is a no-op.
    pub fn dispose(&mut self, unit: &mut TranslationUnit) {
        if let Some(handle) = unit.handle.take() {
            self.frontend.dispose_unit(handle);
            crate::debug_event!("unit", "disposed", "{}", unit.path.display());
        }
        unit.state = UnitState::Disposed;
    }
}
