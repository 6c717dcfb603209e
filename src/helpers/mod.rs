//! Dependent consumers that derive editor state from a fresh snapshot.
//!
//! Each tracked document owns one of each helper. Helpers never draw; they
//! compute what the host should show (styled spans, diagnostic marks,
//! completion lists) and keep it until the next refresh.
//!
//! # Architecture
//!
//! ```text
//! DocumentEntry
//!   - TranslationUnit
//!   - HelperSet
//!         |
//!    +----------+-------------+-------------+
//!    |          |             |             |
//! Completer  Highlighter  Diagnostics   observers
//! ```

pub mod completer;
pub mod diagnostics;
pub mod highlighter;

use std::path::Path;

use crate::config::Settings;
use crate::document::Document;
use crate::error::CdkResult;
use crate::frontend::{CompilerFrontend, UnitHandle};

pub use completer::Completer;
pub use diagnostics::{DiagnosticKind, Diagnostics, Indicator, Marker};
pub use highlighter::{HighlightQueue, Highlighter, StyleId, StyledSpan};

/// Everything a helper may touch while refreshing.
pub struct HelperContext<'a> {
    pub document: &'a dyn Document,
    pub path: &'a Path,
    pub unit: UnitHandle,
    pub frontend: &'a mut dyn CompilerFrontend,
}

/// A consumer notified whenever its document's snapshot changes.
pub trait DocumentHelper: Send {
    /// Helper name for logging.
    fn name(&self) -> &'static str;

    /// Called once when the entry is created.
    fn initialize(&mut self, _document: &dyn Document) {}

    /// Re-derive state from the fresh snapshot in `ctx`.
    fn updated(&mut self, ctx: &mut HelperContext<'_>) -> CdkResult<()>;

    /// Called once when the entry is torn down. Must cancel pending work.
    fn teardown(&mut self) {}
}

/// The three helpers owned by one entry.
pub struct HelperSet {
    pub completer: Completer,
    pub highlighter: Highlighter,
    pub diagnostics: Diagnostics,
}

impl HelperSet {
    pub fn new(settings: &Settings) -> Self {
        Self {
            completer: Completer::new(),
            highlighter: Highlighter::new(settings.timing.highlight_delay()),
            diagnostics: Diagnostics::new(
                settings.diagnostics.indicators,
                settings.diagnostics.markers,
            ),
        }
    }

    /// Helpers in the order they must be refreshed.
    pub fn in_dispatch_order(&mut self) -> [&mut dyn DocumentHelper; 3] {
        [
            &mut self.completer,
            &mut self.highlighter,
            &mut self.diagnostics,
        ]
    }

    pub fn initialize(&mut self, document: &dyn Document) {
        for helper in self.in_dispatch_order() {
            helper.initialize(document);
        }
    }

    pub fn teardown(&mut self) {
        for helper in self.in_dispatch_order() {
            helper.teardown();
        }
    }
}
