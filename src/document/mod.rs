//! Documents as seen from the host editor, and their semantic tracking.
//!
//! The host owns its documents. This crate only ever holds a
//! [`DocumentId`] and asks the host for a [`Document`] view when it needs
//! content, so a document destroyed by the host can never be dereferenced.

pub mod entry;
pub mod registry;
pub mod unit;

use std::borrow::Cow;
use std::fmt;
use std::path::Path;

pub use entry::DocumentEntry;
pub use registry::DocumentRegistry;
pub use unit::{TranslationUnit, TranslationUnitManager};

/// Identity key of a host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc#{}", self.0)
    }
}

/// Language detected by the host for a document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Language {
    C,
    Cpp,
    ObjectiveC,
    Other(String),
}

impl Language {
    /// Settings key for this language.
    pub fn key(&self) -> &str {
        match self {
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::ObjectiveC => "objc",
            Language::Other(name) => name,
        }
    }

    /// Guess from a file extension, the way hosts usually do.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "c" | "h" => Language::C,
            "cc" | "cpp" | "cxx" | "c++" | "hh" | "hpp" | "hxx" => Language::Cpp,
            "m" | "mm" => Language::ObjectiveC,
            other => Language::Other(other.to_string()),
        }
    }
}

/// Read access to a host document.
pub trait Document {
    fn id(&self) -> DocumentId;

    /// Whether the host still considers the document alive.
    fn is_valid(&self) -> bool {
        true
    }

    /// Concrete backing file, if the document has been saved somewhere.
    fn path(&self) -> Option<&Path>;

    fn language(&self) -> Language;

    /// Whether the buffer differs from the file on disk.
    fn is_modified(&self) -> bool;

    /// Current buffer bytes.
    fn contents(&self) -> Cow<'_, [u8]>;

    fn len(&self) -> usize {
        self.contents().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Looks up live documents by identity.
pub trait DocumentProvider {
    fn document(&self, id: DocumentId) -> Option<&dyn Document>;

    /// Every document currently open in the host.
    fn open_documents(&self) -> Vec<DocumentId>;
}
