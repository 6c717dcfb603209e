//! In-memory stand-ins for the compiler frontend and the host editor.

#![allow(dead_code)]

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use cdk::document::{Document, DocumentId, DocumentProvider, Language};
use cdk::frontend::{
    CompilerFrontend, CompletionItem, CursorClass, Diagnostic, ErrorCode, IndexHandle, Token,
    TokenKind, UnitHandle, UnsavedFile,
};

/// One call to `reparse`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReparseCall {
    pub unit: UnitHandle,
    /// Bytes passed as an unsaved override, if any.
    pub unsaved: Option<Vec<u8>>,
}

#[derive(Debug, Default)]
pub struct FrontendState {
    next_handle: u64,
    pub live_indexes: HashSet<IndexHandle>,
    pub live_units: HashMap<UnitHandle, PathBuf>,
    pub disposed_units: Vec<UnitHandle>,
    pub parses: Vec<(PathBuf, Vec<String>)>,
    pub reparses: Vec<ReparseCall>,
    pub tokenize_calls: Vec<Range<usize>>,
    /// Highest number of live units seen at once for a single path.
    pub max_live_per_path: usize,

    pub fail_index: Option<ErrorCode>,
    pub fail_parse: Option<ErrorCode>,
    /// Hand back a non-null handle together with a failing parse.
    pub broken_handle_on_failure: bool,
    pub fail_reparse: Option<ErrorCode>,
    pub fail_tokenize: Option<ErrorCode>,

    pub tokens: Vec<Token>,
    pub diagnostics: Vec<Diagnostic>,
    pub completions: Vec<CompletionItem>,
}

impl FrontendState {
    fn next(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    pub fn live_units_for(&self, path: &Path) -> usize {
        self.live_units.values().filter(|p| p.as_path() == path).count()
    }
}

/// Frontend that records every call. Clones share state, so a test keeps
/// one clone to inspect what the session did with the other.
#[derive(Debug, Clone, Default)]
pub struct FakeFrontend {
    state: Arc<Mutex<FrontendState>>,
}

impl FakeFrontend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, FrontendState> {
        self.state.lock().unwrap()
    }
}

impl CompilerFrontend for FakeFrontend {
    fn create_index(&mut self) -> Result<IndexHandle, ErrorCode> {
        let mut state = self.state();
        if let Some(code) = state.fail_index {
            return Err(code);
        }
        let handle = IndexHandle(state.next());
        state.live_indexes.insert(handle);
        Ok(handle)
    }

    fn dispose_index(&mut self, index: IndexHandle) {
        self.state().live_indexes.remove(&index);
    }

    fn parse(
        &mut self,
        index: IndexHandle,
        path: &Path,
        args: &[String],
    ) -> (Option<UnitHandle>, ErrorCode) {
        let mut state = self.state();
        assert!(state.live_indexes.contains(&index), "parse against dead index");
        state.parses.push((path.to_path_buf(), args.to_vec()));

        if let Some(code) = state.fail_parse {
            if state.broken_handle_on_failure {
                let handle = UnitHandle(state.next());
                state.live_units.insert(handle, path.to_path_buf());
                return (Some(handle), code);
            }
            return (None, code);
        }

        let handle = UnitHandle(state.next());
        state.live_units.insert(handle, path.to_path_buf());
        let live = state.live_units_for(path);
        state.max_live_per_path = state.max_live_per_path.max(live);
        (Some(handle), ErrorCode::Success)
    }

    fn reparse(&mut self, unit: UnitHandle, unsaved: &[UnsavedFile<'_>]) -> ErrorCode {
        let mut state = self.state();
        assert!(state.live_units.contains_key(&unit), "reparse of disposed unit");
        state.reparses.push(ReparseCall {
            unit,
            unsaved: unsaved.first().map(|file| file.contents.to_vec()),
        });
        state.fail_reparse.unwrap_or(ErrorCode::Success)
    }

    fn dispose_unit(&mut self, unit: UnitHandle) {
        let mut state = self.state();
        assert!(state.live_units.remove(&unit).is_some(), "double dispose");
        state.disposed_units.push(unit);
    }

    fn tokenize(
        &self,
        unit: UnitHandle,
        _path: &Path,
        range: Range<usize>,
    ) -> Result<Vec<Token>, ErrorCode> {
        let mut state = self.state();
        assert!(state.live_units.contains_key(&unit), "tokenize of disposed unit");
        state.tokenize_calls.push(range.clone());
        if let Some(code) = state.fail_tokenize {
            return Err(code);
        }
        Ok(state
            .tokens
            .iter()
            .filter(|token| token.extent.start < range.end && token.extent.end > range.start)
            .cloned()
            .collect())
    }

    fn diagnostics(&self, _unit: UnitHandle) -> Vec<Diagnostic> {
        self.state().diagnostics.clone()
    }

    fn complete_at(
        &mut self,
        _unit: UnitHandle,
        _path: &Path,
        _line: u32,
        _column: u32,
        _unsaved: &[UnsavedFile<'_>],
    ) -> Vec<CompletionItem> {
        self.state().completions.clone()
    }
}

pub fn token(kind: TokenKind, cursor: CursorClass, extent: Range<usize>) -> Token {
    Token {
        kind,
        cursor,
        extent,
    }
}

#[derive(Debug)]
struct Buffer {
    language: Language,
    contents: Vec<u8>,
    modified: bool,
    valid: bool,
}

/// Host document. Clones share the buffer, so a test can edit a document
/// that has been handed to a provider.
#[derive(Debug, Clone)]
pub struct FakeDocument {
    id: DocumentId,
    path: Option<PathBuf>,
    buffer: Arc<Mutex<Buffer>>,
}

impl FakeDocument {
    pub fn new(id: u64, path: impl Into<PathBuf>, contents: &str) -> Self {
        let path = path.into();
        let language = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Language::from_extension)
            .unwrap_or_else(|| Language::Other(String::new()));
        Self {
            id: DocumentId(id),
            path: Some(path),
            buffer: Arc::new(Mutex::new(Buffer {
                language,
                contents: contents.as_bytes().to_vec(),
                modified: false,
                valid: true,
            })),
        }
    }

    /// A new buffer never saved to disk.
    pub fn untitled(id: u64) -> Self {
        Self {
            path: None,
            ..Self::new(id, "untitled.c", "")
        }
    }

    /// Replace the buffer, marking the document modified.
    pub fn edit(&self, contents: &str) {
        let mut buffer = self.buffer.lock().unwrap();
        buffer.contents = contents.as_bytes().to_vec();
        buffer.modified = true;
    }

    pub fn mark_saved(&self) {
        self.buffer.lock().unwrap().modified = false;
    }

    pub fn set_language(&self, language: Language) {
        self.buffer.lock().unwrap().language = language;
    }

    pub fn invalidate(&self) {
        self.buffer.lock().unwrap().valid = false;
    }
}

impl Document for FakeDocument {
    fn id(&self) -> DocumentId {
        self.id
    }

    fn is_valid(&self) -> bool {
        self.buffer.lock().unwrap().valid
    }

    fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn language(&self) -> Language {
        self.buffer.lock().unwrap().language.clone()
    }

    fn is_modified(&self) -> bool {
        self.buffer.lock().unwrap().modified
    }

    fn contents(&self) -> Cow<'_, [u8]> {
        Cow::Owned(self.buffer.lock().unwrap().contents.clone())
    }
}

/// Host with a fixed set of open documents.
#[derive(Debug, Clone, Default)]
pub struct FakeProvider {
    documents: Vec<FakeDocument>,
}

impl FakeProvider {
    pub fn new(documents: Vec<FakeDocument>) -> Self {
        Self { documents }
    }
}

impl DocumentProvider for FakeProvider {
    fn document(&self, id: DocumentId) -> Option<&dyn Document> {
        self.documents
            .iter()
            .find(|doc| doc.id == id)
            .map(|doc| doc as &dyn Document)
    }

    fn open_documents(&self) -> Vec<DocumentId> {
        self.documents.iter().map(|doc| doc.id).collect()
    }
}

/// A project directory on disk holding the given empty source files.
pub fn project_dir(files: &[&str]) -> tempfile::TempDir {
    let dir = tempfile::TempDir::new().unwrap();
    for file in files {
        let path = dir.path().join(file);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, "").unwrap();
    }
    dir
}

/// Canonical path of `file` under `dir`, as the session stores it.
pub fn member(dir: &tempfile::TempDir, file: &str) -> PathBuf {
    dunce::canonicalize(dir.path().join(file)).unwrap()
}
