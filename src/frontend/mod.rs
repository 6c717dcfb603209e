//! Contract for the compiler frontend that does the actual parsing.
//!
//! The frontend owns all semantic work (parse, reparse, tokenize, diagnose,
//! complete). This crate only decides *when* those happen and on which
//! content, so everything here is handles and plain data.

use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// Status reported by every frontend call. Only `Success` counts as success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Success,
    Failure,
    Crashed,
    InvalidArguments,
    AstReadError,
}

impl ErrorCode {
    pub fn is_success(self) -> bool {
        self == ErrorCode::Success
    }

    /// Numeric value as the frontend reports it.
    pub fn code(self) -> u32 {
        match self {
            ErrorCode::Success => 0,
            ErrorCode::Failure => 1,
            ErrorCode::Crashed => 2,
            ErrorCode::InvalidArguments => 3,
            ErrorCode::AstReadError => 4,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Opaque handle to a parsing context shared by every unit of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndexHandle(pub u64);

/// Opaque handle to one parsed translation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitHandle(pub u64);

/// In-memory content that replaces the on-disk file during a reparse.
#[derive(Debug, Clone, Copy)]
pub struct UnsavedFile<'a> {
    pub path: &'a Path,
    pub contents: &'a [u8],
}

impl UnsavedFile<'_> {
    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Punctuation,
    Keyword,
    Identifier,
    Literal,
    Comment,
}

/// Semantic classification of the cursor a token annotates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorClass {
    TypeRef,
    MemberRef,
    Call,
    StringLiteral,
    CharacterLiteral,
    NumberLiteral,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub cursor: CursorClass,
    /// Byte extent in the file.
    pub extent: Range<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Ignored,
    Note,
    Warning,
    Error,
    Fatal,
}

/// A position inside a file. `line` is 1-based, `offset` is a byte offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: Option<PathBuf>,
    pub line: u32,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRange {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub location: SourceLocation,
    pub ranges: Vec<SourceRange>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    /// The text that would be inserted.
    pub typed_text: String,
    pub priority: u32,
}

/// The compiler frontend service.
///
/// Implementations must treat a `UnitHandle` as valid until `dispose_unit`
/// is called for it, and an `IndexHandle` until `dispose_index`.
pub trait CompilerFrontend: Send {
    /// Create a fresh parsing context.
    fn create_index(&mut self) -> Result<IndexHandle, ErrorCode>;

    fn dispose_index(&mut self, index: IndexHandle);

    /// Parse `path` from disk with `args`.
    ///
    /// May return a non-null handle together with a non-success code; the
    /// caller is responsible for disposing it.
    fn parse(
        &mut self,
        index: IndexHandle,
        path: &Path,
        args: &[String],
    ) -> (Option<UnitHandle>, ErrorCode);

    /// Refresh `unit`, reading any path listed in `unsaved` from memory.
    fn reparse(&mut self, unit: UnitHandle, unsaved: &[UnsavedFile<'_>]) -> ErrorCode;

    fn dispose_unit(&mut self, unit: UnitHandle);

    /// Tokens of `path` intersecting `range`, annotated with cursor classes.
    fn tokenize(
        &self,
        unit: UnitHandle,
        path: &Path,
        range: Range<usize>,
    ) -> Result<Vec<Token>, ErrorCode>;

    fn diagnostics(&self, unit: UnitHandle) -> Vec<Diagnostic>;

    /// Code completion at a 1-based `line` and `column`.
    fn complete_at(
        &mut self,
        unit: UnitHandle,
        path: &Path,
        line: u32,
        column: u32,
        unsaved: &[UnsavedFile<'_>],
    ) -> Vec<CompletionItem>;
}
