//! Code completion for one document.

use std::borrow::Cow;

use crate::document::Document;
use crate::error::CdkResult;
use crate::frontend::UnsavedFile;

use super::{DocumentHelper, HelperContext};

/// Minimum word length typed before completion triggers on its own.
const MIN_WORD_LEN: usize = 3;

#[derive(Debug, Default)]
pub struct Completer {
    /// Last completion request: word start offset and its candidates.
    cached: Option<(usize, Vec<String>)>,
}

impl Completer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Candidates for the word ending at `offset`, if completion applies.
    ///
    /// Completion triggers after `.` or `->`, or once at least three word
    /// characters precede the cursor. Candidates share the typed prefix and
    /// come back sorted and deduplicated.
    pub fn complete(&mut self, ctx: &mut HelperContext<'_>, offset: usize) -> Option<Vec<String>> {
        let document = ctx.document;
        let contents = document.contents();
        let offset = offset.min(contents.len());
        let word_start = word_start(&contents, offset);

        let last = offset.checked_sub(1).map(|i| contents[i]);
        let before_last = offset.checked_sub(2).map(|i| contents[i]);
        let member_access = last == Some(b'.') || (before_last == Some(b'-') && last == Some(b'>'));
        let prefix = &contents[word_start..offset];

        if !member_access && prefix.len() < MIN_WORD_LEN {
            return None;
        }
        let prefix = String::from_utf8_lossy(prefix).into_owned();

        let cached = self
            .cached
            .as_ref()
            .filter(|(start, _)| *start == word_start)
            .map(|(_, items)| items.clone());

        let candidates = match cached {
            Some(items) => items,
            None => {
                let items = self.query(ctx, &contents, word_start);
                self.cached = Some((word_start, items.clone()));
                items
            }
        };

        let matches: Vec<String> = candidates
            .into_iter()
            .filter(|name| prefix.is_empty() || name.starts_with(&prefix))
            .collect();

        if matches.is_empty() { None } else { Some(matches) }
    }

    fn query(&self, ctx: &mut HelperContext<'_>, contents: &Cow<'_, [u8]>, at: usize) -> Vec<String> {
        let (line, column) = line_column(contents, at);
        let unsaved;
        let overrides: &[UnsavedFile<'_>] = if ctx.document.is_modified() {
            unsaved = [UnsavedFile {
                path: ctx.path,
                contents,
            }];
            &unsaved
        } else {
            &[]
        };

        let mut items = ctx
            .frontend
            .complete_at(ctx.unit, ctx.path, line, column, overrides);
        items.sort_by(|a, b| a.typed_text.cmp(&b.typed_text));

        let mut names: Vec<String> = items.into_iter().map(|item| item.typed_text).collect();
        names.dedup();
        names
    }

    pub fn has_cached(&self) -> bool {
        self.cached.is_some()
    }

    pub fn reset(&mut self) {
        self.cached = None;
    }
}

impl DocumentHelper for Completer {
    fn name(&self) -> &'static str {
        "completer"
    }

    fn initialize(&mut self, _document: &dyn Document) {
        self.reset();
    }

    fn updated(&mut self, _ctx: &mut HelperContext<'_>) -> CdkResult<()> {
        self.reset();
        Ok(())
    }

    fn teardown(&mut self) {
        self.reset();
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Start of the identifier that ends at `offset`.
pub(crate) fn word_start(contents: &[u8], offset: usize) -> usize {
    let mut start = offset;
    while start > 0 && is_word_byte(contents[start - 1]) {
        start -= 1;
    }
    start
}

/// End of the identifier that starts at or spans `offset`.
pub(crate) fn word_end(contents: &[u8], offset: usize) -> usize {
    let mut end = offset;
    while end < contents.len() && is_word_byte(contents[end]) {
        end += 1;
    }
    end
}

/// 1-based line and column of a byte offset.
pub(crate) fn line_column(contents: &[u8], offset: usize) -> (u32, u32) {
    let before = &contents[..offset.min(contents.len())];
    let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
    let line_start = before
        .iter()
        .rposition(|&b| b == b'\n')
        .map(|i| i + 1)
        .unwrap_or(0);
    (line as u32, (offset - line_start + 1) as u32)
}
