//! Semantic highlighting for one document.
//!
//! Style requests from the host are coalesced: every range requested
//! while a highlight is pending widens the pending range, and the union is
//! highlighted once when the delay elapses.

use std::ops::Range;
use std::time::{Duration, Instant};

use crate::document::Document;
use crate::error::{CdkError, CdkResult};
use crate::frontend::{CursorClass, Token, TokenKind};

use super::{DocumentHelper, HelperContext};

/// Style assigned to a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleId {
    Default,
    Comment,
    MemberRef,
    Identifier,
    Keyword,
    Literal,
    Number,
    Preprocessor,
    Punctuation,
    String,
    TypeName,
    FunctionCall,
    Character,
}

impl StyleId {
    /// Cursor class wins; token kind is the fallback.
    pub fn for_token(token: &Token) -> Self {
        match token.cursor {
            CursorClass::TypeRef => StyleId::TypeName,
            CursorClass::MemberRef => StyleId::MemberRef,
            CursorClass::Call => StyleId::FunctionCall,
            CursorClass::StringLiteral => StyleId::String,
            CursorClass::CharacterLiteral => StyleId::Character,
            CursorClass::NumberLiteral => StyleId::Number,
            CursorClass::Other => match token.kind {
                TokenKind::Punctuation => StyleId::Punctuation,
                TokenKind::Keyword => StyleId::Keyword,
                TokenKind::Identifier => StyleId::Identifier,
                TokenKind::Literal => StyleId::Literal,
                TokenKind::Comment => StyleId::Comment,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledSpan {
    pub style: StyleId,
    pub range: Range<usize>,
}

/// Coalescing timer for highlight requests.
#[derive(Debug)]
pub struct HighlightQueue {
    delay: Duration,
    /// Union of requested ranges and when it becomes due.
    pending: Option<(Range<usize>, Instant)>,
}

impl HighlightQueue {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    /// Request `range`. The deadline is set by the first request only.
    ///
    /// Returns `true` when this request started a new pending highlight.
    /// Empty ranges are ignored.
    pub fn queue_at(&mut self, range: Range<usize>, now: Instant) -> bool {
        if range.is_empty() {
            return false;
        }
        if let Some((pending, _)) = self.pending.as_mut() {
            pending.start = pending.start.min(range.start);
            pending.end = pending.end.max(range.end);
            return false;
        }
        self.pending = Some((range, now + self.delay));
        true
    }

    pub fn queue(&mut self, range: Range<usize>) -> bool {
        self.queue_at(range, Instant::now())
    }

    /// Take the pending range if its deadline has passed.
    pub fn take_due(&mut self, now: Instant) -> Option<Range<usize>> {
        let due = self.pending.as_ref().is_some_and(|(_, due)| now >= *due);
        if !due {
            return None;
        }
        self.pending.take().map(|(range, _)| range)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, due)| *due)
    }
}

#[derive(Debug)]
pub struct Highlighter {
    queue: HighlightQueue,
    spans: Vec<StyledSpan>,
    passes: usize,
}

impl Highlighter {
    pub fn new(delay: Duration) -> Self {
        Self {
            queue: HighlightQueue::new(delay),
            spans: Vec::new(),
            passes: 0,
        }
    }

    /// Style every token in `range`, replacing spans previously computed there.
    ///
    /// On failure the existing spans are kept.
    pub fn highlight(&mut self, ctx: &mut HelperContext<'_>, range: Range<usize>) -> CdkResult<usize> {
        let len = ctx.document.len();
        let range = range.start.min(len)..range.end.min(len);

        let tokens = ctx
            .frontend
            .tokenize(ctx.unit, ctx.path, range.clone())
            .map_err(|code| CdkError::Frontend {
                operation: "tokenize",
                code,
            })?;

        self.spans
            .retain(|span| span.range.end <= range.start || span.range.start >= range.end);
        self.spans.extend(tokens.iter().map(|token| StyledSpan {
            style: StyleId::for_token(token),
            range: token.extent.clone(),
        }));
        self.spans.sort_by_key(|span| span.range.start);
        self.passes += 1;

        crate::debug_event!(
            "highlighter",
            "highlighted",
            "{} tokens in {}..{}",
            tokens.len(),
            range.start,
            range.end
        );
        Ok(tokens.len())
    }

    pub fn highlight_all(&mut self, ctx: &mut HelperContext<'_>) -> CdkResult<usize> {
        let len = ctx.document.len();
        self.highlight(ctx, 0..len)
    }

    pub fn queue_highlight_at(&mut self, range: Range<usize>, now: Instant) -> bool {
        self.queue.queue_at(range, now)
    }

    pub fn queue_highlight(&mut self, range: Range<usize>) -> bool {
        self.queue.queue(range)
    }

    /// The coalesced range, once its delay has elapsed.
    pub fn take_due(&mut self, now: Instant) -> Option<Range<usize>> {
        self.queue.take_due(now)
    }

    pub fn has_pending(&self) -> bool {
        self.queue.has_pending()
    }

    pub fn spans(&self) -> &[StyledSpan] {
        &self.spans
    }

    /// Number of highlight passes run so far.
    pub fn pass_count(&self) -> usize {
        self.passes
    }
}

impl DocumentHelper for Highlighter {
    fn name(&self) -> &'static str {
        "highlighter"
    }

    fn initialize(&mut self, _document: &dyn Document) {
        self.spans.clear();
    }

    fn updated(&mut self, ctx: &mut HelperContext<'_>) -> CdkResult<()> {
        self.highlight_all(ctx).map(|_| ())
    }

    fn teardown(&mut self) {
        self.queue.cancel();
        self.spans.clear();
    }
}
