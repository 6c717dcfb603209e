//! Diagnostic marks derived from a translation unit.
//!
//! Warnings and errors become indicator spans (squiggles) and margin
//! markers. Everything below warning severity is skipped.

use std::ops::Range;

use crate::error::CdkResult;
use crate::frontend::{Diagnostic, Severity};

use super::completer::{word_end, word_start};
use super::{DocumentHelper, HelperContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    Warning,
    Error,
}

impl DiagnosticKind {
    fn from_severity(severity: Severity) -> Option<Self> {
        match severity {
            Severity::Warning => Some(DiagnosticKind::Warning),
            Severity::Error | Severity::Fatal => Some(DiagnosticKind::Error),
            Severity::Ignored | Severity::Note => None,
        }
    }
}

/// Underlined byte range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicator {
    pub kind: DiagnosticKind,
    pub range: Range<usize>,
    pub message: String,
}

/// Margin marker on a 0-based line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub kind: DiagnosticKind,
    pub line: u32,
}

#[derive(Debug)]
pub struct Diagnostics {
    indicators_enabled: bool,
    markers_enabled: bool,
    indicators: Vec<Indicator>,
    markers: Vec<Marker>,
}

impl Diagnostics {
    pub fn new(indicators_enabled: bool, markers_enabled: bool) -> Self {
        Self {
            indicators_enabled,
            markers_enabled,
            indicators: Vec::new(),
            markers: Vec::new(),
        }
    }

    pub fn indicators(&self) -> &[Indicator] {
        &self.indicators
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn clear(&mut self) {
        self.indicators.clear();
        self.markers.clear();
    }

    pub fn set_indicators_enabled(&mut self, enabled: bool) {
        self.indicators_enabled = enabled;
        if !enabled {
            self.indicators.clear();
        }
    }

    pub fn set_markers_enabled(&mut self, enabled: bool) {
        self.markers_enabled = enabled;
        if !enabled {
            self.markers.clear();
        }
    }

    fn apply(&mut self, contents: &[u8], diagnostic: &Diagnostic) {
        let Some(kind) = DiagnosticKind::from_severity(diagnostic.severity) else {
            return;
        };

        if diagnostic.ranges.is_empty() {
            let offset = diagnostic.location.offset.min(contents.len());
            let range = word_start(contents, offset)..word_end(contents, offset);
            self.add_indicator(contents, kind, range, &diagnostic.message);
            self.add_marker(kind, diagnostic.location.line);
        }

        for range in &diagnostic.ranges {
            self.add_indicator(
                contents,
                kind,
                range.start.offset..range.end.offset,
                &diagnostic.message,
            );
            self.add_marker(kind, range.start.line);
        }
    }

    fn add_indicator(&mut self, contents: &[u8], kind: DiagnosticKind, range: Range<usize>, message: &str) {
        if !self.indicators_enabled {
            return;
        }
        let range = trim_range(contents, range);
        if range.is_empty() {
            return;
        }
        self.indicators.push(Indicator {
            kind,
            range,
            message: message.to_string(),
        });
    }

    fn add_marker(&mut self, kind: DiagnosticKind, line: u32) {
        // frontend lines are 1-based; 0 means "no line"
        if !self.markers_enabled || line == 0 {
            return;
        }
        let marker = Marker {
            kind,
            line: line - 1,
        };
        if !self.markers.contains(&marker) {
            self.markers.push(marker);
        }
    }
}

impl DocumentHelper for Diagnostics {
    fn name(&self) -> &'static str {
        "diagnostics"
    }

    fn updated(&mut self, ctx: &mut HelperContext<'_>) -> CdkResult<()> {
        if !self.indicators_enabled && !self.markers_enabled {
            return Ok(());
        }

        self.clear();

        let contents = ctx.document.contents();
        let diagnostics = ctx.frontend.diagnostics(ctx.unit);
        for diagnostic in &diagnostics {
            // Diagnostics located in included headers have offsets into
            // another file.
            let in_this_file = diagnostic
                .location
                .file
                .as_deref()
                .is_none_or(|file| file == ctx.path);
            if in_this_file {
                self.apply(&contents, diagnostic);
            }
        }

        crate::debug_event!(
            "diagnostics",
            "refreshed",
            "{} indicators, {} markers",
            self.indicators.len(),
            self.markers.len()
        );
        Ok(())
    }

    fn teardown(&mut self) {
        self.clear();
    }
}

/// Shrink `range` so it neither starts nor ends on whitespace.
fn trim_range(contents: &[u8], range: Range<usize>) -> Range<usize> {
    let mut start = range.start.min(contents.len());
    let mut end = range.end.min(contents.len()).max(start);
    while start < end && contents[start].is_ascii_whitespace() {
        start += 1;
    }
    while end > start && contents[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    start..end
}
