//! Diagnostics and source spans.

use std::fmt;

use serde::Serialize;

use crate::code::{ErrorCode, Severity};

/// Source location span, in byte offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct Span {
    /// Start byte offset in source.
    pub start: usize,
    /// End byte offset in source (exclusive).
    pub end: usize,
}

impl Span {
    /// Create a new span.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Empty span at an offset.
    pub fn empty(at: usize) -> Self {
        Self { start: at, end: at }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest span covering both.
    pub fn cover(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    /// Convert byte offset to line:column.
    ///
    /// Returns (line, column) where both are 1-indexed.
    pub fn to_line_col(&self, source: &str) -> (usize, usize) {
        let mut line = 1;
        let mut col = 1;

        for (i, ch) in source.char_indices() {
            if i >= self.start {
                break;
            }
            if ch == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }

        (line, col)
    }

    /// Format span as "line:col" string.
    pub fn format_location(&self, source: &str) -> String {
        let (line, col) = self.to_line_col(source);
        format!("{}:{}", line, col)
    }

    /// The text this span covers, if it lies within `source`.
    pub fn slice<'s>(&self, source: &'s str) -> Option<&'s str> {
        source.get(self.start..self.end)
    }
}

/// A diagnostic produced by a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Diagnostic code.
    pub code: ErrorCode,
    /// Severity level.
    pub severity: Severity,
    /// Where the diagnostic is anchored.
    pub span: Span,
    /// Human-readable message.
    pub message: String,
    /// Producer name shown by editors.
    pub source: &'static str,
}

impl Diagnostic {
    /// Producer name attached to every diagnostic.
    pub const SOURCE: &'static str = "fishlint";

    /// Create a diagnostic with the code's default severity and message.
    pub fn new(code: ErrorCode, span: Span) -> Self {
        Self {
            code,
            severity: code.default_severity(),
            span,
            message: code.message().to_string(),
            source: Self::SOURCE,
        }
    }

    /// Replace the message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Replace the severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Format the diagnostic for display, with line:column and source context.
    pub fn format(&self, source: &str) -> String {
        let mut result = format!("{}: ", self.span.format_location(source));

        result.push_str(&format!(
            "{} [{}]: {}",
            self.severity,
            self.code.code(),
            self.message
        ));

        if let Some(line_content) = get_line_at_offset(source, self.span.start) {
            result.push_str(&format!("\n  | {}", line_content));
        }

        result
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]: {}", self.severity, self.code.code(), self.message)
    }
}

/// Get the line containing a byte offset.
fn get_line_at_offset(source: &str, offset: usize) -> Option<&str> {
    if offset >= source.len() {
        return None;
    }

    let start = source[..offset].rfind('\n').map_or(0, |i| i + 1);
    let end = source[offset..]
        .find('\n')
        .map_or(source.len(), |i| offset + i);

    Some(&source[start..end])
}
