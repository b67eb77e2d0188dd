//! Conversion of stored comment anchors into half-open line intervals.

use std::fmt;

use crate::types::Comment;

/// Half-open line interval `[start, end)`, 1-based.
///
/// Built from stored anchors as-is; whether it fits any content is checked
/// by [`crate::content::assemble`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    pub start: u32,
    pub end: u32,
}

impl Range {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Number of lines covered.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, line: u32) -> bool {
        self.start <= line && line < self.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

/// Derives the line interval a comment refers to.
///
/// An explicit range wins over the line number; its inclusive end line
/// becomes the exclusive end. A positive line number alone yields a single
/// line. File-level comments yield `None`.
pub fn resolve(comment: &Comment) -> Option<Range> {
    if let Some(range) = comment.range {
        return Some(Range::new(range.start_line, range.end_line.saturating_add(1)));
    }
    match comment.line_number {
        Some(n) if n > 0 => Some(Range::new(n, n.saturating_add(1))),
        _ => None,
    }
}
