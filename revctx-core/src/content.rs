//! Line-addressable text and slicing of comment context out of it.

use crate::error::{ContextError, Result};
use crate::range::Range;
use crate::types::Context;

/// Decoded text of one content class at one revision.
///
/// Lines are addressed 1-based. Line terminators (`\n` or `\r\n`) are not
/// part of the line text, and a trailing terminator does not open an extra
/// empty line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Content {
    lines: Vec<String>,
}

impl Content {
    /// Content with zero lines.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Splits raw blob bytes into lines, replacing invalid UTF-8 sequences.
    pub fn from_bytes(raw: &[u8]) -> Self {
        if raw.is_empty() {
            return Self::empty();
        }
        let body = raw.strip_suffix(b"\n").unwrap_or(raw);
        let lines = body
            .split(|b| *b == b'\n')
            .map(|line| {
                let line = line.strip_suffix(b"\r").unwrap_or(line);
                String::from_utf8_lossy(line).into_owned()
            })
            .collect();
        Self { lines }
    }

    pub fn from_text(text: &str) -> Self {
        Self::from_bytes(text.as_bytes())
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Returns line `n` (1-based), or `None` outside `1..=line_count()`.
    pub fn line(&self, n: u32) -> Option<&str> {
        let idx = (n as usize).checked_sub(1)?;
        self.lines.get(idx).map(String::as_str)
    }

    fn fits(&self, range: Range) -> bool {
        range.start >= 1 && range.start < range.end && range.end as usize <= self.line_count() + 1
    }
}

/// Maps every line of `range` to its text.
///
/// # Errors
///
/// Returns [`ContextError::InvalidRange`] when `range` starts before line 1,
/// is empty, or ends past the last line. The range is never clamped.
pub fn assemble(content: &Content, range: Range) -> Result<Context> {
    assemble_padded(content, range, 0)
}

/// Like [`assemble`], then widens the result by `padding` lines on each side.
///
/// The comment's own range is validated strictly; only the padding is
/// clamped to the available lines.
pub fn assemble_padded(content: &Content, range: Range, padding: u32) -> Result<Context> {
    if !content.fits(range) {
        return Err(ContextError::InvalidRange { range, line_count: content.line_count() });
    }
    let start = range.start.saturating_sub(padding).max(1);
    let last = u32::try_from(content.line_count()).unwrap_or(u32::MAX);
    let end = range.end.saturating_add(padding).min(last.saturating_add(1));

    Ok((start..end)
        .filter_map(|n| content.line(n).map(|text| (n, text.to_owned())))
        .collect())
}
