use serde::{Deserialize, Serialize};
use std::fmt;

/// Location of a token or expression inside an expression source string.
///
/// Lines and columns are 1-based; `start`/`end` are byte offsets into the
/// source so callers can slice the original text back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: u32,
    pub col: u32,
}

impl Span {
    pub fn new(start: usize, end: usize, line: u32, col: u32) -> Self {
        Self {
            start,
            end,
            line,
            col,
        }
    }

    /// Zero-width span at a single position.
    pub fn point(offset: usize, line: u32, col: u32) -> Self {
        Self::new(offset, offset, line, col)
    }

    /// Smallest span covering both `self` and `other`.
    pub fn merge(self, other: Span) -> Span {
        let (line, col) = if self.start <= other.start {
            (self.line, self.col)
        } else {
            (other.line, other.col)
        };
        Span::new(
            self.start.min(other.start),
            self.end.max(other.end),
            line,
            col,
        )
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Slice the covered text out of `source`, if the offsets are in range.
    pub fn slice<'a>(&self, source: &'a str) -> Option<&'a str> {
        source.get(self.start..self.end)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

/// Expression source text with a line index for diagnostics.
#[derive(Debug, Clone)]
pub struct SourceText {
    pub text: String,
    line_starts: Vec<usize>,
}

impl SourceText {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { text, line_starts }
    }

    /// Extract a source line by 1-based line number, without its terminator.
    pub fn line(&self, line_number: u32) -> Option<&str> {
        let idx = line_number.checked_sub(1)? as usize;
        let start = *self.line_starts.get(idx)?;
        let end = self
            .line_starts
            .get(idx + 1)
            .map(|&s| s.saturating_sub(1))
            .unwrap_or(self.text.len());
        Some(self.text[start..end].trim_end_matches('\r'))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// 1-based line and column (in characters) of a byte offset.
    pub fn position(&self, offset: usize) -> (u32, u32) {
        let idx = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let start = self.line_starts.get(idx).copied().unwrap_or(0);
        let col = self
            .text
            .get(start..offset.min(self.text.len()))
            .map_or(0, |s| s.chars().count());
        (idx as u32 + 1, col as u32 + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_earliest_position() {
        let a = Span::new(4, 9, 1, 5);
        let b = Span::new(12, 20, 2, 3);
        let merged = b.merge(a);
        assert_eq!(merged, Span::new(4, 20, 1, 5));
    }

    #[test]
    fn slice_returns_covered_text() {
        let span = Span::new(5, 9, 1, 6);
        assert_eq!(span.slice("user.name"), Some("name"));
        assert_eq!(span.len(), 4);
        assert!(Span::point(3, 1, 4).is_empty());
    }

    #[test]
    fn display_is_line_col() {
        assert_eq!(Span::new(0, 1, 3, 7).to_string(), "3:7");
    }

    #[test]
    fn source_lines() {
        let src = SourceText::new("a ?\r\n  b :\n  c");
        assert_eq!(src.line(1), Some("a ?"));
        assert_eq!(src.line(2), Some("  b :"));
        assert_eq!(src.line(3), Some("  c"));
        assert_eq!(src.line(0), None);
        assert_eq!(src.position(0), (1, 1));
        assert_eq!(src.position(7), (2, 3));
        assert_eq!(src.position(13), (3, 3));
        assert_eq!(src.line(4), None);
        assert_eq!(src.line_count(), 3);
    }

    #[test]
    fn empty_source_has_one_line() {
        let src = SourceText::new("");
        assert_eq!(src.line(1), Some(""));
    }
}
