//! Source positions: byte ranges and their line/column form.

use std::fmt;

pub use text_size::{TextRange, TextSize};

/// A 0-indexed line/column pair, displayed 1-indexed.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Default, Ord, PartialOrd)]
pub struct LineCol {
    pub line: u32,
    /// Column in UTF-8 bytes.
    pub col: u32,
}

impl LineCol {
    #[inline]
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

impl fmt::Debug for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for LineCol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

/// Line start table for one source text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineIndex {
    line_starts: Vec<TextSize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let line_starts = std::iter::once(TextSize::from(0))
            .chain(
                text.match_indices('\n')
                    .map(|(offset, _)| TextSize::from((offset + 1) as u32)),
            )
            .collect();
        Self { line_starts }
    }

    pub fn line_col(&self, offset: TextSize) -> LineCol {
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let col = offset - self.line_starts[line];
        LineCol::new(line as u32, col.into())
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

/// Slice `text` by `range`, or `None` when the range falls outside it.
pub fn slice(text: &str, range: TextRange) -> Option<&str> {
    text.get(usize::from(range.start())..usize::from(range.end()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col_is_one_indexed_for_display() {
        assert_eq!(LineCol::new(4, 0).to_string(), "5:1");
    }

    #[test]
    fn test_line_index_across_lines() {
        let index = LineIndex::new("package p;\nclass X {\n}");
        assert_eq!(index.line_count(), 3);
        assert_eq!(index.line_col(TextSize::from(0)), LineCol::new(0, 0));
        assert_eq!(index.line_col(TextSize::from(11)), LineCol::new(1, 0));
        assert_eq!(index.line_col(TextSize::from(17)), LineCol::new(1, 6));
    }

    #[test]
    fn test_slice_out_of_bounds() {
        let range = TextRange::new(TextSize::from(2), TextSize::from(40));
        assert_eq!(slice("short", range), None);
        let range = TextRange::new(TextSize::from(0), TextSize::from(3));
        assert_eq!(slice("foo()", range), Some("foo"));
    }
}
