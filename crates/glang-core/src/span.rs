//! Source positions carried by tokens, syntax nodes and diagnostics.

use std::fmt;

/// Where something starts in a unit's source and how many characters it
/// covers. Lines and columns are 1-indexed.
///
/// Diagnostics print a span as `line:col`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub line: u32,
    pub col: u32,
    /// Never zero, so every span can be underlined.
    pub len: u32,
}

impl Default for Span {
    fn default() -> Self {
        Self {
            line: 1,
            col: 1,
            len: 1,
        }
    }
}

impl Span {
    /// A zero `len` is widened to 1.
    #[inline]
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        debug_assert!(line >= 1 && col >= 1, "spans are 1-indexed");
        Self {
            line,
            col,
            len: len.max(1),
        }
    }

    /// The smallest span covering both, used to stretch a node over its
    /// operands.
    ///
    /// Across lines the earlier span's start is kept and the lengths add.
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        if self.line == other.line {
            let start_col = self.col.min(other.col);
            let end_col = (other.col + other.len).max(self.col + self.len);
            Span::new(self.line, start_col, end_col - start_col)
        } else if other.line < self.line {
            other.merge(self)
        } else {
            Span::new(self.line, self.col, self.len + other.len)
        }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}
