//! Character cursor used by the lexer.
//!
//! The cursor owns position bookkeeping: a [`Mark`] taken at the start of a
//! token later yields both the token's [`Span`] and its source text.

use glang_core::Span;

/// A saved cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    line: u32,
    col: u32,
    offset: usize,
}

/// Walks the source one character at a time. Columns count characters.
pub struct Cursor<'src> {
    source: &'src str,
    offset: usize,
    line: u32,
    col: u32,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
            col: 1,
        }
    }

    #[inline]
    pub fn mark(&self) -> Mark {
        Mark {
            line: self.line,
            col: self.col,
            offset: self.offset,
        }
    }

    /// One character wide span at the current position.
    #[inline]
    pub fn here(&self) -> Span {
        Span::new(self.line, self.col, 1)
    }

    /// Span from `mark` up to the current position.
    ///
    /// A span crossing lines is measured in bytes, since its column width
    /// has no meaning.
    pub fn span_from(&self, mark: Mark) -> Span {
        let len = if self.line == mark.line {
            self.col - mark.col
        } else {
            (self.offset - mark.offset) as u32
        };
        Span::new(mark.line, mark.col, len)
    }

    /// Source text consumed since `mark`.
    #[inline]
    pub fn text_from(&self, mark: Mark) -> &'src str {
        &self.source[mark.offset..self.offset]
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.offset >= self.source.len()
    }

    #[inline]
    fn rest(&self) -> &'src str {
        &self.source[self.offset..]
    }

    #[inline]
    pub fn peek(&self) -> Option<char> {
        let rest = self.rest();
        match rest.as_bytes().first() {
            Some(&b) if b.is_ascii() => Some(b as char),
            Some(_) => rest.chars().next(),
            None => None,
        }
    }

    /// The character after [`peek`](Self::peek).
    #[inline]
    pub fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    #[inline]
    pub fn check(&self, f: impl Fn(char) -> bool) -> bool {
        self.peek().is_some_and(f)
    }

    pub fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    #[inline]
    pub fn eat(&mut self, expected: char) -> bool {
        let matched = self.peek() == Some(expected);
        if matched {
            self.advance();
        }
        matched
    }

    pub fn skip_while(&mut self, f: impl Fn(char) -> bool) {
        while self.check(&f) {
            self.advance();
        }
    }
}

/// Identifiers start with a letter, `_` or `$`.
#[inline]
pub fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

#[inline]
pub fn is_ident_continue(c: char) -> bool {
    is_ident_start(c) || c.is_numeric()
}
