//! Parser infrastructure for glang.
//!
//! Provides the main [`Parser`] struct with token navigation, error
//! collection and panic-mode recovery.

use bumpalo::Bump;
use glang_core::Span;

use crate::ast::{ParseError, ParseErrorKind, ParseErrors, Script};
use crate::lexer::{Lexer, Token, TokenKind};

/// The main parser for glang source code.
///
/// The whole source is tokenized up front into a buffer.
///
/// The `'ast` lifetime refers to the arena where AST nodes and token
/// lexemes are allocated. The source string only needs to live during
/// the call to `new()`.
pub struct Parser<'ast> {
    /// Buffered tokens, always ending with `Eof`
    pub(super) buffer: Vec<Token<'ast>>,
    /// Current position in the buffer
    pub(super) position: usize,
    /// Accumulated parse errors
    pub(super) errors: ParseErrors,
    /// Arena allocator for AST nodes
    pub(super) arena: &'ast Bump,
}

impl<'ast> Parser<'ast> {
    /// Create a new parser for the given source code.
    ///
    /// Lexical errors are recorded immediately. The offending input stays in
    /// the buffer as `Error` tokens, so the parser never reports a second
    /// error for the same spot.
    pub fn new(source: &str, arena: &'ast Bump) -> Self {
        let (buffer, lex_errors) = Lexer::new(source, arena).tokenize();
        let mut errors = ParseErrors::new();
        for error in lex_errors {
            errors.push(error.into());
        }

        Self {
            buffer,
            position: 0,
            errors,
            arena,
        }
    }

    /// Parse a complete source unit.
    ///
    /// Returns every collected error when any statement failed.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse(source: &str, arena: &'ast Bump) -> Result<Script<'ast>, ParseErrors> {
        let (script, errors) = Self::parse_lenient(source, arena);
        if errors.is_empty() {
            Ok(script)
        } else {
            Err(errors)
        }
    }

    /// Parse a complete source unit, returning whatever was recovered along
    /// with the errors.
    pub fn parse_lenient(source: &str, arena: &'ast Bump) -> (Script<'ast>, ParseErrors) {
        let mut parser = Parser::new(source, arena);
        let start = parser.peek().span;
        let statements = parser.parse_statement_list(TokenKind::Eof);
        let span = start.merge(parser.peek().span);
        (Script::new(statements, span), parser.take_errors())
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Take the errors, leaving an empty error collection.
    pub fn take_errors(&mut self) -> ParseErrors {
        std::mem::take(&mut self.errors)
    }

    // ========================================================================
    // Token Navigation
    // ========================================================================

    /// Peek at the current token without consuming it.
    pub fn peek(&self) -> &Token<'ast> {
        let last = self.buffer.len() - 1;
        &self.buffer[self.position.min(last)]
    }

    /// The most recently consumed token, or the first token at the start.
    pub fn last(&self) -> &Token<'ast> {
        &self.buffer[self.position.saturating_sub(1).min(self.buffer.len() - 1)]
    }

    /// Get the current token and advance to the next. Never moves past `Eof`.
    pub fn advance(&mut self) -> Token<'ast> {
        let token = *self.peek();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    /// Step back one token.
    pub(super) fn rewind(&mut self) {
        self.position = self.position.saturating_sub(1);
    }

    /// Check if the current token matches the given kind.
    pub fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Check if the current token is EOF.
    pub fn is_eof(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    /// If the current token matches the given kind, consume it and return Some.
    pub fn eat(&mut self, kind: TokenKind) -> Option<Token<'ast>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Consume the next token and require it to be of the given kind.
    ///
    /// The token is consumed even on mismatch, matching how recovery skips
    /// forward from the offending token.
    pub fn expect(&mut self, kind: TokenKind) -> Result<Token<'ast>, ParseError> {
        let token = self.advance();
        if token.kind == kind {
            Ok(token)
        } else {
            Err(ParseError::expected_token(
                token.span,
                kind.as_str(),
                &token.pretty(),
            ))
        }
    }

    // ========================================================================
    // Error Handling
    // ========================================================================

    /// Record a parse error without aborting the current statement.
    pub fn error(&mut self, kind: ParseErrorKind, span: Span, message: impl Into<String>) {
        self.record(ParseError::new(kind, span, message));
    }

    /// Record an error unless it points at input the lexer already rejected.
    pub(super) fn record(&mut self, error: ParseError) {
        let lexed_bad = self
            .buffer
            .iter()
            .any(|t| t.kind == TokenKind::Error && t.span == error.span);
        if !lexed_bad {
            self.errors.push(error);
        }
    }

    /// Skip to the next statement boundary after an error.
    ///
    /// Stops at `;`, `}` or EOF and consumes the boundary unless it is `}`,
    /// which belongs to the enclosing block.
    pub fn synchronize(&mut self) {
        while !self.peek().kind.is_savepoint() {
            self.advance();
        }
        if !self.check(TokenKind::RightBrace) {
            self.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_navigation() {
        let arena = Bump::new();
        let mut parser = Parser::new("var x = 42", &arena);
        assert_eq!(parser.peek().kind, TokenKind::Var);
        let token = parser.advance();
        assert_eq!(token.kind, TokenKind::Var);
        assert_eq!(parser.last().kind, TokenKind::Var);
        assert_eq!(parser.peek().kind, TokenKind::Identifier);
    }

    #[test]
    fn advance_stops_at_eof() {
        let arena = Bump::new();
        let mut parser = Parser::new("x", &arena);
        parser.advance();
        assert!(parser.is_eof());
        parser.advance();
        parser.advance();
        assert!(parser.is_eof());
        assert_eq!(parser.last().kind, TokenKind::Identifier);
    }

    #[test]
    fn expect_failure_consumes() {
        let arena = Bump::new();
        let mut parser = Parser::new("var x", &arena);
        let err = parser.expect(TokenKind::Import).unwrap_err();
        assert_eq!(err.message, "Expected 'import', found 'var'");
        assert_eq!(parser.peek().kind, TokenKind::Identifier);
    }

    #[test]
    fn check_and_eat() {
        let arena = Bump::new();
        let mut parser = Parser::new("if x", &arena);
        assert!(parser.check(TokenKind::If));
        assert!(parser.eat(TokenKind::While).is_none());
        assert!(parser.eat(TokenKind::If).is_some());
    }

    #[test]
    fn synchronize_consumes_semicolon() {
        let arena = Bump::new();
        let mut parser = Parser::new("a b c; d", &arena);
        parser.synchronize();
        assert_eq!(parser.peek().lexeme, "d");
    }

    #[test]
    fn synchronize_leaves_closing_brace() {
        let arena = Bump::new();
        let mut parser = Parser::new("a b } d", &arena);
        parser.synchronize();
        assert!(parser.check(TokenKind::RightBrace));
    }

    #[test]
    fn lexer_errors_are_collected() {
        let arena = Bump::new();
        let parser = Parser::new("var s = \"open", &arena);
        assert!(parser.has_errors());
    }

    #[test]
    fn error_accumulation() {
        let arena = Bump::new();
        let mut parser = Parser::new("x", &arena);
        parser.error(ParseErrorKind::ExpectedToken, Span::new(1, 1, 1), "one");
        parser.error(ParseErrorKind::ExpectedToken, Span::new(1, 2, 1), "two");
        assert_eq!(parser.take_errors().len(), 2);
        assert!(!parser.has_errors());
    }
}
