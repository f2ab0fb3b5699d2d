//! Main lexer implementation for glang.
//!
//! The [`Lexer`] converts source text into a stream of [`Token`]s.
//! It dispatches on the first character of each token.
//!
//! The lexer copies all string content (identifiers, literals) into the arena,
//! allowing the source string to be freed after lexing completes.

use bumpalo::Bump;
use glang_core::LexError;
use num_bigint::BigInt;

use super::cursor::{Cursor, Mark, is_ident_continue, is_ident_start};
use super::token::{Token, TokenKind, lookup_keyword};

/// Lexer for glang source code.
///
/// The `'src` lifetime is the source string being lexed (temporary).
/// The `'ast` lifetime is the arena where token lexemes are allocated (persists).
pub struct Lexer<'src, 'ast> {
    cursor: Cursor<'src>,
    /// Arena for allocating token lexemes.
    arena: &'ast Bump,
    /// Accumulated errors.
    errors: Vec<LexError>,
}

impl<'src, 'ast> Lexer<'src, 'ast> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'src str, arena: &'ast Bump) -> Self {
        Self {
            cursor: Cursor::new(source),
            arena,
            errors: Vec::new(),
        }
    }

    /// Take accumulated errors, leaving an empty vec.
    pub fn take_errors(&mut self) -> Vec<LexError> {
        std::mem::take(&mut self.errors)
    }

    /// Check if any errors occurred.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Consume and return the next token.
    ///
    /// Once the end of input is reached every further call returns `Eof`.
    pub fn next_token(&mut self) -> Token<'ast> {
        self.skip_trivia();

        if self.cursor.is_eof() {
            return self.make_eof();
        }

        let start = self.cursor.mark();

        match self.cursor.peek() {
            Some(quote @ ('"' | '\'')) => self.scan_string(quote, TokenKind::StringLiteral, start),
            Some('`') => self.scan_string('`', TokenKind::Identifier, start),
            Some(c) if c.is_ascii_digit() => self.scan_number(start),
            Some('.') if self.cursor.peek_second().is_some_and(|c| c.is_ascii_digit()) => {
                self.scan_number(start)
            }
            Some(c) if is_ident_start(c) => self.scan_identifier(start),
            _ => self.scan_operator(start),
        }
    }

    /// Lex the whole input, including the trailing `Eof` token.
    pub fn tokenize(mut self) -> (Vec<Token<'ast>>, Vec<LexError>) {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        (tokens, self.errors)
    }

    // =========================================
    // Internal: token construction
    // =========================================

    fn make_eof(&self) -> Token<'ast> {
        Token::new(TokenKind::Eof, "", self.cursor.here())
    }

    /// Create a token whose lexeme is the source text since `start`.
    fn make_token(&self, kind: TokenKind, start: Mark) -> Token<'ast> {
        let text = self.cursor.text_from(start);
        Token::new(kind, self.arena.alloc_str(text), self.cursor.span_from(start))
    }

    /// Create a token with an explicit lexeme.
    fn make_token_with(&self, kind: TokenKind, lexeme: &str, start: Mark) -> Token<'ast> {
        Token::new(kind, self.arena.alloc_str(lexeme), self.cursor.span_from(start))
    }

    /// Record an error and return an error token covering `start..cursor`.
    fn make_error(&mut self, error: LexError, start: Mark) -> Token<'ast> {
        self.errors.push(error);
        self.make_token(TokenKind::Error, start)
    }

    // =========================================
    // Scanning: whitespace and comments
    // =========================================

    fn skip_trivia(&mut self) {
        loop {
            self.cursor.skip_while(char::is_whitespace);
            if self.cursor.peek() != Some('/') {
                return;
            }
            match self.cursor.peek_second() {
                Some('/') => {
                    self.cursor.skip_while(|c| c != '\n');
                }
                Some('*') => {
                    let open = self.cursor.mark();
                    self.cursor.advance();
                    self.cursor.advance();
                    let start_span = self.cursor.span_from(open);
                    loop {
                        match self.cursor.advance() {
                            Some('*') if self.cursor.eat('/') => break,
                            Some(_) => {}
                            None => {
                                self.errors
                                    .push(LexError::UnterminatedComment { span: start_span });
                                return;
                            }
                        }
                    }
                }
                _ => return,
            }
        }
    }

    // =========================================
    // Scanning: identifiers and keywords
    // =========================================

    fn scan_identifier(&mut self, start: Mark) -> Token<'ast> {
        self.cursor.skip_while(is_ident_continue);
        let text = self.cursor.text_from(start);
        let kind = lookup_keyword(text).unwrap_or(TokenKind::Identifier);
        self.make_token(kind, start)
    }

    // =========================================
    // Scanning: strings and quoted identifiers
    // =========================================

    fn scan_string(&mut self, quote: char, kind: TokenKind, start: Mark) -> Token<'ast> {
        self.cursor.advance();
        let mut value = String::new();
        loop {
            match self.cursor.peek() {
                Some(c) if c == quote => {
                    self.cursor.advance();
                    break;
                }
                None | Some('\n') => {
                    let error = LexError::UnterminatedString { span: self.cursor.here() };
                    return self.make_error(error, start);
                }
                Some('\\') => {
                    self.cursor.advance();
                    if let Err(error) = self.scan_escape(&mut value) {
                        return self.make_error(error, start);
                    }
                }
                Some(c) => {
                    self.cursor.advance();
                    value.push(c);
                }
            }
        }
        self.make_token_with(kind, &value, start)
    }

    fn scan_escape(&mut self, value: &mut String) -> Result<(), LexError> {
        let span = self.cursor.here();
        let Some(code) = self.cursor.advance() else {
            return Err(LexError::InvalidEscape {
                span,
                detail: "Expected escape code".to_string(),
            });
        };
        let simple = match code {
            '0' => Some('\0'),
            't' => Some('\t'),
            'b' => Some('\u{8}'),
            'n' => Some('\n'),
            'r' => Some('\r'),
            'f' => Some('\u{c}'),
            '\'' | '"' | '`' | '\\' => Some(code),
            _ => None,
        };
        if let Some(c) = simple {
            value.push(c);
            return Ok(());
        }

        let digit_count = match code {
            'x' => 2,
            'u' => 4,
            'U' => 8,
            _ => {
                return Err(LexError::InvalidEscape {
                    span,
                    detail: format!("Unknown escape code \\{code}"),
                });
            }
        };
        let mut codepoint: u32 = 0;
        for _ in 0..digit_count {
            let span = self.cursor.here();
            let digit = match self.cursor.peek() {
                None | Some('\n') => {
                    return Err(LexError::InvalidEscape {
                        span,
                        detail: format!("Unfinished \\{code} escape"),
                    });
                }
                Some(d) => d,
            };
            let Some(value) = digit.to_digit(16) else {
                return Err(LexError::InvalidEscape {
                    span,
                    detail: format!("'{digit}' not a digit in \\{code} escape"),
                });
            };
            self.cursor.advance();
            codepoint = codepoint.wrapping_mul(16).wrapping_add(value);
        }
        match char::from_u32(codepoint) {
            Some(c) => {
                value.push(c);
                Ok(())
            }
            None => Err(LexError::InvalidEscape {
                span,
                detail: format!("Invalid codepoint U+{codepoint:X}"),
            }),
        }
    }

    // =========================================
    // Scanning: numbers
    // =========================================

    /// Scan a numeric literal and classify it.
    ///
    /// Without a suffix, integers take the narrowest of 32-bit, 64-bit and
    /// arbitrary precision that holds the value. A fraction or exponent makes
    /// a double. Suffixes `d`, `l` and `b` force double, wide and arbitrary
    /// precision respectively.
    fn scan_number(&mut self, start: Mark) -> Token<'ast> {
        let mut radix = 10;
        let first = self.cursor.advance();
        let mut has_decimal = first == Some('.');
        let mut prefix_len = 0;

        if first == Some('0') {
            match self.cursor.peek() {
                Some('1'..='9') => {
                    radix = 8;
                    prefix_len = 1;
                }
                Some('o' | 'O') => {
                    radix = 8;
                    self.cursor.advance();
                    prefix_len = 2;
                }
                Some('x' | 'X') => {
                    radix = 16;
                    self.cursor.advance();
                    prefix_len = 2;
                }
                Some('b' | 'B') => {
                    radix = 2;
                    self.cursor.advance();
                    prefix_len = 2;
                }
                _ => {}
            }
        }

        loop {
            match self.cursor.peek() {
                Some(c) if c.is_digit(radix) => {
                    self.cursor.advance();
                }
                Some('.')
                    if !has_decimal
                        && radix == 10
                        && self.cursor.peek_second().is_some_and(|c| c.is_ascii_digit()) =>
                {
                    has_decimal = true;
                    self.cursor.advance();
                }
                Some('e' | 'E') if radix == 10 => {
                    has_decimal = true;
                    self.cursor.advance();
                    if matches!(self.cursor.peek(), Some('+' | '-')) {
                        self.cursor.advance();
                    }
                }
                _ => break,
            }
        }

        let digits = &self.cursor.text_from(start)[prefix_len..];
        if digits.is_empty() {
            self.cursor.advance();
            let error = LexError::InvalidNumber {
                span: self.cursor.span_from(start),
                detail: "Expected number".to_string(),
            };
            return self.make_error(error, start);
        }

        let suffix = self.cursor.peek();
        let parsed = match suffix {
            Some('d' | 'D') => {
                self.cursor.advance();
                parse_double(digits, "Invalid D number")
            }
            Some('l' | 'L') => {
                self.cursor.advance();
                i64::from_str_radix(digits, radix)
                    .map(|v| (TokenKind::LongLiteral, v.to_string()))
                    .map_err(|e| format!("Invalid L number: {e}"))
            }
            Some('b' | 'B') => {
                self.cursor.advance();
                parse_big(digits, radix, "Invalid B number")
            }
            _ if has_decimal => parse_double(digits, "Invalid decimal"),
            _ => parse_integer(digits, radix),
        };

        match parsed {
            Ok((kind, canonical)) => self.make_token_with(kind, &canonical, start),
            Err(detail) => {
                let error = LexError::InvalidNumber {
                    span: self.cursor.span_from(start),
                    detail,
                };
                self.make_error(error, start)
            }
        }
    }

    // =========================================
    // Scanning: operators and punctuation
    // =========================================

    fn scan_operator(&mut self, start: Mark) -> Token<'ast> {
        let Some(c) = self.cursor.advance() else {
            return self.make_eof();
        };
        let kind = match c {
            '+' => self.either('+', TokenKind::PlusPlus, |l| {
                l.either('=', TokenKind::PlusEqual, |_| TokenKind::Plus)
            }),
            '-' => self.either('-', TokenKind::MinusMinus, |l| {
                l.either('=', TokenKind::MinusEqual, |_| TokenKind::Minus)
            }),
            '~' => TokenKind::Tilde,
            '*' => self.either('=', TokenKind::StarEqual, |_| TokenKind::Star),
            '/' => self.either('=', TokenKind::SlashEqual, |_| TokenKind::Slash),
            '%' => self.either('=', TokenKind::PercentEqual, |_| TokenKind::Percent),
            '<' => {
                if self.cursor.eat('<') {
                    self.either('=', TokenKind::LessLessEqual, |_| TokenKind::LessLess)
                } else {
                    self.either('=', TokenKind::LessEqual, |_| TokenKind::Less)
                }
            }
            '>' => {
                if self.cursor.eat('>') {
                    self.either('=', TokenKind::GreaterGreaterEqual, |_| {
                        TokenKind::GreaterGreater
                    })
                } else {
                    self.either('=', TokenKind::GreaterEqual, |_| TokenKind::Greater)
                }
            }
            '=' => {
                if self.cursor.eat('=') {
                    self.either('=', TokenKind::EqualEqualEqual, |_| TokenKind::EqualEqual)
                } else {
                    TokenKind::Equal
                }
            }
            '!' => {
                if self.cursor.eat('=') {
                    self.either('=', TokenKind::BangEqualEqual, |_| TokenKind::BangEqual)
                } else {
                    TokenKind::Bang
                }
            }
            '&' => self.either('&', TokenKind::AmpAmp, |l| {
                l.either('=', TokenKind::AmpEqual, |_| TokenKind::Amp)
            }),
            '|' => self.either('|', TokenKind::PipePipe, |l| {
                l.either('=', TokenKind::PipeEqual, |_| TokenKind::Pipe)
            }),
            '^' => self.either('=', TokenKind::CaretEqual, |_| TokenKind::Caret),
            '?' => TokenKind::Question,
            ':' => {
                if self.cursor.eat(':') {
                    self.either('!', TokenKind::ColonColonBang, |_| TokenKind::ColonColon)
                } else {
                    TokenKind::Colon
                }
            }
            '.' => self.either('!', TokenKind::DotBang, |_| TokenKind::Dot),
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            other => {
                let error = LexError::UnknownToken {
                    text: other.to_string(),
                    span: self.cursor.span_from(start),
                };
                return self.make_error(error, start);
            }
        };
        self.make_token(kind, start)
    }

    /// Consume `next` and yield `matched`, or fall through to `otherwise`.
    fn either(
        &mut self,
        next: char,
        matched: TokenKind,
        otherwise: impl FnOnce(&mut Self) -> TokenKind,
    ) -> TokenKind {
        if self.cursor.eat(next) {
            matched
        } else {
            otherwise(self)
        }
    }
}

fn parse_double(digits: &str, label: &str) -> Result<(TokenKind, String), String> {
    digits
        .parse::<f64>()
        .map(|v| (TokenKind::DoubleLiteral, format!("{v:?}")))
        .map_err(|e| format!("{label}: {e}"))
}

fn parse_big(digits: &str, radix: u32, label: &str) -> Result<(TokenKind, String), String> {
    BigInt::parse_bytes(digits.as_bytes(), radix)
        .map(|v| (TokenKind::BigIntLiteral, v.to_string()))
        .ok_or_else(|| format!("{label}: {digits}"))
}

fn parse_integer(digits: &str, radix: u32) -> Result<(TokenKind, String), String> {
    if let Ok(v) = i32::from_str_radix(digits, radix) {
        return Ok((TokenKind::IntLiteral, v.to_string()));
    }
    if let Ok(v) = i64::from_str_radix(digits, radix) {
        return Ok((TokenKind::LongLiteral, v.to_string()));
    }
    parse_big(digits, radix, "Invalid integer")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(source: &str) -> (Vec<(TokenKind, String)>, Vec<LexError>) {
        let arena = Bump::new();
        let (tokens, errors) = Lexer::new(source, &arena).tokenize();
        let tokens = tokens
            .into_iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .map(|t| (t.kind, t.lexeme.to_string()))
            .collect();
        (tokens, errors)
    }

    fn kinds(source: &str) -> Vec<TokenKind> {
        lex(source).0.into_iter().map(|(k, _)| k).collect()
    }

    #[test]
    fn empty_source_is_eof() {
        let arena = Bump::new();
        let mut lexer = Lexer::new("", &arena);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
        assert_eq!(lexer.next_token().kind, TokenKind::Eof);
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("var x import while"),
            vec![
                TokenKind::Var,
                TokenKind::Identifier,
                TokenKind::Import,
                TokenKind::While
            ]
        );
    }

    #[test]
    fn quoted_identifier_can_be_keyword() {
        let (tokens, errors) = lex("`while`");
        assert!(errors.is_empty());
        assert_eq!(tokens, vec![(TokenKind::Identifier, "while".to_string())]);
    }

    #[test]
    fn access_operators() {
        assert_eq!(
            kinds("a.b .! :: ::! :"),
            vec![
                TokenKind::Identifier,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::DotBang,
                TokenKind::ColonColon,
                TokenKind::ColonColonBang,
                TokenKind::Colon,
            ]
        );
    }

    #[test]
    fn longest_operator_wins() {
        assert_eq!(
            kinds("<<= === !== >>= && ||"),
            vec![
                TokenKind::LessLessEqual,
                TokenKind::EqualEqualEqual,
                TokenKind::BangEqualEqual,
                TokenKind::GreaterGreaterEqual,
                TokenKind::AmpAmp,
                TokenKind::PipePipe,
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("a // line\n/* block\n */ b"),
            vec![TokenKind::Identifier, TokenKind::Identifier]
        );
    }

    #[test]
    fn unterminated_comment_reports() {
        let (_, errors) = lex("a /* never");
        assert!(matches!(errors[0], LexError::UnterminatedComment { .. }));
    }

    #[test]
    fn string_escapes() {
        let (tokens, errors) = lex(r#""a\tb\x41é" 'it\'s'"#);
        assert!(errors.is_empty());
        assert_eq!(tokens[0], (TokenKind::StringLiteral, "a\tbAé".to_string()));
        assert_eq!(tokens[1], (TokenKind::StringLiteral, "it's".to_string()));
    }

    #[test]
    fn bad_escapes_report() {
        let (_, errors) = lex(r#""\q""#);
        assert_eq!(errors[0].to_string(), "Unknown escape code \\q");
        let (_, errors) = lex(r#""\x4""#);
        assert_eq!(errors[0].to_string(), "'\"' not a digit in \\x escape");
        let (_, errors) = lex(r#""\UFFFFFFFF""#);
        assert_eq!(errors[0].to_string(), "Invalid codepoint U+FFFFFFFF");
    }

    #[test]
    fn unterminated_string() {
        let (tokens, errors) = lex("\"abc\nx");
        assert!(matches!(errors[0], LexError::UnterminatedString { .. }));
        assert_eq!(tokens[0].0, TokenKind::Error);
    }

    #[test]
    fn number_classification() {
        let (tokens, errors) = lex("5 3000000000 99999999999999999999 1.5 .5 2e3 7d 7L 7b");
        assert!(errors.is_empty());
        let expected = [
            (TokenKind::IntLiteral, "5"),
            (TokenKind::LongLiteral, "3000000000"),
            (TokenKind::BigIntLiteral, "99999999999999999999"),
            (TokenKind::DoubleLiteral, "1.5"),
            (TokenKind::DoubleLiteral, "0.5"),
            (TokenKind::DoubleLiteral, "2000.0"),
            (TokenKind::DoubleLiteral, "7.0"),
            (TokenKind::LongLiteral, "7"),
            (TokenKind::BigIntLiteral, "7"),
        ];
        for (token, (kind, text)) in tokens.iter().zip(expected) {
            assert_eq!(token.0, kind);
            assert_eq!(token.1, text);
        }
    }

    #[test]
    fn radix_prefixes() {
        let (tokens, _) = lex("0x1F 0b101 0o17 017 0");
        let values: Vec<_> = tokens.iter().map(|(_, v)| v.as_str()).collect();
        assert_eq!(values, vec!["31", "5", "15", "15", "0"]);
    }

    #[test]
    fn member_access_on_number_is_not_fraction() {
        assert_eq!(
            kinds("1.foo"),
            vec![TokenKind::IntLiteral, TokenKind::Dot, TokenKind::Identifier]
        );
    }

    #[test]
    fn spans_are_one_based() {
        let arena = Bump::new();
        let mut lexer = Lexer::new("  foo\n bar", &arena);
        let foo = lexer.next_token();
        assert_eq!((foo.span.line, foo.span.col, foo.span.len), (1, 3, 3));
        let bar = lexer.next_token();
        assert_eq!((bar.span.line, bar.span.col, bar.span.len), (2, 2, 3));
    }

    #[test]
    fn unknown_character() {
        let (tokens, errors) = lex("a # b");
        assert_eq!(errors[0].to_string(), "Unknown token '#'");
        assert_eq!(
            tokens.iter().map(|t| t.0).collect::<Vec<_>>(),
            vec![TokenKind::Identifier, TokenKind::Error, TokenKind::Identifier]
        );
    }
}
