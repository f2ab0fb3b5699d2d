//! Token types and definitions for the glang lexer.

use glang_core::Span;
use glang_core::text::escape;
use std::fmt;

/// A token from the source code.
///
/// The `'ast` lifetime refers to the arena where the lexeme string is allocated.
/// String literal and quoted identifier lexemes hold the unescaped value.
/// Number lexemes hold a canonical rendering of the parsed value.
#[derive(Clone, Copy, PartialEq)]
pub struct Token<'ast> {
    /// The type of token.
    pub kind: TokenKind,
    /// The text of this token (allocated in arena).
    pub lexeme: &'ast str,
    /// Location in source.
    pub span: Span,
}

impl<'ast> Token<'ast> {
    /// Create a new token.
    #[inline]
    pub fn new(kind: TokenKind, lexeme: &'ast str, span: Span) -> Self {
        Self { kind, lexeme, span }
    }

    /// Render the token the way diagnostics quote it.
    pub fn pretty(&self) -> String {
        match self.kind {
            TokenKind::Identifier | TokenKind::Error => self.lexeme.to_string(),
            TokenKind::StringLiteral => format!("\"{}\"", escape(self.lexeme, false)),
            kind if kind.is_number() => self.lexeme.to_string(),
            kind => kind.as_str().to_string(),
        }
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {:?})", self.kind, self.lexeme, self.span)
    }
}

/// All possible token types in glang.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // =========================================
    // Literals
    // =========================================
    /// Integer literal that fits in 32 bits: `42`, `0x1F`
    IntLiteral,
    /// Wide integer literal: `42L`, `3000000000`
    LongLiteral,
    /// Floating point literal: `1.5`, `1e3`, `2d`
    DoubleLiteral,
    /// Arbitrary precision integer literal: `42b`, `99999999999999999999`
    BigIntLiteral,
    /// String literal: `"hello"`, `'a'`
    StringLiteral,

    // =========================================
    // Identifiers
    // =========================================
    /// Identifier, bare or backtick quoted
    Identifier,

    // =========================================
    // Keywords
    // =========================================
    Import,
    Var,
    Fn,
    Class,
    Public,
    Private,
    Static,
    Final,
    Instanceof,
    If,
    Else,
    While,
    For,
    Break,
    Continue,
    True,
    False,
    Null,

    // =========================================
    // Operators
    // =========================================
    PlusPlus,
    MinusMinus,
    Plus,
    Minus,
    Tilde,
    Bang,
    Star,
    Slash,
    Percent,
    LessLess,
    GreaterGreater,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    EqualEqual,
    EqualEqualEqual,
    BangEqual,
    BangEqualEqual,
    Amp,
    Caret,
    Pipe,
    AmpAmp,
    PipePipe,
    Question,
    Colon,
    Equal,
    PlusEqual,
    MinusEqual,
    StarEqual,
    SlashEqual,
    PercentEqual,
    AmpEqual,
    CaretEqual,
    PipeEqual,
    LessLessEqual,
    GreaterGreaterEqual,

    // =========================================
    // Punctuation
    // =========================================
    Comma,
    Semicolon,
    LeftBracket,
    RightBracket,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Dot,
    DotBang,
    ColonColon,
    ColonColonBang,

    // =========================================
    // Special
    // =========================================
    /// Lexical error placeholder; the error itself is reported separately
    Error,
    /// End of file
    Eof,
}

impl TokenKind {
    /// Source spelling of fixed tokens, or a category name for the rest.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::IntLiteral
            | TokenKind::LongLiteral
            | TokenKind::DoubleLiteral
            | TokenKind::BigIntLiteral => "number",
            TokenKind::StringLiteral => "string",
            TokenKind::Identifier => "identifier",
            TokenKind::Import => "import",
            TokenKind::Var => "var",
            TokenKind::Fn => "fn",
            TokenKind::Class => "class",
            TokenKind::Public => "public",
            TokenKind::Private => "private",
            TokenKind::Static => "static",
            TokenKind::Final => "final",
            TokenKind::Instanceof => "instanceof",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::For => "for",
            TokenKind::Break => "break",
            TokenKind::Continue => "continue",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Null => "null",
            TokenKind::PlusPlus => "++",
            TokenKind::MinusMinus => "--",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Tilde => "~",
            TokenKind::Bang => "!",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::LessLess => "<<",
            TokenKind::GreaterGreater => ">>",
            TokenKind::Less => "<",
            TokenKind::Greater => ">",
            TokenKind::LessEqual => "<=",
            TokenKind::GreaterEqual => ">=",
            TokenKind::EqualEqual => "==",
            TokenKind::EqualEqualEqual => "===",
            TokenKind::BangEqual => "!=",
            TokenKind::BangEqualEqual => "!==",
            TokenKind::Amp => "&",
            TokenKind::Caret => "^",
            TokenKind::Pipe => "|",
            TokenKind::AmpAmp => "&&",
            TokenKind::PipePipe => "||",
            TokenKind::Question => "?",
            TokenKind::Colon => ":",
            TokenKind::Equal => "=",
            TokenKind::PlusEqual => "+=",
            TokenKind::MinusEqual => "-=",
            TokenKind::StarEqual => "*=",
            TokenKind::SlashEqual => "/=",
            TokenKind::PercentEqual => "%=",
            TokenKind::AmpEqual => "&=",
            TokenKind::CaretEqual => "^=",
            TokenKind::PipeEqual => "|=",
            TokenKind::LessLessEqual => "<<=",
            TokenKind::GreaterGreaterEqual => ">>=",
            TokenKind::Comma => ",",
            TokenKind::Semicolon => ";",
            TokenKind::LeftBracket => "[",
            TokenKind::RightBracket => "]",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::LeftBrace => "{",
            TokenKind::RightBrace => "}",
            TokenKind::Dot => ".",
            TokenKind::DotBang => ".!",
            TokenKind::ColonColon => "::",
            TokenKind::ColonColonBang => "::!",
            TokenKind::Error => "<<ERROR>>",
            TokenKind::Eof => "<<EOF>>",
        }
    }

    /// Whether this is one of the numeric literal kinds.
    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(
            self,
            TokenKind::IntLiteral
                | TokenKind::LongLiteral
                | TokenKind::DoubleLiteral
                | TokenKind::BigIntLiteral
        )
    }

    /// Whether this token is `=` or a compound assignment.
    #[inline]
    pub fn is_assignment(&self) -> bool {
        matches!(
            self,
            TokenKind::Equal
                | TokenKind::PlusEqual
                | TokenKind::MinusEqual
                | TokenKind::StarEqual
                | TokenKind::SlashEqual
                | TokenKind::PercentEqual
                | TokenKind::AmpEqual
                | TokenKind::CaretEqual
                | TokenKind::PipeEqual
                | TokenKind::LessLessEqual
                | TokenKind::GreaterGreaterEqual
        )
    }

    /// Whether this token ends panic-mode recovery.
    #[inline]
    pub fn is_savepoint(&self) -> bool {
        matches!(
            self,
            TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::Eof
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Look up a keyword by its spelling.
pub fn lookup_keyword(ident: &str) -> Option<TokenKind> {
    Some(match ident {
        "import" => TokenKind::Import,
        "var" => TokenKind::Var,
        "fn" => TokenKind::Fn,
        "class" => TokenKind::Class,
        "public" => TokenKind::Public,
        "private" => TokenKind::Private,
        "static" => TokenKind::Static,
        "final" => TokenKind::Final,
        "instanceof" => TokenKind::Instanceof,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "while" => TokenKind::While,
        "for" => TokenKind::For,
        "break" => TokenKind::Break,
        "continue" => TokenKind::Continue,
        "true" => TokenKind::True,
        "false" => TokenKind::False,
        "null" => TokenKind::Null,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords() {
        assert_eq!(lookup_keyword("while"), Some(TokenKind::While));
        assert_eq!(lookup_keyword("println"), None);
    }

    #[test]
    fn pretty_quotes_strings() {
        let token = Token::new(TokenKind::StringLiteral, "a\"b", Span::default());
        assert_eq!(token.pretty(), "\"a\\\"b\"");
        let eof = Token::new(TokenKind::Eof, "", Span::default());
        assert_eq!(eof.pretty(), "<<EOF>>");
    }

    #[test]
    fn assignment_group() {
        assert!(TokenKind::Equal.is_assignment());
        assert!(TokenKind::GreaterGreaterEqual.is_assignment());
        assert!(!TokenKind::EqualEqual.is_assignment());
    }
}
