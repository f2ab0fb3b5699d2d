//! Operator enums shared by expression nodes.

use std::fmt;

use crate::lexer::TokenKind;

/// Binary operators, grouped by precedence from loosest to tightest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Or,
    And,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    RefEqual,
    RefNotEqual,
    BitOr,
    BitXor,
    BitAnd,
    ShiftLeft,
    ShiftRight,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::RefEqual => "===",
            BinaryOp::RefNotEqual => "!==",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::BitAnd => "&",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
        }
    }

    /// Comparison operators share one precedence level.
    pub fn comparison(kind: TokenKind) -> Option<Self> {
        Some(match kind {
            TokenKind::Less => BinaryOp::Less,
            TokenKind::Greater => BinaryOp::Greater,
            TokenKind::LessEqual => BinaryOp::LessEqual,
            TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
            TokenKind::EqualEqual => BinaryOp::Equal,
            TokenKind::BangEqual => BinaryOp::NotEqual,
            TokenKind::EqualEqualEqual => BinaryOp::RefEqual,
            TokenKind::BangEqualEqual => BinaryOp::RefNotEqual,
            _ => return None,
        })
    }

    pub fn shift(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::LessLess => Some(BinaryOp::ShiftLeft),
            TokenKind::GreaterGreater => Some(BinaryOp::ShiftRight),
            _ => None,
        }
    }

    pub fn term(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Plus => Some(BinaryOp::Add),
            TokenKind::Minus => Some(BinaryOp::Subtract),
            _ => None,
        }
    }

    pub fn factor(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Star => Some(BinaryOp::Multiply),
            TokenKind::Slash => Some(BinaryOp::Divide),
            TokenKind::Percent => Some(BinaryOp::Modulo),
            _ => None,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Prefix unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `!`
    Not,
    /// `+`
    Plus,
    /// `-`
    Negate,
    /// `~`
    Invert,
}

impl UnaryOp {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Minus => Some(UnaryOp::Negate),
            TokenKind::Tilde => Some(UnaryOp::Invert),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Plus => "+",
            UnaryOp::Negate => "-",
            UnaryOp::Invert => "~",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Assignment operators. Only [`AssignOp::Assign`] has code generation support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    AndAssign,
    XorAssign,
    OrAssign,
    ShlAssign,
    ShrAssign,
}

impl AssignOp {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        Some(match kind {
            TokenKind::Equal => AssignOp::Assign,
            TokenKind::PlusEqual => AssignOp::AddAssign,
            TokenKind::MinusEqual => AssignOp::SubAssign,
            TokenKind::StarEqual => AssignOp::MulAssign,
            TokenKind::SlashEqual => AssignOp::DivAssign,
            TokenKind::PercentEqual => AssignOp::ModAssign,
            TokenKind::AmpEqual => AssignOp::AndAssign,
            TokenKind::CaretEqual => AssignOp::XorAssign,
            TokenKind::PipeEqual => AssignOp::OrAssign,
            TokenKind::LessLessEqual => AssignOp::ShlAssign,
            TokenKind::GreaterGreaterEqual => AssignOp::ShrAssign,
            _ => return None,
        })
    }
}

/// Member access operators.
///
/// The direct forms bypass extension methods. The method forms produce a
/// callable instead of a field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    /// `.`
    Simple,
    /// `.!`
    Direct,
    /// `::`
    Method,
    /// `::!`
    DirectMethod,
}

impl AccessKind {
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        match kind {
            TokenKind::Dot => Some(AccessKind::Simple),
            TokenKind::DotBang => Some(AccessKind::Direct),
            TokenKind::ColonColon => Some(AccessKind::Method),
            TokenKind::ColonColonBang => Some(AccessKind::DirectMethod),
            _ => None,
        }
    }

    /// The method-producing counterpart, used when the access is called.
    pub fn to_method_access(self) -> Self {
        match self {
            AccessKind::Simple => AccessKind::Method,
            AccessKind::Direct => AccessKind::DirectMethod,
            other => other,
        }
    }

    pub fn is_method(self) -> bool {
        matches!(self, AccessKind::Method | AccessKind::DirectMethod)
    }

    pub fn is_direct(self) -> bool {
        matches!(self, AccessKind::Direct | AccessKind::DirectMethod)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessKind::Simple => ".",
            AccessKind::Direct => ".!",
            AccessKind::Method => "::",
            AccessKind::DirectMethod => "::!",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_access_mapping() {
        assert_eq!(AccessKind::Simple.to_method_access(), AccessKind::Method);
        assert_eq!(AccessKind::Direct.to_method_access(), AccessKind::DirectMethod);
        assert_eq!(AccessKind::Method.to_method_access(), AccessKind::Method);
        assert!(AccessKind::DirectMethod.is_direct());
        assert!(!AccessKind::Simple.is_method());
    }

    #[test]
    fn precedence_groups() {
        assert_eq!(BinaryOp::comparison(TokenKind::EqualEqual), Some(BinaryOp::Equal));
        assert_eq!(BinaryOp::comparison(TokenKind::Plus), None);
        assert_eq!(BinaryOp::factor(TokenKind::Percent), Some(BinaryOp::Modulo));
        assert_eq!(UnaryOp::from_token(TokenKind::Tilde), Some(UnaryOp::Invert));
    }
}
