//! Expression parsing functions for glang.
//!
//! A precedence-climbing recursive descent parser, one method per level.

use bumpalo::collections::Vec as BVec;
use glang_core::{MAX_CALL_ARGS, Span};

use super::parser::Parser;
use crate::ast::expr::*;
use crate::ast::{AccessKind, AssignOp, BinaryOp, Ident, ParseError, ParseErrorKind, UnaryOp};
use crate::lexer::TokenKind;

impl<'ast> Parser<'ast> {
    /// Parse an expression.
    pub fn parse_expr(&mut self) -> Result<Expr<'ast>, ParseError> {
        self.parse_assignment()
    }

    /// Assignment is right associative and requires an assignable target.
    fn parse_assignment(&mut self) -> Result<Expr<'ast>, ParseError> {
        let start = self.peek().span;
        let target = self.parse_or()?;
        let Some(op) = AssignOp::from_token(self.peek().kind) else {
            return Ok(target);
        };
        let op_token = self.advance();
        if !target.is_assignable() {
            return Err(ParseError::new(
                ParseErrorKind::InvalidAssignmentTarget,
                op_token.span,
                format!("{} is not assignable", target.describe()),
            ));
        }
        let value = self.parse_assignment()?;
        Ok(Expr::Assign(self.arena.alloc(AssignExpr {
            target,
            op,
            value,
            span: start.merge(self.last().span),
        })))
    }

    fn parse_or(&mut self) -> Result<Expr<'ast>, ParseError> {
        self.parse_left_assoc(Self::parse_and, |kind| {
            (kind == TokenKind::PipePipe).then_some(BinaryOp::Or)
        })
    }

    fn parse_and(&mut self) -> Result<Expr<'ast>, ParseError> {
        self.parse_left_assoc(Self::parse_comparison, |kind| {
            (kind == TokenKind::AmpAmp).then_some(BinaryOp::And)
        })
    }

    fn parse_comparison(&mut self) -> Result<Expr<'ast>, ParseError> {
        self.parse_left_assoc(Self::parse_bit_or, BinaryOp::comparison)
    }

    fn parse_bit_or(&mut self) -> Result<Expr<'ast>, ParseError> {
        self.parse_left_assoc(Self::parse_bit_xor, |kind| {
            (kind == TokenKind::Pipe).then_some(BinaryOp::BitOr)
        })
    }

    fn parse_bit_xor(&mut self) -> Result<Expr<'ast>, ParseError> {
        self.parse_left_assoc(Self::parse_bit_and, |kind| {
            (kind == TokenKind::Caret).then_some(BinaryOp::BitXor)
        })
    }

    fn parse_bit_and(&mut self) -> Result<Expr<'ast>, ParseError> {
        self.parse_left_assoc(Self::parse_shift, |kind| {
            (kind == TokenKind::Amp).then_some(BinaryOp::BitAnd)
        })
    }

    fn parse_shift(&mut self) -> Result<Expr<'ast>, ParseError> {
        self.parse_left_assoc(Self::parse_term, BinaryOp::shift)
    }

    fn parse_term(&mut self) -> Result<Expr<'ast>, ParseError> {
        self.parse_left_assoc(Self::parse_factor, BinaryOp::term)
    }

    fn parse_factor(&mut self) -> Result<Expr<'ast>, ParseError> {
        self.parse_left_assoc(Self::parse_unary, BinaryOp::factor)
    }

    /// One left associative precedence level.
    fn parse_left_assoc(
        &mut self,
        operand: fn(&mut Self) -> Result<Expr<'ast>, ParseError>,
        operator: fn(TokenKind) -> Option<BinaryOp>,
    ) -> Result<Expr<'ast>, ParseError> {
        let start = self.peek().span;
        let mut left = operand(self)?;
        while let Some(op) = operator(self.peek().kind) {
            self.advance();
            let right = operand(self)?;
            left = Expr::Binary(self.arena.alloc(BinaryExpr {
                left,
                op,
                right,
                span: start.merge(self.last().span),
            }));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr<'ast>, ParseError> {
        let Some(op) = UnaryOp::from_token(self.peek().kind) else {
            return self.parse_call();
        };
        let start = self.advance().span;
        let operand = self.parse_unary()?;
        Ok(Expr::Unary(self.arena.alloc(UnaryExpr {
            op,
            operand,
            span: start.merge(self.last().span),
        })))
    }

    /// Calls and member accesses chain left to right.
    fn parse_call(&mut self) -> Result<Expr<'ast>, ParseError> {
        let start = self.peek().span;
        let mut target = self.parse_primary()?;
        loop {
            if self.eat(TokenKind::LeftParen).is_some() {
                target = self.finish_call(start, target)?;
            } else if let Some(kind) = AccessKind::from_token(self.peek().kind) {
                self.advance();
                let member = self.expect(TokenKind::Identifier)?;
                target = Expr::Access(self.arena.alloc(AccessExpr {
                    object: target,
                    member: Ident::new(member.lexeme, member.span),
                    kind,
                    span: start.merge(member.span),
                }));
            } else {
                return Ok(target);
            }
        }
    }

    fn finish_call(&mut self, start: Span, callee: Expr<'ast>) -> Result<Expr<'ast>, ParseError> {
        let mut args = BVec::new_in(self.arena);
        if self.eat(TokenKind::RightParen).is_none() {
            loop {
                args.push(self.parse_expr()?);
                if self.eat(TokenKind::RightParen).is_some() {
                    break;
                }
                self.expect(TokenKind::Comma)?;
            }
        }
        if args.len() > MAX_CALL_ARGS {
            return Err(ParseError::new(
                ParseErrorKind::TooManyArguments,
                self.last().span,
                format!(
                    "Maximum number of args is {MAX_CALL_ARGS}. {} were passed",
                    args.len()
                ),
            ));
        }
        Ok(Expr::Call(self.arena.alloc(CallExpr {
            callee,
            args: args.into_bump_slice(),
            span: start.merge(self.last().span),
        })))
    }

    fn parse_primary(&mut self) -> Result<Expr<'ast>, ParseError> {
        let token = self.advance();
        let kind = match token.kind {
            TokenKind::True => LiteralKind::Bool(true),
            TokenKind::False => LiteralKind::Bool(false),
            TokenKind::Null => LiteralKind::Null,
            TokenKind::Identifier => {
                return Ok(Expr::Ident(Ident::new(token.lexeme, token.span)));
            }
            TokenKind::StringLiteral => LiteralKind::String(token.lexeme),
            TokenKind::IntLiteral => LiteralKind::Number(NumberLiteral::Int(
                token.lexeme.parse().map_err(|_| invalid_number(token.span))?,
            )),
            TokenKind::LongLiteral => LiteralKind::Number(NumberLiteral::Long(
                token.lexeme.parse().map_err(|_| invalid_number(token.span))?,
            )),
            TokenKind::DoubleLiteral => LiteralKind::Number(NumberLiteral::Double(
                token.lexeme.parse().map_err(|_| invalid_number(token.span))?,
            )),
            TokenKind::BigIntLiteral => LiteralKind::Number(NumberLiteral::BigInt(token.lexeme)),
            TokenKind::LeftParen => {
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RightParen)?;
                return Ok(inner);
            }
            _ => {
                return Err(ParseError::expected_expression(token.span, &token.pretty()));
            }
        };
        Ok(Expr::Literal(LiteralExpr {
            kind,
            span: token.span,
        }))
    }
}

fn invalid_number(span: Span) -> ParseError {
    ParseError::new(ParseErrorKind::Lexical, span, "Invalid number")
}
