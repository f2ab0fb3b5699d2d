//! Statement parsing functions for glang.
//!
//! Implements parsing of blocks, declarations, imports, conditionals and
//! loops. Each statement either parses completely or is dropped after its
//! error is recorded and the parser has skipped to the next boundary.

use bumpalo::collections::Vec as BVec;

use super::parser::Parser;
use crate::ast::stmt::*;
use crate::ast::{Ident, ParseError, ParseErrorKind};
use crate::lexer::TokenKind;

impl<'ast> Parser<'ast> {
    /// Parse statements until `end` (not consumed) or EOF.
    pub fn parse_statement_list(&mut self, end: TokenKind) -> &'ast [Stmt<'ast>] {
        let mut stmts = BVec::new_in(self.arena);
        while !self.check(end) && !self.is_eof() {
            if let Some(stmt) = self.parse_statement() {
                stmts.push(stmt);
            }
        }
        stmts.into_bump_slice()
    }

    /// Parse one statement, recovering from errors.
    ///
    /// Returns `None` when the statement was invalid; its error has been
    /// recorded and the parser sits at the next statement boundary.
    pub fn parse_statement(&mut self) -> Option<Stmt<'ast>> {
        match self.parse_statement_inner() {
            Ok(stmt) => Some(stmt),
            Err(error) => {
                self.record(error);
                self.synchronize();
                None
            }
        }
    }

    fn parse_statement_inner(&mut self) -> Result<Stmt<'ast>, ParseError> {
        match self.peek().kind {
            TokenKind::LeftBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::Import => self.parse_import(),
            TokenKind::Var => self.parse_var_decl(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::Break => {
                let span = self.advance().span;
                self.end_of_statement();
                Ok(Stmt::Break(BreakStmt { span }))
            }
            TokenKind::Continue => {
                let span = self.advance().span;
                self.end_of_statement();
                Ok(Stmt::Continue(ContinueStmt { span }))
            }
            _ => self.parse_expr_stmt(),
        }
    }

    /// Parse a block.
    ///
    /// Grammar: `'{' STATEMENT* '}'`
    pub fn parse_block(&mut self) -> Result<Block<'ast>, ParseError> {
        let start = self.expect(TokenKind::LeftBrace)?.span;
        let stmts = self.parse_statement_list(TokenKind::RightBrace);
        let end = self.expect(TokenKind::RightBrace)?.span;
        Ok(Block {
            stmts,
            span: start.merge(end),
        })
    }

    /// Parse an import.
    ///
    /// Grammar: `'import' IDENTIFIER ('.' (IDENTIFIER | '*'))*`
    fn parse_import(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::Import)?.span;
        let mut segments = BVec::new_in(self.arena);
        let mut star = false;
        loop {
            if self.eat(TokenKind::Star).is_some() {
                star = true;
                break;
            }
            let token = self.expect(TokenKind::Identifier)?;
            segments.push(Ident::new(token.lexeme, token.span));
            if self.eat(TokenKind::Dot).is_none() {
                break;
            }
        }
        let span = start.merge(self.last().span);
        self.end_of_statement();

        let target = if star { None } else { segments.pop() };
        Ok(Stmt::Import(ImportStmt {
            path: segments.into_bump_slice(),
            target,
            span,
        }))
    }

    /// Parse a variable declaration.
    ///
    /// Grammar: `'var' IDENTIFIER ('=' EXPR)?`
    fn parse_var_decl(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::Var)?.span;
        let name_token = self.expect(TokenKind::Identifier)?;
        let name = Ident::new(name_token.lexeme, name_token.span);
        let init = if self.eat(TokenKind::Equal).is_some() {
            Some(self.parse_expr()?)
        } else {
            None
        };
        let span = start.merge(self.last().span);
        self.end_of_statement();
        Ok(Stmt::VarDecl(VarDeclStmt { name, init, span }))
    }

    /// Parse an if statement. The condition needs no parentheses.
    ///
    /// Grammar: `'if' EXPR STATEMENT ('else' STATEMENT)?`
    fn parse_if(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::If)?.span;
        let condition = self.parse_expr()?;
        let then_stmt = self.parse_body();
        let else_stmt = if self.eat(TokenKind::Else).is_some() {
            Some(self.parse_body())
        } else {
            None
        };
        let span = start.merge(self.last().span);
        Ok(Stmt::If(self.arena.alloc(IfStmt {
            condition,
            then_stmt,
            else_stmt,
            span,
        })))
    }

    /// Parse a while loop.
    ///
    /// Grammar: `'while' EXPR STATEMENT ('else' STATEMENT)?`
    fn parse_while(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.expect(TokenKind::While)?.span;
        let condition = self.parse_expr()?;
        let body = self.parse_body();
        let else_stmt = if self.eat(TokenKind::Else).is_some() {
            Some(self.parse_body())
        } else {
            None
        };
        let span = start.merge(self.last().span);
        Ok(Stmt::While(self.arena.alloc(WhileStmt {
            condition,
            body,
            else_stmt,
            span,
        })))
    }

    /// Parse a conditional or loop body. An invalid body becomes an empty
    /// block so the enclosing statement survives.
    fn parse_body(&mut self) -> Stmt<'ast> {
        let fallback = self.peek().span;
        self.parse_statement().unwrap_or(Stmt::Block(Block {
            stmts: &[],
            span: fallback,
        }))
    }

    /// Parse an expression statement.
    fn parse_expr_stmt(&mut self) -> Result<Stmt<'ast>, ParseError> {
        let start = self.peek().span;
        let expr = self.parse_expr()?;
        let span = start.merge(self.last().span);
        self.end_of_statement();
        Ok(Stmt::Expr(ExprStmt { expr, span }))
    }

    /// Consume a statement terminator.
    ///
    /// A statement ends at `;`, before `}` or EOF, or at a line break.
    /// Another token on the same line is reported without aborting.
    pub(super) fn end_of_statement(&mut self) {
        if self.eat(TokenKind::Semicolon).is_some()
            || self.check(TokenKind::RightBrace)
            || self.is_eof()
        {
            return;
        }
        let next = *self.peek();
        if next.span.line == self.last().span.line {
            self.error(
                ParseErrorKind::MissingSemicolon,
                next.span,
                "Multiple statements on one line should be separated with a semicolon",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use bumpalo::Bump;

    fn parse<'a>(source: &str, arena: &'a Bump) -> Script<'a> {
        match Parser::parse(source, arena) {
            Ok(script) => script,
            Err(errors) => panic!("unexpected errors: {errors}"),
        }
    }

    fn messages(source: &str) -> Vec<String> {
        let arena = Bump::new();
        let (_, errors) = Parser::parse_lenient(source, &arena);
        errors.iter().map(|e| e.message.clone()).collect()
    }

    #[test]
    fn var_without_initializer() {
        let arena = Bump::new();
        let script = parse("var x;", &arena);
        match script.statements()[0] {
            Stmt::VarDecl(decl) => {
                assert_eq!(decl.name.name, "x");
                assert!(decl.init.is_none());
            }
            other => panic!("expected declaration, got {other:?}"),
        }
    }

    #[test]
    fn qualified_import() {
        let arena = Bump::new();
        let script = parse("import a.b.c", &arena);
        let Stmt::Import(import) = script.statements()[0] else {
            panic!("expected import");
        };
        let path: Vec<_> = import.path.iter().map(|i| i.name).collect();
        assert_eq!(path, vec!["a", "b"]);
        assert_eq!(import.target.map(|t| t.name), Some("c"));
    }

    #[test]
    fn star_import() {
        let arena = Bump::new();
        let script = parse("import a.b.*;", &arena);
        let Stmt::Import(import) = script.statements()[0] else {
            panic!("expected import");
        };
        assert!(import.is_star());
        assert_eq!(import.path.len(), 2);
    }

    #[test]
    fn if_else_without_parens() {
        let arena = Bump::new();
        let script = parse("if x { y } else z", &arena);
        let Stmt::If(stmt) = script.statements()[0] else {
            panic!("expected if");
        };
        assert!(matches!(stmt.then_stmt, Stmt::Block(_)));
        assert!(matches!(stmt.else_stmt, Some(Stmt::Expr(_))));
    }

    #[test]
    fn while_with_else_and_jumps() {
        let arena = Bump::new();
        let script = parse("while x { break; continue } else y", &arena);
        let Stmt::While(stmt) = script.statements()[0] else {
            panic!("expected while");
        };
        let Stmt::Block(body) = stmt.body else {
            panic!("expected block body");
        };
        assert!(matches!(body.stmts[0], Stmt::Break(_)));
        assert!(matches!(body.stmts[1], Stmt::Continue(_)));
        assert!(stmt.else_stmt.is_some());
    }

    #[test]
    fn same_line_statements_need_semicolon() {
        assert_eq!(
            messages("var x = 1 var y = 2"),
            vec!["Multiple statements on one line should be separated with a semicolon"]
        );
        assert!(messages("var x = 1; var y = 2").is_empty());
        assert!(messages("var x = 1\nvar y = 2").is_empty());
    }

    #[test]
    fn errors_on_separate_statements_are_all_reported() {
        let errors = messages("var = 1;\nimport 5;\nvar 5;\n");
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0], "Expected 'identifier', found '='");
        assert_eq!(errors[1], "Expected 'identifier', found '5'");
    }

    #[test]
    fn missing_close_brace() {
        let errors = messages("{ var x = 1");
        assert_eq!(errors, vec!["Expected '}', found '<<EOF>>'"]);
    }

    #[test]
    fn recovery_inside_block_keeps_block() {
        let arena = Bump::new();
        let (script, errors) = Parser::parse_lenient("{ var = 1; var y = 2 }\nz", &arena);
        assert_eq!(errors.len(), 1);
        assert_eq!(script.statements().len(), 2);
    }
}
