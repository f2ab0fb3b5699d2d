//! Statement lowering.
//!
//! Conditional and loop layout:
//!
//! ```text
//! if:                         while:
//!   [condition]                 start:
//!   JumpIfFalsy -> else           [condition]
//!   [then]                        JumpIfFalsy -> exit
//!   Jump -> end                   [body]
//! else:                           Loop -> start
//!   [else]                      exit:
//! end:                            [else]
//!                               (breaks land here)
//! ```
//!
//! A leading `!` on a condition is dropped and the jump sense inverted.

use glang_core::Span;
use glang_parser::ast::{
    Block, Expr, IfStmt, ImportStmt, Stmt, UnaryOp, VarDeclStmt, WhileStmt,
};

use crate::bytecode::{JumpTooFar, OpCode};

use super::CodeGenerator;

/// Size of a `SetLocal` instruction, used to start a lifetime after its store.
const SET_LOCAL_SIZE: usize = 3;

impl CodeGenerator<'_> {
    /// Compile a statement.
    pub(super) fn compile_stmt(&mut self, stmt: &Stmt<'_>) {
        self.set_line(stmt.span());

        match stmt {
            Stmt::Expr(expr_stmt) => {
                if self.debug_prints {
                    let span = expr_stmt.span;
                    self.compile_expr(&expr_stmt.expr);
                    self.set_line(span);
                    let prefix = format!("[DEBUG {}:{}] ", span.line, span.col);
                    self.emitter.emit_name(OpCode::DebugPrint, &prefix);
                } else {
                    self.compile_expr(&expr_stmt.expr);
                    self.set_line(expr_stmt.span);
                    self.emitter.emit(OpCode::Pop);
                }
            }
            Stmt::Block(block) => self.compile_block(block),
            Stmt::VarDecl(decl) => self.compile_var_decl(decl),
            Stmt::Import(import) => self.compile_import(import),
            Stmt::If(if_stmt) => self.compile_if(if_stmt),
            Stmt::While(while_stmt) => self.compile_while(while_stmt),
            Stmt::Break(brk) => match self.jumps.check_jump(self.procedure) {
                Ok(()) => {
                    let label = self.emitter.emit_jump(OpCode::Jump);
                    if let Err(e) = self.jumps.add_break(label, self.procedure) {
                        self.error(brk.span, e.to_string());
                    }
                }
                Err(e) => self.error(brk.span, e.to_string()),
            },
            Stmt::Continue(cont) => match self.jumps.continue_target(self.procedure) {
                Ok(target) => {
                    let looped = self.emitter.emit_loop(target);
                    self.check_jumps(cont.span, looped);
                }
                Err(e) => self.error(cont.span, e.to_string()),
            },
        }
    }

    fn compile_block(&mut self, block: &Block<'_>) {
        self.scopes.open();
        for stmt in block.stmts {
            self.compile_stmt(stmt);
        }
        self.scopes.close(self.emitter.current_offset());
    }

    fn compile_var_decl(&mut self, decl: &VarDeclStmt<'_>) {
        let name = decl.name.name;
        let existing = self.scopes.declared_in_current(name);
        if existing.is_some() {
            self.error(decl.span, format!("Duplicate local variable {name}"));
        }

        match &decl.init {
            Some(init) => self.compile_expr(init),
            None => {
                self.set_line(decl.span);
                self.emitter.emit_null();
            }
        }
        self.set_line(decl.span);

        let slot = match existing {
            Some(slot) => Some(slot),
            None => {
                let start = self.emitter.current_offset() + SET_LOCAL_SIZE;
                match self.scopes.declare(name, decl.name.span, start) {
                    Ok(slot) => Some(slot),
                    Err(e) => {
                        self.scope_error(decl.span, e);
                        None
                    }
                }
            }
        };
        match slot {
            Some(slot) => self.emitter.emit_set_local(slot),
            None => self.emitter.emit(OpCode::Pop),
        }
    }

    fn compile_import(&mut self, import: &ImportStmt<'_>) {
        let path: Vec<String> = import.path.iter().map(|p| p.name.to_string()).collect();

        let Some(target) = import.target else {
            if !self.scopes.is_top_level() {
                self.error(import.span, "Star import only allowed at top-level");
            }
            self.emitter.emit_import(path, None);
            return;
        };

        self.emitter.emit_import(path, Some(target.name.to_string()));
        if self.scopes.is_top_level() {
            self.emitter.emit_name(OpCode::PutGlobal, target.name);
            self.emitter.emit(OpCode::Pop);
            return;
        }

        let slot = match self.scopes.declared_in_current(target.name) {
            Some(slot) => Ok(slot),
            None => {
                let start = self.emitter.current_offset() + SET_LOCAL_SIZE;
                self.scopes.declare(target.name, target.span, start)
            }
        };
        match slot {
            Ok(slot) => self.emitter.emit_set_local(slot),
            Err(e) => {
                self.scope_error(import.span, e);
                self.emitter.emit(OpCode::Pop);
            }
        }
    }

    fn compile_if(&mut self, if_stmt: &IfStmt<'_>) {
        let else_jump = self.compile_condition(&if_stmt.condition);

        self.compile_body(&if_stmt.then_stmt, "if");

        let patched = match &if_stmt.else_stmt {
            Some(else_stmt) => {
                let end_jump = self.emitter.emit_jump(OpCode::Jump);
                let to_else = self.emitter.patch_jump(else_jump);
                self.compile_body(else_stmt, "else");
                to_else.and(self.emitter.patch_jump(end_jump))
            }
            None => self.emitter.patch_jump(else_jump),
        };
        self.check_jumps(if_stmt.span, patched);
    }

    fn compile_while(&mut self, while_stmt: &WhileStmt<'_>) {
        let loop_start = self.emitter.current_offset();
        self.jumps.enter_loop(loop_start, self.procedure);

        let exit_jump = self.compile_condition(&while_stmt.condition);
        self.compile_body(&while_stmt.body, "while");
        self.set_line(while_stmt.span);
        let mut patched = self.emitter.emit_loop(loop_start);
        patched = patched.and(self.emitter.patch_jump(exit_jump));

        // the else body is outside the loop: its break/continue target an outer loop
        let breaks = self.jumps.exit_loop();
        if let Some(else_stmt) = &while_stmt.else_stmt {
            self.compile_body(else_stmt, "else");
        }
        for label in breaks {
            patched = patched.and(self.emitter.patch_jump(label));
        }
        self.check_jumps(while_stmt.span, patched);
    }

    /// Report the first jump of a statement that outgrew its operand.
    fn check_jumps(&mut self, span: Span, result: Result<(), JumpTooFar>) {
        if let Err(e) = result {
            self.error(span, e.to_string());
        }
    }

    /// Compile a condition and a forward jump taken when it does not hold.
    fn compile_condition(&mut self, condition: &Expr<'_>) -> crate::emit::JumpLabel {
        let (condition, negated) = match condition {
            Expr::Unary(unary) if unary.op == UnaryOp::Not => (&unary.operand, true),
            other => (other, false),
        };
        self.compile_expr(condition);
        self.set_line(condition.span());
        self.emitter.emit_jump(if negated {
            OpCode::JumpIfTruthy
        } else {
            OpCode::JumpIfFalsy
        })
    }

    /// Compile a conditional or loop body, rejecting declarations and imports.
    fn compile_body(&mut self, body: &Stmt<'_>, position: &str) {
        if body.is_blocked_body() {
            self.error(body.span(), format!("Statement not allowed in {position} body"));
        } else {
            self.compile_stmt(body);
        }
    }
}
