//! Expression lowering.
//!
//! Every expression leaves exactly one value on the stack, including the
//! placeholder pushed for an expression that failed to compile.

use glang_core::{BinaryOperator, MAX_FIXED_ARITY};
use glang_parser::ast::{
    AccessExpr, AccessKind, AssignExpr, AssignOp, BinaryExpr, CallExpr, Expr, Ident, LiteralKind,
    NumberLiteral, UnaryExpr, UnaryOp,
};

use crate::bytecode::{Constant, OpCode};

use super::CodeGenerator;

impl CodeGenerator<'_> {
    /// Compile an expression.
    pub(super) fn compile_expr(&mut self, expr: &Expr<'_>) {
        self.set_line(expr.span());

        match expr {
            Expr::Literal(literal) => match literal.kind {
                LiteralKind::Bool(value) => self.emitter.emit_bool(value),
                LiteralKind::Null => self.emitter.emit_null(),
                LiteralKind::String(value) => self.emitter.emit_string(value),
                LiteralKind::Number(number) => self.compile_number(number),
            },
            Expr::Ident(ident) => self.compile_identifier(ident),
            Expr::Binary(binary) => self.compile_binary(binary),
            Expr::Unary(unary) => self.compile_unary(unary),
            Expr::Assign(assign) => self.compile_assignment(assign),
            Expr::Call(call) => self.compile_call(call),
            Expr::Access(access) => {
                self.compile_expr(&access.object);
                self.set_line(access.span);
                self.compile_access(access, access.kind);
            }
        }
    }

    fn compile_number(&mut self, number: NumberLiteral<'_>) {
        let constant = match number {
            NumberLiteral::Int(v) => Constant::Int(v),
            NumberLiteral::Long(v) => Constant::Long(v),
            NumberLiteral::Double(v) => Constant::Double(v),
            NumberLiteral::BigInt(digits) => Constant::BigInt(digits.to_string()),
        };
        self.emitter.emit_constant(constant);
    }

    fn compile_identifier(&mut self, ident: &Ident<'_>) {
        match self.scopes.resolve(ident.name) {
            Ok(Some(slot)) => self.emitter.emit_get_local(slot),
            Ok(None) => self.emitter.emit_name(OpCode::GetGlobal, ident.name),
            Err(e) => {
                self.scope_error(ident.span, e);
                self.emitter.emit_null();
            }
        }
    }

    fn compile_binary(&mut self, binary: &BinaryExpr<'_>) {
        self.compile_expr(&binary.left);
        self.compile_expr(&binary.right);
        self.set_line(binary.span);

        match BinaryOperator::from_symbol(binary.op.as_str()) {
            Some(op) => self.emitter.emit_name(OpCode::BinaryOp, op.method_name()),
            None => {
                self.error(
                    binary.span,
                    format!("Binary operator '{}' not implemented", binary.op),
                );
                // the left operand stays behind as the placeholder
                self.emitter.emit(OpCode::Pop);
            }
        }
    }

    fn compile_unary(&mut self, unary: &UnaryExpr<'_>) {
        if unary.op == UnaryOp::Negate {
            if let Expr::Literal(literal) = unary.operand {
                if let LiteralKind::Number(number) = literal.kind {
                    self.set_line(unary.span);
                    self.emitter.emit_constant(negate(number));
                    return;
                }
            }
        }

        if unary.op == UnaryOp::Not {
            match unary.operand {
                Expr::Unary(inner) if inner.op == UnaryOp::Not => {
                    self.compile_expr(&inner.operand);
                    self.set_line(unary.span);
                    self.emitter.emit(OpCode::IsTruthy);
                }
                operand => {
                    self.compile_expr(&operand);
                    self.set_line(unary.span);
                    self.emitter.emit(OpCode::IsFalsey);
                }
            }
            return;
        }

        self.error(unary.span, "UnaryExpression not implemented yet");
        self.emitter.emit_null();
    }

    fn compile_assignment(&mut self, assign: &AssignExpr<'_>) {
        if assign.op != AssignOp::Assign {
            self.error(
                assign.span,
                "Only = is supported for AssignmentExpression currently",
            );
            self.compile_expr(&assign.value);
            return;
        }

        match assign.target {
            Expr::Ident(ident) => match self.scopes.resolve_for_write(ident.name) {
                Ok(Some(slot)) => {
                    self.compile_expr(&assign.value);
                    self.set_line(assign.span);
                    self.emitter.emit(OpCode::Dup);
                    self.emitter.emit_set_local(slot);
                }
                Ok(None) => {
                    self.compile_expr(&assign.value);
                    self.set_line(assign.span);
                    self.emitter.emit_name(OpCode::PutGlobal, ident.name);
                }
                Err(e) => {
                    self.scope_error(ident.span, e);
                    self.compile_expr(&assign.value);
                }
            },
            Expr::Access(access) => {
                self.compile_expr(&access.object);
                self.compile_expr(&assign.value);
                self.set_line(assign.span);
                if access.kind.is_method() {
                    self.error(access.span, "Cannot assign to method access");
                    self.emitter.emit(OpCode::Swap);
                    self.emitter.emit(OpCode::Pop);
                } else {
                    self.emitter.emit_name(OpCode::SetField, access.member.name);
                }
            }
            other => {
                self.error(
                    assign.span,
                    format!("AssignmentExpression to {} not supported", other.describe()),
                );
                self.compile_expr(&assign.value);
            }
        }
    }

    /// Emit the member lookup for `access` on the receiver already on the stack.
    fn compile_access(&mut self, access: &AccessExpr<'_>, kind: AccessKind) {
        let op = match kind {
            // Plain and direct field access coincide until properties exist
            AccessKind::Simple | AccessKind::Direct => OpCode::GetField,
            AccessKind::Method => OpCode::GetMethod,
            AccessKind::DirectMethod => OpCode::GetDirectMethod,
        };
        self.emitter.emit_name(op, access.member.name);
    }

    /// Compile a call.
    ///
    /// A member callee is looked up method-style and the receiver becomes the
    /// first argument: `recv Dup GetMethod Swap args...`. Up to
    /// [`MAX_FIXED_ARITY`] arguments use `Invoke`; more are packed into an
    /// array for `InvokeArray`.
    fn compile_call(&mut self, call: &CallExpr<'_>) {
        let mut arg_count = call.args.len();
        match call.callee {
            Expr::Access(access) => {
                self.compile_expr(&access.object);
                self.set_line(call.span);
                self.emitter.emit(OpCode::Dup);
                self.compile_access(access, access.kind.to_method_access());
                self.emitter.emit(OpCode::Swap);
                arg_count += 1;
            }
            callee => self.compile_expr(&callee),
        }

        for arg in call.args {
            self.compile_expr(arg);
        }

        self.set_line(call.span);
        match u8::try_from(arg_count) {
            Ok(count) if arg_count <= MAX_FIXED_ARITY => self.emitter.emit_invoke(count),
            _ => {
                // arg_count never exceeds the 255-argument limit plus a receiver
                self.emitter.emit_new_array(arg_count as u16);
                self.emitter.emit(OpCode::InvokeArray);
            }
        }
    }
}

/// Fold a negation into a numeric literal.
fn negate(number: NumberLiteral<'_>) -> Constant {
    match number {
        NumberLiteral::Int(v) => Constant::Int(v.wrapping_neg()),
        NumberLiteral::Long(v) => Constant::Long(v.wrapping_neg()),
        NumberLiteral::Double(v) => Constant::Double(-v),
        NumberLiteral::BigInt(digits) => Constant::BigInt(match digits.strip_prefix('-') {
            Some(positive) => positive.to_string(),
            None => format!("-{digits}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use crate::bytecode::{CodeUnit, Constant, OpCode};
    use crate::codegen::{CompileOptions, compile_unit};
    use bumpalo::Bump;
    use glang_core::CompileErrors;
    use glang_parser::Parser;

    fn compile(source: &str) -> (CodeUnit, CompileErrors) {
        let arena = Bump::new();
        let script = Parser::parse(source, &arena).expect("parse failed");
        let mut units: Vec<CodeUnit> = Vec::new();
        let errors = compile_unit("test", &script, &mut units, &CompileOptions::default());
        (units.remove(0), errors)
    }

    fn reasons(errors: &CompileErrors) -> Vec<String> {
        errors.iter().map(|e| e.reason.clone()).collect()
    }

    #[test]
    fn literals() {
        let (unit, errors) = compile("true; false; null; \"s\"");
        assert!(errors.is_empty());
        unit.entry().unwrap().chunk.assert_opcodes(&[
            OpCode::PushTrue,
            OpCode::Pop,
            OpCode::PushFalse,
            OpCode::Pop,
            OpCode::PushNull,
            OpCode::Pop,
            OpCode::Constant,
            OpCode::Pop,
            OpCode::Return,
        ]);
    }

    #[test]
    fn repeated_literal_shares_constant() {
        let (unit, _) = compile("7; 7; 7");
        assert_eq!(unit.constants.len(), 1);
        assert_eq!(unit.constants.get(0), Some(&Constant::Int(7)));
    }

    #[test]
    fn negation_folds_into_literals() {
        let (unit, errors) = compile("-5; -2.5; -3000000000; -99999999999999999999");
        assert!(errors.is_empty());
        let constants = unit.constants.constants();
        assert_eq!(constants[0], Constant::Int(-5));
        assert_eq!(constants[1], Constant::Double(-2.5));
        assert_eq!(constants[2], Constant::Long(-3_000_000_000));
        assert_eq!(constants[3], Constant::BigInt("-99999999999999999999".into()));
        assert!(!unit.entry().unwrap().chunk.opcodes().contains(&OpCode::BinaryOp));
    }

    #[test]
    fn negated_minimum_literals_keep_the_wider_type() {
        let (unit, errors) = compile("-2147483648; -9223372036854775808");
        assert!(errors.is_empty());
        let constants = unit.constants.constants();
        assert_eq!(constants[0], Constant::Long(-2_147_483_648));
        assert_eq!(constants[1], Constant::BigInt("-9223372036854775808".into()));
    }

    #[test]
    fn not_and_double_not() {
        let (unit, _) = compile("!x; !!x");
        unit.entry().unwrap().chunk.assert_opcodes(&[
            OpCode::GetGlobal,
            OpCode::IsFalsey,
            OpCode::Pop,
            OpCode::GetGlobal,
            OpCode::IsTruthy,
            OpCode::Pop,
            OpCode::Return,
        ]);
    }

    #[test]
    fn unsupported_unary_pushes_placeholder() {
        let (unit, errors) = compile("~x");
        assert_eq!(reasons(&errors), ["UnaryExpression not implemented yet"]);
        unit.entry()
            .unwrap()
            .chunk
            .assert_opcodes(&[OpCode::PushNull, OpCode::Pop, OpCode::Return]);
    }

    #[test]
    fn binary_operators_dispatch_by_name() {
        let (unit, errors) = compile("a <= b");
        assert!(errors.is_empty());
        let names: Vec<_> = unit
            .constants
            .constants()
            .iter()
            .filter_map(|c| c.as_str())
            .collect();
        assert_eq!(names, ["a", "b", "lessThanEqual"]);
    }

    #[test]
    fn unimplemented_binary_operator() {
        let (unit, errors) = compile("a << b");
        assert_eq!(reasons(&errors), ["Binary operator '<<' not implemented"]);
        unit.entry().unwrap().chunk.assert_opcodes(&[
            OpCode::GetGlobal,
            OpCode::GetGlobal,
            OpCode::Pop,
            OpCode::Pop,
            OpCode::Return,
        ]);
    }

    #[test]
    fn local_assignment_marks_mutable_and_keeps_value() {
        let (unit, errors) = compile("var x = 1\nx = 2\nx");
        assert!(errors.is_empty());
        unit.entry().unwrap().chunk.assert_opcodes(&[
            OpCode::Bootstrap,
            OpCode::SetLocal,
            OpCode::Bootstrap,
            OpCode::Dup,
            OpCode::SetLocal,
            OpCode::Pop,
            OpCode::GetLocal,
            OpCode::Pop,
            OpCode::Return,
        ]);
    }

    #[test]
    fn global_assignment() {
        let (unit, _) = compile("y = 2");
        unit.entry().unwrap().chunk.assert_opcodes(&[
            OpCode::Bootstrap,
            OpCode::PutGlobal,
            OpCode::Pop,
            OpCode::Return,
        ]);
    }

    #[test]
    fn field_assignment() {
        let (unit, errors) = compile("a.b = 1");
        assert!(errors.is_empty());
        unit.entry().unwrap().chunk.assert_opcodes(&[
            OpCode::GetGlobal,
            OpCode::Bootstrap,
            OpCode::SetField,
            OpCode::Pop,
            OpCode::Return,
        ]);
    }

    #[test]
    fn assignment_errors() {
        let (_, errors) = compile("x += 1\na::b = 1");
        assert_eq!(
            reasons(&errors),
            [
                "Only = is supported for AssignmentExpression currently",
                "Cannot assign to method access",
            ]
        );
    }

    #[test]
    fn member_access_variants() {
        let (unit, _) = compile("a.b; a.!b; a::b; a::!b");
        let ops = unit.entry().unwrap().chunk.opcodes();
        let access: Vec<_> = ops
            .into_iter()
            .filter(|op| {
                matches!(
                    op,
                    OpCode::GetField | OpCode::GetMethod | OpCode::GetDirectMethod
                )
            })
            .collect();
        assert_eq!(
            access,
            [
                OpCode::GetField,
                OpCode::GetField,
                OpCode::GetMethod,
                OpCode::GetDirectMethod,
            ]
        );
    }

    #[test]
    fn method_call_prepends_receiver() {
        let (unit, _) = compile("a.b(1)");
        let chunk = &unit.entry().unwrap().chunk;
        chunk.assert_opcodes(&[
            OpCode::GetGlobal,
            OpCode::Dup,
            OpCode::GetMethod,
            OpCode::Swap,
            OpCode::Bootstrap,
            OpCode::Invoke,
            OpCode::Pop,
            OpCode::Return,
        ]);
        // operand of the Invoke, ahead of the trailing Pop and Return
        assert_eq!(chunk.read_byte(chunk.len() - 3), Some(2));
    }

    #[test]
    fn direct_method_call() {
        let (unit, _) = compile("a.!b()");
        unit.entry()
            .unwrap()
            .chunk
            .assert_contains_opcodes(&[OpCode::Dup, OpCode::GetDirectMethod, OpCode::Swap]);
    }

    #[test]
    fn fixed_arity_threshold() {
        let args16 = vec!["1"; 16].join(", ");
        let (unit, _) = compile(&format!("f({args16})"));
        let chunk = &unit.entry().unwrap().chunk;
        assert!(chunk.opcodes().contains(&OpCode::Invoke));
        assert!(!chunk.opcodes().contains(&OpCode::InvokeArray));

        let args17 = vec!["1"; 17].join(", ");
        let (unit, _) = compile(&format!("f({args17})"));
        unit.entry()
            .unwrap()
            .chunk
            .assert_contains_opcodes(&[OpCode::NewArray, OpCode::InvokeArray]);
    }

    #[test]
    fn method_call_receiver_counts_towards_threshold() {
        let args16 = vec!["1"; 16].join(", ");
        let (unit, _) = compile(&format!("a.f({args16})"));
        let chunk = &unit.entry().unwrap().chunk;
        chunk.assert_contains_opcodes(&[OpCode::NewArray, OpCode::InvokeArray]);
        // GetGlobal Dup GetMethod Swap, then sixteen Bootstrap loads
        let new_array = 3 + 1 + 3 + 1 + 16 * 3;
        assert_eq!(chunk.read_byte(new_array), Some(u8::from(OpCode::NewArray)));
        assert_eq!(chunk.read_u16(new_array + 1), Some(17));
    }

    #[test]
    fn unknown_identifier_is_global_lookup() {
        let (unit, errors) = compile("undefinedFn()");
        assert!(errors.is_empty());
        unit.entry().unwrap().chunk.assert_opcodes(&[
            OpCode::GetGlobal,
            OpCode::Invoke,
            OpCode::Pop,
            OpCode::Return,
        ]);
    }
}
