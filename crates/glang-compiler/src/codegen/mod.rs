//! Code generator for glang.
//!
//! The [`CodeGenerator`] walks a parsed [`Script`] and emits the bytecode of
//! its entry procedure. Every dynamic operation is lowered to a single
//! instruction that hands its operands to the dispatch runtime, so the
//! generator only tracks what is static: local slots, scope nesting, the
//! mutability of each variable, and control flow.
//!
//! Errors never stop the walk. A node that cannot be compiled is reported
//! and replaced by a placeholder null, so one pass yields every independent
//! diagnostic.
//!
//! - [`stmt`](self) - statement lowering (`stmt.rs`)
//! - [`expr`](self) - expression lowering (`expr.rs`)

mod expr;
mod stmt;

use glang_core::abi::ENTRY_PROCEDURE;
use glang_core::{CompileErrors, Span, type_name_for};
use glang_parser::Script;
use log::{debug, trace};

use crate::bytecode::{ConstantPool, OpCode, Procedure, UnitFactory};
use crate::emit::{BytecodeEmitter, JumpManager};
use crate::scope::{ProcedureId, ScopeError, ScopeTracker};

/// Name of the entry procedure's launch-arguments parameter.
pub const ARGS_PARAM: &str = "args";

/// Options that change what the generator emits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Print every expression statement's position and value to the side
    /// channel instead of discarding the value.
    pub debug_prints: bool,
    /// Display name recorded on the unit.
    pub source_file: Option<String>,
}

impl CompileOptions {
    pub fn with_debug_prints(mut self, enabled: bool) -> Self {
        self.debug_prints = enabled;
        self
    }

    pub fn with_source_file(mut self, name: impl Into<String>) -> Self {
        self.source_file = Some(name.into());
        self
    }
}

/// Compiles one procedure's statements to bytecode.
pub struct CodeGenerator<'pool> {
    emitter: BytecodeEmitter<'pool>,
    scopes: ScopeTracker,
    jumps: JumpManager,
    errors: CompileErrors,
    procedure: ProcedureId,
    debug_prints: bool,
}

impl<'pool> CodeGenerator<'pool> {
    /// Create a generator for the entry procedure, with `args` in slot 0.
    pub fn new(constants: &'pool mut ConstantPool, debug_prints: bool) -> Self {
        let mut scopes = ScopeTracker::new();
        let procedure = scopes.enter_procedure();
        let mut errors = CompileErrors::new();
        if let Err(e) = scopes.declare_param(ARGS_PARAM, Span::default()) {
            errors.report(Span::default(), e.to_string());
        }
        Self {
            emitter: BytecodeEmitter::new(constants),
            scopes,
            jumps: JumpManager::new(),
            errors,
            procedure,
            debug_prints,
        }
    }

    /// Compile the top-level statements and close the entry procedure.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile_script(mut self, script: &Script<'_>) -> (Procedure, CompileErrors) {
        for stmt in script.statements() {
            self.compile_stmt(stmt);
        }
        self.emitter.emit(OpCode::Return);
        self.finish(script.span())
    }

    fn finish(mut self, span: Span) -> (Procedure, CompileErrors) {
        let end = self.emitter.current_offset();
        let closed = self.scopes.exit_procedure(end);
        if self.jumps.in_loop() {
            self.errors.report(span, "Loop stack was not fully popped!");
        }
        if self.emitter.pool_overflowed() {
            self.errors.report(span, "Too many constants in unit");
        }

        let mut procedure = Procedure::new(ENTRY_PROCEDURE);
        procedure.param_count = 1;
        if let Some(closed) = closed {
            procedure.max_locals = closed.max_locals;
            procedure.locals = closed.locals;
        }
        procedure.chunk = self.emitter.finish();
        trace!(
            "compiled {} ({} bytes, {} locals)",
            procedure.name,
            procedure.chunk.len(),
            procedure.max_locals
        );
        (procedure, self.errors)
    }

    /// Record a diagnostic; compilation continues.
    fn error(&mut self, span: Span, reason: impl Into<String>) {
        let reason = reason.into();
        debug!("compile error at {span}: {reason}");
        self.errors.report(span, reason);
    }

    fn scope_error(&mut self, span: Span, error: ScopeError) {
        self.error(span, error.to_string());
    }

    fn set_line(&mut self, span: Span) {
        self.emitter.set_line(span.line);
    }
}

/// Compile `script` as the unit for `namespace`, writing its output into the
/// unit `factory` hands out for the generated type name.
///
/// The returned collection holds every diagnostic; when it is non-empty the
/// unit must not be used.
pub fn compile_unit<F>(
    namespace: &str,
    script: &Script<'_>,
    factory: &mut F,
    options: &CompileOptions,
) -> CompileErrors
where
    F: UnitFactory + ?Sized,
{
    let type_name = type_name_for(namespace);
    debug!("compiling {namespace} as {type_name}");

    let unit = factory.unit(&type_name);
    unit.source_file = options.source_file.clone();
    let mut constants = std::mem::take(&mut unit.constants);
    let (procedure, errors) =
        CodeGenerator::new(&mut constants, options.debug_prints).compile_script(script);
    unit.constants = constants;
    unit.procedures.retain(|p| p.name != procedure.name);
    unit.procedures.push(procedure);
    errors
}
