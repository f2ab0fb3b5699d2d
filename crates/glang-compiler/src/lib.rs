//! glang compiler.
//!
//! Lowers a parsed glang script to the bytecode of one [`CodeUnit`]. The
//! language is dynamically typed, so the compiler resolves nothing but local
//! variables: every call, member access, operator and global lookup becomes
//! a single instruction whose meaning is decided by the dispatch runtime.
//!
//! ## Modules
//!
//! - [`bytecode`]: Bytecode types (OpCode, BytecodeChunk, ConstantPool, CodeUnit)
//! - [`emit`]: High-level bytecode emitter and loop jump bookkeeping
//! - [`scope`]: Local slots and the variable mutability state machine
//! - [`codegen`]: The statement and expression walker

pub mod bytecode;
pub mod codegen;
pub mod emit;
pub mod scope;

pub use bytecode::{BytecodeChunk, CodeUnit, Constant, ConstantPool, OpCode, Procedure, UnitFactory};
pub use codegen::{CodeGenerator, CompileOptions, compile_unit};
pub use emit::{BytecodeEmitter, JumpError, JumpLabel};
pub use scope::{ScopeError, ScopeTracker, VariableState};

pub use glang_core::{CompileError, CompileErrors};

use bumpalo::Bump;
use glang_parser::Parser;
use log::debug;

/// Parse and compile `source` as the unit for `namespace`.
///
/// Parse errors stop before code generation. Every diagnostic carries the
/// source so it renders with its offending line.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn compile_source(
    namespace: &str,
    source: &str,
    options: &CompileOptions,
) -> Result<CodeUnit, CompileErrors> {
    let arena = Bump::new();
    let script =
        Parser::parse(source, &arena).map_err(|e| CompileErrors::from(e).with_source(source))?;

    let mut units: Vec<CodeUnit> = Vec::with_capacity(1);
    let errors = compile_unit(namespace, &script, &mut units, options);
    if !errors.is_empty() {
        debug!("{namespace}: {} compile errors", errors.len());
        return Err(errors.with_source(source));
    }
    units
        .pop()
        .ok_or_else(|| CompileErrors::new().with_source(source))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_a_script() {
        let unit = compile_source("demo", "println(\"hi\")", &CompileOptions::default()).unwrap();
        assert_eq!(unit.type_name, "DemoNs");
        assert!(unit.entry().is_some());
    }

    #[test]
    fn oversized_loop_is_a_diagnostic() {
        let source = format!("var x = 0\nwhile x {{\n{}}}", "x = 1\n".repeat(20_000));
        let errors = compile_source("demo", &source, &CompileOptions::default()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors.to_string().contains("Too much code to jump over"));
    }

    #[test]
    fn parse_errors_skip_codegen() {
        let errors = compile_source("demo", "var = 1", &CompileOptions::default()).unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn codegen_errors_are_aggregated() {
        let errors = compile_source("demo", "break\ncontinue", &CompileOptions::default())
            .unwrap_err();
        assert_eq!(errors.len(), 2);
        let rendered = errors.to_string();
        assert!(rendered.contains("Not in a loop"));
    }
}
