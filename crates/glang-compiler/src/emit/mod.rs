//! Bytecode emitter for the glang compiler.
//!
//! The [`BytecodeEmitter`] provides a high-level API for generating the
//! bytecode of one procedure, handling constants and jumps.
//!
//! # Example
//!
//! ```
//! use glang_compiler::bytecode::{ConstantPool, OpCode};
//! use glang_compiler::emit::BytecodeEmitter;
//!
//! let mut constants = ConstantPool::new();
//! let mut emitter = BytecodeEmitter::new(&mut constants);
//!
//! emitter.set_line(1);
//! emitter.emit_name(OpCode::GetGlobal, "println");
//! emitter.emit_string("hello");
//! emitter.emit_invoke(1);
//! emitter.emit(OpCode::Pop);
//!
//! let chunk = emitter.finish();
//! assert_eq!(chunk.opcodes().len(), 4);
//! ```

mod jumps;

pub use jumps::{JumpError, JumpManager};

use crate::bytecode::{BytecodeChunk, Constant, ConstantPool, JumpTooFar, OpCode};

/// Emits bytecode instructions.
///
/// Uses a shared unit-level constant pool for deduplication across procedures.
/// Each `BytecodeEmitter` produces bytecode for a single procedure.
pub struct BytecodeEmitter<'pool> {
    /// The bytecode chunk being built (per-procedure)
    chunk: BytecodeChunk,

    /// Shared unit-level constant pool (deduplicated)
    constants: &'pool mut ConstantPool,

    /// Current source line for debug info
    current_line: u32,

    /// Set once a constant index no longer fits an operand.
    pool_overflow: bool,
}

impl<'pool> BytecodeEmitter<'pool> {
    pub fn new(constants: &'pool mut ConstantPool) -> Self {
        Self {
            chunk: BytecodeChunk::new(),
            constants,
            current_line: 1,
            pool_overflow: false,
        }
    }

    /// Set current source line for debug info.
    ///
    /// All subsequent instructions will be associated with this line number.
    pub fn set_line(&mut self, line: u32) {
        self.current_line = line;
    }

    pub fn current_line(&self) -> u32 {
        self.current_line
    }

    // ==========================================================================
    // Basic Emission
    // ==========================================================================

    /// Emit a single opcode with no operands.
    pub fn emit(&mut self, op: OpCode) {
        self.chunk.write_op(op, self.current_line);
    }

    /// Emit opcode with 8-bit operand.
    pub fn emit_byte(&mut self, op: OpCode, byte: u8) {
        self.chunk.write_op(op, self.current_line);
        self.chunk.write_byte(byte, self.current_line);
    }

    /// Emit opcode with 16-bit operand.
    pub fn emit_u16(&mut self, op: OpCode, value: u16) {
        self.chunk.write_op(op, self.current_line);
        self.chunk.write_u16(value, self.current_line);
    }

    fn constant_index(&mut self, constant: Constant) -> u16 {
        let index = self.constants.add(constant);
        match u16::try_from(index) {
            Ok(index) => index,
            Err(_) => {
                self.pool_overflow = true;
                0
            }
        }
    }

    /// Whether the unit's constant pool outgrew the operand width.
    pub fn pool_overflowed(&self) -> bool {
        self.pool_overflow
    }

    // ==========================================================================
    // Constants
    // ==========================================================================

    /// Emit a constant load instruction.
    ///
    /// Numeric literals load through their bootstrap so they are
    /// materialized once; everything else is a plain pool load.
    pub fn emit_constant(&mut self, constant: Constant) {
        let op = if constant.is_bootstrapped() {
            OpCode::Bootstrap
        } else {
            OpCode::Constant
        };
        let index = self.constant_index(constant);
        self.emit_u16(op, index);
    }

    pub fn emit_string(&mut self, value: &str) {
        self.emit_constant(Constant::Str(value.to_string()));
    }

    /// Emit an instruction whose operand is a name in the constant pool.
    pub fn emit_name(&mut self, op: OpCode, name: &str) {
        let index = self.constant_index(Constant::Str(name.to_string()));
        self.emit_u16(op, index);
    }

    pub fn emit_null(&mut self) {
        self.emit(OpCode::PushNull);
    }

    pub fn emit_bool(&mut self, value: bool) {
        self.emit(if value {
            OpCode::PushTrue
        } else {
            OpCode::PushFalse
        });
    }

    // ==========================================================================
    // Local Variables
    // ==========================================================================

    pub fn emit_get_local(&mut self, slot: u16) {
        self.emit_u16(OpCode::GetLocal, slot);
    }

    pub fn emit_set_local(&mut self, slot: u16) {
        self.emit_u16(OpCode::SetLocal, slot);
    }

    // ==========================================================================
    // Calls
    // ==========================================================================

    /// Emit a fixed-arity invoke. `arg_count` excludes the invoked target.
    pub fn emit_invoke(&mut self, arg_count: u8) {
        self.emit_byte(OpCode::Invoke, arg_count);
    }

    /// Pack the topmost `count` values into an array.
    pub fn emit_new_array(&mut self, count: u16) {
        self.emit_u16(OpCode::NewArray, count);
    }

    // ==========================================================================
    // Imports
    // ==========================================================================

    /// Emit a qualified import (`target` is `Some`) or a star import.
    pub fn emit_import(&mut self, path: Vec<String>, target: Option<String>) {
        let op = if target.is_some() {
            OpCode::Import
        } else {
            OpCode::ImportStar
        };
        let index = self.constant_index(Constant::Import { path, target });
        self.emit_u16(op, index);
    }

    // ==========================================================================
    // Jumps
    // ==========================================================================

    /// Emit a forward jump to be patched later.
    pub fn emit_jump(&mut self, op: OpCode) -> JumpLabel {
        let offset = self.chunk.emit_jump(op, self.current_line);
        JumpLabel(offset)
    }

    /// Patch a forward jump to target the current position.
    pub fn patch_jump(&mut self, label: JumpLabel) -> Result<(), JumpTooFar> {
        self.chunk.patch_jump(label.0)
    }

    /// Emit a backward jump to `target`.
    pub fn emit_loop(&mut self, target: usize) -> Result<(), JumpTooFar> {
        self.chunk.emit_loop(target, self.current_line)
    }

    /// Get current bytecode offset.
    pub fn current_offset(&self) -> usize {
        self.chunk.current_offset()
    }

    // ==========================================================================
    // Finalization
    // ==========================================================================

    /// Finish emission and return the bytecode chunk.
    pub fn finish(self) -> BytecodeChunk {
        self.chunk
    }
}

/// A label for a forward jump that needs patching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpLabel(pub(crate) usize);

impl JumpLabel {
    /// Get the bytecode offset this label points to.
    pub fn offset(&self) -> usize {
        self.0
    }
}
