//! Bytecode types for the glang compiler.
//!
//! This module contains the core bytecode types:
//!
//! - [`OpCode`] - The instruction set for the VM
//! - [`BytecodeChunk`] - Compiled bytecode for a procedure
//! - [`Constant`] and [`ConstantPool`] - Unit-level constant storage
//! - [`CodeUnit`] and [`Procedure`] - The output of compiling one source unit

mod chunk;
mod constant;
mod opcode;
mod unit;

pub use chunk::{BytecodeChunk, JumpTooFar};
pub use constant::{Constant, ConstantPool};
pub use opcode::OpCode;
pub use unit::{CodeUnit, LocalVarInfo, Procedure, UnitFactory};
