//! Bytecode operation codes.
//!
//! This module defines the instruction set for the glang VM.
//! Each opcode is a single byte, with operands following inline.
//! Every dynamic operation (operators, member access, calls, imports)
//! is a single instruction handing its operands to the dispatch runtime.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Bytecode operation codes.
///
/// The VM is a stack-based machine. Most operations pop operands
/// from the stack and push results back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
pub enum OpCode {
    // =========================================================================
    // Constants
    // =========================================================================
    /// Push null.
    PushNull = 0,
    /// Push boolean true.
    PushTrue,
    /// Push boolean false.
    PushFalse,
    /// Push a string constant from the pool.
    /// Operand: u16 constant index
    Constant,
    /// Push a numeric constant, materialized once per unit by its bootstrap
    /// procedure and reused afterwards.
    /// Operand: u16 constant index
    Bootstrap,

    // =========================================================================
    // Stack Operations
    // =========================================================================
    /// Pop top of stack.
    Pop,
    /// Duplicate top of stack.
    Dup,
    /// Swap the two topmost values.
    Swap,

    // =========================================================================
    // Variables
    // =========================================================================
    /// Load local variable.
    /// Operand: u16 slot index
    GetLocal,
    /// Store top of stack to a local variable (pops it).
    /// Operand: u16 slot index
    SetLocal,
    /// Load a global by name, falling back to the default imports.
    /// Operand: u16 constant index (name)
    GetGlobal,
    /// Store top of stack to a global, leaving the value on the stack.
    /// Operand: u16 constant index (name)
    PutGlobal,

    // =========================================================================
    // Members
    // =========================================================================
    /// Pop a receiver and push the named field.
    /// Operand: u16 constant index (member name)
    GetField,
    /// Pop value and receiver, set the field, push the value.
    /// Operand: u16 constant index (member name)
    SetField,
    /// Pop a receiver and push its extension-aware method lookup.
    /// Operand: u16 constant index (member name)
    GetMethod,
    /// Pop a receiver and push its declared-member method lookup.
    /// Operand: u16 constant index (member name)
    GetDirectMethod,

    // =========================================================================
    // Calls
    // =========================================================================
    /// Invoke through a fixed-arity entry point.
    /// Stack: target, arg0..argN-1. Operand: u8 argument count (0..=16)
    Invoke,
    /// Pop N values into an array value, first pushed first.
    /// Operand: u16 element count
    NewArray,
    /// Invoke through the array-collecting entry point.
    /// Stack: target, array
    InvokeArray,
    /// Pop right and left operands and dispatch the named operator method.
    /// Operand: u16 constant index (method name)
    BinaryOp,

    // =========================================================================
    // Truthiness
    // =========================================================================
    /// Replace top of stack with its truthiness as a boolean.
    IsTruthy,
    /// Replace top of stack with its falsiness as a boolean.
    IsFalsey,

    // =========================================================================
    // Control Flow
    // =========================================================================
    /// Pop a value and jump forward if it is falsy.
    /// Operand: u16 forward offset
    JumpIfFalsy,
    /// Pop a value and jump forward if it is truthy.
    /// Operand: u16 forward offset
    JumpIfTruthy,
    /// Unconditional forward jump.
    /// Operand: u16 forward offset
    Jump,
    /// Unconditional backward jump.
    /// Operand: u16 backward offset
    Loop,

    // =========================================================================
    // Imports
    // =========================================================================
    /// Resolve a qualified import (once per unit) and push the result.
    /// Operand: u16 constant index (import reference)
    Import,
    /// Resolve a star import (once per unit) and merge it into the globals.
    /// Operand: u16 constant index (import reference)
    ImportStar,

    // =========================================================================
    // Debug
    // =========================================================================
    /// Pop a value and print it to the side channel after a prefix.
    /// Operand: u16 constant index (prefix string)
    DebugPrint,

    /// Return from the current procedure.
    Return,
}

impl OpCode {
    /// Convert from u8, returning None for invalid values.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::try_from(value).ok()
    }

    /// Get the size of operands for this opcode in bytes.
    ///
    /// This does NOT include the opcode byte itself.
    pub fn operand_size(&self) -> usize {
        match self {
            OpCode::PushNull
            | OpCode::PushTrue
            | OpCode::PushFalse
            | OpCode::Pop
            | OpCode::Dup
            | OpCode::Swap
            | OpCode::InvokeArray
            | OpCode::IsTruthy
            | OpCode::IsFalsey
            | OpCode::Return => 0,

            OpCode::Invoke => 1,

            OpCode::Constant
            | OpCode::Bootstrap
            | OpCode::GetLocal
            | OpCode::SetLocal
            | OpCode::GetGlobal
            | OpCode::PutGlobal
            | OpCode::GetField
            | OpCode::SetField
            | OpCode::GetMethod
            | OpCode::GetDirectMethod
            | OpCode::NewArray
            | OpCode::BinaryOp
            | OpCode::JumpIfFalsy
            | OpCode::JumpIfTruthy
            | OpCode::Jump
            | OpCode::Loop
            | OpCode::Import
            | OpCode::ImportStar
            | OpCode::DebugPrint => 2,
        }
    }

    /// Get the name of this opcode for disassembly.
    pub fn name(&self) -> &'static str {
        match self {
            OpCode::PushNull => "PUSH_NULL",
            OpCode::PushTrue => "PUSH_TRUE",
            OpCode::PushFalse => "PUSH_FALSE",
            OpCode::Constant => "CONSTANT",
            OpCode::Bootstrap => "BOOTSTRAP",
            OpCode::Pop => "POP",
            OpCode::Dup => "DUP",
            OpCode::Swap => "SWAP",
            OpCode::GetLocal => "GET_LOCAL",
            OpCode::SetLocal => "SET_LOCAL",
            OpCode::GetGlobal => "GET_GLOBAL",
            OpCode::PutGlobal => "PUT_GLOBAL",
            OpCode::GetField => "GET_FIELD",
            OpCode::SetField => "SET_FIELD",
            OpCode::GetMethod => "GET_METHOD",
            OpCode::GetDirectMethod => "GET_DIRECT_METHOD",
            OpCode::Invoke => "INVOKE",
            OpCode::NewArray => "NEW_ARRAY",
            OpCode::InvokeArray => "INVOKE_ARRAY",
            OpCode::BinaryOp => "BINARY_OP",
            OpCode::IsTruthy => "IS_TRUTHY",
            OpCode::IsFalsey => "IS_FALSEY",
            OpCode::JumpIfFalsy => "JUMP_IF_FALSY",
            OpCode::JumpIfTruthy => "JUMP_IF_TRUTHY",
            OpCode::Jump => "JUMP",
            OpCode::Loop => "LOOP",
            OpCode::Import => "IMPORT",
            OpCode::ImportStar => "IMPORT_STAR",
            OpCode::DebugPrint => "DEBUG_PRINT",
            OpCode::Return => "RETURN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_repr() {
        assert_eq!(OpCode::PushNull as u8, 0);
        assert_eq!(u8::from(OpCode::PushTrue), 1);
    }

    #[test]
    fn opcode_from_u8() {
        assert_eq!(OpCode::from_u8(0), Some(OpCode::PushNull));
        assert_eq!(OpCode::from_u8(OpCode::Return as u8), Some(OpCode::Return));
        assert_eq!(OpCode::from_u8(OpCode::Return as u8 + 1), None);
        assert_eq!(OpCode::from_u8(255), None);
    }

    #[test]
    fn opcode_name() {
        assert_eq!(OpCode::Bootstrap.name(), "BOOTSTRAP");
        assert_eq!(OpCode::GetDirectMethod.name(), "GET_DIRECT_METHOD");
        assert_eq!(OpCode::JumpIfFalsy.name(), "JUMP_IF_FALSY");
    }

    #[test]
    fn operand_sizes() {
        assert_eq!(OpCode::Pop.operand_size(), 0);
        assert_eq!(OpCode::InvokeArray.operand_size(), 0);
        assert_eq!(OpCode::Invoke.operand_size(), 1);
        assert_eq!(OpCode::GetLocal.operand_size(), 2);
        assert_eq!(OpCode::Import.operand_size(), 2);
        assert_eq!(OpCode::Loop.operand_size(), 2);
    }
}
