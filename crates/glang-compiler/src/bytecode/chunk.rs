//! Instruction storage for one compiled procedure.
//!
//! Jump operands are 16 bits wide. A body too large for one is reported as
//! a [`JumpTooFar`] instead of producing a wrapped offset.

use thiserror::Error;

use super::OpCode;

/// A jump whose distance does not fit its 16-bit operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Too much code to jump over")]
pub struct JumpTooFar {
    pub distance: usize,
}

/// Bytecode of a single procedure with the source line of every byte.
///
/// Constants live in the unit's `ConstantPool`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BytecodeChunk {
    code: Vec<u8>,
    lines: Vec<u32>,
}

impl BytecodeChunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_op(&mut self, op: OpCode, line: u32) {
        self.write_byte(op as u8, line);
    }

    pub fn write_byte(&mut self, byte: u8, line: u32) {
        self.code.push(byte);
        self.lines.push(line);
    }

    /// Big-endian.
    pub fn write_u16(&mut self, value: u16, line: u32) {
        for byte in value.to_be_bytes() {
            self.write_byte(byte, line);
        }
    }

    pub fn current_offset(&self) -> usize {
        self.code.len()
    }

    /// Write `op` with a placeholder operand and return the operand's offset.
    pub fn emit_jump(&mut self, op: OpCode, line: u32) -> usize {
        self.write_op(op, line);
        let operand = self.code.len();
        self.write_u16(u16::MAX, line);
        operand
    }

    /// Point the forward jump whose operand sits at `operand` at the end of
    /// the chunk. The placeholder is left in place when the distance is too
    /// large.
    pub fn patch_jump(&mut self, operand: usize) -> Result<(), JumpTooFar> {
        let distance = self.code.len() - operand - 2;
        let encoded = u16::try_from(distance).map_err(|_| JumpTooFar { distance })?;
        self.code[operand..operand + 2].copy_from_slice(&encoded.to_be_bytes());
        Ok(())
    }

    /// Write a `Loop` back to `target`. The operand counts its own bytes.
    ///
    /// On overflow the instruction is still written, with a zero operand.
    pub fn emit_loop(&mut self, target: usize, line: u32) -> Result<(), JumpTooFar> {
        self.write_op(OpCode::Loop, line);
        let distance = self.code.len() + 2 - target;
        match u16::try_from(distance) {
            Ok(encoded) => {
                self.write_u16(encoded, line);
                Ok(())
            }
            Err(_) => {
                self.write_u16(0, line);
                Err(JumpTooFar { distance })
            }
        }
    }

    pub fn code(&self) -> &[u8] {
        &self.code
    }

    pub fn line_at(&self, offset: usize) -> Option<u32> {
        self.lines.get(offset).copied()
    }

    pub fn len(&self) -> usize {
        self.code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.code.is_empty()
    }

    pub fn read_byte(&self, offset: usize) -> Option<u8> {
        self.code.get(offset).copied()
    }

    pub fn read_u16(&self, offset: usize) -> Option<u16> {
        let bytes = self.code.get(offset..offset + 2)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_op(&self, offset: usize) -> Option<OpCode> {
        self.code.get(offset).and_then(|&b| OpCode::from_u8(b))
    }

    /// The instruction sequence with operands skipped.
    pub fn opcodes(&self) -> Vec<OpCode> {
        let mut ops = Vec::new();
        let mut offset = 0;
        while offset < self.code.len() {
            match self.read_op(offset) {
                Some(op) => {
                    ops.push(op);
                    offset += 1 + op.operand_size();
                }
                None => offset += 1,
            }
        }
        ops
    }

    /// Assert the instruction sequence, ignoring operands.
    #[track_caller]
    pub fn assert_opcodes(&self, expected: &[OpCode]) {
        let actual = self.opcodes();
        assert_eq!(
            actual,
            expected,
            "Bytecode mismatch.\nExpected: {:?}\nActual:   {:?}",
            expected.iter().map(|op| op.name()).collect::<Vec<_>>(),
            actual.iter().map(|op| op.name()).collect::<Vec<_>>(),
        );
    }

    /// Assert that `expected` occurs in order, gaps allowed.
    #[track_caller]
    pub fn assert_contains_opcodes(&self, expected: &[OpCode]) {
        let actual = self.opcodes();
        let mut pending = expected.iter().peekable();
        for op in &actual {
            if pending.peek() == Some(&op) {
                pending.next();
            }
        }
        let missing: Vec<_> = pending.map(|op| op.name()).collect();
        if !missing.is_empty() {
            panic!(
                "Missing opcodes in sequence.\nExpected to find: {:?}\nActual bytecode:  {:?}",
                missing,
                actual.iter().map(|op| op.name()).collect::<Vec<_>>(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filler(chunk: &mut BytecodeChunk, count: usize) {
        for _ in 0..count {
            chunk.write_op(OpCode::Dup, 1);
        }
    }

    #[test]
    fn new_chunk_is_empty() {
        let chunk = BytecodeChunk::new();
        assert!(chunk.is_empty());
        assert_eq!(chunk.len(), 0);
    }

    #[test]
    fn write_op_and_operand() {
        let mut chunk = BytecodeChunk::new();
        chunk.write_op(OpCode::Invoke, 1);
        chunk.write_byte(3, 1);

        assert_eq!(chunk.len(), 2);
        assert_eq!(chunk.read_op(0), Some(OpCode::Invoke));
        assert_eq!(chunk.read_byte(1), Some(3));
        assert_eq!(chunk.line_at(1), Some(1));
    }

    #[test]
    fn write_u16() {
        let mut chunk = BytecodeChunk::new();
        chunk.write_u16(0x1234, 5);

        assert_eq!(chunk.read_u16(0), Some(0x1234));
        assert_eq!(chunk.line_at(0), Some(5));
        assert_eq!(chunk.read_u16(1), None);
    }

    #[test]
    fn emit_and_patch_jump() {
        let mut chunk = BytecodeChunk::new();
        chunk.write_op(OpCode::PushTrue, 1);

        let operand = chunk.emit_jump(OpCode::JumpIfFalsy, 2);
        chunk.write_op(OpCode::PushNull, 3);
        chunk.write_op(OpCode::Pop, 3);
        chunk.patch_jump(operand).unwrap();

        // skips PushNull and Pop
        assert_eq!(chunk.read_u16(operand), Some(2));
    }

    #[test]
    fn emit_loop() {
        let mut chunk = BytecodeChunk::new();

        let start = chunk.current_offset();
        chunk.write_op(OpCode::PushNull, 1);
        chunk.write_op(OpCode::Pop, 1);
        chunk.emit_loop(start, 2).unwrap();

        assert_eq!(chunk.len(), 5);
        assert_eq!(chunk.read_op(2), Some(OpCode::Loop));
        assert_eq!(chunk.read_u16(3), Some(5));
    }

    #[test]
    fn longest_forward_jump_fits() {
        let mut chunk = BytecodeChunk::new();
        let operand = chunk.emit_jump(OpCode::Jump, 1);
        filler(&mut chunk, u16::MAX as usize);

        assert_eq!(chunk.patch_jump(operand), Ok(()));
        assert_eq!(chunk.read_u16(operand), Some(u16::MAX));
    }

    #[test]
    fn forward_jump_overflow_is_an_error() {
        let mut chunk = BytecodeChunk::new();
        let operand = chunk.emit_jump(OpCode::JumpIfFalsy, 1);
        filler(&mut chunk, u16::MAX as usize + 1);

        let err = chunk.patch_jump(operand).unwrap_err();
        assert_eq!(err.distance, u16::MAX as usize + 1);
        assert_eq!(err.to_string(), "Too much code to jump over");
    }

    #[test]
    fn loop_overflow_keeps_instruction_shape() {
        let mut chunk = BytecodeChunk::new();
        filler(&mut chunk, u16::MAX as usize);

        assert!(chunk.emit_loop(0, 2).is_err());
        assert_eq!(chunk.read_op(u16::MAX as usize), Some(OpCode::Loop));
        assert_eq!(chunk.read_u16(u16::MAX as usize + 1), Some(0));
        assert_eq!(chunk.len(), u16::MAX as usize + 3);
    }

    #[test]
    fn opcodes_skip_operands() {
        let mut chunk = BytecodeChunk::new();
        chunk.write_op(OpCode::GetLocal, 1);
        chunk.write_u16(0, 1);
        chunk.write_op(OpCode::Invoke, 1);
        chunk.write_byte(0, 1);
        chunk.write_op(OpCode::Return, 1);

        chunk.assert_opcodes(&[OpCode::GetLocal, OpCode::Invoke, OpCode::Return]);
        chunk.assert_contains_opcodes(&[OpCode::GetLocal, OpCode::Return]);
    }

    #[test]
    #[should_panic(expected = "Bytecode mismatch")]
    fn assert_opcodes_failure() {
        let mut chunk = BytecodeChunk::new();
        chunk.write_op(OpCode::Pop, 1);
        chunk.assert_opcodes(&[OpCode::Dup]);
    }

    #[test]
    #[should_panic(expected = "Missing opcodes")]
    fn assert_contains_opcodes_failure() {
        let mut chunk = BytecodeChunk::new();
        chunk.write_op(OpCode::Pop, 1);
        chunk.assert_contains_opcodes(&[OpCode::Pop, OpCode::Swap]);
    }
}
