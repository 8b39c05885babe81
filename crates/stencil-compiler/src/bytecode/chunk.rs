//! Bytecode chunk for compiled functions.
//!
//! A `BytecodeChunk` contains the compiled bytecode for a single function,
//! along with the unit line each byte came from.

use super::OpCode;

/// A forward jump too long for its 16-bit operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpTooFar(pub usize);

/// A chunk of compiled bytecode for a single function.
///
/// Constants are stored at artifact level in a `ConstantPool`, not per-function.
#[derive(Debug, Clone, Default)]
pub struct BytecodeChunk {
    code: Vec<u8>,
    /// Line numbers, parallel to `code`.
    lines: Vec<u32>,
}

impl BytecodeChunk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_op(&mut self, op: OpCode, line: u32) {
        self.code.push(op.into());
        self.lines.push(line);
    }

    pub fn write_byte(&mut self, byte: u8, line: u32) {
        self.code.push(byte);
        self.lines.push(line);
    }

    /// Write a 16-bit operand (big-endian).
    pub fn write_u16(&mut self, value: u16, line: u32) {
        for byte in value.to_be_bytes() {
            self.write_byte(byte, line);
        }
    }

    /// Current code offset (for jump patching).
    pub fn current_offset(&self) -> usize {
        self.code.len()
    }

    /// Emit a jump instruction and return the offset of its operand.
    ///
    /// The operand is a 0xFFFF placeholder until [`patch_jump`](Self::patch_jump).
    pub fn emit_jump(&mut self, op: OpCode, line: u32) -> usize {
        self.write_op(op, line);
        let offset = self.code.len();
        self.write_u16(0xFFFF, line);
        offset
    }

    /// Patch the jump whose operand is at `offset` to land on the current position.
    pub fn patch_jump(&mut self, offset: usize) -> Result<(), JumpTooFar> {
        let distance = self.code.len() - offset - 2;
        let distance = u16::try_from(distance).map_err(|_| JumpTooFar(distance))?;
        let [hi, lo] = distance.to_be_bytes();
        self.code[offset] = hi;
        self.code[offset + 1] = lo;
        Ok(())
    }

    /// Drop all code from `offset` on.
    pub fn truncate(&mut self, offset: usize) {
        self.code.truncate(offset);
        self.lines.truncate(offset);
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

    /// Read a u16 at the given offset (big-endian).
    pub fn read_u16(&self, offset: usize) -> Option<u16> {
        let bytes = self.code.get(offset..offset + 2)?;
        Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_op(&self, offset: usize) -> Option<OpCode> {
        self.code.get(offset).and_then(|&b| OpCode::from_u8(b))
    }

    /// Extract all opcodes from the chunk, skipping operands.
    ///
    /// Useful for testing bytecode sequences without worrying about
    /// specific operand values or instruction offsets.
    pub fn opcodes(&self) -> Vec<OpCode> {
        let mut ops = Vec::new();
        let mut offset = 0;
        while offset < self.code.len() {
            match self.read_op(offset) {
                Some(op) => {
                    ops.push(op);
                    offset += 1 + op.operand_len();
                }
                None => offset += 1,
            }
        }
        ops
    }

    /// Check that this chunk contains exactly the given opcode sequence.
    #[track_caller]
    pub fn assert_opcodes(&self, expected: &[OpCode]) {
        let actual = self.opcodes();
        assert_eq!(
            actual, expected,
            "Bytecode mismatch.\nExpected: {expected:?}\nActual:   {actual:?}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_chunk_is_empty() {
        let chunk = BytecodeChunk::new();
        assert!(chunk.is_empty());
        assert_eq!(chunk.len(), 0);
    }

    #[test]
    fn write_op_and_operands() {
        let mut chunk = BytecodeChunk::new();
        chunk.write_op(OpCode::Constant, 1);
        chunk.write_byte(42, 1);
        chunk.write_u16(0x1234, 5);

        assert_eq!(chunk.len(), 4);
        assert_eq!(chunk.read_op(0), Some(OpCode::Constant));
        assert_eq!(chunk.read_byte(1), Some(42));
        assert_eq!(chunk.read_u16(2), Some(0x1234));
        assert_eq!(chunk.line_at(3), Some(5));
        assert_eq!(chunk.read_u16(3), None);
    }

    #[test]
    fn emit_and_patch_jump() {
        let mut chunk = BytecodeChunk::new();
        chunk.write_op(OpCode::PushTrue, 1);
        let jump = chunk.emit_jump(OpCode::JumpIfFalse, 2);
        chunk.write_op(OpCode::PushOne, 3);
        chunk.write_op(OpCode::PushZero, 3);
        chunk.patch_jump(jump).unwrap();

        // Skips over PushOne and PushZero.
        assert_eq!(chunk.read_u16(jump), Some(2));
    }

    #[test]
    fn overlong_jump_is_an_error() {
        let mut chunk = BytecodeChunk::new();
        let jump = chunk.emit_jump(OpCode::Jump, 1);
        for _ in 0..=u16::MAX as usize {
            chunk.write_op(OpCode::Pop, 1);
        }
        assert_eq!(chunk.patch_jump(jump), Err(JumpTooFar(u16::MAX as usize + 1)));
    }

    #[test]
    fn opcodes_skip_operands() {
        let mut chunk = BytecodeChunk::new();
        chunk.write_op(OpCode::GetLocal, 1);
        chunk.write_byte(0, 1);
        chunk.write_op(OpCode::GetField, 1);
        chunk.write_u16(3, 1);
        chunk.write_u16(0, 1);
        chunk.write_op(OpCode::Return, 1);

        chunk.assert_opcodes(&[OpCode::GetLocal, OpCode::GetField, OpCode::Return]);
    }

    #[test]
    #[should_panic(expected = "Bytecode mismatch")]
    fn assert_opcodes_failure() {
        let mut chunk = BytecodeChunk::new();
        chunk.write_op(OpCode::Constant, 1);
        chunk.write_byte(0, 1);
        chunk.assert_opcodes(&[OpCode::GetLocal]);
    }
}
