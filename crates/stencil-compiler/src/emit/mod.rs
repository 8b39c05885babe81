//! Bytecode emitter for the stencil compiler.
//!
//! The [`BytecodeEmitter`] provides a high-level API for generating bytecode,
//! handling constants, jumps, and the operand limits of the instruction set.
//!
//! # Example
//!
//! ```
//! use stencil_compiler::bytecode::{ConstantPool, OpCode};
//! use stencil_compiler::emit::BytecodeEmitter;
//!
//! let mut constants = ConstantPool::new();
//! let mut emitter = BytecodeEmitter::new(&mut constants);
//!
//! emitter.emit_int(42).unwrap();
//! emitter.emit_int(1).unwrap();
//! emitter.emit(OpCode::AddIntChecked);
//! emitter.emit(OpCode::Return);
//!
//! let chunk = emitter.finish();
//! chunk.assert_opcodes(&[OpCode::Constant, OpCode::PushOne, OpCode::AddIntChecked, OpCode::Return]);
//! ```

use stencil_core::{CompilationError, Span, Value};

use crate::bytecode::{BytecodeChunk, Constant, ConstantPool, OpCode};

type Result<T> = std::result::Result<T, CompilationError>;

/// A forward jump waiting to be patched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "a jump must be patched"]
pub struct JumpLabel(usize);

impl JumpLabel {
    /// Offset of the jump's operand.
    pub fn offset(&self) -> usize {
        self.0
    }
}

/// Emits bytecode instructions.
///
/// Uses a shared artifact-level constant pool for deduplication across functions.
/// Each `BytecodeEmitter` produces bytecode for a single function.
pub struct BytecodeEmitter<'pool> {
    chunk: BytecodeChunk,
    constants: &'pool mut ConstantPool,
    /// Source location of the construct being emitted, for line info and limit errors.
    span: Span,
}

impl<'pool> BytecodeEmitter<'pool> {
    pub fn new(constants: &'pool mut ConstantPool) -> Self {
        Self {
            chunk: BytecodeChunk::new(),
            constants,
            span: Span::point(1, 1),
        }
    }

    /// Set the construct being emitted. Subsequent instructions carry its line.
    pub fn set_span(&mut self, span: Span) {
        self.span = span;
    }

    pub fn span(&self) -> Span {
        self.span
    }

    fn line(&self) -> u32 {
        self.span.line
    }

    // ==========================================================================
    // Basic Emission
    // ==========================================================================

    /// Emit a single opcode with no operands.
    pub fn emit(&mut self, op: OpCode) {
        self.chunk.write_op(op, self.line());
    }

    /// Emit opcode with 8-bit operand.
    pub fn emit_byte(&mut self, op: OpCode, byte: u8) {
        self.chunk.write_op(op, self.line());
        self.chunk.write_byte(byte, self.line());
    }

    /// Emit opcode with 16-bit operand.
    pub fn emit_u16(&mut self, op: OpCode, value: u16) {
        self.chunk.write_op(op, self.line());
        self.chunk.write_u16(value, self.line());
    }

    /// Emit opcode with a 16-bit operand given as a count or index.
    pub fn emit_count(&mut self, op: OpCode, count: usize, what: &str) -> Result<()> {
        let value = u16::try_from(count).map_err(|_| self.limit(format!("too many {what}")))?;
        self.emit_u16(op, value);
        Ok(())
    }

    /// Emit a field read.
    pub fn emit_get_field(&mut self, index: usize, name: &str) -> Result<()> {
        let index = u16::try_from(index).map_err(|_| self.limit("field index out of range"))?;
        let name = self.add_constant(Constant::Str(name.to_string()))?;
        self.emit_u16(OpCode::GetField, index);
        self.chunk.write_u16(name, self.line());
        Ok(())
    }

    // ==========================================================================
    // Constants
    // ==========================================================================

    /// Emit a constant load instruction.
    ///
    /// Constants are added to the shared pool (deduplicated).
    /// Uses narrow (8-bit) or wide (16-bit) index based on pool size.
    pub fn emit_constant(&mut self, constant: Constant) -> Result<()> {
        let index = self.add_constant(constant)?;
        match u8::try_from(index) {
            Ok(narrow) => self.emit_byte(OpCode::Constant, narrow),
            Err(_) => self.emit_u16(OpCode::ConstantWide, index),
        }
        Ok(())
    }

    fn add_constant(&mut self, constant: Constant) -> Result<u16> {
        let index = self.constants.add(constant);
        u16::try_from(index).map_err(|_| self.limit("too many constants in one unit"))
    }

    /// Emit an integer constant.
    ///
    /// Optimizes common cases: 0 uses `PushZero`, 1 uses `PushOne`.
    pub fn emit_int(&mut self, value: i64) -> Result<()> {
        match value {
            0 => self.emit(OpCode::PushZero),
            1 => self.emit(OpCode::PushOne),
            _ => self.emit_constant(Constant::Int(value))?,
        }
        Ok(())
    }

    pub fn emit_float(&mut self, value: f64) -> Result<()> {
        self.emit_constant(Constant::Float(value))
    }

    pub fn emit_str(&mut self, value: &str) -> Result<()> {
        self.emit_constant(Constant::Str(value.to_string()))
    }

    pub fn emit_bool(&mut self, value: bool) {
        self.emit(if value { OpCode::PushTrue } else { OpCode::PushFalse });
    }

    /// Emit code that pushes a constant-folded value.
    pub fn emit_value(&mut self, value: &Value<'_>) -> Result<()> {
        match value {
            Value::Null => {
                self.emit(OpCode::PushNull);
                Ok(())
            }
            Value::Bool(b) => {
                self.emit_bool(*b);
                Ok(())
            }
            Value::Int(i) => self.emit_int(*i),
            Value::UInt(u) => self.emit_constant(Constant::UInt(*u)),
            Value::Float(f) => self.emit_float(*f),
            Value::Str(s) => self.emit_str(s),
            Value::Object(_) => Err(CompilationError::InvalidOperation {
                message: "a model instance cannot be a constant".to_string(),
                span: self.span,
            }),
        }
    }

    // ==========================================================================
    // Locals
    // ==========================================================================

    pub fn emit_get_local(&mut self, slot: u8) {
        self.emit_byte(OpCode::GetLocal, slot);
    }

    pub fn emit_set_local(&mut self, slot: u8) {
        self.emit_byte(OpCode::SetLocal, slot);
    }

    // ==========================================================================
    // Control Flow
    // ==========================================================================

    /// Emit a forward jump with a placeholder operand.
    pub fn emit_jump(&mut self, op: OpCode) -> JumpLabel {
        JumpLabel(self.chunk.emit_jump(op, self.line()))
    }

    /// Patch a forward jump to the current position.
    pub fn patch_jump(&mut self, label: JumpLabel) -> Result<()> {
        self.chunk
            .patch_jump(label.0)
            .map_err(|too_far| self.limit(format!("jump of {} bytes is too long", too_far.0)))
    }

    // ==========================================================================
    // Rewriting
    // ==========================================================================

    pub fn current_offset(&self) -> usize {
        self.chunk.current_offset()
    }

    /// Drop everything emitted from `offset` on, to replace it with a folded constant.
    pub fn truncate(&mut self, offset: usize) {
        self.chunk.truncate(offset);
    }

    pub fn chunk(&self) -> &BytecodeChunk {
        &self.chunk
    }

    pub fn finish(self) -> BytecodeChunk {
        self.chunk
    }

    fn limit(&self, message: impl Into<String>) -> CompilationError {
        CompilationError::LimitExceeded {
            message: message.into(),
            span: self.span,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_ints_use_dedicated_opcodes() {
        let mut constants = ConstantPool::new();
        let mut emitter = BytecodeEmitter::new(&mut constants);
        emitter.emit_int(0).unwrap();
        emitter.emit_int(1).unwrap();
        emitter.emit_int(2).unwrap();
        emitter
            .finish()
            .assert_opcodes(&[OpCode::PushZero, OpCode::PushOne, OpCode::Constant]);
        assert_eq!(constants.len(), 1);
    }

    #[test]
    fn wide_constant_index() {
        let mut constants = ConstantPool::new();
        for i in 0..300 {
            constants.add(Constant::Int(i + 10));
        }
        let mut emitter = BytecodeEmitter::new(&mut constants);
        emitter.emit_str("late").unwrap();
        let chunk = emitter.finish();
        chunk.assert_opcodes(&[OpCode::ConstantWide]);
        assert_eq!(chunk.read_u16(1), Some(300));
    }

    #[test]
    fn line_follows_span() {
        let mut constants = ConstantPool::new();
        let mut emitter = BytecodeEmitter::new(&mut constants);
        emitter.set_span(Span::new(7, 3, 4));
        emitter.emit(OpCode::PushNull);
        assert_eq!(emitter.chunk().line_at(0), Some(7));
    }

    #[test]
    fn truncate_discards_tail() {
        let mut constants = ConstantPool::new();
        let mut emitter = BytecodeEmitter::new(&mut constants);
        emitter.emit(OpCode::PushTrue);
        let mark = emitter.current_offset();
        emitter.emit_int(5).unwrap();
        emitter.emit(OpCode::NegIntChecked);
        emitter.truncate(mark);
        emitter.emit_int(-5).unwrap();
        emitter
            .finish()
            .assert_opcodes(&[OpCode::PushTrue, OpCode::Constant]);
    }

    #[test]
    fn field_read_records_name() {
        let mut constants = ConstantPool::new();
        let mut emitter = BytecodeEmitter::new(&mut constants);
        emitter.emit_get_field(2, "Name").unwrap();
        let chunk = emitter.finish();
        assert_eq!(chunk.read_u16(1), Some(2));
        let name = chunk.read_u16(3).unwrap();
        assert_eq!(constants.get_str(name as u32), Some("Name"));
    }

    #[test]
    fn jump_patches_forward() {
        let mut constants = ConstantPool::new();
        let mut emitter = BytecodeEmitter::new(&mut constants);
        let jump = emitter.emit_jump(OpCode::JumpIfNotNull);
        emitter.emit(OpCode::Pop);
        emitter.emit(OpCode::PushNull);
        emitter.patch_jump(jump).unwrap();
        assert_eq!(emitter.chunk().read_u16(jump.offset()), Some(2));
    }
}
