//! Stack machine that executes one compiled function.
//!
//! Values borrow from the call's arguments (model fields) and from the
//! artifact's constant pool, so rendering copies text only when it joins
//! pieces into the result. Bytecode only jumps forward, so every call
//! terminates.

use std::borrow::Cow;

use stencil_core::{RuntimeError, Value};
use stencil_parser::ast::FormatKind;

use crate::artifact::CompiledFunction;
use crate::bytecode::{ConstantPool, OpCode};
use crate::eval::{self, ArithOp, IntError, StrOp};

type Result<T> = std::result::Result<T, RuntimeError>;

pub(crate) struct Vm<'m, 'a> {
    function: &'m CompiledFunction,
    constants: &'m ConstantPool,
    stack: Vec<Value<'a>>,
    locals: Vec<Value<'a>>,
    ip: usize,
}

impl<'m: 'a, 'a> Vm<'m, 'a> {
    pub(crate) fn new(function: &'m CompiledFunction, constants: &'m ConstantPool, args: &[Value<'a>]) -> Self {
        let mut locals = args.to_vec();
        locals.resize(function.local_count.max(args.len()), Value::Null);
        Self {
            function,
            constants,
            stack: Vec::with_capacity(8),
            locals,
            ip: 0,
        }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn run(mut self) -> Result<Value<'a>> {
        loop {
            let offset = self.ip;
            let op = self
                .function
                .chunk
                .read_op(offset)
                .ok_or_else(|| malformed(offset, "invalid opcode or missing return"))?;
            self.ip += 1;

            match op {
                OpCode::Constant => {
                    let index = self.read_u8()? as u32;
                    self.push_constant(index)?;
                }
                OpCode::ConstantWide => {
                    let index = self.read_u16()? as u32;
                    self.push_constant(index)?;
                }
                OpCode::PushNull => self.stack.push(Value::Null),
                OpCode::PushTrue => self.stack.push(Value::Bool(true)),
                OpCode::PushFalse => self.stack.push(Value::Bool(false)),
                OpCode::PushZero => self.stack.push(Value::Int(0)),
                OpCode::PushOne => self.stack.push(Value::Int(1)),

                OpCode::Pop => {
                    self.pop()?;
                }
                OpCode::GetLocal => {
                    let slot = self.read_u8()? as usize;
                    let value = self
                        .locals
                        .get(slot)
                        .cloned()
                        .ok_or_else(|| malformed(offset, format!("no local slot {slot}")))?;
                    self.stack.push(value);
                }
                OpCode::SetLocal => {
                    let slot = self.read_u8()? as usize;
                    let value = self.pop()?;
                    let target = self
                        .locals
                        .get_mut(slot)
                        .ok_or_else(|| malformed(offset, format!("no local slot {slot}")))?;
                    *target = value;
                }

                OpCode::GetField => {
                    let index = self.read_u16()? as usize;
                    let name = self.read_u16()? as u32;
                    let value = self.get_field(index, name)?;
                    self.stack.push(value);
                }

                OpCode::AddInt => self.int_binary(ArithOp::Add, false, offset)?,
                OpCode::SubInt => self.int_binary(ArithOp::Sub, false, offset)?,
                OpCode::MulInt => self.int_binary(ArithOp::Mul, false, offset)?,
                OpCode::AddIntChecked => self.int_binary(ArithOp::Add, true, offset)?,
                OpCode::SubIntChecked => self.int_binary(ArithOp::Sub, true, offset)?,
                OpCode::MulIntChecked => self.int_binary(ArithOp::Mul, true, offset)?,
                OpCode::NegInt => self.int_neg(false, offset)?,
                OpCode::NegIntChecked => self.int_neg(true, offset)?,

                OpCode::AddFloat => self.float_binary(ArithOp::Add)?,
                OpCode::SubFloat => self.float_binary(ArithOp::Sub)?,
                OpCode::MulFloat => self.float_binary(ArithOp::Mul)?,
                OpCode::NegFloat => {
                    let x = self.pop_float()?;
                    self.stack.push(Value::Float(-x));
                }
                OpCode::IntToFloat => {
                    let top = self.stack.len().checked_sub(1).ok_or(RuntimeError::StackUnderflow)?;
                    promote(&mut self.stack[top]);
                }
                OpCode::IntToFloatUnder => {
                    let under = self.stack.len().checked_sub(2).ok_or(RuntimeError::StackUnderflow)?;
                    promote(&mut self.stack[under]);
                }

                OpCode::Concat => {
                    let right = self.pop()?;
                    let left = self.pop()?;
                    let mut text = eval::render(&left).into_owned();
                    text.push_str(&eval::render(&right));
                    self.stack.push(Value::Str(Cow::Owned(text)));
                }
                OpCode::BuildString => {
                    let count = self.read_u16()? as usize;
                    let start = self
                        .stack
                        .len()
                        .checked_sub(count)
                        .ok_or(RuntimeError::StackUnderflow)?;
                    let mut text = String::new();
                    for piece in self.stack.drain(start..) {
                        text.push_str(&eval::render(&piece));
                    }
                    self.stack.push(Value::Str(Cow::Owned(text)));
                }
                OpCode::ToString => {
                    let value = self.pop()?;
                    let text = eval::render(&value).into_owned();
                    self.stack.push(Value::Str(Cow::Owned(text)));
                }
                OpCode::StrUpper => self.str_op(StrOp::Upper)?,
                OpCode::StrLower => self.str_op(StrOp::Lower)?,
                OpCode::StrTrim => self.str_op(StrOp::Trim)?,
                OpCode::StrLen => {
                    let value = match self.pop()? {
                        Value::Null => Value::Null,
                        Value::Str(s) => Value::Int(eval::str_len(&s)),
                        other => return Err(mismatch("string", &other)),
                    };
                    self.stack.push(value);
                }

                OpCode::FormatFixed => {
                    let n = self.read_u8()?;
                    self.format(FormatKind::Fixed(n))?;
                }
                OpCode::FormatDecimal => {
                    let n = self.read_u8()?;
                    self.format(FormatKind::Decimal(n))?;
                }
                OpCode::FormatHexUpper => {
                    let width = self.read_u8()?;
                    self.format(FormatKind::Hex { upper: true, width })?;
                }
                OpCode::FormatHexLower => {
                    let width = self.read_u8()?;
                    self.format(FormatKind::Hex { upper: false, width })?;
                }
                OpCode::FormatUpper => self.format(FormatKind::Upper)?,
                OpCode::FormatLower => self.format(FormatKind::Lower)?,

                OpCode::Equal | OpCode::NotEqual => {
                    let right = self.pop()?;
                    let left = self.pop()?;
                    let equal = left == right;
                    self.stack.push(Value::Bool(equal == (op == OpCode::Equal)));
                }
                OpCode::Not => {
                    let b = self.pop_bool()?;
                    self.stack.push(Value::Bool(!b));
                }

                OpCode::Jump => {
                    let distance = self.read_u16()? as usize;
                    self.jump(distance)?;
                }
                OpCode::JumpIfFalse => {
                    let distance = self.read_u16()? as usize;
                    if !self.pop_bool()? {
                        self.jump(distance)?;
                    }
                }
                OpCode::JumpIfNotNull => {
                    let distance = self.read_u16()? as usize;
                    let top = self.stack.last().ok_or(RuntimeError::StackUnderflow)?;
                    if !top.is_null() {
                        self.jump(distance)?;
                    }
                }
                OpCode::Return => return self.pop(),
            }
        }
    }

    // ==========================================================================
    // Operands
    // ==========================================================================

    fn read_u8(&mut self) -> Result<u8> {
        let byte = self
            .function
            .chunk
            .read_byte(self.ip)
            .ok_or_else(|| malformed(self.ip, "truncated operand"))?;
        self.ip += 1;
        Ok(byte)
    }

    fn read_u16(&mut self) -> Result<u16> {
        let value = self
            .function
            .chunk
            .read_u16(self.ip)
            .ok_or_else(|| malformed(self.ip, "truncated operand"))?;
        self.ip += 2;
        Ok(value)
    }

    fn jump(&mut self, distance: usize) -> Result<()> {
        let target = self.ip + distance;
        if target > self.function.chunk.len() {
            return Err(malformed(self.ip, format!("jump past end to {target}")));
        }
        self.ip = target;
        Ok(())
    }

    fn line(&self, offset: usize) -> u32 {
        self.function.chunk.line_at(offset).unwrap_or(0)
    }

    // ==========================================================================
    // Stack
    // ==========================================================================

    fn pop(&mut self) -> Result<Value<'a>> {
        self.stack.pop().ok_or(RuntimeError::StackUnderflow)
    }

    fn pop_bool(&mut self) -> Result<bool> {
        match self.pop()? {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch("bool", &other)),
        }
    }

    fn pop_float(&mut self) -> Result<f64> {
        match self.pop()? {
            Value::Float(x) => Ok(x),
            other => Err(mismatch("float", &other)),
        }
    }

    fn push_constant(&mut self, index: u32) -> Result<()> {
        let constant = self
            .constants
            .get(index)
            .ok_or_else(|| malformed(self.ip, format!("no constant {index}")))?;
        self.stack.push(constant.to_value());
        Ok(())
    }

    // ==========================================================================
    // Operations
    // ==========================================================================

    fn get_field(&mut self, index: usize, name: u32) -> Result<Value<'a>> {
        match self.pop()? {
            Value::Null => Ok(Value::Null),
            Value::Object(model) => model.field(index).ok_or_else(|| RuntimeError::MissingField {
                type_name: model.type_name().to_string(),
                field: self.constants.get_str(name).unwrap_or("?").to_string(),
            }),
            other => Err(mismatch("model", &other)),
        }
    }

    fn int_binary(&mut self, op: ArithOp, checked: bool, offset: usize) -> Result<()> {
        let right = self.pop()?;
        let left = self.pop()?;
        let value = eval::int_arith(op, &left, &right, checked).map_err(|error| match error {
            IntError::Overflow => RuntimeError::IntegerOverflow {
                op: op.as_str(),
                line: self.line(offset),
            },
            IntError::NotInteger => {
                let bad = if left.as_wide().is_none() { &left } else { &right };
                mismatch("int", bad)
            }
        })?;
        self.stack.push(value);
        Ok(())
    }

    fn int_neg(&mut self, checked: bool, offset: usize) -> Result<()> {
        let operand = self.pop()?;
        let value = eval::int_neg(&operand, checked).map_err(|error| match error {
            IntError::Overflow => RuntimeError::IntegerOverflow {
                op: "-",
                line: self.line(offset),
            },
            IntError::NotInteger => mismatch("int", &operand),
        })?;
        self.stack.push(value);
        Ok(())
    }

    fn float_binary(&mut self, op: ArithOp) -> Result<()> {
        let y = self.pop_float()?;
        let x = self.pop_float()?;
        self.stack.push(Value::Float(eval::float_arith(op, x, y)));
        Ok(())
    }

    fn str_op(&mut self, op: StrOp) -> Result<()> {
        let value = match self.pop()? {
            Value::Null => Value::Null,
            Value::Str(s) => Value::Str(Cow::Owned(eval::str_op(op, &s))),
            other => return Err(mismatch("string", &other)),
        };
        self.stack.push(value);
        Ok(())
    }

    fn format(&mut self, kind: FormatKind) -> Result<()> {
        let value = self.pop()?;
        let text = eval::apply_format(kind, &value)?;
        self.stack.push(Value::Str(Cow::Owned(text)));
        Ok(())
    }
}

/// Convert an integer in place. Floats and `null` are left alone.
fn promote(value: &mut Value<'_>) {
    if let Some(x) = eval::to_float(value) {
        *value = Value::Float(x);
    }
}

fn mismatch(expected: &str, actual: &Value<'_>) -> RuntimeError {
    RuntimeError::TypeMismatch {
        expected: expected.to_string(),
        actual: actual.type_name().to_string(),
    }
}

fn malformed(offset: usize, detail: impl Into<String>) -> RuntimeError {
    RuntimeError::MalformedBytecode {
        offset,
        detail: detail.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ValueType;
    use crate::bytecode::{BytecodeChunk, Constant};

    fn function(chunk: BytecodeChunk, local_count: usize) -> CompiledFunction {
        CompiledFunction {
            name: "test".into(),
            params: Vec::new(),
            return_type: ValueType::Str,
            local_count,
            chunk,
        }
    }

    fn run(chunk: BytecodeChunk, constants: &ConstantPool) -> Result<Value<'static>> {
        let function = function(chunk, 1);
        Vm::new(&function, constants, &[]).run().map(Value::into_owned)
    }

    #[test]
    fn builds_strings_from_mixed_values() {
        let mut constants = ConstantPool::new();
        let hello = constants.add_str("n=");
        let mut chunk = BytecodeChunk::new();
        chunk.write_op(OpCode::Constant, 1);
        chunk.write_byte(hello as u8, 1);
        chunk.write_op(OpCode::PushOne, 1);
        chunk.write_op(OpCode::PushNull, 1);
        chunk.write_op(OpCode::PushTrue, 1);
        chunk.write_op(OpCode::BuildString, 1);
        chunk.write_u16(4, 1);
        chunk.write_op(OpCode::Return, 1);

        assert_eq!(run(chunk, &constants).unwrap(), Value::from("n=1true"));
    }

    #[test]
    fn checked_overflow_reports_line() {
        let mut constants = ConstantPool::new();
        let max = constants.add(Constant::UInt(u64::MAX));
        let mut chunk = BytecodeChunk::new();
        chunk.write_op(OpCode::Constant, 1);
        chunk.write_byte(max as u8, 1);
        chunk.write_op(OpCode::PushOne, 1);
        chunk.write_op(OpCode::AddIntChecked, 3);
        chunk.write_op(OpCode::Return, 3);

        assert_eq!(
            run(chunk, &constants),
            Err(RuntimeError::IntegerOverflow { op: "+", line: 3 })
        );
    }

    #[test]
    fn locals_round_trip() {
        let constants = ConstantPool::new();
        let mut chunk = BytecodeChunk::new();
        chunk.write_op(OpCode::PushOne, 1);
        chunk.write_op(OpCode::SetLocal, 1);
        chunk.write_byte(0, 1);
        chunk.write_op(OpCode::GetLocal, 1);
        chunk.write_byte(0, 1);
        chunk.write_op(OpCode::GetLocal, 1);
        chunk.write_byte(0, 1);
        chunk.write_op(OpCode::AddInt, 1);
        chunk.write_op(OpCode::Return, 1);
        assert_eq!(run(chunk, &constants).unwrap(), Value::Int(2));
    }

    #[test]
    fn coalesce_skips_right_when_present() {
        let constants = ConstantPool::new();
        let mut chunk = BytecodeChunk::new();
        chunk.write_op(OpCode::PushZero, 1);
        let jump = chunk.emit_jump(OpCode::JumpIfNotNull, 1);
        chunk.write_op(OpCode::Pop, 1);
        chunk.write_op(OpCode::PushOne, 1);
        chunk.patch_jump(jump).unwrap();
        chunk.write_op(OpCode::Return, 1);
        assert_eq!(run(chunk, &constants).unwrap(), Value::Int(0));
    }

    #[test]
    fn malformed_code_is_an_error_not_a_panic() {
        let constants = ConstantPool::new();

        let mut missing_return = BytecodeChunk::new();
        missing_return.write_op(OpCode::PushOne, 1);
        assert!(matches!(
            run(missing_return, &constants),
            Err(RuntimeError::MalformedBytecode { offset: 1, .. })
        ));

        let mut underflow = BytecodeChunk::new();
        underflow.write_op(OpCode::Return, 1);
        assert_eq!(run(underflow, &constants), Err(RuntimeError::StackUnderflow));

        let mut bad_constant = BytecodeChunk::new();
        bad_constant.write_op(OpCode::Constant, 1);
        bad_constant.write_byte(9, 1);
        assert!(matches!(
            run(bad_constant, &constants),
            Err(RuntimeError::MalformedBytecode { .. })
        ));
    }

    #[test]
    fn string_methods_pass_null_through() {
        let constants = ConstantPool::new();
        let mut chunk = BytecodeChunk::new();
        chunk.write_op(OpCode::PushNull, 1);
        chunk.write_op(OpCode::StrUpper, 1);
        chunk.write_op(OpCode::Return, 1);
        assert_eq!(run(chunk, &constants).unwrap(), Value::Null);
    }
}
