//! Bytecode operation codes.
//!
//! Each opcode is a single byte, with operands following inline
//! (big-endian for 16-bit operands).

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Bytecode operation codes.
///
/// The VM is a stack-based machine. Most operations pop operands
/// from the stack and push results back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum OpCode {
    // =========================================================================
    // Constants
    // =========================================================================
    /// Push constant from pool.
    /// Operand: u8 constant index
    Constant = 0,
    /// Push constant from pool.
    /// Operand: u16 constant index
    ConstantWide,
    PushNull,
    PushTrue,
    PushFalse,
    /// Push integer 0.
    PushZero,
    /// Push integer 1.
    PushOne,

    // =========================================================================
    // Stack and locals
    // =========================================================================
    Pop,
    /// Operand: u8 slot index
    GetLocal,
    /// Pops the value into the slot.
    /// Operand: u8 slot index
    SetLocal,

    // =========================================================================
    // Model fields
    // =========================================================================
    /// Pop a model, push one of its fields. A null model yields null.
    /// Operands: u16 field index, u16 constant index of the field name
    GetField,

    // =========================================================================
    // Integer arithmetic
    // =========================================================================
    /// Wrapping integer add.
    AddInt,
    SubInt,
    MulInt,
    NegInt,
    /// Integer add that raises `IntegerOverflow`.
    AddIntChecked,
    SubIntChecked,
    MulIntChecked,
    NegIntChecked,

    // =========================================================================
    // Float arithmetic
    // =========================================================================
    AddFloat,
    SubFloat,
    MulFloat,
    NegFloat,
    /// Convert the int on top of the stack to float.
    IntToFloat,
    /// Convert the int one below the top of the stack to float.
    IntToFloatUnder,

    // =========================================================================
    // Strings
    // =========================================================================
    /// Pop two values, push the concatenation of their renderings.
    Concat,
    /// Pop N values, push the concatenation of their renderings.
    /// Operand: u16 count
    BuildString,
    /// Replace the top value with its rendering. Null renders as "".
    ToString,
    /// Null passes through.
    StrUpper,
    StrLower,
    StrTrim,
    /// Length in characters.
    StrLen,

    // =========================================================================
    // Formatting (pop value, push formatted string; null renders as "")
    // =========================================================================
    /// Operand: u8 decimals
    FormatFixed,
    /// Operand: u8 minimum digits
    FormatDecimal,
    /// Operand: u8 minimum digits
    FormatHexUpper,
    /// Operand: u8 minimum digits
    FormatHexLower,
    FormatUpper,
    FormatLower,

    // =========================================================================
    // Comparison and logic
    // =========================================================================
    Equal,
    NotEqual,
    Not,

    // =========================================================================
    // Control flow
    // =========================================================================
    /// Unconditional forward jump.
    /// Operand: u16 offset
    Jump,
    /// Pop a bool; jump if false.
    /// Operand: u16 offset
    JumpIfFalse,
    /// Jump if the top of the stack is not null, leaving it in place.
    /// Operand: u16 offset
    JumpIfNotNull,
    /// Pop the return value and leave the function.
    Return,
}

impl OpCode {
    /// Number of operand bytes following this opcode.
    pub fn operand_len(self) -> usize {
        use OpCode::*;
        match self {
            Constant | GetLocal | SetLocal | FormatFixed | FormatDecimal | FormatHexUpper
            | FormatHexLower => 1,
            ConstantWide | BuildString | Jump | JumpIfFalse | JumpIfNotNull => 2,
            GetField => 4,
            _ => 0,
        }
    }

    pub fn from_u8(byte: u8) -> Option<Self> {
        Self::try_from(byte).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_byte() {
        for op in [OpCode::Constant, OpCode::GetField, OpCode::Return] {
            let byte: u8 = op.into();
            assert_eq!(OpCode::from_u8(byte), Some(op));
        }
    }

    #[test]
    fn unknown_byte_is_rejected() {
        assert_eq!(OpCode::from_u8(0xFF), None);
    }

    #[test]
    fn operand_lengths() {
        assert_eq!(OpCode::Return.operand_len(), 0);
        assert_eq!(OpCode::FormatFixed.operand_len(), 1);
        assert_eq!(OpCode::Jump.operand_len(), 2);
        assert_eq!(OpCode::GetField.operand_len(), 4);
    }
}
