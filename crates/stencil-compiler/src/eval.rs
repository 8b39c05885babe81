//! Value-level operations shared by the VM and constant folding.
//!
//! Keeping one implementation means a folded constant renders exactly as
//! the same expression would at runtime.

use std::borrow::Cow;

use stencil_core::{RuntimeError, Value};
use stencil_parser::ast::FormatKind;

/// Integer and float arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
}

impl ArithOp {
    pub fn as_str(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
        }
    }
}

/// Failure of an integer operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntError {
    Overflow,
    NotInteger,
}

/// Integer arithmetic over `Int`/`UInt` values.
///
/// A signed operand makes the result signed: it must fit `i64`. Only two
/// `UInt` operands may produce a result above `i64::MAX`. Results that do
/// not fit are an overflow when `checked`, otherwise wrap to 64 bits.
pub fn int_arith(op: ArithOp, a: &Value<'_>, b: &Value<'_>, checked: bool) -> Result<Value<'static>, IntError> {
    let (x, y) = match (a.as_wide(), b.as_wide()) {
        (Some(x), Some(y)) => (x, y),
        _ => return Err(IntError::NotInteger),
    };
    let signed = is_signed(a) || is_signed(b);
    let exact = match op {
        ArithOp::Add => x.checked_add(y),
        ArithOp::Sub => x.checked_sub(y),
        ArithOp::Mul => x.checked_mul(y),
    };
    if let Some(value) = exact.and_then(|v| fit(v, signed)) {
        return Ok(value);
    }
    if checked {
        return Err(IntError::Overflow);
    }
    let (x, y) = (x as i64, y as i64);
    Ok(Value::Int(match op {
        ArithOp::Add => x.wrapping_add(y),
        ArithOp::Sub => x.wrapping_sub(y),
        ArithOp::Mul => x.wrapping_mul(y),
    }))
}

/// Negation. The result is always signed, so `-i64::MIN` overflows.
pub fn int_neg(a: &Value<'_>, checked: bool) -> Result<Value<'static>, IntError> {
    let x = a.as_wide().ok_or(IntError::NotInteger)?;
    match fit(-x, true) {
        Some(value) => Ok(value),
        None if checked => Err(IntError::Overflow),
        None => Ok(Value::Int((x as i64).wrapping_neg())),
    }
}

fn is_signed(value: &Value<'_>) -> bool {
    matches!(value, Value::Int(_))
}

fn fit(v: i128, signed: bool) -> Option<Value<'static>> {
    if signed {
        i64::try_from(v).ok().map(Value::Int)
    } else {
        Value::from_wide(v)
    }
}

pub fn float_arith(op: ArithOp, x: f64, y: f64) -> f64 {
    match op {
        ArithOp::Add => x + y,
        ArithOp::Sub => x - y,
        ArithOp::Mul => x * y,
    }
}

/// Numeric value as `f64`, for int-to-float promotion.
pub fn to_float(value: &Value<'_>) -> Option<f64> {
    match value {
        Value::Int(i) => Some(*i as f64),
        Value::UInt(u) => Some(*u as f64),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

/// Text of a value as it appears in rendered output.
pub fn render<'a>(value: &Value<'a>) -> Cow<'a, str> {
    match value {
        Value::Str(s) => s.clone(),
        Value::Null => Cow::Borrowed(""),
        other => Cow::Owned(other.to_string()),
    }
}

/// String transformations available as methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrOp {
    Upper,
    Lower,
    Trim,
}

pub fn str_op(op: StrOp, s: &str) -> String {
    match op {
        StrOp::Upper => s.to_uppercase(),
        StrOp::Lower => s.to_lowercase(),
        StrOp::Trim => s.trim().to_string(),
    }
}

/// Length of a string in characters.
pub fn str_len(s: &str) -> i64 {
    s.chars().count() as i64
}

/// Apply a hole's format specifier. `null` formats as the empty string.
pub fn apply_format(kind: FormatKind, value: &Value<'_>) -> Result<String, RuntimeError> {
    if value.is_null() {
        return Ok(String::new());
    }
    let mismatch = |expected: &str| RuntimeError::TypeMismatch {
        expected: expected.to_string(),
        actual: value.type_name().to_string(),
    };

    match kind {
        FormatKind::Fixed(decimals) => {
            let x = to_float(value).ok_or_else(|| mismatch("int or float"))?;
            Ok(format!("{x:.prec$}", prec = decimals as usize))
        }
        FormatKind::Decimal(width) => {
            let x = value.as_wide().ok_or_else(|| mismatch("int"))?;
            let sign = if x < 0 { "-" } else { "" };
            Ok(format!("{sign}{:0width$}", x.unsigned_abs(), width = width as usize))
        }
        FormatKind::Hex { upper, width } => {
            let width = width as usize;
            let bits = match value {
                Value::Int(i) => *i as u64,
                Value::UInt(u) => *u,
                _ => return Err(mismatch("int")),
            };
            Ok(if upper {
                format!("{bits:0width$X}")
            } else {
                format!("{bits:0width$x}")
            })
        }
        FormatKind::Upper | FormatKind::Lower => {
            let s = value.as_str().ok_or_else(|| mismatch("string"))?;
            Ok(if kind == FormatKind::Upper {
                s.to_uppercase()
            } else {
                s.to_lowercase()
            })
        }
    }
}
