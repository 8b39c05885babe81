//! Constant pool for compiled artifacts.
//!
//! The constant pool stores the values bytecode instructions refer to by
//! index: numeric literals, literal text, and field names for diagnostics.

use std::borrow::Cow;

use ordered_float::OrderedFloat;
use rustc_hash::FxHashMap;
use stencil_core::Value;

/// Values stored in the constant pool.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int(i64),
    /// Unsigned values above `i64::MAX`.
    UInt(u64),
    Float(f64),
    Str(String),
}

impl Constant {
    /// The constant as a VM value, borrowing string data from the pool.
    pub fn to_value(&self) -> Value<'_> {
        match self {
            Constant::Int(v) => Value::Int(*v),
            Constant::UInt(v) => Value::UInt(*v),
            Constant::Float(v) => Value::Float(*v),
            Constant::Str(s) => Value::Str(Cow::Borrowed(s)),
        }
    }
}

/// Artifact-level constant pool with deduplication.
#[derive(Debug, Clone, Default)]
pub struct ConstantPool {
    constants: Vec<Constant>,
    /// Deduplication index: maps constant to its index.
    index: FxHashMap<ConstantKey, u32>,
}

/// Hashable version of [`Constant`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ConstantKey {
    Int(i64),
    UInt(u64),
    Float(OrderedFloat<f64>),
    Str(String),
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or get existing constant, returns index.
    pub fn add(&mut self, constant: Constant) -> u32 {
        let key = Self::to_key(&constant);

        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }

        let idx = self.constants.len() as u32;
        self.constants.push(constant);
        self.index.insert(key, idx);
        idx
    }

    pub fn add_str(&mut self, value: &str) -> u32 {
        self.add(Constant::Str(value.to_string()))
    }

    pub fn get(&self, index: u32) -> Option<&Constant> {
        self.constants.get(index as usize)
    }

    /// The string constant at `index`, if it is one.
    pub fn get_str(&self, index: u32) -> Option<&str> {
        match self.get(index)? {
            Constant::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn constants(&self) -> &[Constant] {
        &self.constants
    }

    pub fn len(&self) -> usize {
        self.constants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constants.is_empty()
    }

    fn to_key(constant: &Constant) -> ConstantKey {
        match constant {
            Constant::Int(v) => ConstantKey::Int(*v),
            Constant::UInt(v) => ConstantKey::UInt(*v),
            Constant::Float(v) => ConstantKey::Float(OrderedFloat(*v)),
            Constant::Str(s) => ConstantKey::Str(s.clone()),
        }
    }
}
