//! Static types of unit expressions.

use stencil_core::FieldKind;

use crate::artifact::ValueType;
use crate::registry::{ShapeId, TypeRegistry};

/// The kind part of a [`Ty`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TyKind {
    Str,
    Int,
    Float,
    Bool,
    /// Type of the `null` literal.
    Null,
    Model(ShapeId),
}

/// Type of an expression: a kind plus whether it may be `null` at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ty {
    pub kind: TyKind,
    pub nullable: bool,
}

impl Ty {
    pub const STR: Ty = Ty::new(TyKind::Str);
    pub const INT: Ty = Ty::new(TyKind::Int);
    pub const FLOAT: Ty = Ty::new(TyKind::Float);
    pub const BOOL: Ty = Ty::new(TyKind::Bool);
    pub const NULL: Ty = Ty {
        kind: TyKind::Null,
        nullable: true,
    };

    pub const fn new(kind: TyKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    pub fn model(id: ShapeId) -> Self {
        Self::new(TyKind::Model(id))
    }

    pub fn nullable_if(self, nullable: bool) -> Self {
        Self {
            nullable: self.nullable || nullable,
            ..self
        }
    }

    pub fn non_null(self) -> Self {
        Self {
            nullable: false,
            ..self
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, TyKind::Int | TyKind::Float)
    }

    /// Built-in type for a simple type name.
    pub fn builtin(name: &str) -> Option<Ty> {
        match name {
            "string" => Some(Ty::STR),
            "int" => Some(Ty::INT),
            "float" => Some(Ty::FLOAT),
            "bool" => Some(Ty::BOOL),
            _ => None,
        }
    }

    /// Type of a model field, or `None` for a nested model that was never registered.
    pub fn of_field(kind: &FieldKind, registry: &TypeRegistry) -> Option<Ty> {
        let ty = match kind.base() {
            FieldKind::Bool => Ty::BOOL,
            FieldKind::Int => Ty::INT,
            FieldKind::Float => Ty::FLOAT,
            FieldKind::Str => Ty::STR,
            FieldKind::Object(shape) => Ty::model(registry.id_of(&shape())?),
            FieldKind::Optional(_) => return None,
        };
        Some(ty.nullable_if(kind.is_optional()))
    }

    /// Name used in diagnostics.
    pub fn display(&self, registry: &TypeRegistry) -> String {
        let base = match self.kind {
            TyKind::Str => "string",
            TyKind::Int => "int",
            TyKind::Float => "float",
            TyKind::Bool => "bool",
            TyKind::Null => return "null".to_string(),
            TyKind::Model(id) => registry.shape(id).name.as_str(),
        };
        if self.nullable {
            format!("{base}?")
        } else {
            base.to_string()
        }
    }

    /// The runtime type of a declared parameter or return value. `null` and
    /// nullable types cannot be declared.
    pub fn value_type(&self, registry: &TypeRegistry) -> Option<ValueType> {
        if self.nullable {
            return None;
        }
        Some(match self.kind {
            TyKind::Str => ValueType::Str,
            TyKind::Int => ValueType::Int,
            TyKind::Float => ValueType::Float,
            TyKind::Bool => ValueType::Bool,
            TyKind::Null => return None,
            TyKind::Model(id) => {
                let shape = registry.shape(id);
                ValueType::Model {
                    name: shape.name.clone(),
                    hash: shape.hash,
                }
            }
        })
    }
}
