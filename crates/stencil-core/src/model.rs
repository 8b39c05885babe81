//! Model shapes: the host-side description of the data a template renders.
//!
//! A [`Model`] exposes two things. Its [`ModelShape`] (type name plus typed
//! field list) lets the compiler declare the entry-point parameter and check
//! every placeholder at compile time. Its indexed [`Model::field`] accessor
//! lets compiled code read fields without name lookups at render time.
//!
//! `#[derive(Model)]` writes both; hand implementations must keep the field
//! order of `shape()` and `field()` in sync.

use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::{TypeHash, Value, normalize_type_name};

/// A data type that templates can be rendered against.
pub trait Model {
    /// The shape descriptor for this type.
    fn shape() -> ModelShape
    where
        Self: Sized;

    /// The host type name, as in [`ModelShape::host_name`].
    fn type_name(&self) -> &'static str;

    /// Read the field at `index` in [`ModelShape::fields`] order.
    fn field(&self, index: usize) -> Option<Value<'_>>;

    /// Identity used to check a model against a compiled parameter.
    fn type_hash(&self) -> TypeHash {
        TypeHash::from_name(self.type_name())
    }
}

/// Static type of a model field.
#[derive(Clone)]
pub enum FieldKind {
    Bool,
    Int,
    Float,
    Str,
    /// A field that may be unset, read as `null`.
    Optional(Box<FieldKind>),
    /// A nested model. Resolved lazily so self-referential shapes terminate.
    Object(fn() -> ModelShape),
}

impl FieldKind {
    /// Strip any `Optional` layers.
    pub fn base(&self) -> &FieldKind {
        match self {
            FieldKind::Optional(inner) => inner.base(),
            other => other,
        }
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, FieldKind::Optional(_))
    }
}

impl PartialEq for FieldKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldKind::Bool, FieldKind::Bool)
            | (FieldKind::Int, FieldKind::Int)
            | (FieldKind::Float, FieldKind::Float)
            | (FieldKind::Str, FieldKind::Str) => true,
            (FieldKind::Optional(a), FieldKind::Optional(b)) => a == b,
            (FieldKind::Object(a), FieldKind::Object(b)) => a().host_name == b().host_name,
            _ => false,
        }
    }
}

impl fmt::Debug for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Bool => f.write_str("bool"),
            FieldKind::Int => f.write_str("int"),
            FieldKind::Float => f.write_str("float"),
            FieldKind::Str => f.write_str("string"),
            FieldKind::Optional(inner) => write!(f, "{inner:?}?"),
            FieldKind::Object(shape) => f.write_str(shape().host_name),
        }
    }
}

/// One field of a [`ModelShape`].
#[derive(Debug, Clone, PartialEq)]
pub struct FieldShape {
    /// Name placeholders use to reach the field (`model.Name`).
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldShape {
    pub fn new(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind }
    }
}

/// Description of a model type sufficient to declare it in a synthesized unit.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelShape {
    /// Type name as the host reports it, e.g. `app::Wrapper<app::Item>`.
    pub host_name: &'static str,
    pub fields: Vec<FieldShape>,
}

impl ModelShape {
    pub fn new(host_name: &'static str, fields: Vec<FieldShape>) -> Self {
        Self { host_name, fields }
    }

    /// The name the unit language spells this type with, or `None` if the
    /// host name cannot be expressed (anonymous or structural types).
    pub fn type_name(&self) -> Option<String> {
        normalize_type_name(self.host_name)
    }

    pub fn type_hash(&self) -> TypeHash {
        TypeHash::from_name(self.host_name)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn field(&self, name: &str) -> Option<(usize, &FieldShape)> {
        self.fields.iter().enumerate().find(|(_, f)| f.name == name)
    }
}

/// Conversion of a Rust field into a template-visible [`Value`].
///
/// Implemented for strings, scalars, `Option<T>`, and every derived model.
pub trait FieldValue {
    fn kind() -> FieldKind;
    fn to_value(&self) -> Value<'_>;
}

impl FieldValue for String {
    fn kind() -> FieldKind {
        FieldKind::Str
    }
    fn to_value(&self) -> Value<'_> {
        Value::Str(Cow::Borrowed(self))
    }
}

impl FieldValue for &str {
    fn kind() -> FieldKind {
        FieldKind::Str
    }
    fn to_value(&self) -> Value<'_> {
        Value::Str(Cow::Borrowed(self))
    }
}

impl FieldValue for Box<str> {
    fn kind() -> FieldKind {
        FieldKind::Str
    }
    fn to_value(&self) -> Value<'_> {
        Value::Str(Cow::Borrowed(self))
    }
}

impl FieldValue for Arc<str> {
    fn kind() -> FieldKind {
        FieldKind::Str
    }
    fn to_value(&self) -> Value<'_> {
        Value::Str(Cow::Borrowed(self))
    }
}

impl FieldValue for Rc<str> {
    fn kind() -> FieldKind {
        FieldKind::Str
    }
    fn to_value(&self) -> Value<'_> {
        Value::Str(Cow::Borrowed(self))
    }
}

impl FieldValue for Cow<'_, str> {
    fn kind() -> FieldKind {
        FieldKind::Str
    }
    fn to_value(&self) -> Value<'_> {
        Value::Str(Cow::Borrowed(self))
    }
}

impl FieldValue for char {
    fn kind() -> FieldKind {
        FieldKind::Str
    }
    fn to_value(&self) -> Value<'_> {
        Value::Str(Cow::Owned(self.to_string()))
    }
}

impl FieldValue for bool {
    fn kind() -> FieldKind {
        FieldKind::Bool
    }
    fn to_value(&self) -> Value<'_> {
        Value::Bool(*self)
    }
}

macro_rules! signed_field {
    ($($ty:ty),*) => {$(
        impl FieldValue for $ty {
            fn kind() -> FieldKind {
                FieldKind::Int
            }
            fn to_value(&self) -> Value<'_> {
                Value::Int(*self as i64)
            }
        }
    )*};
}

macro_rules! unsigned_field {
    ($($ty:ty),*) => {$(
        impl FieldValue for $ty {
            fn kind() -> FieldKind {
                FieldKind::Int
            }
            fn to_value(&self) -> Value<'_> {
                Value::from_unsigned(*self as u64)
            }
        }
    )*};
}

signed_field!(i8, i16, i32, i64, isize);
unsigned_field!(u8, u16, u32, u64, usize);

impl FieldValue for f32 {
    fn kind() -> FieldKind {
        FieldKind::Float
    }
    fn to_value(&self) -> Value<'_> {
        Value::Float(*self as f64)
    }
}

impl FieldValue for f64 {
    fn kind() -> FieldKind {
        FieldKind::Float
    }
    fn to_value(&self) -> Value<'_> {
        Value::Float(*self)
    }
}

impl<T: FieldValue> FieldValue for Option<T> {
    fn kind() -> FieldKind {
        FieldKind::Optional(Box::new(T::kind()))
    }
    fn to_value(&self) -> Value<'_> {
        match self {
            Some(v) => v.to_value(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pet {
        name: String,
        age: Option<u8>,
    }

    impl Model for Pet {
        fn shape() -> ModelShape {
            ModelShape::new(
                "zoo::Pet",
                vec![
                    FieldShape::new("Name", String::kind()),
                    FieldShape::new("Age", <Option<u8>>::kind()),
                ],
            )
        }

        fn type_name(&self) -> &'static str {
            "zoo::Pet"
        }

        fn field(&self, index: usize) -> Option<Value<'_>> {
            match index {
                0 => Some(self.name.to_value()),
                1 => Some(self.age.to_value()),
                _ => None,
            }
        }
    }

    #[test]
    fn shape_lookup_by_name() {
        let shape = Pet::shape();
        assert_eq!(shape.type_name().as_deref(), Some("zoo::Pet"));
        assert_eq!(shape.field_index("Age"), Some(1));
        assert_eq!(shape.field_index("age"), None);
        let (_, age) = shape.field("Age").unwrap();
        assert!(age.kind.is_optional());
        assert_eq!(*age.kind.base(), FieldKind::Int);
    }

    #[test]
    fn fields_read_by_index() {
        let pet = Pet {
            name: "Rex".into(),
            age: None,
        };
        assert_eq!(pet.field(0), Some(Value::from("Rex")));
        assert_eq!(pet.field(1), Some(Value::Null));
        assert!(pet.field(2).is_none());
        assert_eq!(pet.type_hash(), Pet::shape().type_hash());
    }

    #[test]
    fn object_kinds_compare_by_type() {
        assert_eq!(FieldKind::Object(Pet::shape), FieldKind::Object(Pet::shape));
        assert_ne!(FieldKind::Object(Pet::shape), FieldKind::Str);
        assert_eq!(format!("{:?}", <Option<String>>::kind()), "string?");
    }
}
