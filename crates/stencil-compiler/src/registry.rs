//! Type registry: the reference set a unit is compiled against.
//!
//! The registry knows two things: which namespaces a unit may `use`, and
//! which model types it may name. Registering a model registers the shapes
//! of its nested model fields too, and every namespace prefix of every
//! registered type name, so `use app::models;` resolves once any type in
//! `app::models` is known.
//!
//! The built-in `std` namespace is always present.
//!
//! # Example
//!
//! ```
//! use stencil_compiler::TypeRegistry;
//! use stencil_core::{FieldKind, FieldShape, ModelShape};
//!
//! let mut registry = TypeRegistry::new();
//! let shape = ModelShape::new("app::Person", vec![FieldShape::new("Name", FieldKind::Str)]);
//! let id = registry.register(&shape).unwrap();
//!
//! assert!(registry.has_namespace("std"));
//! assert!(registry.has_namespace("app"));
//! assert_eq!(registry.lookup("app::Person"), Some(id));
//! ```

use rustc_hash::{FxHashMap, FxHashSet};
use stencil_core::{FieldKind, Model, ModelShape, QualifiedName, TypeHash};
use thiserror::Error;

/// Namespace every unit may use.
pub const STD_NAMESPACE: &str = "std";

/// Index of a registered shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeId(u32);

impl ShapeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A model shape as the compiler sees it.
#[derive(Debug, Clone)]
pub struct RegisteredShape {
    /// Normalized name, as a unit spells it.
    pub name: String,
    pub shape: ModelShape,
    /// Identity checked against the model passed at call time.
    pub hash: TypeHash,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("type name '{0}' cannot be spelled in a unit")]
    InvalidTypeName(String),

    #[error("two different types normalize to '{0}'")]
    DuplicateType(String),
}

/// Namespaces and model types visible to a compilation.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    namespaces: FxHashSet<String>,
    shapes: Vec<RegisteredShape>,
    by_name: FxHashMap<String, ShapeId>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut namespaces = FxHashSet::default();
        namespaces.insert(STD_NAMESPACE.to_string());
        Self {
            namespaces,
            shapes: Vec::new(),
            by_name: FxHashMap::default(),
        }
    }

    /// Make a namespace usable without registering any type in it.
    pub fn add_namespace(&mut self, namespace: impl Into<String>) {
        self.namespaces.insert(namespace.into());
    }

    /// Register a model type and, transitively, its nested model fields.
    ///
    /// Registering the same type again returns the existing id.
    pub fn register(&mut self, shape: &ModelShape) -> Result<ShapeId, RegistryError> {
        let name = shape
            .type_name()
            .ok_or_else(|| RegistryError::InvalidTypeName(shape.host_name.to_string()))?;

        if let Some(&id) = self.by_name.get(&name) {
            let existing = &self.shapes[id.index()];
            if existing.hash != shape.type_hash() {
                return Err(RegistryError::DuplicateType(name));
            }
            return Ok(id);
        }

        let qualified = QualifiedName::from_qualified_string(&name);
        self.namespaces.extend(qualified.namespace_prefixes());

        let id = ShapeId(self.shapes.len() as u32);
        self.by_name.insert(name.clone(), id);
        self.shapes.push(RegisteredShape {
            name,
            shape: shape.clone(),
            hash: shape.type_hash(),
        });

        // Inserted before recursing so self-referential shapes terminate.
        for field in &shape.fields {
            if let FieldKind::Object(nested) = field.kind.base() {
                self.register(&nested())?;
            }
        }

        Ok(id)
    }

    pub fn register_model<M: Model>(&mut self) -> Result<ShapeId, RegistryError> {
        self.register(&M::shape())
    }

    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.contains(namespace)
    }

    /// Look up a type by its exact normalized name.
    pub fn lookup(&self, name: &str) -> Option<ShapeId> {
        self.by_name.get(name).copied()
    }

    /// Look up a type as a unit names it: exactly, then under each used namespace.
    pub fn resolve(&self, name: &str, uses: &[String]) -> Option<ShapeId> {
        self.lookup(name).or_else(|| {
            uses.iter()
                .find_map(|ns| self.lookup(&format!("{ns}::{name}")))
        })
    }

    /// The id of an already registered shape.
    pub fn id_of(&self, shape: &ModelShape) -> Option<ShapeId> {
        shape.type_name().and_then(|name| self.lookup(&name))
    }

    pub fn shape(&self, id: ShapeId) -> &RegisteredShape {
        &self.shapes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
