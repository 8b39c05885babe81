//! Compiled artifacts and the loaded-module interface.
//!
//! An [`Artifact`] is the output of one compilation: every module, type and
//! function of a unit plus the shared constant pool. It is immutable and
//! `Send + Sync`, so one artifact can serve every thread that renders the
//! template it was built from.
//!
//! Calling into an artifact is two lookups and a call, each with its own
//! failure:
//!
//! ```text
//! LoadedModule::resolve_type("module::Type")   -> Option<TypeHandle>
//! TypeHandle::entry_point("Interpolate")       -> Option<EntryPoint>
//! EntryPoint::call(&[Value::Object(&model)])   -> Result<Value, RuntimeError>
//! ```

use std::fmt;

use rustc_hash::FxHashMap;
use stencil_core::{Diagnostics, RuntimeError, TypeHash, Value};

use crate::bytecode::{BytecodeChunk, ConstantPool};
use crate::vm::Vm;

/// Declared type of a parameter or return value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    Str,
    Int,
    Float,
    Bool,
    Model { name: String, hash: TypeHash },
}

impl ValueType {
    /// Whether a call-time argument has this type.
    pub fn accepts(&self, value: &Value<'_>) -> bool {
        match (self, value) {
            (ValueType::Str, Value::Str(_))
            | (ValueType::Int, Value::Int(_) | Value::UInt(_))
            | (ValueType::Float, Value::Float(_))
            | (ValueType::Bool, Value::Bool(_)) => true,
            (ValueType::Model { hash, .. }, Value::Object(model)) => model.type_hash() == *hash,
            _ => false,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Str => f.write_str("string"),
            ValueType::Int => f.write_str("int"),
            ValueType::Float => f.write_str("float"),
            ValueType::Bool => f.write_str("bool"),
            ValueType::Model { name, .. } => f.write_str(name),
        }
    }
}

/// A compiled function.
#[derive(Debug, Clone)]
pub struct CompiledFunction {
    pub name: String,
    pub params: Vec<ValueType>,
    pub return_type: ValueType,
    /// Slots for parameters and `let` bindings.
    pub local_count: usize,
    pub chunk: BytecodeChunk,
}

/// A compiled type: a named group of functions.
#[derive(Debug, Clone, Default)]
pub struct CompiledType {
    functions: Vec<CompiledFunction>,
}

impl CompiledType {
    pub(crate) fn push(&mut self, function: CompiledFunction) {
        self.functions.push(function);
    }

    pub fn function(&self, name: &str) -> Option<&CompiledFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn functions(&self) -> &[CompiledFunction] {
        &self.functions
    }
}

/// The loaded output of compiling one unit.
#[derive(Debug, Clone, Default)]
pub struct Artifact {
    constants: ConstantPool,
    /// Types by `module::Type`.
    types: FxHashMap<String, CompiledType>,
    /// Warnings from a successful compilation.
    warnings: Diagnostics,
}

impl Artifact {
    pub(crate) fn new(
        constants: ConstantPool,
        types: FxHashMap<String, CompiledType>,
        warnings: Diagnostics,
    ) -> Self {
        Self {
            constants,
            types,
            warnings,
        }
    }

    pub fn constants(&self) -> &ConstantPool {
        &self.constants
    }

    pub fn warnings(&self) -> &Diagnostics {
        &self.warnings
    }

    /// Qualified names of every compiled type.
    pub fn type_names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }
}

/// Code loaded into the process that can be looked up by name and called.
pub trait LoadedModule {
    /// Find a type by its qualified `module::Type` name.
    fn resolve_type(&self, qualified: &str) -> Option<TypeHandle<'_>>;
}

impl LoadedModule for Artifact {
    fn resolve_type(&self, qualified: &str) -> Option<TypeHandle<'_>> {
        let ty = self.types.get(qualified)?;
        Some(TypeHandle {
            artifact: self,
            ty,
        })
    }
}

/// A type resolved inside a loaded module.
#[derive(Clone, Copy)]
pub struct TypeHandle<'m> {
    artifact: &'m Artifact,
    ty: &'m CompiledType,
}

impl<'m> TypeHandle<'m> {
    pub fn entry_point(&self, name: &str) -> Option<EntryPoint<'m>> {
        let function = self.ty.function(name)?;
        Some(EntryPoint {
            artifact: self.artifact,
            function,
        })
    }
}

/// A callable function inside a loaded module.
#[derive(Clone, Copy)]
pub struct EntryPoint<'m> {
    artifact: &'m Artifact,
    function: &'m CompiledFunction,
}

impl<'m> EntryPoint<'m> {
    pub fn name(&self) -> &'m str {
        &self.function.name
    }

    pub fn params(&self) -> &'m [ValueType] {
        &self.function.params
    }

    /// Check the arguments against the declared parameters and run the function.
    ///
    /// The result may borrow from the arguments and from the artifact's constants.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn call<'a>(&self, args: &[Value<'a>]) -> Result<Value<'a>, RuntimeError>
    where
        'm: 'a,
    {
        let params = &self.function.params;
        if args.len() != params.len() {
            return Err(RuntimeError::ArgumentCount {
                expected: params.len(),
                actual: args.len(),
            });
        }
        for (index, (param, arg)) in params.iter().zip(args).enumerate() {
            if !param.accepts(arg) {
                return Err(RuntimeError::ArgumentMismatch {
                    index,
                    expected: param.to_string(),
                    actual: arg.type_name().to_string(),
                });
            }
        }

        tracing::trace!(function = %self.function.name, "entering VM");
        Vm::new(self.function, &self.artifact.constants, args).run()
    }
}

impl fmt::Debug for EntryPoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPoint")
            .field("name", &self.function.name)
            .field("params", &self.function.params)
            .finish()
    }
}

impl fmt::Debug for TypeHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.ty.functions.iter().map(|f| f.name.as_str()).collect();
        f.debug_struct("TypeHandle").field("functions", &names).finish()
    }
}
