//! Compilation Pass (Pass 2) - type check function bodies and generate bytecode.
//!
//! Every function that survived registration is compiled by its own
//! [`FunctionCompiler`], all sharing the unit's constant pool.

use rustc_hash::FxHashMap;

use crate::artifact::{CompiledFunction, CompiledType};
use crate::bytecode::ConstantPool;
use crate::context::CompilationContext;
use crate::function_compiler::FunctionCompiler;
use crate::passes::{FunctionSignature, RegistrationOutput};

/// Output of the compilation pass.
#[derive(Debug, Default)]
pub struct CompilationOutput {
    pub constants: ConstantPool,
    /// Compiled types by `module::Type`.
    pub types: FxHashMap<String, CompiledType>,
    pub functions_compiled: usize,
}

/// Pass 2: compile function bodies.
pub struct CompilationPass<'a, 'reg> {
    ctx: &'a mut CompilationContext<'reg>,
    constants: ConstantPool,
}

impl<'a, 'reg> CompilationPass<'a, 'reg> {
    pub fn new(ctx: &'a mut CompilationContext<'reg>) -> Self {
        Self {
            ctx,
            constants: ConstantPool::new(),
        }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self, registration: RegistrationOutput<'_>) -> CompilationOutput {
        let mut types = FxHashMap::default();
        let mut functions_compiled = 0;

        for registered in registration.types {
            let mut compiled = CompiledType::default();
            for signature in &registered.functions {
                compiled.push(self.compile_function(signature));
                functions_compiled += 1;
            }
            types.insert(registered.qualified_name, compiled);
        }

        CompilationOutput {
            constants: self.constants,
            types,
            functions_compiled,
        }
    }

    fn compile_function(&mut self, signature: &FunctionSignature<'_>) -> CompiledFunction {
        let param_types: Vec<_> = signature.params.iter().map(|(ty, _)| *ty).collect();
        let (return_ty, return_type) = &signature.return_type;

        let mut compiler = FunctionCompiler::new(self.ctx, &mut self.constants, *return_ty);
        compiler.declare_params(signature.decl, &param_types);
        compiler.compile_body(signature.decl);
        let (chunk, local_count) = compiler.finish();

        tracing::trace!(
            function = signature.decl.name.name,
            bytes = chunk.len(),
            locals = local_count,
            "compiled function"
        );

        CompiledFunction {
            name: signature.decl.name.name.to_string(),
            params: signature.params.iter().map(|(_, vt)| vt.clone()).collect(),
            return_type: return_type.clone(),
            local_count,
            chunk,
        }
    }
}
