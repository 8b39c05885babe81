//! Function compiler for generating bytecode from function bodies.
//!
//! [`FunctionCompiler`] compiles a single function's body. It handles:
//!
//! - Binding parameters to the first local slots
//! - `let` bindings, each in the next free slot
//! - Checking `return` values against the declared return type
//! - Reporting a body without a `return`, and warning about statements after one
//!
//! Errors are recorded in the [`CompilationContext`] statement by statement,
//! so one bad placeholder does not hide the next.

use stencil_core::{CompilationError, Span};
use stencil_parser::ast::{Block, FunctionDecl, LetStmt, ReturnStmt, Stmt};

use crate::bytecode::{BytecodeChunk, ConstantPool, OpCode};
use crate::context::CompilationContext;
use crate::emit::BytecodeEmitter;
use crate::expr::ExprCompiler;
use crate::scope::LocalScope;
use crate::types::{Ty, TyKind};

type Result<T> = std::result::Result<T, CompilationError>;

/// Compiles a single function body to bytecode.
pub struct FunctionCompiler<'a, 'reg, 'pool> {
    ctx: &'a mut CompilationContext<'reg>,
    emitter: BytecodeEmitter<'pool>,
    scope: LocalScope,
    return_type: Ty,
}

impl<'a, 'reg, 'pool> FunctionCompiler<'a, 'reg, 'pool> {
    pub fn new(
        ctx: &'a mut CompilationContext<'reg>,
        constants: &'pool mut ConstantPool,
        return_type: Ty,
    ) -> Self {
        Self {
            ctx,
            emitter: BytecodeEmitter::new(constants),
            scope: LocalScope::new(),
            return_type,
        }
    }

    /// Bind parameters, in order, to the first slots.
    pub fn declare_params(&mut self, decl: &FunctionDecl<'_>, types: &[Ty]) {
        for (param, ty) in decl.params.iter().zip(types) {
            if let Err(error) = self.scope.declare(param.name.name, *ty, param.name.span) {
                self.ctx.error(error);
            }
        }
    }

    /// Compile the body, recording every error.
    pub fn compile_body(&mut self, decl: &FunctionDecl<'_>) {
        let body: &Block<'_> = &decl.body;
        let mut returned = false;
        for stmt in body.stmts {
            if returned {
                self.ctx.warning(stmt.span(), "unreachable statement after 'return'");
            }
            let result = match stmt {
                Stmt::Let(let_stmt) => self.compile_let(let_stmt),
                Stmt::Return(ret) => self.compile_return(ret),
            };
            if let Err(error) = result {
                self.report(error);
            }
            returned |= matches!(stmt, Stmt::Return(_));
        }

        if !body.returns() {
            self.ctx.error(CompilationError::MissingReturn {
                name: decl.name.name.to_string(),
                span: decl.name.span,
            });
        }
    }

    fn compile_let(&mut self, stmt: &LetStmt<'_>) -> Result<()> {
        let ty = match self.expr_compiler().infer(stmt.value) {
            Ok(ty) => ty,
            Err(error) => {
                self.scope.poison(stmt.name.name);
                return Err(error);
            }
        };
        let slot = self.scope.declare(stmt.name.name, ty, stmt.name.span)?;
        self.emitter.set_span(stmt.span);
        self.emitter.emit_set_local(slot);
        Ok(())
    }

    fn compile_return(&mut self, stmt: &ReturnStmt<'_>) -> Result<()> {
        let ty = self.expr_compiler().infer(stmt.value)?;
        let expected = self.return_type;
        self.emitter.set_span(stmt.span);

        let converts = match (ty.kind, expected.kind) {
            (a, b) if a == b => false,
            (TyKind::Int, TyKind::Float) => true,
            _ => return Err(self.return_mismatch(ty, stmt.value.span())),
        };
        if ty.nullable {
            return Err(self.return_mismatch(ty, stmt.value.span()));
        }
        if converts {
            self.emitter.emit(OpCode::IntToFloat);
        }
        self.emitter.emit(OpCode::Return);
        Ok(())
    }

    fn return_mismatch(&self, found: Ty, span: Span) -> CompilationError {
        CompilationError::TypeMismatch {
            message: format!(
                "function returns {}, found {}",
                self.ctx.type_name(self.return_type),
                self.ctx.type_name(found)
            ),
            span,
        }
    }

    /// Record an error unless it only repeats an earlier failed `let`.
    fn report(&mut self, error: CompilationError) {
        if let CompilationError::UnknownVariable { name, .. } = &error {
            if self.scope.is_poisoned(name) {
                return;
            }
        }
        self.ctx.error(error);
    }

    fn expr_compiler(&mut self) -> ExprCompiler<'_, 'reg, 'pool> {
        ExprCompiler::new(self.ctx, &self.scope, &mut self.emitter)
    }

    /// The function's code and the number of local slots it needs.
    pub fn finish(self) -> (BytecodeChunk, usize) {
        (self.emitter.finish(), self.scope.frame_size())
    }
}
