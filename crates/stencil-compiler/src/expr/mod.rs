//! Expression compiler.
//!
//! The [`ExprCompiler`] type checks an expression and emits the code that
//! leaves its value on the stack, in one walk. In release builds a constant
//! expression's code is then replaced by its folded value.
//!
//! # Example
//!
//! ```ignore
//! let mut compiler = ExprCompiler::new(&ctx, &scope, &mut emitter);
//! let ty = compiler.infer(expr)?;
//! ```

mod access;
mod interpolation;
mod operators;

use stencil_core::{CompilationError, Span};
use stencil_parser::ast::{Expr, LiteralKind};

use crate::context::CompilationContext;
use crate::emit::BytecodeEmitter;
use crate::fold;
use crate::registry::TypeRegistry;
use crate::scope::LocalScope;
use crate::types::Ty;

type Result<T> = std::result::Result<T, CompilationError>;

/// Compiles expressions of one function body.
pub struct ExprCompiler<'a, 'reg, 'pool> {
    ctx: &'a CompilationContext<'reg>,
    scope: &'a LocalScope,
    emitter: &'a mut BytecodeEmitter<'pool>,
}

impl<'a, 'reg, 'pool> ExprCompiler<'a, 'reg, 'pool> {
    pub fn new(
        ctx: &'a CompilationContext<'reg>,
        scope: &'a LocalScope,
        emitter: &'a mut BytecodeEmitter<'pool>,
    ) -> Self {
        Self {
            ctx,
            scope,
            emitter,
        }
    }

    /// Type check `expr` and emit code that pushes its value.
    pub fn infer(&mut self, expr: &Expr<'_>) -> Result<Ty> {
        let start = self.emitter.current_offset();
        self.emitter.set_span(expr.span());

        let ty = match expr {
            Expr::Literal(lit) => self.compile_literal(&lit.kind)?,
            Expr::Ident(ident) => access::compile_ident(self, ident)?,
            Expr::Member(member) => access::compile_member(self, member)?,
            Expr::MethodCall(call) => access::compile_method_call(self, call)?,
            Expr::Unary(unary) => operators::compile_unary(self, unary)?,
            Expr::Binary(binary) => operators::compile_binary(self, binary)?,
            Expr::Ternary(ternary) => operators::compile_ternary(self, ternary)?,
            Expr::Interpolated(interp) => interpolation::compile_interpolated(self, interp)?,
            Expr::Paren(paren) => self.infer(paren.expr)?,
        };

        if self.folds() && !matches!(expr, Expr::Literal(_)) {
            if let Some(value) = fold::evaluate(expr) {
                self.emitter.truncate(start);
                self.emitter.set_span(expr.span());
                self.emitter.emit_value(&value)?;
            }
        }
        Ok(ty)
    }

    fn compile_literal(&mut self, kind: &LiteralKind<'_>) -> Result<Ty> {
        match *kind {
            LiteralKind::Int(i) => {
                self.emitter.emit_int(i)?;
                Ok(Ty::INT)
            }
            LiteralKind::Float(f) => {
                self.emitter.emit_float(f)?;
                Ok(Ty::FLOAT)
            }
            LiteralKind::Bool(b) => {
                self.emitter.emit_bool(b);
                Ok(Ty::BOOL)
            }
            LiteralKind::String(s) => {
                self.emitter.emit_str(s)?;
                Ok(Ty::STR)
            }
            LiteralKind::Null => {
                self.emitter.emit(crate::bytecode::OpCode::PushNull);
                Ok(Ty::NULL)
            }
        }
    }

    fn folds(&self) -> bool {
        self.ctx.options().folds_constants()
    }

    fn checked(&self) -> bool {
        self.ctx.options().overflow_checks
    }

    fn registry(&self) -> &'reg TypeRegistry {
        self.ctx.registry()
    }

    fn type_name(&self, ty: Ty) -> String {
        self.ctx.type_name(ty)
    }

    fn mismatch(&self, span: Span, message: String) -> CompilationError {
        CompilationError::TypeMismatch { message, span }
    }
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use stencil_core::{FieldKind, FieldShape, ModelShape};
    use stencil_parser::Parser;

    use super::*;
    use crate::bytecode::{ConstantPool, OpCode};
    use crate::options::CompileOptions;
    use crate::types::TyKind;

    fn address() -> ModelShape {
        ModelShape::new("geo::Address", vec![FieldShape::new("City", FieldKind::Str)])
    }

    fn person() -> ModelShape {
        ModelShape::new(
            "app::Person",
            vec![
                FieldShape::new("Name", FieldKind::Str),
                FieldShape::new("Age", FieldKind::Int),
                FieldShape::new("Score", FieldKind::Float),
                FieldShape::new("Nick", FieldKind::Optional(Box::new(FieldKind::Str))),
                FieldShape::new("Home", FieldKind::Object(address)),
                FieldShape::new(
                    "Work",
                    FieldKind::Optional(Box::new(FieldKind::Object(address))),
                ),
            ],
        )
    }

    struct Harness {
        registry: TypeRegistry,
    }

    impl Harness {
        fn new() -> Self {
            let mut registry = TypeRegistry::new();
            registry.register(&person()).unwrap();
            Self { registry }
        }

        fn compile(&self, source: &str, options: CompileOptions) -> (Result<Ty>, Vec<OpCode>) {
            let arena = Bump::new();
            let expr = Parser::parse_expression(source, &arena).unwrap();
            let ctx = CompilationContext::new(&self.registry, options);
            let mut scope = LocalScope::new();
            let model = self.registry.lookup("app::Person").unwrap();
            scope.declare("model", Ty::model(model), Span::default()).unwrap();

            let mut constants = ConstantPool::new();
            let mut emitter = BytecodeEmitter::new(&mut constants);
            let ty = ExprCompiler::new(&ctx, &scope, &mut emitter).infer(expr);
            (ty, emitter.finish().opcodes())
        }

        fn infer(&self, source: &str) -> Result<Ty> {
            self.compile(source, CompileOptions::debug()).0
        }

        fn debug_ops(&self, source: &str) -> Vec<OpCode> {
            let (ty, ops) = self.compile(source, CompileOptions::debug());
            ty.unwrap();
            ops
        }

        fn release_ops(&self, source: &str) -> Vec<OpCode> {
            let (ty, ops) = self.compile(source, CompileOptions::default());
            ty.unwrap();
            ops
        }
    }

    #[test]
    fn field_access() {
        let h = Harness::new();
        assert_eq!(h.infer("model.Name").unwrap(), Ty::STR);
        assert_eq!(h.infer("model.Nick").unwrap(), Ty::STR.nullable_if(true));
        assert_eq!(
            h.debug_ops("model.Home.City"),
            vec![OpCode::GetLocal, OpCode::GetField, OpCode::GetField]
        );
    }

    #[test]
    fn null_propagates_through_optional_models() {
        let h = Harness::new();
        let ty = h.infer("model.Work.City").unwrap();
        assert_eq!(ty, Ty::STR.nullable_if(true));
        assert_eq!(h.infer("model.Work.City.upper()").unwrap(), ty);
    }

    #[test]
    fn unknown_names() {
        let h = Harness::new();
        assert!(matches!(
            h.infer("model.Missing"),
            Err(CompilationError::UnknownField { ref field, .. }) if field == "Missing"
        ));
        assert!(matches!(
            h.infer("other.Name"),
            Err(CompilationError::UnknownVariable { ref name, .. }) if name == "other"
        ));
        assert!(matches!(
            h.infer("model.Age.upper()"),
            Err(CompilationError::UnknownMethod { ref type_name, .. }) if type_name == "int"
        ));
        assert!(matches!(
            h.infer("model.Name.Length"),
            Err(CompilationError::UnknownField { .. })
        ));
    }

    #[test]
    fn methods_take_no_arguments() {
        let h = Harness::new();
        assert!(matches!(
            h.infer("model.Name.upper(1)"),
            Err(CompilationError::InvalidOperation { .. })
        ));
        assert_eq!(h.infer("model.Age.to_string()").unwrap(), Ty::STR);
        assert_eq!(h.infer("model.Name.len()").unwrap(), Ty::INT);
    }

    #[test]
    fn arithmetic_types() {
        let h = Harness::new();
        assert_eq!(h.infer("model.Age + 1").unwrap(), Ty::INT);
        assert_eq!(h.infer("model.Age * model.Score").unwrap(), Ty::FLOAT);
        assert_eq!(h.infer("model.Name + model.Age").unwrap(), Ty::STR);
        assert!(matches!(
            h.infer("model.Age - model.Name"),
            Err(CompilationError::TypeMismatch { .. })
        ));
        assert!(matches!(
            h.infer("model.Nick + 1"),
            Ok(ty) if ty == Ty::STR
        ));
        assert!(matches!(
            h.infer("-model.Name"),
            Err(CompilationError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn overflow_checks_select_opcode() {
        let h = Harness::new();
        let (_, checked) = h.compile("model.Age + 2", CompileOptions::debug());
        assert!(checked.contains(&OpCode::AddIntChecked));
        let (_, wrapping) = h.compile(
            "model.Age + 2",
            CompileOptions::debug().with_overflow_checks(false),
        );
        assert!(wrapping.contains(&OpCode::AddInt));
    }

    #[test]
    fn int_promotes_on_either_side() {
        let h = Harness::new();
        assert_eq!(
            h.debug_ops("model.Age + model.Score"),
            vec![
                OpCode::GetLocal,
                OpCode::GetField,
                OpCode::GetLocal,
                OpCode::GetField,
                OpCode::IntToFloatUnder,
                OpCode::AddFloat,
            ]
        );
        assert!(h.debug_ops("model.Score - model.Age").contains(&OpCode::IntToFloat));
    }

    #[test]
    fn comparisons() {
        let h = Harness::new();
        assert_eq!(h.infer("model.Age == 3").unwrap(), Ty::BOOL);
        assert_eq!(h.infer("model.Nick != null").unwrap(), Ty::BOOL);
        assert!(matches!(
            h.infer("model.Age == model.Name"),
            Err(CompilationError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn ternary_and_coalesce() {
        let h = Harness::new();
        assert_eq!(h.infer("model.Age == 1 ? \"one\" : \"many\"").unwrap(), Ty::STR);
        assert_eq!(
            h.infer("model.Age == 1 ? model.Nick : null").unwrap(),
            Ty::STR.nullable_if(true)
        );
        assert!(matches!(
            h.infer("model.Age ? 1 : 2"),
            Err(CompilationError::TypeMismatch { .. })
        ));
        assert!(matches!(
            h.infer("model.Age == 1 ? 1 : \"x\""),
            Err(CompilationError::TypeMismatch { .. })
        ));
        assert_eq!(h.infer("model.Nick ?? \"anon\"").unwrap(), Ty::STR);
        assert_eq!(
            h.debug_ops("model.Nick ?? \"anon\""),
            vec![
                OpCode::GetLocal,
                OpCode::GetField,
                OpCode::JumpIfNotNull,
                OpCode::Pop,
                OpCode::Constant,
            ]
        );
        assert!(matches!(
            h.infer("model.Nick ?? 3"),
            Err(CompilationError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn release_folds_constants() {
        let h = Harness::new();
        assert_eq!(h.release_ops("1 + 2 * 3"), vec![OpCode::Constant]);
        assert_eq!(h.release_ops("\"a\" + \"b\""), vec![OpCode::Constant]);
        assert_eq!(
            h.debug_ops("\"a\" + \"b\""),
            vec![OpCode::Constant, OpCode::Constant, OpCode::Concat]
        );
        // The product folds; the sum overflows and stays for the VM to report.
        assert_eq!(
            h.release_ops("9223372036854775807 + 2 * 3"),
            vec![OpCode::Constant, OpCode::Constant, OpCode::AddIntChecked]
        );
    }

    #[test]
    fn release_and_debug_agree_on_types() {
        let h = Harness::new();
        for source in ["true ? \"a\" : null", "null ?? 1", "2 * 0.5", "!(1 == 2)"] {
            let debug = h.compile(source, CompileOptions::debug()).0.unwrap();
            let release = h.compile(source, CompileOptions::default()).0.unwrap();
            assert_eq!(debug, release, "{source}");
        }
        assert_eq!(h.infer("null ?? 1").unwrap().kind, TyKind::Int);
    }
}
