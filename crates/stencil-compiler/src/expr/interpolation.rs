//! Interpolated strings.
//!
//! Each literal segment becomes a string constant and each hole pushes its
//! value (formatted when it has a specifier), then `BuildString` renders
//! and joins the pieces. Release builds fold constant holes into the
//! surrounding text and merge adjacent literal pieces.

use stencil_core::CompilationError;
use stencil_parser::ast::{FormatKind, FormatSpec, Hole, InterpolatedExpr, Segment};

use super::{ExprCompiler, Result};
use crate::bytecode::OpCode;
use crate::fold;
use crate::types::{Ty, TyKind};

pub fn compile_interpolated(
    compiler: &mut ExprCompiler<'_, '_, '_>,
    interp: &InterpolatedExpr<'_>,
) -> Result<Ty> {
    let mut pieces = Pieces::default();

    for segment in interp.segments {
        match segment {
            Segment::Text(text) => {
                pieces.text(compiler, text)?;
            }
            Segment::Hole(hole) => {
                let folded = if compiler.folds() {
                    fold::evaluate_hole(hole)
                } else {
                    None
                };
                match folded {
                    Some(text) => {
                        // Still type checked, so release rejects what debug rejects.
                        let start = compiler.emitter.current_offset();
                        compile_hole(compiler, hole)?;
                        compiler.emitter.truncate(start);
                        pieces.text(compiler, &text)?;
                    }
                    None => {
                        pieces.flush(compiler)?;
                        compile_hole(compiler, hole)?;
                        pieces.count += 1;
                        pieces.only_text = false;
                    }
                }
            }
        }
    }
    pieces.flush(compiler)?;

    compiler.emitter.set_span(interp.span);
    match (pieces.count, pieces.only_text) {
        (0, _) => compiler.emitter.emit_str("")?,
        (1, true) => {}
        (count, _) => compiler
            .emitter
            .emit_count(OpCode::BuildString, count, "interpolation segments")?,
    }
    Ok(Ty::STR)
}

/// Pieces pushed so far, plus literal text not yet emitted.
#[derive(Default)]
struct Pieces {
    count: usize,
    pending: Option<String>,
    /// Every piece pushed so far is a string constant.
    only_text: bool,
}

impl Pieces {
    fn text(&mut self, compiler: &mut ExprCompiler<'_, '_, '_>, text: &str) -> Result<()> {
        if compiler.folds() {
            self.pending.get_or_insert_with(String::new).push_str(text);
            Ok(())
        } else {
            self.push_text(compiler, text)
        }
    }

    fn flush(&mut self, compiler: &mut ExprCompiler<'_, '_, '_>) -> Result<()> {
        match self.pending.take() {
            Some(text) => self.push_text(compiler, &text),
            None => Ok(()),
        }
    }

    fn push_text(&mut self, compiler: &mut ExprCompiler<'_, '_, '_>, text: &str) -> Result<()> {
        compiler.emitter.emit_str(text)?;
        self.only_text = self.count == 0 || self.only_text;
        self.count += 1;
        Ok(())
    }
}

fn compile_hole(compiler: &mut ExprCompiler<'_, '_, '_>, hole: &Hole<'_>) -> Result<()> {
    let ty = compiler.infer(hole.expr)?;
    if let Some(spec) = hole.format {
        compile_format(compiler, ty, spec)?;
    }
    Ok(())
}

fn compile_format(compiler: &mut ExprCompiler<'_, '_, '_>, ty: Ty, spec: FormatSpec) -> Result<()> {
    let applies = match spec.kind {
        FormatKind::Fixed(_) => ty.is_numeric(),
        FormatKind::Decimal(_) | FormatKind::Hex { .. } => ty.kind == TyKind::Int,
        FormatKind::Upper | FormatKind::Lower => ty.kind == TyKind::Str,
    };
    if !applies && ty.kind != TyKind::Null {
        return Err(CompilationError::InvalidFormat {
            spec: spec.kind.to_string(),
            type_name: compiler.type_name(ty),
            span: spec.span,
        });
    }

    compiler.emitter.set_span(spec.span);
    match spec.kind {
        FormatKind::Fixed(n) => compiler.emitter.emit_byte(OpCode::FormatFixed, n),
        FormatKind::Decimal(n) => compiler.emitter.emit_byte(OpCode::FormatDecimal, n),
        FormatKind::Hex { upper: true, width } => compiler.emitter.emit_byte(OpCode::FormatHexUpper, width),
        FormatKind::Hex { upper: false, width } => compiler.emitter.emit_byte(OpCode::FormatHexLower, width),
        FormatKind::Upper => compiler.emitter.emit(OpCode::FormatUpper),
        FormatKind::Lower => compiler.emitter.emit(OpCode::FormatLower),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use stencil_core::{FieldKind, FieldShape, ModelShape, Span};
    use stencil_parser::Parser;

    use super::*;
    use crate::bytecode::{Constant, ConstantPool};
    use crate::context::CompilationContext;
    use crate::emit::BytecodeEmitter;
    use crate::options::CompileOptions;
    use crate::registry::TypeRegistry;
    use crate::scope::LocalScope;

    fn person() -> ModelShape {
        ModelShape::new(
            "app::Person",
            vec![
                FieldShape::new("Name", FieldKind::Str),
                FieldShape::new("Age", FieldKind::Int),
            ],
        )
    }

    fn compile(source: &str, options: CompileOptions) -> (Result<Ty>, Vec<OpCode>, ConstantPool) {
        let mut registry = TypeRegistry::new();
        let id = registry.register(&person()).unwrap();
        let arena = Bump::new();
        let expr = Parser::parse_expression(source, &arena).unwrap();
        let ctx = CompilationContext::new(&registry, options);
        let mut scope = LocalScope::new();
        scope.declare("model", Ty::model(id), Span::default()).unwrap();

        let mut constants = ConstantPool::new();
        let mut emitter = BytecodeEmitter::new(&mut constants);
        let ty = ExprCompiler::new(&ctx, &scope, &mut emitter).infer(expr);
        let ops = emitter.finish().opcodes();
        (ty, ops, constants)
    }

    #[test]
    fn debug_emits_every_segment() {
        let (ty, ops, _) = compile("$\"hello {model.Name}, age {model.Age}\"", CompileOptions::debug());
        assert_eq!(ty.unwrap(), Ty::STR);
        assert_eq!(
            ops,
            vec![
                OpCode::Constant,
                OpCode::GetLocal,
                OpCode::GetField,
                OpCode::Constant,
                OpCode::GetLocal,
                OpCode::GetField,
                OpCode::BuildString,
            ]
        );
    }

    #[test]
    fn release_merges_constant_holes_into_text() {
        let (_, ops, constants) = compile(
            "$\"a{1 + 1}b{model.Name}c{\"d\"}\"",
            CompileOptions::default(),
        );
        assert_eq!(
            ops,
            vec![
                OpCode::Constant,
                OpCode::GetLocal,
                OpCode::GetField,
                OpCode::Constant,
                OpCode::BuildString,
            ]
        );
        let texts: Vec<_> = constants
            .constants()
            .iter()
            .filter_map(|c| match c {
                Constant::Str(s) => Some(s.as_str()),
                _ => None,
            })
            .collect();
        assert!(texts.contains(&"a2b"));
        assert!(texts.contains(&"cd"));
    }

    #[test]
    fn hole_free_interpolation_is_one_constant() {
        let (_, ops, _) = compile("$\"just text\"", CompileOptions::default());
        assert_eq!(ops, vec![OpCode::Constant]);
        let (_, ops, _) = compile("$\"\"", CompileOptions::debug());
        assert_eq!(ops, vec![OpCode::Constant]);
    }

    #[test]
    fn format_applicability() {
        let (ty, ops, _) = compile("$\"{model.Age:D3}\"", CompileOptions::debug());
        assert_eq!(ty.unwrap(), Ty::STR);
        assert!(ops.contains(&OpCode::FormatDecimal));

        let (ty, _, _) = compile("$\"{model.Name:F2}\"", CompileOptions::debug());
        assert!(matches!(
            ty,
            Err(CompilationError::InvalidFormat { ref spec, ref type_name, .. })
                if spec == "F2" && type_name == "string"
        ));
    }

    #[test]
    fn release_still_rejects_what_debug_rejects() {
        let (ty, _, _) = compile("$\"{true + 1}\"", CompileOptions::default());
        assert!(matches!(ty, Err(CompilationError::TypeMismatch { .. })));
    }
}
