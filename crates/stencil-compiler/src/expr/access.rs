//! Variables, model fields, and built-in methods.

use stencil_core::CompilationError;
use stencil_parser::ast::{Ident, MemberExpr, MethodCallExpr};

use super::{ExprCompiler, Result};
use crate::bytecode::OpCode;
use crate::types::{Ty, TyKind};

pub fn compile_ident(compiler: &mut ExprCompiler<'_, '_, '_>, ident: &Ident<'_>) -> Result<Ty> {
    let local = compiler
        .scope
        .get(ident.name)
        .ok_or_else(|| CompilationError::UnknownVariable {
            name: ident.name.to_string(),
            span: ident.span,
        })?;
    let (slot, ty) = (local.slot, local.ty);
    compiler.emitter.emit_get_local(slot);
    Ok(ty)
}

/// `object.Field`. Reading a field of a `null` model yields `null`.
pub fn compile_member(compiler: &mut ExprCompiler<'_, '_, '_>, member: &MemberExpr<'_>) -> Result<Ty> {
    let object = compiler.infer(member.object)?;
    let unknown = |compiler: &ExprCompiler<'_, '_, '_>| CompilationError::UnknownField {
        type_name: compiler.type_name(object.non_null()),
        field: member.member.name.to_string(),
        span: member.member.span,
    };

    let TyKind::Model(id) = object.kind else {
        return Err(unknown(compiler));
    };
    let registry = compiler.registry();
    let shape = &registry.shape(id).shape;
    let Some((index, field)) = shape.field(member.member.name) else {
        return Err(unknown(compiler));
    };
    let field_ty = Ty::of_field(&field.kind, registry).ok_or_else(|| CompilationError::UnknownType {
        name: format!("{:?}", field.kind.base()),
        span: member.member.span,
    })?;

    compiler.emitter.set_span(member.span);
    compiler.emitter.emit_get_field(index, field.name)?;
    Ok(field_ty.nullable_if(object.nullable))
}

/// Built-in methods: `upper`, `lower`, `trim`, `len` on strings and
/// `to_string` on every type. String methods pass `null` through;
/// `to_string` renders it as the empty string.
pub fn compile_method_call(
    compiler: &mut ExprCompiler<'_, '_, '_>,
    call: &MethodCallExpr<'_>,
) -> Result<Ty> {
    let receiver = compiler.infer(call.receiver)?;
    let name = call.method.name;

    let (op, result) = match (name, receiver.kind) {
        ("to_string", _) => (OpCode::ToString, Ty::STR),
        ("upper", TyKind::Str) => (OpCode::StrUpper, Ty::STR.nullable_if(receiver.nullable)),
        ("lower", TyKind::Str) => (OpCode::StrLower, Ty::STR.nullable_if(receiver.nullable)),
        ("trim", TyKind::Str) => (OpCode::StrTrim, Ty::STR.nullable_if(receiver.nullable)),
        ("len", TyKind::Str) => (OpCode::StrLen, Ty::INT.nullable_if(receiver.nullable)),
        _ => {
            return Err(CompilationError::UnknownMethod {
                type_name: compiler.type_name(receiver.non_null()),
                method: name.to_string(),
                span: call.method.span,
            });
        }
    };

    if !call.args.is_empty() {
        return Err(CompilationError::InvalidOperation {
            message: format!("method '{name}' takes no arguments, found {}", call.args.len()),
            span: call.span,
        });
    }

    compiler.emitter.set_span(call.span);
    compiler.emitter.emit(op);
    Ok(result)
}
