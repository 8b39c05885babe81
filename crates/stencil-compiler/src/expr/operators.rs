//! Unary, binary, conditional, and null-coalescing operators.

use stencil_core::Span;
use stencil_parser::ast::{BinaryExpr, BinaryOp, TernaryExpr, UnaryExpr, UnaryOp};

use super::{ExprCompiler, Result};
use crate::bytecode::OpCode;
use crate::types::{Ty, TyKind};

pub fn compile_unary(compiler: &mut ExprCompiler<'_, '_, '_>, expr: &UnaryExpr<'_>) -> Result<Ty> {
    let operand = compiler.infer(expr.operand)?;
    compiler.emitter.set_span(expr.span);

    let (op, result) = match (expr.op, operand) {
        (UnaryOp::Not, Ty::BOOL) => (OpCode::Not, Ty::BOOL),
        (UnaryOp::Neg, Ty::INT) if compiler.checked() => (OpCode::NegIntChecked, Ty::INT),
        (UnaryOp::Neg, Ty::INT) => (OpCode::NegInt, Ty::INT),
        (UnaryOp::Neg, Ty::FLOAT) => (OpCode::NegFloat, Ty::FLOAT),
        _ => {
            let message = format!(
                "operator '{}' cannot be applied to {}",
                expr.op,
                compiler.type_name(operand)
            );
            return Err(compiler.mismatch(expr.span, message));
        }
    };
    compiler.emitter.emit(op);
    Ok(result)
}

pub fn compile_binary(compiler: &mut ExprCompiler<'_, '_, '_>, expr: &BinaryExpr<'_>) -> Result<Ty> {
    if expr.op == BinaryOp::Coalesce {
        return compile_coalesce(compiler, expr);
    }

    let left = compiler.infer(expr.left)?;
    let right = compiler.infer(expr.right)?;
    compiler.emitter.set_span(expr.span);

    match expr.op {
        BinaryOp::Equal | BinaryOp::NotEqual => compile_equality(compiler, expr, left, right),
        BinaryOp::Add if left.kind == TyKind::Str || right.kind == TyKind::Str => {
            compiler.emitter.emit(OpCode::Concat);
            Ok(Ty::STR)
        }
        _ => compile_arithmetic(compiler, expr, left, right),
    }
}

/// `+ - *` on numbers. Integers are promoted when mixed with floats.
fn compile_arithmetic(
    compiler: &mut ExprCompiler<'_, '_, '_>,
    expr: &BinaryExpr<'_>,
    left: Ty,
    right: Ty,
) -> Result<Ty> {
    if left.nullable || right.nullable || !left.is_numeric() || !right.is_numeric() {
        let message = format!(
            "operator '{}' cannot be applied to {} and {}",
            expr.op,
            compiler.type_name(left),
            compiler.type_name(right)
        );
        return Err(compiler.mismatch(expr.span, message));
    }

    let checked = compiler.checked();
    if left == Ty::INT && right == Ty::INT {
        let op = match (expr.op, checked) {
            (BinaryOp::Add, true) => OpCode::AddIntChecked,
            (BinaryOp::Sub, true) => OpCode::SubIntChecked,
            (BinaryOp::Mul, true) => OpCode::MulIntChecked,
            (BinaryOp::Add, false) => OpCode::AddInt,
            (BinaryOp::Sub, false) => OpCode::SubInt,
            _ => OpCode::MulInt,
        };
        compiler.emitter.emit(op);
        return Ok(Ty::INT);
    }

    promote(compiler, left, right);
    compiler.emitter.emit(match expr.op {
        BinaryOp::Add => OpCode::AddFloat,
        BinaryOp::Sub => OpCode::SubFloat,
        _ => OpCode::MulFloat,
    });
    Ok(Ty::FLOAT)
}

/// Convert whichever operand is an int when the other is a float.
fn promote(compiler: &mut ExprCompiler<'_, '_, '_>, left: Ty, right: Ty) {
    match (left.kind, right.kind) {
        (TyKind::Int, TyKind::Float) => compiler.emitter.emit(OpCode::IntToFloatUnder),
        (TyKind::Float, TyKind::Int) => compiler.emitter.emit(OpCode::IntToFloat),
        _ => {}
    }
}

/// `==` and `!=`. Operands must have the same type, both be numbers, or one
/// be the `null` literal. Models compare by identity.
fn compile_equality(
    compiler: &mut ExprCompiler<'_, '_, '_>,
    expr: &BinaryExpr<'_>,
    left: Ty,
    right: Ty,
) -> Result<Ty> {
    let comparable = left.kind == right.kind
        || (left.is_numeric() && right.is_numeric())
        || left.kind == TyKind::Null
        || right.kind == TyKind::Null;
    if !comparable {
        let message = format!(
            "cannot compare {} with {}",
            compiler.type_name(left),
            compiler.type_name(right)
        );
        return Err(compiler.mismatch(expr.span, message));
    }

    promote(compiler, left, right);
    compiler.emitter.emit(if expr.op == BinaryOp::Equal {
        OpCode::Equal
    } else {
        OpCode::NotEqual
    });
    Ok(Ty::BOOL)
}

/// `left ?? right`: `right` is evaluated only when `left` is null.
fn compile_coalesce(compiler: &mut ExprCompiler<'_, '_, '_>, expr: &BinaryExpr<'_>) -> Result<Ty> {
    let left = compiler.infer(expr.left)?;
    compiler.emitter.set_span(expr.span);
    let skip = compiler.emitter.emit_jump(OpCode::JumpIfNotNull);
    compiler.emitter.emit(OpCode::Pop);
    let right = compiler.infer(expr.right)?;
    compiler.emitter.set_span(expr.span);
    compiler.emitter.patch_jump(skip)?;

    if left.kind == TyKind::Null {
        return Ok(right);
    }
    if right.kind == TyKind::Null {
        return Ok(left.nullable_if(true));
    }
    if left.kind == right.kind {
        return Ok(Ty {
            kind: left.kind,
            nullable: right.nullable,
        });
    }
    let message = format!(
        "operands of '??' have different types: {} and {}",
        compiler.type_name(left),
        compiler.type_name(right)
    );
    Err(compiler.mismatch(expr.span, message))
}

/// `condition ? then : else`. The condition must be a non-null bool; the
/// branches must agree up to nullability.
pub fn compile_ternary(compiler: &mut ExprCompiler<'_, '_, '_>, expr: &TernaryExpr<'_>) -> Result<Ty> {
    let condition = compiler.infer(expr.condition)?;
    if condition != Ty::BOOL {
        let message = format!(
            "condition must be bool, found {}",
            compiler.type_name(condition)
        );
        return Err(compiler.mismatch(expr.condition.span(), message));
    }

    compiler.emitter.set_span(expr.span);
    let to_else = compiler.emitter.emit_jump(OpCode::JumpIfFalse);
    let then_ty = compiler.infer(expr.then_expr)?;
    compiler.emitter.set_span(expr.span);
    let to_end = compiler.emitter.emit_jump(OpCode::Jump);
    compiler.emitter.patch_jump(to_else)?;
    let else_ty = compiler.infer(expr.else_expr)?;
    compiler.emitter.set_span(expr.span);
    compiler.emitter.patch_jump(to_end)?;

    join(compiler, then_ty, else_ty, expr.span)
}

fn join(compiler: &ExprCompiler<'_, '_, '_>, a: Ty, b: Ty, span: Span) -> Result<Ty> {
    match (a.kind, b.kind) {
        (TyKind::Null, _) => Ok(b.nullable_if(true)),
        (_, TyKind::Null) => Ok(a.nullable_if(true)),
        (x, y) if x == y => Ok(a.nullable_if(b.nullable)),
        _ => {
            let message = format!(
                "branches have different types: {} and {}",
                compiler.type_name(a),
                compiler.type_name(b)
            );
            Err(compiler.mismatch(span, message))
        }
    }
}
