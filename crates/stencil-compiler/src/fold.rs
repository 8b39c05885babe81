//! Constant folding for release builds.
//!
//! Folding runs after an expression has been type checked and emitted, and
//! only replaces the emitted code, so debug and release builds accept
//! exactly the same units. An expression folds when every leaf is a literal
//! and evaluating it cannot fail. Anything that would fail (overflow, a
//! format applied to the wrong type) is left for the VM to report.

use std::borrow::Cow;

use stencil_core::Value;
use stencil_parser::ast::{BinaryOp, Expr, Hole, LiteralKind, Segment, UnaryOp};

use crate::eval::{self, ArithOp, StrOp};

/// The value of a constant expression.
pub fn evaluate(expr: &Expr<'_>) -> Option<Value<'static>> {
    match expr {
        Expr::Literal(lit) => Some(match lit.kind {
            LiteralKind::Int(i) => Value::Int(i),
            LiteralKind::Float(f) => Value::Float(f),
            LiteralKind::Bool(b) => Value::Bool(b),
            LiteralKind::String(s) => Value::Str(Cow::Owned(s.to_string())),
            LiteralKind::Null => Value::Null,
        }),
        Expr::Paren(paren) => evaluate(paren.expr),
        Expr::Unary(unary) => {
            let operand = evaluate(unary.operand)?;
            match (unary.op, operand) {
                (UnaryOp::Not, Value::Bool(b)) => Some(Value::Bool(!b)),
                (UnaryOp::Neg, Value::Float(f)) => Some(Value::Float(-f)),
                (UnaryOp::Neg, v) => eval::int_neg(&v, true).ok(),
                _ => None,
            }
        }
        Expr::Binary(binary) => {
            let left = evaluate(binary.left)?;
            if binary.op == BinaryOp::Coalesce {
                return if left.is_null() {
                    evaluate(binary.right)
                } else {
                    None
                };
            }
            let right = evaluate(binary.right)?;
            fold_binary(binary.op, left, right)
        }
        Expr::Ternary(ternary) => {
            let Value::Bool(condition) = evaluate(ternary.condition)? else {
                return None;
            };
            let then_value = evaluate(ternary.then_expr)?;
            let else_value = evaluate(ternary.else_expr)?;
            if !same_kind(&then_value, &else_value) {
                return None;
            }
            Some(if condition { then_value } else { else_value })
        }
        Expr::MethodCall(call) => {
            if !call.args.is_empty() {
                return None;
            }
            let receiver = evaluate(call.receiver)?;
            match (call.method.name, &receiver) {
                ("to_string", _) => Some(Value::Str(Cow::Owned(eval::render(&receiver).into_owned()))),
                (_, Value::Null) => None,
                ("upper", Value::Str(s)) => Some(Value::from(eval::str_op(StrOp::Upper, s))),
                ("lower", Value::Str(s)) => Some(Value::from(eval::str_op(StrOp::Lower, s))),
                ("trim", Value::Str(s)) => Some(Value::from(eval::str_op(StrOp::Trim, s))),
                ("len", Value::Str(s)) => Some(Value::Int(eval::str_len(s))),
                _ => None,
            }
        }
        Expr::Interpolated(interp) => {
            let mut out = String::new();
            for segment in interp.segments {
                match segment {
                    Segment::Text(text) => out.push_str(text),
                    Segment::Hole(hole) => out.push_str(&evaluate_hole(hole)?),
                }
            }
            Some(Value::from(out))
        }
        Expr::Ident(_) | Expr::Member(_) => None,
    }
}

/// The rendered text of a constant interpolation hole.
pub fn evaluate_hole(hole: &Hole<'_>) -> Option<String> {
    let value = evaluate(hole.expr)?;
    match hole.format {
        Some(spec) => eval::apply_format(spec.kind, &value).ok(),
        None => Some(eval::render(&value).into_owned()),
    }
}

fn fold_binary(op: BinaryOp, left: Value<'static>, right: Value<'static>) -> Option<Value<'static>> {
    let arith = match op {
        BinaryOp::Add => ArithOp::Add,
        BinaryOp::Sub => ArithOp::Sub,
        BinaryOp::Mul => ArithOp::Mul,
        BinaryOp::Equal | BinaryOp::NotEqual => {
            let equal = match (eval::to_float(&left), eval::to_float(&right)) {
                (Some(x), Some(y)) if is_float(&left) || is_float(&right) => x == y,
                _ if same_kind(&left, &right) => left == right,
                _ => return None,
            };
            return Some(Value::Bool(equal == (op == BinaryOp::Equal)));
        }
        BinaryOp::Coalesce => return None,
    };

    if op == BinaryOp::Add && (left.as_str().is_some() || right.as_str().is_some()) {
        let mut text = eval::render(&left).into_owned();
        text.push_str(&eval::render(&right));
        return Some(Value::from(text));
    }
    if is_float(&left) || is_float(&right) {
        let x = eval::to_float(&left)?;
        let y = eval::to_float(&right)?;
        return Some(Value::Float(eval::float_arith(arith, x, y)));
    }
    eval::int_arith(arith, &left, &right, true).ok()
}

fn is_float(value: &Value<'_>) -> bool {
    matches!(value, Value::Float(_))
}

/// Whether two constants have the same type, counting `null` as any type.
fn same_kind(a: &Value<'_>, b: &Value<'_>) -> bool {
    a.is_null() || b.is_null() || a.type_name() == b.type_name()
}

#[cfg(test)]
mod tests {
    use bumpalo::Bump;
    use stencil_parser::Parser;

    use super::*;

    fn fold(source: &str) -> Option<Value<'static>> {
        let arena = Bump::new();
        let expr = Parser::parse_expression(source, &arena).unwrap();
        evaluate(expr)
    }

    #[test]
    fn arithmetic() {
        assert_eq!(fold("1 + 2 * 3"), Some(Value::Int(7)));
        assert_eq!(fold("2 * 1.5"), Some(Value::Float(3.0)));
        assert_eq!(fold("-(4 - 9)"), Some(Value::Int(5)));
    }

    #[test]
    fn overflow_is_left_to_runtime() {
        assert_eq!(fold("9223372036854775807 * 9223372036854775807"), None);
    }

    #[test]
    fn string_concatenation_and_methods() {
        assert_eq!(fold("\"a\" + 1"), Some(Value::from("a1")));
        assert_eq!(fold("\" Hi \".trim().upper()"), Some(Value::from("HI")));
        assert_eq!(fold("\"héllo\".len()"), Some(Value::Int(5)));
        assert_eq!(fold("null.to_string()"), Some(Value::from("")));
    }

    #[test]
    fn comparisons_and_conditionals() {
        assert_eq!(fold("1 == 1.0"), Some(Value::Bool(true)));
        assert_eq!(fold("\"a\" != \"b\""), Some(Value::Bool(true)));
        assert_eq!(fold("1 == \"1\""), None);
        assert_eq!(fold("!true ? 1 : 2"), Some(Value::Int(2)));
        assert_eq!(fold("true ? 1 : \"x\""), None);
        assert_eq!(fold("null ?? 4"), Some(Value::Int(4)));
    }

    #[test]
    fn interpolation() {
        assert_eq!(fold("$\"n={1 + 1:D3}!\""), Some(Value::from("n=002!")));
        assert_eq!(fold("$\"{\"x\":D3}\""), None);
        assert_eq!(fold("$\"{model}\""), None);
    }
}
