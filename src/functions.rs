//! Stock function vocabulary entries.
//!
//! Ready-made [`Function`] values for assembling vocabularies. Nothing here
//! is registered implicitly; callers pass the entries they want into a
//! [`Vocabulary`](crate::Vocabulary) explicitly. Division and modulo are
//! protected: a zero divisor yields 0 instead of failing, so evolved
//! programs never abort mid-evaluation.

use crate::tree::Function;
use crate::types::{NodeType, Value};

/// Typed float addition.
#[must_use]
pub fn add2floats() -> Function {
    Function::typed(
        "add2floats",
        vec![NodeType::Float, NodeType::Float],
        NodeType::Float,
        |args| Value::Float(args[0].as_f64() + args[1].as_f64()),
    )
}

/// Typed float subtraction.
#[must_use]
pub fn sub2floats() -> Function {
    Function::typed(
        "sub2floats",
        vec![NodeType::Float, NodeType::Float],
        NodeType::Float,
        |args| Value::Float(args[0].as_f64() - args[1].as_f64()),
    )
}

/// Typed float multiplication.
#[must_use]
pub fn mul2floats() -> Function {
    Function::typed(
        "mul2floats",
        vec![NodeType::Float, NodeType::Float],
        NodeType::Float,
        |args| Value::Float(args[0].as_f64() * args[1].as_f64()),
    )
}

/// Typed float division (protected: zero divisor yields 0).
#[must_use]
pub fn div2floats() -> Function {
    Function::typed(
        "div2floats",
        vec![NodeType::Float, NodeType::Float],
        NodeType::Float,
        |args| {
            let divisor = args[1].as_f64();
            if divisor.abs() > 0.0 {
                Value::Float(args[0].as_f64() / divisor)
            } else {
                Value::Float(0.0)
            }
        },
    )
}

/// Typed float greater-than comparison.
#[must_use]
pub fn gt2floats() -> Function {
    Function::typed(
        "gt2floats",
        vec![NodeType::Float, NodeType::Float],
        NodeType::Bool,
        |args| Value::Bool(args[0].as_f64() > args[1].as_f64()),
    )
}

/// Typed integer addition (saturating).
#[must_use]
pub fn add2ints() -> Function {
    Function::typed(
        "add2ints",
        vec![NodeType::Int, NodeType::Int],
        NodeType::Int,
        |args| Value::Int(args[0].as_i64().saturating_add(args[1].as_i64())),
    )
}

/// Typed integer subtraction (saturating).
#[must_use]
pub fn sub2ints() -> Function {
    Function::typed(
        "sub2ints",
        vec![NodeType::Int, NodeType::Int],
        NodeType::Int,
        |args| Value::Int(args[0].as_i64().saturating_sub(args[1].as_i64())),
    )
}

/// Typed integer multiplication (saturating).
#[must_use]
pub fn mul2ints() -> Function {
    Function::typed(
        "mul2ints",
        vec![NodeType::Int, NodeType::Int],
        NodeType::Int,
        |args| Value::Int(args[0].as_i64().saturating_mul(args[1].as_i64())),
    )
}

/// Typed integer division (protected: zero divisor yields 0).
#[must_use]
pub fn div2ints() -> Function {
    Function::typed(
        "div2ints",
        vec![NodeType::Int, NodeType::Int],
        NodeType::Int,
        |args| {
            let divisor = args[1].as_i64();
            if divisor == 0 {
                Value::Int(0)
            } else {
                Value::Int(args[0].as_i64().wrapping_div(divisor))
            }
        },
    )
}

/// Typed boolean conjunction.
#[must_use]
pub fn and2bools() -> Function {
    Function::typed(
        "and2bools",
        vec![NodeType::Bool, NodeType::Bool],
        NodeType::Bool,
        |args| Value::Bool(args[0].as_bool() && args[1].as_bool()),
    )
}

/// Typed boolean disjunction.
#[must_use]
pub fn or2bools() -> Function {
    Function::typed(
        "or2bools",
        vec![NodeType::Bool, NodeType::Bool],
        NodeType::Bool,
        |args| Value::Bool(args[0].as_bool() || args[1].as_bool()),
    )
}

/// Typed boolean negation.
#[must_use]
pub fn not1bool() -> Function {
    Function::typed("not1bool", vec![NodeType::Bool], NodeType::Bool, |args| {
        Value::Bool(!args[0].as_bool())
    })
}

fn promote(a: Value, b: Value, int_op: fn(i64, i64) -> i64, float_op: fn(f64, f64) -> f64) -> Value {
    match (a, b) {
        (Value::Int(a), Value::Int(b)) => Value::Int(int_op(a, b)),
        _ => Value::Float(float_op(a.as_f64(), b.as_f64())),
    }
}

/// Untyped addition with numeric promotion.
#[must_use]
pub fn untyped_add() -> Function {
    Function::untyped("add", 2, |args| {
        promote(args[0], args[1], i64::saturating_add, |a, b| a + b)
    })
}

/// Untyped subtraction with numeric promotion.
#[must_use]
pub fn untyped_sub() -> Function {
    Function::untyped("sub", 2, |args| {
        promote(args[0], args[1], i64::saturating_sub, |a, b| a - b)
    })
}

/// Untyped multiplication with numeric promotion.
#[must_use]
pub fn untyped_mul() -> Function {
    Function::untyped("mul", 2, |args| {
        promote(args[0], args[1], i64::saturating_mul, |a, b| a * b)
    })
}

/// Untyped division (protected: zero divisor yields 0).
#[must_use]
pub fn untyped_div() -> Function {
    Function::untyped("div", 2, |args| {
        let divisor = args[1].as_f64();
        if divisor.abs() > 0.0 {
            Value::Float(args[0].as_f64() / divisor)
        } else {
            Value::Float(0.0)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protected_division() {
        let div = div2floats();
        assert_eq!(
            div.call(&[Value::Float(1.0), Value::Float(0.0)]),
            Value::Float(0.0)
        );
        assert_eq!(
            div.call(&[Value::Float(6.0), Value::Float(2.0)]),
            Value::Float(3.0)
        );

        let idiv = div2ints();
        assert_eq!(idiv.call(&[Value::Int(5), Value::Int(0)]), Value::Int(0));
        assert_eq!(idiv.call(&[Value::Int(7), Value::Int(2)]), Value::Int(3));
    }

    #[test]
    fn test_untyped_promotion() {
        let add = untyped_add();
        assert_eq!(add.call(&[Value::Int(1), Value::Int(2)]), Value::Int(3));
        assert_eq!(
            add.call(&[Value::Int(1), Value::Float(2.5)]),
            Value::Float(3.5)
        );
    }

    #[test]
    fn test_bool_logic() {
        assert_eq!(
            and2bools().call(&[Value::Bool(true), Value::Bool(false)]),
            Value::Bool(false)
        );
        assert_eq!(
            or2bools().call(&[Value::Bool(true), Value::Bool(false)]),
            Value::Bool(true)
        );
        assert_eq!(not1bool().call(&[Value::Bool(true)]), Value::Bool(false));
    }

    #[test]
    fn test_comparison_returns_bool() {
        let gt = gt2floats();
        assert_eq!(gt.return_type(), Some(NodeType::Bool));
        assert_eq!(
            gt.call(&[Value::Float(2.0), Value::Float(1.0)]),
            Value::Bool(true)
        );
    }
}
