//! Binary operator dispatch on tagged values.
//!
//! Arithmetic keeps the left operand's tag: the right operand is converted
//! into it first and the operation wraps on overflow. Division always
//! produces `float64`. Comparisons produce `bool`; numerics of different
//! tags compare by value without converting either side.

use std::cmp::Ordering;

use sable_core::{RuntimeError, Value};
use sable_parser::BinaryOp;

fn unsupported(op: BinaryOp, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::UnsupportedOperator {
        op: op.as_str().to_string(),
        left: left.type_name(),
        right: right.type_name(),
    }
}

#[cfg_attr(feature = "profiling", profiling::function)]
pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match op {
        BinaryOp::Div => divide(left, right),
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul => arithmetic(op, left, right),
        _ => compare(op, left, right).map(Value::Bool),
    }
}

fn divide(left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => Ok(Value::Float64(a / b)),
        _ => Err(unsupported(BinaryOp::Div, left, right)),
    }
}

macro_rules! wrapping {
    ($op:expr, $a:expr, $b:expr) => {
        match $op {
            BinaryOp::Add => $a.wrapping_add($b),
            BinaryOp::Sub => $a.wrapping_sub($b),
            _ => $a.wrapping_mul($b),
        }
    };
}

macro_rules! float {
    ($op:expr, $a:expr, $b:expr) => {
        match $op {
            BinaryOp::Add => $a + $b,
            BinaryOp::Sub => $a - $b,
            _ => $a * $b,
        }
    };
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, RuntimeError> {
    if let Value::String(a) = left {
        return match (op, right) {
            (BinaryOp::Add, Value::String(b)) => Ok(Value::String(format!("{}{}", a, b))),
            (BinaryOp::Add, Value::Char(c)) => {
                let mut s = a.clone();
                s.push(*c);
                Ok(Value::String(s))
            }
            _ => Err(unsupported(op, left, right)),
        };
    }

    if !left.is_numeric() || !right.is_numeric() {
        return Err(unsupported(op, left, right));
    }
    let right = right.cast(left.primitive())?;

    Ok(match (left, &right) {
        (Value::Byte(a), Value::Byte(b)) => Value::Byte(wrapping!(op, a, *b)),
        (Value::Int8(a), Value::Int8(b)) => Value::Int8(wrapping!(op, a, *b)),
        (Value::Int16(a), Value::Int16(b)) => Value::Int16(wrapping!(op, a, *b)),
        (Value::Int32(a), Value::Int32(b)) => Value::Int32(wrapping!(op, a, *b)),
        (Value::Int64(a), Value::Int64(b)) => Value::Int64(wrapping!(op, a, *b)),
        (Value::UInt8(a), Value::UInt8(b)) => Value::UInt8(wrapping!(op, a, *b)),
        (Value::UInt16(a), Value::UInt16(b)) => Value::UInt16(wrapping!(op, a, *b)),
        (Value::UInt32(a), Value::UInt32(b)) => Value::UInt32(wrapping!(op, a, *b)),
        (Value::UInt64(a), Value::UInt64(b)) => Value::UInt64(wrapping!(op, a, *b)),
        (Value::Float32(a), Value::Float32(b)) => Value::Float32(float!(op, a, b)),
        (Value::Float64(a), Value::Float64(b)) => Value::Float64(float!(op, a, b)),
        _ => return Err(unsupported(op, left, &right)),
    })
}

/// Whether `value` is `null` or a null pointer.
fn is_null(value: &Value) -> bool {
    matches!(value, Value::None | Value::Pointer { target: None, .. })
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<bool, RuntimeError> {
    let equality = matches!(op, BinaryOp::Equal | BinaryOp::NotEqual);

    let ordering = match (left, right) {
        (Value::Bool(a), Value::Bool(b)) if equality => a.cmp(b),
        (Value::Char(a), Value::Char(b)) => a.cmp(b),
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Pointer { target: a, .. }, Value::Pointer { target: b, .. }) if equality => {
            if a == b { Ordering::Equal } else { Ordering::Less }
        }
        (a, b) if equality && (is_null(a) || is_null(b)) && !a.is_numeric() && !b.is_numeric() => {
            if is_null(a) && is_null(b) { Ordering::Equal } else { Ordering::Less }
        }
        (a, b) if a.is_numeric() && b.is_numeric() => match a.numeric_cmp(b) {
            Some(ordering) => ordering,
            // NaN is unordered: only `!=` holds.
            None => return Ok(op == BinaryOp::NotEqual),
        },
        _ => return Err(unsupported(op, left, right)),
    };

    Ok(match op {
        BinaryOp::Equal => ordering == Ordering::Equal,
        BinaryOp::NotEqual => ordering != Ordering::Equal,
        BinaryOp::Less => ordering == Ordering::Less,
        BinaryOp::LessEqual => ordering != Ordering::Greater,
        BinaryOp::Greater => ordering == Ordering::Greater,
        BinaryOp::GreaterEqual => ordering != Ordering::Less,
        _ => return Err(unsupported(op, left, right)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_core::{Primitive, TypeDesc};

    #[test]
    fn arithmetic_keeps_left_type() {
        let v = binary(BinaryOp::Add, &Value::UInt8(5), &Value::Int32(10)).unwrap();
        assert_eq!(v, Value::UInt8(15));

        let v = binary(BinaryOp::Mul, &Value::Int64(7), &Value::Float64(2.9)).unwrap();
        assert_eq!(v, Value::Int64(14));
    }

    #[test]
    fn arithmetic_wraps() {
        let v = binary(BinaryOp::Add, &Value::UInt8(250), &Value::UInt8(10)).unwrap();
        assert_eq!(v, Value::UInt8(4));
        let v = binary(BinaryOp::Sub, &Value::UInt32(0), &Value::UInt32(1)).unwrap();
        assert_eq!(v, Value::UInt32(u32::MAX));
    }

    #[test]
    fn division_is_float64() {
        assert_eq!(
            binary(BinaryOp::Div, &Value::Int32(10), &Value::Int32(2)).unwrap(),
            Value::Float64(5.0)
        );
        assert_eq!(
            binary(BinaryOp::Div, &Value::Float64(10.0), &Value::Float64(2.0)).unwrap(),
            Value::Float64(5.0)
        );
        assert_eq!(
            binary(BinaryOp::Div, &Value::Int32(7), &Value::Int32(2)).unwrap(),
            Value::Float64(3.5)
        );
    }

    #[test]
    fn comparisons() {
        let t = Value::Bool(true);
        assert_eq!(binary(BinaryOp::Less, &Value::Int32(1), &Value::Int32(2)).unwrap(), t);
        assert_eq!(binary(BinaryOp::GreaterEqual, &Value::Float64(2.0), &Value::Int32(2)).unwrap(), t);
        assert_eq!(
            binary(BinaryOp::Less, &Value::String("abc".into()), &Value::String("abd".into())).unwrap(),
            t
        );
        assert_eq!(binary(BinaryOp::Equal, &Value::Char('x'), &Value::Char('x')).unwrap(), t);
        assert_eq!(binary(BinaryOp::NotEqual, &Value::Bool(true), &Value::Bool(false)).unwrap(), t);
    }

    #[test]
    fn mixed_numeric_comparisons_are_exact() {
        let t = Value::Bool(true);
        assert_eq!(binary(BinaryOp::Less, &Value::UInt8(200), &Value::Int32(300)).unwrap(), t);
        assert_eq!(binary(BinaryOp::Less, &Value::Int32(1), &Value::Float64(1.5)).unwrap(), t);
        assert_eq!(binary(BinaryOp::Greater, &Value::UInt32(5), &Value::Int32(-1)).unwrap(), t);
        assert_eq!(
            binary(BinaryOp::Equal, &Value::Int8(-1), &Value::UInt8(255)).unwrap(),
            Value::Bool(false)
        );
        let nan = Value::Float64(f64::NAN);
        assert_eq!(binary(BinaryOp::Equal, &nan, &nan).unwrap(), Value::Bool(false));
        assert_eq!(binary(BinaryOp::NotEqual, &nan, &Value::Int32(1)).unwrap(), t);
    }

    #[test]
    fn bool_has_no_ordering() {
        assert!(binary(BinaryOp::Less, &Value::Bool(true), &Value::Bool(false)).is_err());
        assert!(binary(BinaryOp::Add, &Value::Bool(true), &Value::Bool(false)).is_err());
    }

    #[test]
    fn string_concatenation() {
        let v = binary(BinaryOp::Add, &Value::String("ab".into()), &Value::String("cd".into())).unwrap();
        assert_eq!(v, Value::String("abcd".into()));
        let v = binary(BinaryOp::Add, &Value::String("ab".into()), &Value::Char('!')).unwrap();
        assert_eq!(v, Value::String("ab!".into()));
        assert!(binary(BinaryOp::Sub, &Value::String("ab".into()), &Value::String("b".into())).is_err());
    }

    #[test]
    fn mixed_tags_rejected() {
        let err = binary(BinaryOp::Add, &Value::Int32(1), &Value::String("x".into())).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::UnsupportedOperator {
                op: "+".into(),
                left: "int32".into(),
                right: "string".into(),
            }
        );
    }

    #[test]
    fn null_pointer_equality() {
        let ptr = Value::default_for(
            &TypeDesc::wrap(sable_core::Composition::Pointer, Primitive::Int32.into()).unwrap(),
        );
        assert_eq!(binary(BinaryOp::Equal, &ptr, &Value::None).unwrap(), Value::Bool(true));
        assert_eq!(binary(BinaryOp::NotEqual, &Value::None, &ptr).unwrap(), Value::Bool(false));
    }
}
