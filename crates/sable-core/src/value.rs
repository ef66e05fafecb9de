//! Tagged runtime values.
//!
//! Every [`Value`] variant is its own type tag. Composite values carry the
//! full [`TypeDesc`] they were created with so that growing a list or
//! inserting into a map knows what the new elements must look like.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use ordered_float::OrderedFloat;

use crate::error::RuntimeError;
use crate::types::{Composition, Primitive, TypeDesc};

/// A runtime value together with its type tag.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    /// The "no type" value: results of functions without a return, and `null`.
    None,
    Bool(bool),
    Char(char),
    Byte(u8),
    String(String),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    /// Lists, vectors and tensors.
    List { ty: TypeDesc, items: Vec<Value> },
    Map {
        ty: TypeDesc,
        entries: BTreeMap<MapKey, Value>,
    },
    Pointer { ty: TypeDesc, target: Option<usize> },
}

/// Totally ordered projection of a comparable value, used as a map key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MapKey {
    Bool(bool),
    Char(char),
    Signed(i64),
    Unsigned(u64),
    Float(OrderedFloat<f64>),
    String(String),
}

impl fmt::Display for MapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapKey::Bool(v) => write!(f, "{}", v),
            MapKey::Char(v) => write!(f, "'{}'", v),
            MapKey::Signed(v) => write!(f, "{}", v),
            MapKey::Unsigned(v) => write!(f, "{}", v),
            MapKey::Float(v) => write!(f, "{}", v),
            MapKey::String(v) => write!(f, "\"{}\"", v),
        }
    }
}

/// Numeric payload widened for conversion.
#[derive(Debug, Clone, Copy)]
enum Num {
    Signed(i64),
    Unsigned(u64),
    Float(f64),
}

macro_rules! num_as {
    ($num:expr, $ty:ty) => {
        match $num {
            Num::Signed(v) => v as $ty,
            Num::Unsigned(v) => v as $ty,
            Num::Float(v) => v as $ty,
        }
    };
}

impl Value {
    /// The default value for a freshly bound cell of type `ty`.
    pub fn default_for(ty: &TypeDesc) -> Value {
        match ty.composition {
            Composition::None => match ty.primitive {
                Primitive::None => Value::None,
                Primitive::Bool => Value::Bool(false),
                Primitive::Char => Value::Char('\0'),
                Primitive::Byte => Value::Byte(0),
                Primitive::String => Value::String(String::new()),
                Primitive::Int8 => Value::Int8(0),
                Primitive::Int16 => Value::Int16(0),
                Primitive::Int32 => Value::Int32(0),
                Primitive::Int64 => Value::Int64(0),
                Primitive::UInt8 => Value::UInt8(0),
                Primitive::UInt16 => Value::UInt16(0),
                Primitive::UInt32 => Value::UInt32(0),
                Primitive::UInt64 => Value::UInt64(0),
                Primitive::Float32 => Value::Float32(0.0),
                Primitive::Float64 => Value::Float64(0.0),
            },
            Composition::List | Composition::Vector | Composition::Tensor => Value::List {
                ty: ty.clone(),
                items: Vec::new(),
            },
            Composition::Map => Value::Map {
                ty: ty.clone(),
                entries: BTreeMap::new(),
            },
            Composition::Pointer => Value::Pointer {
                ty: ty.clone(),
                target: None,
            },
        }
    }

    /// The primitive tag, `Primitive::None` for composites and `none`.
    pub fn primitive(&self) -> Primitive {
        match self {
            Value::None => Primitive::None,
            Value::Bool(_) => Primitive::Bool,
            Value::Char(_) => Primitive::Char,
            Value::Byte(_) => Primitive::Byte,
            Value::String(_) => Primitive::String,
            Value::Int8(_) => Primitive::Int8,
            Value::Int16(_) => Primitive::Int16,
            Value::Int32(_) => Primitive::Int32,
            Value::Int64(_) => Primitive::Int64,
            Value::UInt8(_) => Primitive::UInt8,
            Value::UInt16(_) => Primitive::UInt16,
            Value::UInt32(_) => Primitive::UInt32,
            Value::UInt64(_) => Primitive::UInt64,
            Value::Float32(_) => Primitive::Float32,
            Value::Float64(_) => Primitive::Float64,
            Value::List { .. } | Value::Map { .. } | Value::Pointer { .. } => Primitive::None,
        }
    }

    /// Full type descriptor of this value.
    pub fn type_desc(&self) -> TypeDesc {
        match self {
            Value::List { ty, .. } | Value::Map { ty, .. } | Value::Pointer { ty, .. } => {
                ty.clone()
            }
            other => TypeDesc::primitive(other.primitive()),
        }
    }

    pub fn type_name(&self) -> String {
        self.type_desc().to_string()
    }

    pub fn is_numeric(&self) -> bool {
        self.primitive().is_numeric()
    }

    fn num(&self) -> Option<Num> {
        Some(match *self {
            Value::Byte(v) => Num::Unsigned(v as u64),
            Value::Int8(v) => Num::Signed(v as i64),
            Value::Int16(v) => Num::Signed(v as i64),
            Value::Int32(v) => Num::Signed(v as i64),
            Value::Int64(v) => Num::Signed(v),
            Value::UInt8(v) => Num::Unsigned(v as u64),
            Value::UInt16(v) => Num::Unsigned(v as u64),
            Value::UInt32(v) => Num::Unsigned(v as u64),
            Value::UInt64(v) => Num::Unsigned(v),
            Value::Float32(v) => Num::Float(v as f64),
            Value::Float64(v) => Num::Float(v),
            _ => return None,
        })
    }

    pub fn as_f64(&self) -> Option<f64> {
        self.num().map(|n| num_as!(n, f64))
    }

    pub fn as_i64(&self) -> Option<i64> {
        self.num().map(|n| num_as!(n, i64))
    }

    /// Orders two numerics by their mathematical value, whatever their tags.
    /// Integers compare exactly; a float on either side compares as `f64`.
    /// `None` for non-numerics and NaN.
    pub fn numeric_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self.num()?, other.num()?) {
            (Num::Float(a), b) => a.partial_cmp(&num_as!(b, f64)),
            (a, Num::Float(b)) => num_as!(a, f64).partial_cmp(&b),
            (a, b) => Some(num_as!(a, i128).cmp(&num_as!(b, i128))),
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Reinterprets a numeric value as another numeric primitive, with the
    /// usual truncating/wrapping semantics of `as`.
    fn numeric_as(n: Num, to: Primitive) -> Option<Value> {
        Some(match to {
            Primitive::Byte => Value::Byte(num_as!(n, u8)),
            Primitive::Int8 => Value::Int8(num_as!(n, i8)),
            Primitive::Int16 => Value::Int16(num_as!(n, i16)),
            Primitive::Int32 => Value::Int32(num_as!(n, i32)),
            Primitive::Int64 => Value::Int64(num_as!(n, i64)),
            Primitive::UInt8 => Value::UInt8(num_as!(n, u8)),
            Primitive::UInt16 => Value::UInt16(num_as!(n, u16)),
            Primitive::UInt32 => Value::UInt32(num_as!(n, u32)),
            Primitive::UInt64 => Value::UInt64(num_as!(n, u64)),
            Primitive::Float32 => Value::Float32(num_as!(n, f32)),
            Primitive::Float64 => Value::Float64(num_as!(n, f64)),
            _ => return None,
        })
    }

    /// Explicit conversion, as performed by the cast builtins.
    pub fn cast(&self, to: Primitive) -> Result<Value, RuntimeError> {
        let fail = || RuntimeError::InvalidCast {
            from: self.type_name(),
            to: to.name().to_string(),
        };

        if to == Primitive::String {
            return match self {
                Value::List { .. } | Value::Map { .. } | Value::Pointer { .. } => Err(fail()),
                other => Ok(Value::String(other.to_string())),
            };
        }

        if let Some(n) = self.num() {
            return match to {
                Primitive::Bool => Ok(Value::Bool(num_as!(n, f64) != 0.0)),
                Primitive::Char => u32::try_from(num_as!(n, i64))
                    .ok()
                    .and_then(char::from_u32)
                    .map(Value::Char)
                    .ok_or_else(fail),
                _ => Self::numeric_as(n, to).ok_or_else(fail),
            };
        }

        match self {
            Value::Bool(b) => match to {
                Primitive::Bool => Ok(Value::Bool(*b)),
                _ => Self::numeric_as(Num::Unsigned(*b as u64), to).ok_or_else(fail),
            },
            Value::Char(c) => match to {
                Primitive::Char => Ok(Value::Char(*c)),
                Primitive::Bool => Err(fail()),
                _ => Self::numeric_as(Num::Unsigned(*c as u64), to).ok_or_else(fail),
            },
            Value::String(s) => {
                let text = s.trim();
                match to {
                    Primitive::Bool => text.parse::<bool>().map(Value::Bool).map_err(|_| fail()),
                    Primitive::Char => {
                        let mut chars = text.chars();
                        match (chars.next(), chars.next()) {
                            (Some(c), None) => Ok(Value::Char(c)),
                            _ => Err(fail()),
                        }
                    }
                    p if p.is_float() => text
                        .parse::<f64>()
                        .ok()
                        .and_then(|v| Self::numeric_as(Num::Float(v), p))
                        .ok_or_else(fail),
                    p if p.is_integer() => {
                        let n = match text.parse::<i64>() {
                            Ok(v) => Num::Signed(v),
                            Err(_) => Num::Unsigned(text.parse::<u64>().map_err(|_| fail())?),
                        };
                        Self::numeric_as(n, p).ok_or_else(fail)
                    }
                    _ => Err(fail()),
                }
            }
            _ => Err(fail()),
        }
    }

    /// Converts `self` so it can be stored in a cell of type `target`.
    ///
    /// Numeric payloads are converted into the target's numeric width; any
    /// other payload must already carry the target's tag. `none` stored into
    /// a pointer yields a null pointer.
    pub fn coerce_to(&self, target: &TypeDesc) -> Result<Value, RuntimeError> {
        if target.is_numeric() {
            if let Some(n) = self.num() {
                if let Some(v) = Self::numeric_as(n, target.primitive) {
                    return Ok(v);
                }
            }
        }

        let mismatch = || RuntimeError::AssignMismatch {
            expected: target.to_string(),
            found: self.type_name(),
        };

        match (self, target.composition) {
            (Value::None, Composition::Pointer) => Ok(Value::Pointer {
                ty: target.clone(),
                target: None,
            }),
            (Value::List { items, ty }, c) if c.is_sequence() => {
                if ty == target {
                    Ok(self.clone())
                } else if ty.composition == c {
                    let element = target.element_type().ok_or_else(mismatch)?;
                    let items = items
                        .iter()
                        .map(|item| item.coerce_to(element))
                        .collect::<Result<Vec<_>, _>>()
                        .map_err(|_| mismatch())?;
                    Ok(Value::List {
                        ty: target.clone(),
                        items,
                    })
                } else {
                    Err(mismatch())
                }
            }
            (Value::Map { ty, .. }, Composition::Map) if ty == target => Ok(self.clone()),
            (Value::Pointer { ty, .. }, Composition::Pointer) if ty == target => Ok(self.clone()),
            (v, Composition::None) if v.primitive() == target.primitive => Ok(self.clone()),
            _ => Err(mismatch()),
        }
    }

    /// Projects a comparable value onto its map key form.
    pub fn to_map_key(&self) -> Option<MapKey> {
        Some(match self {
            Value::Bool(v) => MapKey::Bool(*v),
            Value::Char(v) => MapKey::Char(*v),
            Value::String(v) => MapKey::String(v.clone()),
            other => match other.num()? {
                Num::Signed(v) => MapKey::Signed(v),
                Num::Unsigned(v) => MapKey::Unsigned(v),
                Num::Float(v) => MapKey::Float(OrderedFloat(v)),
            },
        })
    }

    /// Element count of strings and collections.
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::String(s) => Some(s.chars().count()),
            Value::List { items, .. } => Some(items.len()),
            Value::Map { entries, .. } => Some(entries.len()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => f.write_str("none"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "{}", v),
            Value::Byte(v) => write!(f, "{}", v),
            Value::String(v) => f.write_str(v),
            Value::Int8(v) => write!(f, "{}", v),
            Value::Int16(v) => write!(f, "{}", v),
            Value::Int32(v) => write!(f, "{}", v),
            Value::Int64(v) => write!(f, "{}", v),
            Value::UInt8(v) => write!(f, "{}", v),
            Value::UInt16(v) => write!(f, "{}", v),
            Value::UInt32(v) => write!(f, "{}", v),
            Value::UInt64(v) => write!(f, "{}", v),
            Value::Float32(v) => write!(f, "{}", v),
            Value::Float64(v) => write!(f, "{}", v),
            Value::List { items, .. } => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Map { entries, .. } => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            }
            Value::Pointer { target: None, .. } => f.write_str("null"),
            Value::Pointer {
                target: Some(slot), ..
            } => write!(f, "&s{}", slot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_cmp_across_tags() {
        assert_eq!(
            Value::UInt8(200).numeric_cmp(&Value::Int32(300)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Value::UInt32(5).numeric_cmp(&Value::Int32(-1)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Value::UInt64(u64::MAX).numeric_cmp(&Value::Int64(-1)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Value::Int32(1).numeric_cmp(&Value::Float64(1.5)),
            Some(Ordering::Less)
        );
        assert_eq!(Value::Float64(f64::NAN).numeric_cmp(&Value::Int32(1)), None);
        assert_eq!(Value::Bool(true).numeric_cmp(&Value::Int32(1)), None);
    }

    #[test]
    fn defaults() {
        assert_eq!(Value::default_for(&Primitive::UInt8.into()), Value::UInt8(0));
        assert_eq!(
            Value::default_for(&Primitive::String.into()),
            Value::String(String::new())
        );
        let list = TypeDesc::list(Primitive::Int32.into());
        assert_eq!(Value::default_for(&list).len(), Some(0));
        assert_eq!(Value::default_for(&TypeDesc::none()), Value::None);
    }

    #[test]
    fn coerce_numeric_into_cell_type() {
        let v = Value::Int32(11).coerce_to(&Primitive::UInt8.into()).unwrap();
        assert_eq!(v, Value::UInt8(11));

        let v = Value::Float64(2.75).coerce_to(&Primitive::Int64.into()).unwrap();
        assert_eq!(v, Value::Int64(2));
    }

    #[test]
    fn coerce_rejects_mismatched_tags() {
        let err = Value::String("x".into())
            .coerce_to(&Primitive::Int32.into())
            .unwrap_err();
        assert!(matches!(err, RuntimeError::AssignMismatch { .. }));
        assert!(Value::Bool(true).coerce_to(&Primitive::Char.into()).is_err());
    }

    #[test]
    fn null_into_pointer() {
        let ty = TypeDesc::wrap(Composition::Pointer, Primitive::Int32.into()).unwrap();
        let v = Value::None.coerce_to(&ty).unwrap();
        assert_eq!(v.to_string(), "null");
    }

    #[test]
    fn string_casts() {
        let s = Value::String(" 42 ".into());
        assert_eq!(s.cast(Primitive::Int16).unwrap(), Value::Int16(42));
        assert_eq!(s.cast(Primitive::Float64).unwrap(), Value::Float64(42.0));
        assert!(Value::String("abc".into()).cast(Primitive::Int32).is_err());
        assert_eq!(
            Value::Float64(1.5).cast(Primitive::String).unwrap(),
            Value::String("1.5".into())
        );
    }

    #[test]
    fn char_casts() {
        assert_eq!(Value::Int32(65).cast(Primitive::Char).unwrap(), Value::Char('A'));
        assert_eq!(Value::Char('a').cast(Primitive::UInt8).unwrap(), Value::UInt8(97));
        assert!(Value::Int32(-1).cast(Primitive::Char).is_err());
    }

    #[test]
    fn map_keys_order_floats() {
        let a = Value::Float64(1.5).to_map_key().unwrap();
        let b = Value::Float64(2.5).to_map_key().unwrap();
        assert!(a < b);
        assert!(Value::None.to_map_key().is_none());
    }

    #[test]
    fn display_list() {
        let v = Value::List {
            ty: TypeDesc::list(Primitive::Int32.into()),
            items: vec![Value::Int32(1), Value::Int32(2)],
        };
        assert_eq!(v.to_string(), "[1, 2]");
    }
}
