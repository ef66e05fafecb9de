//! The builtin function table.
//!
//! Builtins are known to the compiler by name and invoked by the VM through
//! a fixed numeric id. The compiler never descends into them and they never
//! consume symbol table slots.

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::types::Primitive;

/// Numeric ids of every builtin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u16)]
pub enum BuiltinId {
    Len = 0,
    Print = 1,
    Println = 2,
    Printf = 3,
    ReadLine = 4,
    ReadChar = 5,
    CastBool = 16,
    CastChar = 17,
    CastByte = 18,
    CastString = 19,
    CastInt8 = 20,
    CastInt16 = 21,
    CastInt32 = 22,
    CastInt64 = 23,
    CastUInt8 = 24,
    CastUInt16 = 25,
    CastUInt32 = 26,
    CastUInt64 = 27,
    CastFloat32 = 28,
    CastFloat64 = 29,
}

/// How many arguments a builtin accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Range(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::Range(min, max) => (min..=max).contains(&count),
            Arity::AtLeast(min) => count >= min,
        }
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::Range(min, max) => write!(f, "{} to {}", min, max),
            Arity::AtLeast(min) => write!(f, "at least {}", min),
        }
    }
}

const TABLE: &[(&str, BuiltinId)] = &[
    ("len", BuiltinId::Len),
    ("print", BuiltinId::Print),
    ("println", BuiltinId::Println),
    ("printf", BuiltinId::Printf),
    ("readline", BuiltinId::ReadLine),
    ("readchar", BuiltinId::ReadChar),
    ("bool", BuiltinId::CastBool),
    ("char", BuiltinId::CastChar),
    ("byte", BuiltinId::CastByte),
    ("string", BuiltinId::CastString),
    ("int8", BuiltinId::CastInt8),
    ("int16", BuiltinId::CastInt16),
    ("int32", BuiltinId::CastInt32),
    ("int64", BuiltinId::CastInt64),
    ("uint8", BuiltinId::CastUInt8),
    ("uint16", BuiltinId::CastUInt16),
    ("uint32", BuiltinId::CastUInt32),
    ("uint64", BuiltinId::CastUInt64),
    ("float32", BuiltinId::CastFloat32),
    ("float64", BuiltinId::CastFloat64),
];

impl BuiltinId {
    pub fn from_name(name: &str) -> Option<Self> {
        TABLE.iter().find(|(n, _)| *n == name).map(|(_, id)| *id)
    }

    pub fn is_builtin(name: &str) -> bool {
        Self::from_name(name).is_some()
    }

    pub fn name(self) -> &'static str {
        TABLE
            .iter()
            .find(|(_, id)| *id == self)
            .map(|(n, _)| *n)
            .unwrap_or("?")
    }

    pub const fn arity(self) -> Arity {
        match self {
            BuiltinId::Println => Arity::Range(0, 1),
            BuiltinId::Printf => Arity::AtLeast(1),
            BuiltinId::ReadLine | BuiltinId::ReadChar => Arity::Exact(0),
            _ => Arity::Exact(1),
        }
    }

    /// Target primitive for the cast builtins.
    pub const fn cast_target(self) -> Option<Primitive> {
        Some(match self {
            BuiltinId::CastBool => Primitive::Bool,
            BuiltinId::CastChar => Primitive::Char,
            BuiltinId::CastByte => Primitive::Byte,
            BuiltinId::CastString => Primitive::String,
            BuiltinId::CastInt8 => Primitive::Int8,
            BuiltinId::CastInt16 => Primitive::Int16,
            BuiltinId::CastInt32 => Primitive::Int32,
            BuiltinId::CastInt64 => Primitive::Int64,
            BuiltinId::CastUInt8 => Primitive::UInt8,
            BuiltinId::CastUInt16 => Primitive::UInt16,
            BuiltinId::CastUInt32 => Primitive::UInt32,
            BuiltinId::CastUInt64 => Primitive::UInt64,
            BuiltinId::CastFloat32 => Primitive::Float32,
            BuiltinId::CastFloat64 => Primitive::Float64,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_name() {
        assert_eq!(BuiltinId::from_name("println"), Some(BuiltinId::Println));
        assert_eq!(BuiltinId::from_name("main"), None);
        assert_eq!(BuiltinId::CastUInt8.name(), "uint8");
    }

    #[test]
    fn numeric_ids_round_trip() {
        for (_, id) in TABLE {
            let raw: u16 = (*id).into();
            assert_eq!(BuiltinId::try_from(raw).unwrap(), *id);
        }
        assert!(BuiltinId::try_from(999u16).is_err());
    }

    #[test]
    fn every_primitive_but_none_has_a_cast() {
        for p in Primitive::ALL.into_iter().filter(|p| *p != Primitive::None) {
            let id = BuiltinId::from_name(p.name()).unwrap();
            assert_eq!(id.cast_target(), Some(p));
        }
    }

    #[test]
    fn arity_checks() {
        assert!(BuiltinId::Println.arity().accepts(0));
        assert!(BuiltinId::Println.arity().accepts(1));
        assert!(!BuiltinId::Len.arity().accepts(2));
        assert!(BuiltinId::Printf.arity().accepts(4));
        assert!(!BuiltinId::Printf.arity().accepts(0));
    }
}
