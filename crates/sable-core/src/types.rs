//! Type descriptors.
//!
//! A [`TypeDesc`] is either a bare primitive (`int32`, `string`) or a
//! composition wrapping one or two inner descriptors (`list<T>`,
//! `map<K, V>`). Compositions restrict what they may wrap; the restriction is
//! expressed as a [`TypeConstraint`] and enforced when the descriptor is
//! built, so a descriptor that exists always satisfies it.

use std::fmt;

use bitflags::bitflags;

use crate::error::TypeError;

/// Primitive (non-composed) types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Primitive {
    /// Explicit absence of a type (functions without a return type).
    None,
    Bool,
    Char,
    Byte,
    String,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
}

impl Primitive {
    /// Every primitive that has a surface spelling.
    pub const ALL: [Primitive; 15] = [
        Primitive::None,
        Primitive::Bool,
        Primitive::Char,
        Primitive::Byte,
        Primitive::String,
        Primitive::Int8,
        Primitive::Int16,
        Primitive::Int32,
        Primitive::Int64,
        Primitive::UInt8,
        Primitive::UInt16,
        Primitive::UInt32,
        Primitive::UInt64,
        Primitive::Float32,
        Primitive::Float64,
    ];

    /// Surface spelling of the primitive.
    pub const fn name(self) -> &'static str {
        match self {
            Primitive::None => "none",
            Primitive::Bool => "bool",
            Primitive::Char => "char",
            Primitive::Byte => "byte",
            Primitive::String => "string",
            Primitive::Int8 => "int8",
            Primitive::Int16 => "int16",
            Primitive::Int32 => "int32",
            Primitive::Int64 => "int64",
            Primitive::UInt8 => "uint8",
            Primitive::UInt16 => "uint16",
            Primitive::UInt32 => "uint32",
            Primitive::UInt64 => "uint64",
            Primitive::Float32 => "float32",
            Primitive::Float64 => "float64",
        }
    }

    /// Looks up a primitive by its surface spelling.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Integers, floats and `byte`.
    pub const fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Primitive::Byte
                | Primitive::Int8
                | Primitive::Int16
                | Primitive::Int32
                | Primitive::Int64
                | Primitive::UInt8
                | Primitive::UInt16
                | Primitive::UInt32
                | Primitive::UInt64
        )
    }

    pub const fn is_float(self) -> bool {
        matches!(self, Primitive::Float32 | Primitive::Float64)
    }

    /// Types with a total order usable as map keys.
    pub const fn is_comparable(self) -> bool {
        !matches!(self, Primitive::None)
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The wrapper a type descriptor applies to its inner type(s).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Composition {
    None,
    List,
    Vector,
    Tensor,
    Map,
    Pointer,
}

impl Composition {
    pub const fn name(self) -> &'static str {
        match self {
            Composition::None => "",
            Composition::List => "list",
            Composition::Vector => "vector",
            Composition::Tensor => "tensor",
            Composition::Map => "map",
            Composition::Pointer => "pointer",
        }
    }

    /// Constraint every element of this composition must satisfy.
    pub const fn element_constraint(self) -> TypeConstraint {
        match self {
            Composition::Vector | Composition::Tensor => TypeConstraint::NUMERIC,
            _ => TypeConstraint::empty(),
        }
    }

    /// Constraint the key type must satisfy (maps only).
    pub const fn key_constraint(self) -> TypeConstraint {
        match self {
            Composition::Map => TypeConstraint::COMPARABLE,
            _ => TypeConstraint::empty(),
        }
    }

    /// Whether values of this composition are indexable sequences.
    pub const fn is_sequence(self) -> bool {
        matches!(
            self,
            Composition::List | Composition::Vector | Composition::Tensor
        )
    }
}

bitflags! {
    /// Requirements a composition places on the types it wraps.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct TypeConstraint: u8 {
        /// Must be an integer, float or byte primitive.
        const NUMERIC = 1 << 0;
        /// Must be a primitive with a total order.
        const COMPARABLE = 1 << 1;
    }
}

impl fmt::Display for TypeConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = Vec::new();
        if self.contains(TypeConstraint::NUMERIC) {
            names.push("numeric");
        }
        if self.contains(TypeConstraint::COMPARABLE) {
            names.push("comparable");
        }
        if names.is_empty() {
            f.write_str("any")
        } else {
            f.write_str(&names.join(" + "))
        }
    }
}

/// A possibly composed type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeDesc {
    /// The primitive for bare types, `Primitive::None` for compositions.
    pub primitive: Primitive,
    pub composition: Composition,
    /// Element (or pointee, or map value) type.
    pub element: Option<Box<TypeDesc>>,
    /// Key type, maps only.
    pub key: Option<Box<TypeDesc>>,
}

impl TypeDesc {
    pub const fn primitive(primitive: Primitive) -> Self {
        Self {
            primitive,
            composition: Composition::None,
            element: None,
            key: None,
        }
    }

    pub const fn none() -> Self {
        Self::primitive(Primitive::None)
    }

    /// Wraps `element` in a list, vector, tensor or pointer.
    ///
    /// Fails when `element` does not satisfy the composition's constraint.
    pub fn wrap(composition: Composition, element: TypeDesc) -> Result<Self, TypeError> {
        debug_assert!(composition != Composition::Map && composition != Composition::None);
        element.require(composition.element_constraint())?;
        Ok(Self {
            primitive: Primitive::None,
            composition,
            element: Some(Box::new(element)),
            key: None,
        })
    }

    pub fn list(element: TypeDesc) -> Self {
        Self {
            primitive: Primitive::None,
            composition: Composition::List,
            element: Some(Box::new(element)),
            key: None,
        }
    }

    pub fn map(key: TypeDesc, value: TypeDesc) -> Result<Self, TypeError> {
        key.require(Composition::Map.key_constraint())?;
        Ok(Self {
            primitive: Primitive::None,
            composition: Composition::Map,
            element: Some(Box::new(value)),
            key: Some(Box::new(key)),
        })
    }

    pub fn is_none(&self) -> bool {
        self.composition == Composition::None && self.primitive == Primitive::None
    }

    /// Bare numeric primitive.
    pub fn is_numeric(&self) -> bool {
        self.composition == Composition::None && self.primitive.is_numeric()
    }

    pub fn is_comparable(&self) -> bool {
        self.composition == Composition::None && self.primitive.is_comparable()
    }

    pub fn satisfies(&self, constraint: TypeConstraint) -> bool {
        (!constraint.contains(TypeConstraint::NUMERIC) || self.is_numeric())
            && (!constraint.contains(TypeConstraint::COMPARABLE) || self.is_comparable())
    }

    /// Returns a constraint violation error unless `self` satisfies `constraint`.
    pub fn require(&self, constraint: TypeConstraint) -> Result<(), TypeError> {
        if self.satisfies(constraint) {
            Ok(())
        } else {
            Err(TypeError::ConstraintViolation {
                ty: self.to_string(),
                constraint,
            })
        }
    }

    pub fn element_type(&self) -> Option<&TypeDesc> {
        self.element.as_deref()
    }

    pub fn key_type(&self) -> Option<&TypeDesc> {
        self.key.as_deref()
    }
}

impl From<Primitive> for TypeDesc {
    fn from(primitive: Primitive) -> Self {
        TypeDesc::primitive(primitive)
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.composition, &self.key, &self.element) {
            (Composition::None, _, _) => write!(f, "{}", self.primitive),
            (Composition::Map, Some(key), Some(value)) => {
                write!(f, "map<{}, {}>", key, value)
            }
            (composition, _, Some(element)) => write!(f, "{}<{}>", composition.name(), element),
            (composition, _, None) => write!(f, "{}<?>", composition.name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_names_round_trip() {
        for p in Primitive::ALL {
            assert_eq!(Primitive::from_name(p.name()), Some(p));
        }
        assert_eq!(Primitive::from_name("int"), None);
    }

    #[test]
    fn numeric_classification() {
        assert!(Primitive::UInt8.is_numeric());
        assert!(Primitive::Byte.is_numeric());
        assert!(Primitive::Float32.is_float());
        assert!(!Primitive::String.is_numeric());
        assert!(!Primitive::Bool.is_numeric());
    }

    #[test]
    fn vector_requires_numeric_element() {
        let ok = TypeDesc::wrap(Composition::Vector, Primitive::Float64.into());
        assert!(ok.is_ok());

        let err = TypeDesc::wrap(Composition::Vector, Primitive::String.into()).unwrap_err();
        assert!(matches!(err, TypeError::ConstraintViolation { .. }));
    }

    #[test]
    fn map_key_must_be_comparable() {
        let nested = TypeDesc::list(Primitive::Int32.into());
        assert!(TypeDesc::map(nested, Primitive::Int32.into()).is_err());
        assert!(TypeDesc::map(Primitive::String.into(), Primitive::Int32.into()).is_ok());
    }

    #[test]
    fn display_nested() {
        let inner = TypeDesc::wrap(Composition::Vector, Primitive::Int8.into()).unwrap();
        let ty = TypeDesc::map(Primitive::String.into(), TypeDesc::list(inner)).unwrap();
        assert_eq!(ty.to_string(), "map<string, list<vector<int8>>>");
    }

    #[test]
    fn constraint_display() {
        assert_eq!(TypeConstraint::NUMERIC.to_string(), "numeric");
        assert_eq!(TypeConstraint::empty().to_string(), "any");
    }
}
