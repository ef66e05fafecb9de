//! Parses type text into [`TypeDesc`] trees.
//!
//! ```text
//! int32
//! list<string>
//! vector<float64>          element must be numeric
//! map<string, list<int8>>  key must be comparable
//! pointer<tensor<uint8>>
//! ```

use std::sync::LazyLock;

use regex::Regex;
use sable_core::{Composition, Primitive, TypeConstraint, TypeDesc, TypeError};

use crate::lexer::split_top_level;

static WRAPPER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(list|vector|tensor|pointer)\s*<\s*(.+?)\s*>$").expect("wrapper pattern")
});
static MAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^map\s*<\s*(.+?)\s*>$").expect("map pattern"));

/// Parses a type.
///
/// An empty `text` yields the `none` type when `allow_none` is set and
/// fails otherwise.
pub fn parse_type(text: &str, allow_none: bool) -> Result<TypeDesc, TypeError> {
    let text = text.trim();
    if text.is_empty() {
        return if allow_none {
            Ok(TypeDesc::none())
        } else {
            Err(TypeError::MissingType)
        };
    }
    parse_constrained(text, TypeConstraint::empty())
}

fn parse_constrained(text: &str, constraint: TypeConstraint) -> Result<TypeDesc, TypeError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(TypeError::MissingType);
    }

    let ty = if let Some(caps) = WRAPPER.captures(text) {
        let composition = match &caps[1] {
            "list" => Composition::List,
            "vector" => Composition::Vector,
            "tensor" => Composition::Tensor,
            _ => Composition::Pointer,
        };
        let element = parse_constrained(&caps[2], composition.element_constraint())?;
        TypeDesc::wrap(composition, element)?
    } else if let Some(caps) = MAP.captures(text) {
        let malformed = || TypeError::MalformedMap {
            text: text.to_string(),
        };
        let parts = split_top_level(&caps[1], true).map_err(|_| malformed())?;
        let [key, value] = parts.as_slice() else {
            return Err(malformed());
        };
        let key = parse_constrained(key, Composition::Map.key_constraint())?;
        let value = parse_constrained(value, TypeConstraint::empty())?;
        TypeDesc::map(key, value)?
    } else {
        match Primitive::from_name(text) {
            Some(Primitive::None) if !constraint.is_empty() => {
                return Err(TypeError::ConstraintViolation {
                    ty: text.to_string(),
                    constraint,
                });
            }
            Some(primitive) => TypeDesc::primitive(primitive),
            None => {
                return Err(TypeError::UnknownType {
                    name: text.to_string(),
                });
            }
        }
    };

    ty.require(constraint)?;
    Ok(ty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives() {
        assert_eq!(
            parse_type("uint8", false).unwrap(),
            TypeDesc::primitive(Primitive::UInt8)
        );
        assert_eq!(parse_type(" string ", false).unwrap().to_string(), "string");
    }

    #[test]
    fn empty_type() {
        assert!(parse_type("", true).unwrap().is_none());
        assert_eq!(parse_type("", false), Err(TypeError::MissingType));
    }

    #[test]
    fn nested_compositions() {
        let ty = parse_type("map<string, list<vector<float32>>>", false).unwrap();
        assert_eq!(ty.composition, Composition::Map);
        assert_eq!(ty.key_type().unwrap().primitive, Primitive::String);
        let list = ty.element_type().unwrap();
        assert_eq!(list.composition, Composition::List);
        assert_eq!(list.to_string(), "list<vector<float32>>");
    }

    #[test]
    fn vector_of_string_is_rejected() {
        let err = parse_type("vector<string>", false).unwrap_err();
        assert!(matches!(err, TypeError::ConstraintViolation { .. }));
        assert!(parse_type("tensor<list<int32>>", false).is_err());
    }

    #[test]
    fn map_key_must_be_comparable() {
        assert!(parse_type("map<list<int32>, int32>", false).is_err());
        assert!(parse_type("map<float64, string>", false).is_ok());
    }

    #[test]
    fn malformed_map() {
        assert!(matches!(
            parse_type("map<string>", false),
            Err(TypeError::MalformedMap { .. })
        ));
    }

    #[test]
    fn unknown_primitive() {
        assert!(matches!(
            parse_type("int", false),
            Err(TypeError::UnknownType { .. })
        ));
        assert!(parse_type("list<>", false).is_err());
    }
}
