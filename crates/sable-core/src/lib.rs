//! Core types shared by every stage of the sable pipeline.
//!
//! This crate holds the pieces that the parser, compiler and virtual
//! machine all need to agree on:
//!
//! - [`types`]: type descriptors (`int32`, `list<string>`, `map<string, float64>`)
//!   and the constraints compositions place on their inner types
//! - [`value`]: the tagged runtime [`Value`] and its conversions
//! - [`builtins`]: the fixed builtin name table and numeric ids
//! - [`error`]: the error taxonomy, one enum per category

pub mod builtins;
pub mod error;
pub mod types;
pub mod value;

pub use builtins::{Arity, BuiltinId};
pub use error::{
    CompilationError, LexError, ParseError, ParseErrorKind, Result, RuntimeError, SableError,
    TypeError,
};
pub use types::{Composition, Primitive, TypeConstraint, TypeDesc};
pub use value::{MapKey, Value};

/// Index into the runtime symbol table.
pub type Slot = usize;

/// Absolute index into a program's instruction list.
pub type Address = usize;
