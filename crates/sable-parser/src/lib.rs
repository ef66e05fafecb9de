//! Parser for the sable scripting language.
//!
//! The parser works on normalized source text: every function is a
//! `func name(params) => ret { ... }` unit with one statement per line.
//! Parsing happens in layers:
//!
//! - [`lexer`] splits a single expression into tokens
//! - [`ast::tree_builder`] reduces those tokens into an [`Expr`] tree
//! - [`ast::type_parser`] turns type text into a [`TypeDesc`](sable_core::TypeDesc)
//! - [`ast::stmt_parser`] classifies body lines into [`Operation`]s
//! - [`ast::program`] extracts every function and picks the entry point
//!
//! # Example
//!
//! ```
//! use sable_parser::parse_program;
//!
//! let source = r#"
//! func main() => int32 {
//!     let a: int32 = 5 + 10 * 10;
//!     return a;
//! }
//! "#;
//!
//! let program = parse_program(source, "main").unwrap();
//! assert_eq!(program.entry.name, "main");
//! assert!(program.side_functions.is_empty());
//! ```

pub mod ast;
pub mod lexer;

pub use ast::{
    Assignment, BinaryExpr, BinaryOp, BuiltinCall, CallExpr, CallTarget, Expr, FunctionDef,
    IndexExpr, Operation, Param, Program, Statement, VarRef, parse_expression, parse_program,
    parse_type,
};
pub use lexer::{Token, TokenKind, tokenize};
