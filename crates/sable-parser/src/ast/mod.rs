//! Syntax trees and the parsers that build them.

pub mod expr;
pub mod ops;
pub mod program;
pub mod stmt;
pub mod stmt_parser;
pub mod tree_builder;
pub mod type_parser;

pub use expr::{BinaryExpr, BuiltinCall, CallExpr, CallTarget, Expr, IndexExpr, VarRef};
pub use ops::BinaryOp;
pub use program::{FunctionDef, Param, Program, parse_program};
pub use stmt::{Assignment, Operation, Statement};
pub use stmt_parser::{parse_body, parse_statement};
pub use tree_builder::parse_expression;
pub use type_parser::parse_type;
