//! Intermediate operations produced by the statement parser.

use sable_core::TypeDesc;

use super::expr::Expr;

/// A classified body line.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// 1-based source line.
    pub line: u32,
    pub op: Operation,
}

/// `name = value` or `name[index] = value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub name: String,
    pub index: Option<Expr>,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// `let name: type [= init]`
    Bind {
        name: String,
        ty: TypeDesc,
        init: Option<Expr>,
    },
    Assign(Assignment),
    /// `for (let it: type = init; condition; update) {`
    ForHeader {
        iterator: String,
        ty: TypeDesc,
        init: Expr,
        condition: Expr,
        update: Assignment,
    },
    /// `while condition {`
    While { condition: Expr },
    /// `if condition {`
    If { condition: Expr },
    /// `} else {`
    Else,
    /// `grow name by amount`
    Grow { name: String, amount: Expr },
    /// `shrink name by amount`
    Shrink { name: String, amount: Expr },
    Break,
    Return(Option<Expr>),
    CloseBrace,
    Expression(Expr),
    NoOp,
}

impl Operation {
    /// Whether this line opens a block closed by a later `}`.
    pub fn opens_block(&self) -> bool {
        matches!(
            self,
            Operation::ForHeader { .. } | Operation::While { .. } | Operation::If { .. }
        )
    }

    pub fn is_noop(&self) -> bool {
        matches!(self, Operation::NoOp)
    }
}
