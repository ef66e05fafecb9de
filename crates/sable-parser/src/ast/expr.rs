//! Expression trees.
//!
//! The parser produces trees whose variable references and calls are
//! placeholders holding names. The compiler resolves them in place into
//! slot indices, builtin ids and function addresses; after that the tree is
//! never modified again.

use std::fmt;

use sable_core::{Address, Primitive, Slot, Value};

use super::ops::BinaryOp;

/// An expression tree node.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Expr {
    Constant(Value),
    Variable(VarRef),
    Binary(Box<BinaryExpr>),
    /// Call to a user function.
    Call(CallExpr),
    /// Call to a builtin, by numeric id.
    Builtin(BuiltinCall),
    Index(IndexExpr),
    Null,
}

/// A variable reference: a name before compilation, a slot after.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VarRef {
    Name(String),
    Slot(Slot),
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BinaryExpr {
    pub left: Expr,
    pub op: BinaryOp,
    pub right: Expr,
    /// Statically known result type, derived from the left operand.
    pub result_type: Option<Primitive>,
}

impl BinaryExpr {
    pub fn new(left: Expr, op: BinaryOp, right: Expr) -> Self {
        let mut node = Self {
            left,
            op,
            right,
            result_type: None,
        };
        node.result_type = node.infer_type(node.left.static_type());
        node
    }

    /// Result type given the left operand's type.
    pub fn infer_type(&self, left: Option<Primitive>) -> Option<Primitive> {
        match self.op {
            op if op.is_comparison() => Some(Primitive::Bool),
            BinaryOp::Div => Some(Primitive::Float64),
            _ => left,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CallExpr {
    pub name: String,
    pub args: Vec<Expr>,
    pub target: CallTarget,
}

/// What a call node invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CallTarget {
    Unresolved,
    /// Index into the program's function table and the callee's first
    /// instruction.
    Function { id: usize, address: Address },
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BuiltinCall {
    pub id: u16,
    pub name: String,
    pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexExpr {
    pub base: VarRef,
    pub index: Box<Expr>,
}

impl Expr {
    pub fn constant(value: Value) -> Self {
        Expr::Constant(value)
    }

    pub fn variable(name: impl Into<String>) -> Self {
        Expr::Variable(VarRef::Name(name.into()))
    }

    pub fn binary(left: Expr, op: BinaryOp, right: Expr) -> Self {
        Expr::Binary(Box::new(BinaryExpr::new(left, op, right)))
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call(CallExpr {
            name: name.into(),
            args,
            target: CallTarget::Unresolved,
        })
    }

    /// Type known without executing anything, if any.
    pub fn static_type(&self) -> Option<Primitive> {
        match self {
            Expr::Constant(value) => Some(value.primitive()),
            Expr::Binary(node) => node.result_type,
            Expr::Null => Some(Primitive::None),
            _ => None,
        }
    }

    /// Direct children, in evaluation order.
    pub fn children(&self) -> Vec<&Expr> {
        match self {
            Expr::Binary(node) => vec![&node.left, &node.right],
            Expr::Call(call) => call.args.iter().collect(),
            Expr::Builtin(call) => call.args.iter().collect(),
            Expr::Index(index) => vec![&*index.index],
            Expr::Constant(_) | Expr::Variable(_) | Expr::Null => Vec::new(),
        }
    }

    pub fn children_mut(&mut self) -> Vec<&mut Expr> {
        match self {
            Expr::Binary(node) => vec![&mut node.left, &mut node.right],
            Expr::Call(call) => call.args.iter_mut().collect(),
            Expr::Builtin(call) => call.args.iter_mut().collect(),
            Expr::Index(index) => vec![&mut *index.index],
            Expr::Constant(_) | Expr::Variable(_) | Expr::Null => Vec::new(),
        }
    }

    /// Visits every node top to bottom, parents before children.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }

    /// Mutable pre-order walk that stops at the first error.
    pub fn try_walk_mut<E>(&mut self, f: &mut impl FnMut(&mut Expr) -> Result<(), E>) -> Result<(), E> {
        f(self)?;
        for child in self.children_mut() {
            child.try_walk_mut(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for VarRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarRef::Name(name) => f.write_str(name),
            VarRef::Slot(slot) => write!(f, "s{}", slot),
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Expr]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", arg)?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Constant(Value::String(s)) => write!(f, "{:?}", s),
            Expr::Constant(Value::Char(c)) => write!(f, "{:?}", c),
            Expr::Constant(value) => write!(f, "{}", value),
            Expr::Variable(var) => write!(f, "{}", var),
            Expr::Binary(node) => write!(f, "({} {} {})", node.left, node.op, node.right),
            Expr::Call(call) => {
                match call.target {
                    CallTarget::Unresolved => write!(f, "{}(", call.name)?,
                    CallTarget::Function { address, .. } => {
                        write!(f, "{}@{:04}(", call.name, address)?
                    }
                }
                write_args(f, &call.args)?;
                f.write_str(")")
            }
            Expr::Builtin(call) => {
                write!(f, "{}#{}(", call.name, call.id)?;
                write_args(f, &call.args)?;
                f.write_str(")")
            }
            Expr::Index(index) => write!(f, "{}[{}]", index.base, index.index),
            Expr::Null => f.write_str("null"),
        }
    }
}
