//! The instruction set.

use std::fmt;

use sable_core::{Address, Slot, TypeDesc};
use sable_parser::Expr;

/// One VM instruction. Every kind carries exactly the operands it needs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Instruction {
    /// Binds `slot` to a fresh cell holding `ty`'s default value.
    Bind { slot: Slot, ty: TypeDesc },
    /// Copies the value of `value` into the cell bound at `slot`.
    Assign { slot: Slot, value: Expr },
    /// Stores `value` at `index` of the collection bound at `slot`.
    IndexAssign { slot: Slot, index: Expr, value: Expr },
    /// Evaluates for side effects only.
    Expression { expr: Expr },
    EnterScope,
    /// Unbinds every slot bound since the matching `EnterScope`.
    ExitScope,
    Jump { target: Address },
    JumpIf { cond: Expr, target: Address },
    JumpIfNot { cond: Expr, target: Address },
    /// Appends `amount` default `element`s to the collection at `slot`.
    Grow {
        slot: Slot,
        amount: Expr,
        element: TypeDesc,
    },
    /// Drops `amount` trailing elements of the collection at `slot`.
    Shrink { slot: Slot, amount: Expr },
    Return { value: Option<Expr> },
}

impl Instruction {
    pub fn name(&self) -> &'static str {
        match self {
            Instruction::Bind { .. } => "BIND",
            Instruction::Assign { .. } => "ASSIGN",
            Instruction::IndexAssign { .. } => "INDEX_ASSIGN",
            Instruction::Expression { .. } => "EXPRESSION",
            Instruction::EnterScope => "ENTER_SCOPE",
            Instruction::ExitScope => "EXIT_SCOPE",
            Instruction::Jump { .. } => "JUMP",
            Instruction::JumpIf { .. } => "JUMP_IF",
            Instruction::JumpIfNot { .. } => "JUMP_IF_NOT",
            Instruction::Grow { .. } => "GROW",
            Instruction::Shrink { .. } => "SHRINK",
            Instruction::Return { .. } => "RETURN",
        }
    }

    /// Jump target, for the three jump kinds.
    pub fn jump_target(&self) -> Option<Address> {
        match self {
            Instruction::Jump { target }
            | Instruction::JumpIf { target, .. }
            | Instruction::JumpIfNot { target, .. } => Some(*target),
            _ => None,
        }
    }

    pub fn jump_target_mut(&mut self) -> Option<&mut Address> {
        match self {
            Instruction::Jump { target }
            | Instruction::JumpIf { target, .. }
            | Instruction::JumpIfNot { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Every expression operand, in evaluation order.
    pub fn exprs_mut(&mut self) -> Vec<&mut Expr> {
        match self {
            Instruction::Assign { value, .. } => vec![value],
            Instruction::IndexAssign { index, value, .. } => vec![index, value],
            Instruction::Expression { expr } => vec![expr],
            Instruction::JumpIf { cond, .. } | Instruction::JumpIfNot { cond, .. } => vec![cond],
            Instruction::Grow { amount, .. } | Instruction::Shrink { amount, .. } => vec![amount],
            Instruction::Return { value } => value.iter_mut().collect(),
            Instruction::Bind { .. }
            | Instruction::EnterScope
            | Instruction::ExitScope
            | Instruction::Jump { .. } => Vec::new(),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        match self {
            Instruction::Bind { slot, ty } => write!(f, "{} s{} {}", name, slot, ty),
            Instruction::Assign { slot, value } => write!(f, "{} s{} <- {}", name, slot, value),
            Instruction::IndexAssign { slot, index, value } => {
                write!(f, "{} s{}[{}] <- {}", name, slot, index, value)
            }
            Instruction::Expression { expr } => write!(f, "{} {}", name, expr),
            Instruction::EnterScope | Instruction::ExitScope => f.write_str(name),
            Instruction::Jump { target } => write!(f, "{} -> {:04}", name, target),
            Instruction::JumpIf { cond, target } | Instruction::JumpIfNot { cond, target } => {
                write!(f, "{} {} -> {:04}", name, cond, target)
            }
            Instruction::Grow {
                slot,
                amount,
                element,
            } => write!(f, "{} s{} by {} of {}", name, slot, amount, element),
            Instruction::Shrink { slot, amount } => write!(f, "{} s{} by {}", name, slot, amount),
            Instruction::Return { value: Some(value) } => write!(f, "{} {}", name, value),
            Instruction::Return { value: None } => f.write_str(name),
        }
    }
}
