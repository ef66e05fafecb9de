//! The compiled program.

use std::fmt::Write as _;

use sable_core::{Address, Slot, TypeDesc};

use super::Instruction;

/// A parameter's slot and declared type.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParamSlot {
    pub slot: Slot,
    pub ty: TypeDesc,
}

/// Metadata for one generated function.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FunctionInfo {
    pub name: String,
    /// Address of the function's first instruction.
    pub address: Address,
    pub params: Vec<ParamSlot>,
    pub return_type: TypeDesc,
}

/// Flat bytecode for a whole program.
///
/// Produced once by the compiler and never modified afterwards, so one
/// program can be executed by any number of VMs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompiledProgram {
    pub instructions: Vec<Instruction>,
    /// Number of slots the runtime symbol table needs.
    pub capacity: usize,
    /// Address of the entry function.
    pub entry: Address,
    /// Reachable functions in generation order; the entry is first.
    pub functions: Vec<FunctionInfo>,
    /// Source line of every instruction.
    pub lines: Vec<u32>,
}

impl CompiledProgram {
    /// Number of instructions.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Compiled function called `name`. Eliminated functions are absent.
    pub fn function(&self, name: &str) -> Option<&FunctionInfo> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// The function whose address is the program entry.
    pub fn entry_function(&self) -> Option<&FunctionInfo> {
        self.functions.iter().find(|f| f.address == self.entry)
    }

    /// Source line of the instruction at `address`.
    pub fn line(&self, address: Address) -> Option<u32> {
        self.lines.get(address).copied()
    }

    /// Human-readable listing, one instruction per line, with a label
    /// before each function.
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "; capacity {}", self.capacity);
        for (address, instruction) in self.instructions.iter().enumerate() {
            if let Some(function) = self.functions.iter().find(|f| f.address == address) {
                let _ = writeln!(out, "{}:", function.name);
            }
            let _ = writeln!(out, "  {:04}  {}", address, instruction);
        }
        out
    }
}
