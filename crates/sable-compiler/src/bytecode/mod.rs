//! Bytecode produced by the generator and consumed by the VM.

mod instruction;
mod program;

pub use instruction::Instruction;
pub use program::{CompiledProgram, FunctionInfo, ParamSlot};
