//! Instruction emitter with jump backpatching.
//!
//! Forward jumps are emitted with a placeholder target and return a
//! [`JumpLabel`]; once the destination is known the label is patched. Jump
//! targets are always the absolute address of the destination instruction.

mod jumps;

pub use jumps::{BreakError, JumpManager};

use sable_core::{Address, CompilationError};
use sable_parser::Expr;

use crate::bytecode::Instruction;

/// Address of an emitted jump awaiting its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpLabel(pub Address);

/// Appends instructions and their source lines.
#[derive(Debug, Default)]
pub struct BytecodeEmitter {
    instructions: Vec<Instruction>,
    lines: Vec<u32>,
}

impl BytecodeEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Address the next instruction will get.
    pub fn current_address(&self) -> Address {
        self.instructions.len()
    }

    pub fn emit(&mut self, instruction: Instruction, line: u32) -> Address {
        let address = self.current_address();
        self.instructions.push(instruction);
        self.lines.push(line);
        address
    }

    // =========================================================================
    // Jumps
    // =========================================================================

    /// Emits an unconditional jump to a known address.
    pub fn emit_loop(&mut self, target: Address, line: u32) {
        self.emit(Instruction::Jump { target }, line);
    }

    /// Emits an unconditional jump to be patched later.
    pub fn emit_jump(&mut self, line: u32) -> JumpLabel {
        JumpLabel(self.emit(Instruction::Jump { target: 0 }, line))
    }

    /// Emits a jump taken when `cond` is false, to be patched later.
    pub fn emit_jump_if_not(&mut self, cond: Expr, line: u32) -> JumpLabel {
        JumpLabel(self.emit(Instruction::JumpIfNot { cond, target: 0 }, line))
    }

    /// Points the jump at `label` to `target`.
    pub fn patch_jump(&mut self, label: JumpLabel, target: Address) -> Result<(), CompilationError> {
        let slot = self
            .instructions
            .get_mut(label.0)
            .and_then(Instruction::jump_target_mut)
            .ok_or_else(|| CompilationError::Internal {
                message: format!("no jump at address {}", label.0),
            })?;
        *slot = target;
        Ok(())
    }

    /// Patches `label` to the current address.
    pub fn patch_here(&mut self, label: JumpLabel) -> Result<(), CompilationError> {
        let here = self.current_address();
        self.patch_jump(label, here)
    }

    // =========================================================================
    // Access
    // =========================================================================

    /// Emitted instructions, for the link pass.
    pub fn instructions_mut(&mut self) -> &mut [Instruction] {
        &mut self.instructions
    }

    /// The most recently emitted instruction.
    pub fn last(&self) -> Option<&Instruction> {
        self.instructions.last()
    }

    /// Consumes the emitter, yielding the code and its source lines.
    pub fn finish(self) -> (Vec<Instruction>, Vec<u32>) {
        (self.instructions, self.lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_core::Value;

    #[test]
    fn emit_returns_addresses() {
        let mut emitter = BytecodeEmitter::new();
        assert_eq!(emitter.emit(Instruction::EnterScope, 1), 0);
        assert_eq!(emitter.emit(Instruction::ExitScope, 2), 1);
        assert_eq!(emitter.current_address(), 2);

        let (code, lines) = emitter.finish();
        assert_eq!(code.len(), 2);
        assert_eq!(lines, [1, 2]);
    }

    #[test]
    fn patch_forward_jump() {
        let mut emitter = BytecodeEmitter::new();
        let label = emitter.emit_jump_if_not(Expr::constant(Value::Bool(false)), 1);
        emitter.emit(Instruction::EnterScope, 1);
        emitter.emit(Instruction::ExitScope, 1);
        emitter.patch_here(label).unwrap();

        let (code, _) = emitter.finish();
        assert_eq!(code[0].jump_target(), Some(3));
    }

    #[test]
    fn patch_non_jump_fails() {
        let mut emitter = BytecodeEmitter::new();
        emitter.emit(Instruction::EnterScope, 1);
        assert!(emitter.patch_jump(JumpLabel(0), 5).is_err());
        assert!(emitter.patch_jump(JumpLabel(9), 5).is_err());
    }

    #[test]
    fn loop_jumps_backwards() {
        let mut emitter = BytecodeEmitter::new();
        emitter.emit(Instruction::EnterScope, 1);
        emitter.emit_loop(0, 2);
        assert_eq!(emitter.last().and_then(Instruction::jump_target), Some(0));
    }
}
