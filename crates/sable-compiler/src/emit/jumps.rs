//! Loop bookkeeping for `break`.

use thiserror::Error;

use super::JumpLabel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BreakError {
    #[error("break outside of a loop")]
    NotInLoop,
}

/// Tracks the enclosing loops of the statement being compiled.
#[derive(Debug, Default)]
pub struct JumpManager {
    /// Innermost last.
    loops: Vec<LoopContext>,
}

#[derive(Debug)]
struct LoopContext {
    /// Scope depth right after the loop's own `EnterScope`.
    scope_depth: usize,
    /// Breaks to patch to the loop's `ExitScope`.
    break_labels: Vec<JumpLabel>,
}

impl JumpManager {
    /// A manager outside of any loop.
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a loop whose own scope sits at `scope_depth`.
    pub fn enter_loop(&mut self, scope_depth: usize) {
        self.loops.push(LoopContext {
            scope_depth,
            break_labels: Vec::new(),
        });
    }

    /// Leaves the innermost loop, returning its pending breaks.
    pub fn exit_loop(&mut self) -> Vec<JumpLabel> {
        self.loops
            .pop()
            .map(|ctx| ctx.break_labels)
            .unwrap_or_default()
    }

    /// Records a pending `break` jump in the innermost loop.
    pub fn add_break(&mut self, label: JumpLabel) -> Result<(), BreakError> {
        let ctx = self.loops.last_mut().ok_or(BreakError::NotInLoop)?;
        ctx.break_labels.push(label);
        Ok(())
    }

    /// How many scopes a `break` at `current_depth` must close before it
    /// reaches the innermost loop's own scope.
    pub fn scopes_to_unwind(&self, current_depth: usize) -> Result<usize, BreakError> {
        self.loops
            .last()
            .map(|ctx| current_depth.saturating_sub(ctx.scope_depth))
            .ok_or(BreakError::NotInLoop)
    }
}
