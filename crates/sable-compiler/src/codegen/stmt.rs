//! Statement and block generation.
//!
//! Block layouts (`exit` is the block's `EXIT_SCOPE`):
//!
//! ```text
//! for:    ENTER  BIND it  ASSIGN it  cond: JUMP_IF_NOT exit  body  ASSIGN update  JUMP cond  exit: EXIT
//! while:  ENTER  cond: JUMP_IF_NOT exit  body  JUMP cond  exit: EXIT
//! if:     ENTER  JUMP_IF_NOT else  then  JUMP exit  else: body  exit: EXIT
//! ```

use sable_core::{CompilationError, TypeDesc, Value};
use sable_parser::{Assignment, Expr, FunctionDef, Operation, Statement};

use super::CodeGenerator;
use crate::bytecode::Instruction;
use crate::emit::JumpLabel;

/// How a block's statement run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockEnd {
    Close(u32),
    Else(u32),
    Body,
}

impl<'a, 'p> CodeGenerator<'a, 'p> {
    pub(super) fn generate_body(&mut self, function: &'p FunctionDef) -> Result<(), CompilationError> {
        let mut cursor = 0;
        match self.generate_block(&function.body, &mut cursor)? {
            BlockEnd::Body => Ok(()),
            BlockEnd::Close(line) => Err(CompilationError::UnexpectedCloseBrace { line }),
            BlockEnd::Else(line) => Err(CompilationError::UnexpectedElse { line }),
        }
    }

    /// Generates statements from `cursor` up to the next `}` or `} else {`
    /// at this nesting level, leaving `cursor` after it.
    fn generate_block(
        &mut self,
        body: &'p [Statement],
        cursor: &mut usize,
    ) -> Result<BlockEnd, CompilationError> {
        while let Some(stmt) = body.get(*cursor) {
            *cursor += 1;
            match &stmt.op {
                Operation::CloseBrace => return Ok(BlockEnd::Close(stmt.line)),
                Operation::Else => return Ok(BlockEnd::Else(stmt.line)),
                Operation::ForHeader {
                    iterator,
                    ty,
                    init,
                    condition,
                    update,
                } => self.generate_for(
                    body,
                    cursor,
                    stmt.line,
                    (iterator.as_str(), ty, init),
                    condition,
                    update,
                )?,
                Operation::While { condition } => {
                    self.generate_while(body, cursor, stmt.line, condition)?
                }
                Operation::If { condition } => self.generate_if(body, cursor, stmt.line, condition)?,
                op => self.generate_simple(op, stmt.line)?,
            }
        }
        Ok(BlockEnd::Body)
    }

    /// Generates a loop or if body that must end with `}`.
    fn generate_closed(
        &mut self,
        body: &'p [Statement],
        cursor: &mut usize,
        header: u32,
    ) -> Result<(), CompilationError> {
        match self.generate_block(body, cursor)? {
            BlockEnd::Close(_) => Ok(()),
            BlockEnd::Else(line) => Err(CompilationError::UnexpectedElse { line }),
            BlockEnd::Body => Err(self.unclosed(header)),
        }
    }

    fn unclosed(&self, line: u32) -> CompilationError {
        CompilationError::UnclosedBlock {
            function: self.function.to_string(),
            line,
        }
    }

    // =========================================================================
    // Blocks
    // =========================================================================

    fn enter_scope(&mut self, line: u32) {
        self.emitter.emit(Instruction::EnterScope, line);
        self.scope_depth += 1;
        self.scope_marks.push(self.visible.len());
    }

    /// Emits the block's `EXIT_SCOPE` and returns its address. Names declared
    /// inside the block go out of scope.
    fn exit_scope(&mut self, line: u32) -> usize {
        self.scope_depth -= 1;
        if let Some(mark) = self.scope_marks.pop() {
            self.visible.truncate(mark);
        }
        self.emitter.emit(Instruction::ExitScope, line)
    }

    fn generate_for(
        &mut self,
        body: &'p [Statement],
        cursor: &mut usize,
        line: u32,
        (iterator, ty, init): (&str, &TypeDesc, &Expr),
        condition: &Expr,
        update: &Assignment,
    ) -> Result<(), CompilationError> {
        self.enter_scope(line);
        self.generate_bind(iterator, ty, Some(init), line)?;

        let cond = self.emitter.current_address();
        let condition = self.compile_expr(condition, line)?;
        let exit = self.emitter.emit_jump_if_not(condition, line);
        self.jumps.enter_loop(self.scope_depth);

        self.generate_closed(body, cursor, line)?;
        self.generate_assignment(update, line)?;
        self.emitter.emit_loop(cond, line);

        self.finish_loop(exit, line)
    }

    fn generate_while(
        &mut self,
        body: &'p [Statement],
        cursor: &mut usize,
        line: u32,
        condition: &Expr,
    ) -> Result<(), CompilationError> {
        self.enter_scope(line);
        let cond = self.emitter.current_address();
        let condition = self.compile_expr(condition, line)?;
        let exit = self.emitter.emit_jump_if_not(condition, line);
        self.jumps.enter_loop(self.scope_depth);

        self.generate_closed(body, cursor, line)?;
        self.emitter.emit_loop(cond, line);

        self.finish_loop(exit, line)
    }

    /// Emits the loop's `EXIT_SCOPE` and points the exit branch and every
    /// `break` at it.
    fn finish_loop(&mut self, exit: JumpLabel, line: u32) -> Result<(), CompilationError> {
        let breaks = self.jumps.exit_loop();
        let target = self.exit_scope(line);
        self.emitter.patch_jump(exit, target)?;
        for label in breaks {
            self.emitter.patch_jump(label, target)?;
        }
        Ok(())
    }

    fn generate_if(
        &mut self,
        body: &'p [Statement],
        cursor: &mut usize,
        line: u32,
        condition: &Expr,
    ) -> Result<(), CompilationError> {
        self.enter_scope(line);
        let mark = self.visible.len();
        let condition = self.compile_expr(condition, line)?;
        let skip = self.emitter.emit_jump_if_not(condition, line);

        let end = match self.generate_block(body, cursor)? {
            BlockEnd::Close(_) => None,
            BlockEnd::Else(else_line) => {
                // The then branch's bindings never run on the else path.
                self.visible.truncate(mark);
                let end = self.emitter.emit_jump(else_line);
                self.emitter.patch_here(skip)?;
                self.generate_closed(body, cursor, else_line)?;
                Some(end)
            }
            BlockEnd::Body => return Err(self.unclosed(line)),
        };

        let exit = self.exit_scope(line);
        match end {
            Some(end) => self.emitter.patch_jump(end, exit),
            None => self.emitter.patch_jump(skip, exit),
        }
    }

    // =========================================================================
    // Simple statements
    // =========================================================================

    fn generate_simple(&mut self, op: &'p Operation, line: u32) -> Result<(), CompilationError> {
        match op {
            Operation::Bind { name, ty, init } => self.generate_bind(name, ty, init.as_ref(), line),
            Operation::Assign(assignment) => self.generate_assignment(assignment, line),
            Operation::Grow { name, amount } => {
                let (slot, ty) = self.collection(name, line)?;
                let element = ty.element_type().cloned().unwrap_or_else(TypeDesc::none);
                let amount = self.compile_expr(amount, line)?;
                self.emitter.emit(
                    Instruction::Grow {
                        slot,
                        amount,
                        element,
                    },
                    line,
                );
                Ok(())
            }
            Operation::Shrink { name, amount } => {
                let (slot, _) = self.collection(name, line)?;
                let amount = self.compile_expr(amount, line)?;
                self.emitter.emit(Instruction::Shrink { slot, amount }, line);
                Ok(())
            }
            Operation::Break => {
                let unwind = self
                    .jumps
                    .scopes_to_unwind(self.scope_depth)
                    .map_err(|_| CompilationError::BreakOutsideLoop { line })?;
                for _ in 0..unwind {
                    self.emitter.emit(Instruction::ExitScope, line);
                }
                let label = self.emitter.emit_jump(line);
                self.jumps
                    .add_break(label)
                    .map_err(|_| CompilationError::BreakOutsideLoop { line })
            }
            Operation::Return(value) => {
                let value = match value {
                    Some(expr) => Some(self.compile_expr(expr, line)?),
                    None => None,
                };
                self.emitter.emit(Instruction::Return { value }, line);
                Ok(())
            }
            Operation::Expression(expr) => {
                let expr = self.compile_expr(expr, line)?;
                self.emitter.emit(Instruction::Expression { expr }, line);
                Ok(())
            }
            Operation::NoOp => Ok(()),
            Operation::ForHeader { .. }
            | Operation::While { .. }
            | Operation::If { .. }
            | Operation::Else
            | Operation::CloseBrace => Err(CompilationError::Internal {
                message: format!("line {}: block statement reached simple generation", line),
            }),
        }
    }

    fn generate_bind(
        &mut self,
        name: &str,
        ty: &TypeDesc,
        init: Option<&Expr>,
        line: u32,
    ) -> Result<(), CompilationError> {
        self.ctx.retype(self.function, name, ty);
        let slot = self.declared_slot(name, line)?;
        let value = match init {
            Some(expr) => self.compile_expr(expr, line)?,
            None => Expr::constant(Value::default_for(ty)),
        };
        self.declare(name);
        self.emitter.emit(
            Instruction::Bind {
                slot,
                ty: ty.clone(),
            },
            line,
        );
        self.emitter.emit(Instruction::Assign { slot, value }, line);
        Ok(())
    }

    fn generate_assignment(&mut self, assignment: &Assignment, line: u32) -> Result<(), CompilationError> {
        let slot = self.slot_of(&assignment.name, line)?;
        let value = self.compile_expr(&assignment.value, line)?;
        let instruction = match &assignment.index {
            Some(index) => Instruction::IndexAssign {
                slot,
                index: self.compile_expr(index, line)?,
                value,
            },
            None => Instruction::Assign { slot, value },
        };
        self.emitter.emit(instruction, line);
        Ok(())
    }

    /// Slot and type of a growable collection.
    fn collection(&self, name: &str, line: u32) -> Result<(usize, TypeDesc), CompilationError> {
        let slot = self.slot_of(name, line)?;
        let ty = self.type_of(name).cloned().unwrap_or_else(TypeDesc::none);
        if !ty.composition.is_sequence() {
            return Err(CompilationError::NotACollection {
                name: name.to_string(),
                ty: ty.to_string(),
                line,
            });
        }
        Ok((slot, ty))
    }
}
