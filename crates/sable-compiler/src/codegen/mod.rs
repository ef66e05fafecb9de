//! Bytecode generation.
//!
//! Generates every reachable function in discovery order into one flat
//! instruction list. Each function's code ends with a `RETURN`. Call nodes
//! get their callee's id during generation; the callee's address is only
//! known once every function has been laid out, so a final link pass fills
//! it in.

mod expr;
mod stmt;

use sable_core::{CompilationError, TypeDesc};
use sable_parser::{CallTarget, Expr, FunctionDef};
use tracing::debug;

use crate::bytecode::{CompiledProgram, FunctionInfo, Instruction, ParamSlot};
use crate::context::CompilationContext;
use crate::emit::{BytecodeEmitter, JumpManager};

pub struct CodeGenerator<'a, 'p> {
    ctx: &'a mut CompilationContext<'p>,
    emitter: BytecodeEmitter,
    jumps: JumpManager,
    functions: Vec<FunctionInfo>,
    /// Name of the function being generated.
    function: &'p str,
    /// Scopes opened inside the current function body.
    scope_depth: usize,
    /// Names declared so far and still in scope, innermost last.
    visible: Vec<String>,
    /// Length of `visible` at each open scope.
    scope_marks: Vec<usize>,
}

impl<'a, 'p> CodeGenerator<'a, 'p> {
    pub fn new(ctx: &'a mut CompilationContext<'p>) -> Self {
        Self {
            ctx,
            emitter: BytecodeEmitter::new(),
            jumps: JumpManager::new(),
            functions: Vec::new(),
            function: "",
            scope_depth: 0,
            visible: Vec::new(),
            scope_marks: Vec::new(),
        }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn generate(mut self) -> Result<CompiledProgram, CompilationError> {
        let reachable: Vec<&'p FunctionDef> = self.ctx.reachable().to_vec();
        for function in reachable {
            self.generate_function(function)?;
        }
        self.link()?;

        let entry = self
            .functions
            .first()
            .map(|f| f.address)
            .ok_or_else(|| CompilationError::Internal {
                message: "no entry function was generated".to_string(),
            })?;
        let capacity = self.ctx.capacity();
        let functions = self.functions;
        let (instructions, lines) = self.emitter.finish();

        debug!(
            instructions = instructions.len(),
            functions = functions.len(),
            capacity,
            "bytecode generated"
        );
        Ok(CompiledProgram {
            instructions,
            capacity,
            entry,
            functions,
            lines,
        })
    }

    fn generate_function(&mut self, function: &'p FunctionDef) -> Result<(), CompilationError> {
        self.function = function.name.as_str();
        self.scope_depth = 0;
        self.visible.clear();
        self.scope_marks.clear();
        let address = self.emitter.current_address();

        let mut params = Vec::with_capacity(function.params.len());
        for param in &function.params {
            self.ctx.retype(self.function, &param.name, &param.ty);
            params.push(ParamSlot {
                slot: self.declared_slot(&param.name, function.line)?,
                ty: param.ty.clone(),
            });
            self.declare(&param.name);
        }
        self.functions.push(FunctionInfo {
            name: function.name.clone(),
            address,
            params,
            return_type: function.return_type.clone(),
        });

        self.generate_body(function)?;

        let returns = self.emitter.current_address() > address
            && matches!(self.emitter.last(), Some(Instruction::Return { .. }));
        if !returns {
            let line = function.body.last().map_or(function.line, |s| s.line);
            self.emitter.emit(Instruction::Return { value: None }, line);
        }

        debug!(
            function = function.name.as_str(),
            address,
            size = self.emitter.current_address() - address,
            "function generated"
        );
        Ok(())
    }

    /// Fills in the address of every call node and checks that every jump
    /// lands inside the program.
    fn link(&mut self) -> Result<(), CompilationError> {
        let addresses: Vec<_> = self.functions.iter().map(|f| f.address).collect();
        let len = self.emitter.current_address();
        for instruction in self.emitter.instructions_mut() {
            if let Some(target) = instruction.jump_target().filter(|&t| t >= len) {
                return Err(CompilationError::Internal {
                    message: format!("jump to {} is past the end of the program", target),
                });
            }
            for expr in instruction.exprs_mut() {
                expr.try_walk_mut(&mut |node| {
                    if let Expr::Call(call) = node {
                        if let CallTarget::Function { id, address } = &mut call.target {
                            *address = *addresses.get(*id).ok_or_else(|| {
                                CompilationError::Internal {
                                    message: format!("call to unknown function id {}", id),
                                }
                            })?;
                        }
                    }
                    Ok(())
                })?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Symbols
    // =========================================================================

    /// Slot of a name that is in scope at this point of the body.
    fn slot_of(&self, name: &str, line: u32) -> Result<usize, CompilationError> {
        if !self.visible.iter().any(|v| v == name) {
            return Err(CompilationError::UndeclaredSymbol {
                name: name.to_string(),
                line,
            });
        }
        self.declared_slot(name, line)
    }

    /// Slot the prescan assigned to `name`, whether or not it is in scope yet.
    fn declared_slot(&self, name: &str, line: u32) -> Result<usize, CompilationError> {
        self.ctx
            .lookup(self.function, name)
            .map(|symbol| symbol.slot)
            .ok_or_else(|| CompilationError::UndeclaredSymbol {
                name: name.to_string(),
                line,
            })
    }

    fn declare(&mut self, name: &str) {
        self.visible.push(name.to_string());
    }

    fn type_of(&self, name: &str) -> Option<&TypeDesc> {
        self.ctx.lookup(self.function, name).map(|symbol| &symbol.ty)
    }
}
