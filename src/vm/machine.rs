use std::io::{BufRead, Write};

use sable_compiler::{CompiledProgram, FunctionInfo, Instruction};
use sable_core::{Address, RuntimeError, Slot, TypeDesc, Value};
use sable_parser::{CallExpr, CallTarget, Expr, IndexExpr, VarRef};
use tracing::{debug, trace, warn};

use super::io::Console;
use super::ops;
use super::scope::{Cell, SymbolTable};

/// Native stack left before a call grows the stack.
const STACK_RED_ZONE: usize = 128 * 1024;
/// Size of each new stack segment.
const STACK_GROW_SIZE: usize = 4 * 1024 * 1024;

/// Execution limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmOptions {
    /// Deepest allowed nesting of user function calls.
    pub max_call_depth: usize,
}

impl Default for VmOptions {
    fn default() -> Self {
        Self {
            max_call_depth: 512,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmState {
    Idle,
    Running,
    Finished,
    Aborted,
}

/// The bytecode interpreter.
///
/// A `Vm` owns its symbol table, scope stack and console. Programs are only
/// borrowed for the duration of [`Vm::exec`], so one program can be run by
/// many VMs and one VM can run many programs in turn.
#[derive(Debug)]
pub struct Vm {
    options: VmOptions,
    symbols: SymbolTable,
    console: Console,
    state: VmState,
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}

impl Vm {
    pub fn new() -> Self {
        Self::with_options(VmOptions::default())
    }

    pub fn with_options(options: VmOptions) -> Self {
        Self {
            options,
            symbols: SymbolTable::default(),
            console: Console::default(),
            state: VmState::Idle,
        }
    }

    pub fn options(&self) -> &VmOptions {
        &self.options
    }

    pub fn set_max_call_depth(&mut self, depth: usize) {
        self.options.max_call_depth = depth;
    }

    pub fn set_output(&mut self, output: impl Write + 'static) {
        self.console.set_output(output);
    }

    pub fn set_input(&mut self, input: impl BufRead + 'static) {
        self.console.set_input(input);
    }

    pub fn state(&self) -> VmState {
        self.state
    }

    /// Whether `slot` is currently bound.
    pub fn is_bound(&self, slot: Slot) -> bool {
        self.symbols.is_bound(slot)
    }

    /// Runs `program` from its entry function, whose parameters get their
    /// type's default value.
    pub fn exec(&mut self, program: &CompiledProgram) -> Result<Value, RuntimeError> {
        self.exec_with_args(program, Vec::new())
    }

    /// Runs `program`, passing `args` to the entry function's parameters.
    /// Missing arguments take their parameter type's default.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn exec_with_args(
        &mut self,
        program: &CompiledProgram,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        self.symbols.reset(program.capacity);
        self.state = VmState::Running;
        debug!(
            instructions = program.len(),
            capacity = program.capacity,
            "exec start"
        );

        let mut executor = Executor {
            program,
            symbols: &mut self.symbols,
            console: &mut self.console,
            max_call_depth: self.options.max_call_depth,
            pc: program.entry,
            call_depth: 0,
        };
        let result = executor.run_entry(args);

        match &result {
            Ok(value) => {
                self.state = VmState::Finished;
                debug!(result = %value, "exec finished");
            }
            Err(err) => {
                self.state = VmState::Aborted;
                debug!(error = %err, "exec aborted");
            }
        }
        result
    }
}

/// Value produced by resolving an expression: either a live cell or a
/// temporary.
pub(crate) enum Operand {
    Cell(Cell),
    Value(Value),
}

impl Operand {
    /// Detaches the value from any cell.
    pub(crate) fn into_value(self) -> Value {
        match self {
            Operand::Cell(cell) => cell.borrow().clone(),
            Operand::Value(value) => value,
        }
    }

    pub(crate) fn with<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        match self {
            Operand::Cell(cell) => f(&cell.borrow()),
            Operand::Value(value) => f(value),
        }
    }
}

/// State of one `exec` call.
pub(crate) struct Executor<'a> {
    program: &'a CompiledProgram,
    symbols: &'a mut SymbolTable,
    pub(crate) console: &'a mut Console,
    max_call_depth: usize,
    pc: Address,
    call_depth: usize,
}

impl<'a> Executor<'a> {
    fn run_entry(&mut self, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let program = self.program;
        let info = program
            .entry_function()
            .ok_or(RuntimeError::InvalidAddress {
                address: self.program.entry,
            })?;
        let mut args = args.into_iter();
        let args = info
            .params
            .iter()
            .map(|param| args.next().unwrap_or_else(|| Value::default_for(&param.ty)))
            .collect();
        self.invoke(info, args)
    }

    /// Runs a function frame: binds `args` to its parameters in a new scope,
    /// executes until its `RETURN` and tears the frame's scopes down.
    fn invoke(&mut self, info: &'a FunctionInfo, args: Vec<Value>) -> Result<Value, RuntimeError> {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROW_SIZE, || self.invoke_frame(info, args))
    }

    fn invoke_frame(
        &mut self,
        info: &'a FunctionInfo,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        if self.call_depth >= self.max_call_depth {
            return Err(RuntimeError::CallDepthExceeded {
                limit: self.max_call_depth,
            });
        }
        if args.len() != info.params.len() {
            return Err(RuntimeError::ArityMismatch {
                name: info.name.clone(),
                expected: info.params.len().to_string(),
                got: args.len(),
            });
        }
        trace!(function = %info.name, depth = self.call_depth, "call");

        let saved_pc = self.pc;
        let depth = self.symbols.depth();
        self.symbols.enter();
        self.call_depth += 1;

        let result = self.bind_params(info, args).and_then(|()| self.run(info.address));

        self.call_depth -= 1;
        self.symbols.unwind_to(depth);
        self.pc = saved_pc;

        finish_return(info, result?)
    }

    fn bind_params(&mut self, info: &FunctionInfo, args: Vec<Value>) -> Result<(), RuntimeError> {
        for (param, arg) in info.params.iter().zip(args) {
            self.symbols.bind(param.slot, arg.coerce_to(&param.ty)?)?;
        }
        Ok(())
    }

    /// Fetch-decode-execute from `start` until a `RETURN`.
    fn run(&mut self, start: Address) -> Result<Value, RuntimeError> {
        let program = self.program;
        self.pc = start;
        loop {
            let address = self.pc;
            let instruction = program
                .instructions
                .get(address)
                .ok_or(RuntimeError::InvalidAddress { address })?;
            trace!(pc = address, %instruction);
            self.pc += 1;

            match instruction {
                Instruction::Bind { slot, ty } => self.symbols.bind(*slot, Value::default_for(ty))?,
                Instruction::Assign { slot, value } => {
                    let value = self.resolve(value)?.into_value();
                    self.assign(*slot, value)?;
                }
                Instruction::IndexAssign { slot, index, value } => {
                    let index = self.resolve(index)?.into_value();
                    let value = self.resolve(value)?.into_value();
                    self.index_assign(*slot, &index, value)?;
                }
                Instruction::Expression { expr } => {
                    self.resolve(expr)?;
                }
                Instruction::EnterScope => self.symbols.enter(),
                Instruction::ExitScope => self.symbols.exit(),
                Instruction::Jump { target } => self.jump(*target)?,
                Instruction::JumpIf { cond, target } => {
                    if self.condition(cond)? {
                        self.jump(*target)?;
                    }
                }
                Instruction::JumpIfNot { cond, target } => {
                    if !self.condition(cond)? {
                        self.jump(*target)?;
                    }
                }
                Instruction::Grow {
                    slot,
                    amount,
                    element,
                } => {
                    let amount = self.amount(amount)?;
                    self.grow(*slot, amount, element)?;
                }
                Instruction::Shrink { slot, amount } => {
                    let amount = self.amount(amount)?;
                    self.shrink(*slot, amount)?;
                }
                Instruction::Return { value } => {
                    return match value {
                        Some(expr) => Ok(self.resolve(expr)?.into_value()),
                        None => Ok(Value::None),
                    };
                }
            }
        }
    }

    fn jump(&mut self, target: Address) -> Result<(), RuntimeError> {
        if target >= self.program.len() {
            return Err(RuntimeError::InvalidAddress { address: target });
        }
        self.pc = target;
        Ok(())
    }

    fn condition(&mut self, cond: &Expr) -> Result<bool, RuntimeError> {
        self.resolve(cond)?.with(|value| {
            value.as_bool().ok_or_else(|| RuntimeError::ConditionNotBool {
                found: value.type_name(),
            })
        })
    }

    fn amount(&mut self, amount: &Expr) -> Result<usize, RuntimeError> {
        self.resolve(amount)?.with(|value| {
            let n = value.as_i64().ok_or_else(|| RuntimeError::InvalidIndex {
                found: value.type_name(),
            })?;
            usize::try_from(n).map_err(|_| RuntimeError::IndexOutOfRange { index: n, len: 0 })
        })
    }

    // =========================================================================
    // Cells
    // =========================================================================

    /// Writes `value` into the cell at `slot`, converted to the cell's type.
    /// The cell itself is kept, so aliases observe the write.
    fn assign(&mut self, slot: Slot, value: Value) -> Result<(), RuntimeError> {
        let cell = self.symbols.get(slot)?;
        let ty = cell.borrow().type_desc();
        let value = value.coerce_to(&ty)?;
        *cell.borrow_mut() = value;
        Ok(())
    }

    fn index_assign(&mut self, slot: Slot, index: &Value, value: Value) -> Result<(), RuntimeError> {
        let cell = self.symbols.get(slot)?;
        let mut target = cell.borrow_mut();
        match &mut *target {
            Value::List { ty, items } => {
                let i = position(index, items.len())?;
                items[i] = match ty.element_type() {
                    Some(element) => value.coerce_to(element)?,
                    None => value,
                };
            }
            Value::Map { ty, entries } => {
                let key = map_key(ty.key_type(), index)?;
                let value = match ty.element_type() {
                    Some(element) => value.coerce_to(element)?,
                    None => value,
                };
                entries.insert(key, value);
            }
            Value::String(s) => {
                let i = position(index, s.chars().count())?;
                let c = match value {
                    Value::Char(c) => c,
                    other => {
                        return Err(RuntimeError::AssignMismatch {
                            expected: "char".to_string(),
                            found: other.type_name(),
                        });
                    }
                };
                *s = s
                    .chars()
                    .enumerate()
                    .map(|(j, old)| if j == i { c } else { old })
                    .collect();
            }
            other => {
                return Err(RuntimeError::NotIndexable {
                    found: other.type_name(),
                });
            }
        }
        Ok(())
    }

    fn grow(&mut self, slot: Slot, amount: usize, element: &TypeDesc) -> Result<(), RuntimeError> {
        let cell = self.symbols.get(slot)?;
        let mut target = cell.borrow_mut();
        match &mut *target {
            Value::List { items, .. } => {
                let fill = Value::default_for(element);
                items.resize(items.len() + amount, fill);
                Ok(())
            }
            other => Err(RuntimeError::NotACollection {
                found: other.type_name(),
            }),
        }
    }

    fn shrink(&mut self, slot: Slot, amount: usize) -> Result<(), RuntimeError> {
        let cell = self.symbols.get(slot)?;
        let mut target = cell.borrow_mut();
        match &mut *target {
            Value::List { items, .. } => {
                let len = items.len();
                let keep = len
                    .checked_sub(amount)
                    .ok_or(RuntimeError::IndexOutOfRange {
                        index: amount as i64,
                        len,
                    })?;
                items.truncate(keep);
                Ok(())
            }
            other => Err(RuntimeError::NotACollection {
                found: other.type_name(),
            }),
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(crate) fn resolve(&mut self, expr: &Expr) -> Result<Operand, RuntimeError> {
        match expr {
            Expr::Constant(value) => Ok(Operand::Value(value.clone())),
            Expr::Null => Ok(Operand::Value(Value::None)),
            Expr::Variable(var) => Ok(Operand::Cell(self.cell(var)?)),
            Expr::Binary(node) => {
                let left = self.resolve(&node.left)?;
                let right = self.resolve(&node.right)?;
                left.with(|l| right.with(|r| ops::binary(node.op, l, r)))
                    .map(Operand::Value)
            }
            Expr::Index(index) => self.index(index).map(Operand::Value),
            Expr::Call(call) => self.call(call).map(Operand::Value),
            Expr::Builtin(call) => self.call_builtin(call).map(Operand::Value),
        }
    }

    fn cell(&self, var: &VarRef) -> Result<Cell, RuntimeError> {
        match var {
            VarRef::Slot(slot) => self.symbols.get(*slot),
            VarRef::Name(name) => Err(RuntimeError::UnresolvedPlaceholder { name: name.clone() }),
        }
    }

    fn index(&mut self, index: &IndexExpr) -> Result<Value, RuntimeError> {
        let key = self.resolve(&index.index)?.into_value();
        let cell = self.cell(&index.base)?;
        let base = cell.borrow();
        match &*base {
            Value::List { items, .. } => Ok(items[position(&key, items.len())?].clone()),
            Value::Map { ty, entries } => {
                let k = map_key(ty.key_type(), &key)?;
                entries
                    .get(&k)
                    .cloned()
                    .ok_or_else(|| RuntimeError::KeyNotFound { key: k.to_string() })
            }
            Value::String(s) => {
                let i = position(&key, s.chars().count())?;
                s.chars()
                    .nth(i)
                    .map(Value::Char)
                    .ok_or(RuntimeError::IndexOutOfRange {
                        index: i as i64,
                        len: s.len(),
                    })
            }
            other => Err(RuntimeError::NotIndexable {
                found: other.type_name(),
            }),
        }
    }

    /// Calls a user function. Arguments are resolved in the caller's frame
    /// and passed by value.
    fn call(&mut self, call: &CallExpr) -> Result<Value, RuntimeError> {
        let CallTarget::Function { id, address } = call.target else {
            return Err(RuntimeError::UnresolvedPlaceholder {
                name: call.name.clone(),
            });
        };
        let program = self.program;
        let info = program
            .functions
            .get(id)
            .filter(|info| info.address == address)
            .ok_or(RuntimeError::InvalidAddress { address })?;

        let args = call
            .args
            .iter()
            .map(|arg| self.resolve(arg).map(Operand::into_value))
            .collect::<Result<Vec<_>, _>>()?;
        self.invoke(info, args)
    }
}

/// Converts a function's result to its declared return type.
fn finish_return(info: &FunctionInfo, value: Value) -> Result<Value, RuntimeError> {
    if info.return_type.is_none() {
        return Ok(value);
    }
    if value == Value::None {
        warn!(
            function = %info.name,
            return_type = %info.return_type,
            "function returned no value; using the type's default"
        );
        return Ok(Value::default_for(&info.return_type));
    }
    value.coerce_to(&info.return_type)
}

/// Bounds-checked position from a numeric index value.
fn position(index: &Value, len: usize) -> Result<usize, RuntimeError> {
    let i = index.as_i64().ok_or_else(|| RuntimeError::InvalidIndex {
        found: index.type_name(),
    })?;
    usize::try_from(i)
        .ok()
        .filter(|&i| i < len)
        .ok_or(RuntimeError::IndexOutOfRange { index: i, len })
}

fn map_key(key_type: Option<&TypeDesc>, index: &Value) -> Result<sable_core::MapKey, RuntimeError> {
    let key = match key_type {
        Some(ty) => index.coerce_to(ty)?,
        None => index.clone(),
    };
    key.to_map_key().ok_or_else(|| RuntimeError::InvalidIndex {
        found: key.type_name(),
    })
}
