//! One-stop facade over the compiler and the VM.

use std::io::{BufRead, Write};

use sable_compiler::{CompiledProgram, CompilerOptions, compile_with};
use sable_core::{Result, Value};
use tracing::debug;

use crate::vm::{Vm, VmOptions};

/// Compiles and runs scripts with one set of options and one console.
///
/// ```
/// use sable::{Engine, OutputBuffer, Value};
///
/// let out = OutputBuffer::new();
/// let mut engine = Engine::new().with_output(out.clone());
/// let result = engine
///     .run("func main() => int32 {\n    println(\"hi\");\n    return 2 * 21;\n}\n")
///     .unwrap();
/// assert_eq!(result, Value::Int32(42));
/// assert_eq!(out.contents(), "hi\n");
/// ```
#[derive(Debug, Default)]
pub struct Engine {
    compiler: CompilerOptions,
    vm: Vm,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(compiler: CompilerOptions, vm: VmOptions) -> Self {
        Self {
            compiler,
            vm: Vm::with_options(vm),
        }
    }

    pub fn with_entry_point(mut self, name: impl Into<String>) -> Self {
        self.compiler.entry_point = name.into();
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.vm.set_max_call_depth(depth);
        self
    }

    pub fn with_output(mut self, output: impl Write + 'static) -> Self {
        self.vm.set_output(output);
        self
    }

    pub fn with_input(mut self, input: impl BufRead + 'static) -> Self {
        self.vm.set_input(input);
        self
    }

    pub fn compiler_options(&self) -> &CompilerOptions {
        &self.compiler
    }

    pub fn vm(&self) -> &Vm {
        &self.vm
    }

    pub fn vm_mut(&mut self) -> &mut Vm {
        &mut self.vm
    }

    pub fn compile(&self, source: &str) -> Result<CompiledProgram> {
        compile_with(source, &self.compiler)
    }

    pub fn execute(&mut self, program: &CompiledProgram) -> Result<Value> {
        Ok(self.vm.exec(program)?)
    }

    /// Compiles and executes `source`.
    pub fn run(&mut self, source: &str) -> Result<Value> {
        let program = self.compile(source)?;
        debug!(instructions = program.len(), "compiled");
        self.execute(&program)
    }
}
