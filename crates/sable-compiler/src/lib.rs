//! Bytecode compiler for sable.
//!
//! ## Architecture
//!
//! Compilation runs three passes over one [`CompilationContext`]:
//!
//! 1. **Parse**: `sable_parser::parse_program` splits the source into
//!    functions of classified statements.
//! 2. **Prescan**: [`Prescanner`] walks from the entry function, numbering
//!    every parameter and local with a global slot and collecting the set of
//!    reachable functions. Everything else is dropped.
//! 3. **Generate**: [`CodeGenerator`] lays out each reachable function,
//!    resolving names to slots, builtin ids and function addresses and
//!    backpatching jumps.
//!
//! The result is an immutable [`CompiledProgram`].
//!
//! ```
//! let program = sable_compiler::compile("func main() => int32 {\n    return 1 + 2;\n}\n").unwrap();
//! assert_eq!(program.capacity, 0);
//! assert_eq!(program.instructions.len(), 1);
//! ```

pub mod bytecode;
pub mod codegen;
pub mod context;
pub mod emit;
pub mod prescan;

pub use bytecode::{CompiledProgram, FunctionInfo, Instruction, ParamSlot};
pub use codegen::CodeGenerator;
pub use context::{Callee, CompilationContext, Symbol};
pub use prescan::{PrescanReport, Prescanner};

use sable_core::Result;
use sable_parser::{Program, parse_program};
use tracing::debug;

/// Compiler settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerOptions {
    /// Name of the function execution starts in.
    pub entry_point: String,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            entry_point: "main".to_string(),
        }
    }
}

/// Compiles `source` with default options.
pub fn compile(source: &str) -> Result<CompiledProgram> {
    compile_with(source, &CompilerOptions::default())
}

pub fn compile_with(source: &str, options: &CompilerOptions) -> Result<CompiledProgram> {
    let program = parse_program(source, &options.entry_point)?;
    compile_program(&program)
}

/// Compiles an already parsed program.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn compile_program(program: &Program) -> Result<CompiledProgram> {
    let mut ctx = CompilationContext::new(program);
    let report = Prescanner::new(&mut ctx).run();
    if !report.eliminated.is_empty() {
        debug!(functions = ?report.eliminated, "eliminated unreachable functions");
    }
    Ok(CodeGenerator::new(&mut ctx).generate()?)
}

#[cfg(test)]
mod tests {
    use sable_core::{CompilationError, ParseErrorKind, SableError};

    use super::*;

    #[test]
    fn slots_follow_declaration_order() {
        let program = compile(
            r#"
func main(a: int32, b: int32) {
    let c: int32 = a + b;
    let d: int32 = c;
}
"#,
        )
        .unwrap();
        let slots: Vec<_> = program
            .instructions
            .iter()
            .filter_map(|i| match i {
                Instruction::Bind { slot, .. } => Some(*slot),
                _ => None,
            })
            .collect();
        assert_eq!(slots, [2, 3]);
        let main = program.entry_function().unwrap();
        assert_eq!(main.params.iter().map(|p| p.slot).collect::<Vec<_>>(), [0, 1]);
        assert_eq!(program.capacity, 4);
    }

    #[test]
    fn custom_entry_point() {
        let options = CompilerOptions {
            entry_point: "start".to_string(),
        };
        let program = compile_with("func start() {\n}\n", &options).unwrap();
        assert_eq!(program.entry_function().unwrap().name, "start");
    }

    #[test]
    fn missing_entry_is_a_parse_error() {
        let err = compile("func other() {\n}\n").unwrap_err();
        assert!(matches!(err, SableError::Parse(ref e) if e.kind == ParseErrorKind::MissingEntry));
    }

    #[test]
    fn compile_errors_surface_as_sable_errors() {
        let err = compile("func main() {\n    x = 1;\n}\n").unwrap_err();
        assert!(err.is_compile_time());
        assert!(matches!(
            err,
            SableError::Compile(CompilationError::UndeclaredSymbol { .. })
        ));
    }

    #[test]
    fn every_function_ends_in_return() {
        let program = compile(
            "func helper() {\n    println(1);\n}\nfunc main() {\n    helper();\n}\n",
        )
        .unwrap();
        for function in &program.functions {
            let next = program
                .functions
                .iter()
                .map(|f| f.address)
                .filter(|&a| a > function.address)
                .min()
                .unwrap_or(program.len());
            assert_eq!(program.instructions[next - 1].name(), "RETURN");
        }
    }

    #[test]
    fn disassembly_lists_functions() {
        let program = compile("func main() => uint8 {\n    let a: uint8 = 11;\n    return a;\n}\n")
            .unwrap();
        let text = program.disassemble();
        assert!(text.contains("main:"));
        assert!(text.contains("0000  BIND s0 uint8"));
        assert!(text.contains("0002  RETURN s0"));
    }
}
