//! sable: a compiler and virtual machine for a small statically typed
//! scripting language.
//!
//! Source text goes through the parser (`sable-parser`), is compiled into a
//! flat [`CompiledProgram`] (`sable-compiler`) and is executed by the
//! [`Vm`] in this crate. [`Engine`] wires the two halves together.
//!
//! ```
//! use sable::{Value, Vm, compile};
//!
//! let program = compile(
//!     "func main() => int32 {\n    let total: int32 = 0;\n    for (let i: int32 = 0; i < 4; i = i + 1) {\n        total = total + i;\n    }\n    return total;\n}\n",
//! )
//! .unwrap();
//! assert_eq!(Vm::new().exec(&program).unwrap(), Value::Int32(6));
//! ```

pub mod engine;
pub mod vm;

pub use engine::Engine;
pub use vm::{OutputBuffer, Vm, VmOptions, VmState};

pub use sable_compiler::{
    CompiledProgram, CompilerOptions, FunctionInfo, Instruction, compile, compile_program,
    compile_with,
};
pub use sable_core::{
    BuiltinId, CompilationError, LexError, ParseError, ParseErrorKind, Primitive, Result,
    RuntimeError, SableError, TypeDesc, TypeError, Value,
};
pub use sable_parser::{Expr, parse_program};
