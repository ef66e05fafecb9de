//! The bytecode virtual machine.
//!
//! Execution is a fetch-decode-execute loop over a [`CompiledProgram`]'s
//! instruction list. A user function call re-enters the loop recursively
//! at the callee's address inside a fresh scope and returns once the callee
//! executes its `RETURN`; builtins are dispatched by numeric id.
//!
//! Variables live in reference-counted cells stored in a slot-indexed
//! symbol table. Reading a variable yields its live cell, writes mutate the
//! cell in place, and every value leaving a frame is cloned out of its cell
//! before the frame's scopes are torn down.
//!
//! [`CompiledProgram`]: sable_compiler::CompiledProgram

mod builtins;
mod io;
mod machine;
mod ops;
mod scope;

pub use io::{Console, OutputBuffer};
pub use machine::{Vm, VmOptions, VmState};
pub use ops::binary;
pub use scope::{Cell, SymbolTable};
