//! CompilationContext - state shared by the prescanner and the generator.
//!
//! The context owns every name-keyed map built during compilation: the
//! compile-time symbol table (variable → global slot), the function lookup
//! table and the set of functions reached from the entry point. It is
//! created per compilation and passed explicitly through each pass.

use rustc_hash::{FxHashMap, FxHashSet};
use sable_core::{BuiltinId, Slot, TypeDesc};
use sable_parser::{FunctionDef, Program};

/// A declared variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    pub slot: Slot,
    /// Type of the most recent declaration seen.
    pub ty: TypeDesc,
}

/// What a call site names.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Callee<'p> {
    Builtin(BuiltinId),
    Function(&'p FunctionDef),
    Undefined,
}

pub struct CompilationContext<'p> {
    program: &'p Program,
    functions: FxHashMap<&'p str, &'p FunctionDef>,
    /// Keyed by (function, variable); slots are numbered across the whole
    /// program.
    symbols: FxHashMap<(&'p str, String), Symbol>,
    next_slot: Slot,
    called: FxHashSet<&'p str>,
    /// Reachable functions in discovery order, entry first.
    reachable: Vec<&'p FunctionDef>,
}

impl<'p> CompilationContext<'p> {
    /// Indexes the entry and side functions of `program` by name.
    pub fn new(program: &'p Program) -> Self {
        let mut functions = FxHashMap::default();
        functions.insert(program.entry.name.as_str(), &program.entry);
        for function in &program.side_functions {
            functions.insert(function.name.as_str(), function);
        }
        Self {
            program,
            functions,
            symbols: FxHashMap::default(),
            next_slot: 0,
            called: FxHashSet::default(),
            reachable: Vec::new(),
        }
    }

    pub fn program(&self) -> &'p Program {
        self.program
    }

    // =========================================================================
    // Symbols
    // =========================================================================

    /// Declares `name` in `function`, allocating the next global slot on its
    /// first declaration. Later declarations reuse the slot.
    pub fn declare(&mut self, function: &'p str, name: &str, ty: &TypeDesc) -> Slot {
        let key = (function, name.to_string());
        if let Some(symbol) = self.symbols.get_mut(&key) {
            symbol.ty = ty.clone();
            return symbol.slot;
        }
        let slot = self.next_slot;
        self.next_slot += 1;
        self.symbols.insert(
            key,
            Symbol {
                slot,
                ty: ty.clone(),
            },
        );
        slot
    }

    /// Symbol declared as `name` anywhere in `function`.
    pub fn lookup(&self, function: &'p str, name: &str) -> Option<&Symbol> {
        self.symbols.get(&(function, name.to_string()))
    }

    /// Records the type of the declaration currently being generated.
    pub fn retype(&mut self, function: &'p str, name: &str, ty: &TypeDesc) {
        if let Some(symbol) = self.symbols.get_mut(&(function, name.to_string())) {
            symbol.ty = ty.clone();
        }
    }

    /// Symbol-table capacity required so far.
    pub fn capacity(&self) -> usize {
        self.next_slot
    }

    // =========================================================================
    // Functions
    // =========================================================================

    /// Resolves a call name. Builtins win over user functions of the same
    /// name.
    pub fn callee(&self, name: &str) -> Callee<'p> {
        if let Some(id) = BuiltinId::from_name(name) {
            return Callee::Builtin(id);
        }
        match self.functions.get(name) {
            Some(&function) => Callee::Function(function),
            None => Callee::Undefined,
        }
    }

    /// Marks `function` reachable. Returns false if it already was.
    pub fn mark_called(&mut self, function: &'p FunctionDef) -> bool {
        if !self.called.insert(function.name.as_str()) {
            return false;
        }
        self.reachable.push(function);
        true
    }

    pub fn is_called(&self, name: &str) -> bool {
        self.called.contains(name)
    }

    pub fn reachable(&self) -> &[&'p FunctionDef] {
        &self.reachable
    }

    /// Position of `name` in the reachable list; this is the function's id
    /// in the compiled program.
    pub fn function_id(&self, name: &str) -> Option<usize> {
        self.reachable.iter().position(|f| f.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_core::Primitive;
    use sable_parser::parse_program;

    fn program() -> Program {
        parse_program(
            "func len(x: int32) {\n}\nfunc helper() {\n}\nfunc main() {\n}\n",
            "main",
        )
        .unwrap()
    }

    #[test]
    fn slots_are_global_and_reused() {
        let program = program();
        let mut ctx = CompilationContext::new(&program);
        let int = TypeDesc::primitive(Primitive::Int32);

        assert_eq!(ctx.declare("main", "a", &int), 0);
        assert_eq!(ctx.declare("helper", "a", &int), 1);
        assert_eq!(ctx.declare("main", "a", &int), 0);
        assert_eq!(ctx.capacity(), 2);
        assert_eq!(ctx.lookup("helper", "a").unwrap().slot, 1);
        assert!(ctx.lookup("helper", "b").is_none());
    }

    #[test]
    fn redeclaration_updates_type() {
        let program = program();
        let mut ctx = CompilationContext::new(&program);
        ctx.declare("main", "x", &TypeDesc::primitive(Primitive::Int32));
        ctx.declare("main", "x", &TypeDesc::primitive(Primitive::String));
        assert_eq!(
            ctx.lookup("main", "x").unwrap().ty,
            TypeDesc::primitive(Primitive::String)
        );
    }

    #[test]
    fn builtins_shadow_functions() {
        let program = program();
        let ctx = CompilationContext::new(&program);
        assert_eq!(ctx.callee("len"), Callee::Builtin(BuiltinId::Len));
        assert!(matches!(ctx.callee("helper"), Callee::Function(_)));
        assert_eq!(ctx.callee("missing"), Callee::Undefined);
    }

    #[test]
    fn reachability_in_discovery_order() {
        let program = program();
        let mut ctx = CompilationContext::new(&program);
        assert!(ctx.mark_called(&program.entry));
        let helper = program.function("helper").unwrap();
        assert!(ctx.mark_called(helper));
        assert!(!ctx.mark_called(helper));
        assert_eq!(ctx.function_id("helper"), Some(1));
        assert!(!ctx.is_called("len"));
    }
}
