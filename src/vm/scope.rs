//! Runtime symbol table and scope stack.

use std::cell::RefCell;
use std::rc::Rc;

use sable_core::{RuntimeError, Slot, Value};

/// Shared mutable storage for one variable. Variable references alias the
/// cell; values leaving the table are cloned out of it.
pub type Cell = Rc<RefCell<Value>>;

#[derive(Debug, Default)]
struct Scope {
    /// Slots bound in this scope, each with the cell it displaced.
    bound: Vec<(Slot, Option<Cell>)>,
}

/// Slot-indexed cells plus the stack of live-slot sets.
#[derive(Debug, Default)]
pub struct SymbolTable {
    cells: Vec<Option<Cell>>,
    scopes: Vec<Scope>,
}

impl SymbolTable {
    pub fn new(capacity: usize) -> Self {
        let mut table = Self::default();
        table.reset(capacity);
        table
    }

    /// Unbinds everything and resizes to `capacity`.
    pub fn reset(&mut self, capacity: usize) {
        self.cells.clear();
        self.cells.resize(capacity, None);
        self.scopes.clear();
    }

    pub fn capacity(&self) -> usize {
        self.cells.len()
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn enter(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Pops the innermost scope, unbinding its slots and restoring the
    /// cells they displaced.
    pub fn exit(&mut self) {
        if let Some(scope) = self.scopes.pop() {
            for (slot, previous) in scope.bound.into_iter().rev() {
                self.cells[slot] = previous;
            }
        }
    }

    /// Pops scopes until `depth` remain.
    pub fn unwind_to(&mut self, depth: usize) {
        while self.scopes.len() > depth {
            self.exit();
        }
    }

    /// Binds `slot` to a fresh cell holding `value` in the innermost scope.
    ///
    /// A slot already bound in the same scope gets a new cell; one bound by
    /// an outer scope is restored when this scope exits.
    pub fn bind(&mut self, slot: Slot, value: Value) -> Result<(), RuntimeError> {
        self.check(slot)?;
        if self.scopes.is_empty() {
            self.enter();
        }
        let cell = Some(Rc::new(RefCell::new(value)));
        let Some(scope) = self.scopes.last_mut() else {
            return Ok(());
        };
        if scope.bound.iter().any(|(s, _)| *s == slot) {
            self.cells[slot] = cell;
        } else {
            let previous = std::mem::replace(&mut self.cells[slot], cell);
            scope.bound.push((slot, previous));
        }
        Ok(())
    }

    pub fn get(&self, slot: Slot) -> Result<Cell, RuntimeError> {
        self.check(slot)?;
        self.cells[slot]
            .clone()
            .ok_or(RuntimeError::UnboundSlot { slot })
    }

    pub fn is_bound(&self, slot: Slot) -> bool {
        matches!(self.cells.get(slot), Some(Some(_)))
    }

    fn check(&self, slot: Slot) -> Result<(), RuntimeError> {
        if slot < self.cells.len() {
            Ok(())
        } else {
            Err(RuntimeError::SlotOutOfRange {
                slot,
                capacity: self.cells.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_unbinds_scope_slots() {
        let mut table = SymbolTable::new(3);
        table.enter();
        table.bind(0, Value::Int32(1)).unwrap();
        table.enter();
        table.bind(1, Value::Int32(2)).unwrap();
        table.bind(2, Value::Int32(3)).unwrap();
        table.exit();

        assert!(table.is_bound(0));
        assert!(!table.is_bound(1));
        assert_eq!(table.get(2), Err(RuntimeError::UnboundSlot { slot: 2 }));
    }

    #[test]
    fn cells_alias() {
        let mut table = SymbolTable::new(1);
        table.enter();
        table.bind(0, Value::Int32(1)).unwrap();
        let a = table.get(0).unwrap();
        *table.get(0).unwrap().borrow_mut() = Value::Int32(9);
        assert_eq!(*a.borrow(), Value::Int32(9));
    }

    #[test]
    fn outer_binding_restored() {
        let mut table = SymbolTable::new(1);
        table.enter();
        table.bind(0, Value::Int64(5)).unwrap();
        table.enter();
        table.bind(0, Value::Int64(4)).unwrap();
        assert_eq!(*table.get(0).unwrap().borrow(), Value::Int64(4));
        table.exit();
        assert_eq!(*table.get(0).unwrap().borrow(), Value::Int64(5));
    }

    #[test]
    fn rebinding_in_same_scope_replaces() {
        let mut table = SymbolTable::new(1);
        table.enter();
        table.bind(0, Value::Int32(1)).unwrap();
        let old = table.get(0).unwrap();
        table.bind(0, Value::Int32(2)).unwrap();
        assert_eq!(*old.borrow(), Value::Int32(1));
        table.exit();
        assert!(!table.is_bound(0));
    }

    #[test]
    fn unwind_and_range() {
        let mut table = SymbolTable::new(2);
        table.enter();
        table.enter();
        table.enter();
        table.unwind_to(1);
        assert_eq!(table.depth(), 1);
        assert_eq!(
            table.bind(5, Value::None),
            Err(RuntimeError::SlotOutOfRange {
                slot: 5,
                capacity: 2
            })
        );
    }
}
