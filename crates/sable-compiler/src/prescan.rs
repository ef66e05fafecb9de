//! Symbol and call prescanner.
//!
//! Walks the program from the entry function, assigning each parameter and
//! bound local a global slot in first-declaration order. A call to a user
//! function that has not been visited yet marks it reachable and scans it
//! immediately, so its symbols continue the same numbering. Functions never
//! reached are dropped before code generation.

use sable_parser::{Expr, FunctionDef, Operation};
use tracing::debug;

use crate::context::{Callee, CompilationContext};

/// Outcome of a prescan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrescanReport {
    /// Required symbol-table capacity.
    pub capacity: usize,
    /// Reachable functions in discovery order, entry first.
    pub reachable: Vec<String>,
    /// Functions that will not be generated.
    pub eliminated: Vec<String>,
}

pub struct Prescanner<'a, 'p> {
    ctx: &'a mut CompilationContext<'p>,
}

impl<'a, 'p> Prescanner<'a, 'p> {
    pub fn new(ctx: &'a mut CompilationContext<'p>) -> Self {
        Self { ctx }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self) -> PrescanReport {
        let program = self.ctx.program();
        let entry = &program.entry;
        self.ctx.mark_called(entry);
        self.scan_function(entry);

        let reachable: Vec<String> = self
            .ctx
            .reachable()
            .iter()
            .map(|f| f.name.clone())
            .collect();
        let eliminated: Vec<String> = program
            .side_functions
            .iter()
            .filter(|f| !self.ctx.is_called(&f.name))
            .map(|f| f.name.clone())
            .collect();

        debug!(
            capacity = self.ctx.capacity(),
            reachable = reachable.len(),
            eliminated = ?eliminated,
            "prescan complete"
        );
        PrescanReport {
            capacity: self.ctx.capacity(),
            reachable,
            eliminated,
        }
    }

    fn scan_function(&mut self, function: &'p FunctionDef) {
        let name = function.name.as_str();
        for param in &function.params {
            self.ctx.declare(name, &param.name, &param.ty);
        }
        for stmt in &function.body {
            self.scan_operation(name, &stmt.op);
        }
    }

    fn scan_operation(&mut self, function: &'p str, op: &'p Operation) {
        match op {
            Operation::Bind { name, ty, init } => {
                self.ctx.declare(function, name, ty);
                if let Some(init) = init {
                    self.scan_expr(init);
                }
            }
            Operation::ForHeader {
                iterator,
                ty,
                init,
                condition,
                update,
            } => {
                self.ctx.declare(function, iterator, ty);
                self.scan_expr(init);
                self.scan_expr(condition);
                if let Some(index) = &update.index {
                    self.scan_expr(index);
                }
                self.scan_expr(&update.value);
            }
            Operation::Assign(assignment) => {
                if let Some(index) = &assignment.index {
                    self.scan_expr(index);
                }
                self.scan_expr(&assignment.value);
            }
            Operation::While { condition } | Operation::If { condition } => {
                self.scan_expr(condition)
            }
            Operation::Grow { amount, .. } | Operation::Shrink { amount, .. } => {
                self.scan_expr(amount)
            }
            Operation::Return(Some(expr)) | Operation::Expression(expr) => self.scan_expr(expr),
            Operation::Return(None)
            | Operation::Else
            | Operation::Break
            | Operation::CloseBrace
            | Operation::NoOp => {}
        }
    }

    fn scan_expr(&mut self, expr: &'p Expr) {
        let mut calls: Vec<&'p str> = Vec::new();
        expr.walk(&mut |node| {
            if let Expr::Call(call) = node {
                calls.push(call.name.as_str());
            }
        });

        for name in calls {
            if let Callee::Function(function) = self.ctx.callee(name) {
                if self.ctx.mark_called(function) {
                    self.scan_function(function);
                }
            }
        }
    }
}
