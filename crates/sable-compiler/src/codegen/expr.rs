//! Placeholder resolution inside expression trees.

use sable_core::{BuiltinId, CompilationError, Composition, Primitive, TypeDesc};
use sable_parser::{BuiltinCall, CallTarget, Expr, VarRef};

use super::CodeGenerator;
use crate::context::Callee;

/// Primitive of a bare type; compositions have no scalar type.
fn scalar(ty: &TypeDesc) -> Option<Primitive> {
    (ty.composition == Composition::None).then_some(ty.primitive)
}

impl<'a, 'p> CodeGenerator<'a, 'p> {
    /// Returns a copy of `expr` with every name resolved.
    pub(super) fn compile_expr(&self, expr: &Expr, line: u32) -> Result<Expr, CompilationError> {
        let mut expr = expr.clone();
        self.resolve(&mut expr, line)?;
        Ok(expr)
    }

    /// Resolves `expr` in place, bottom-up, and returns its static type.
    fn resolve(&self, expr: &mut Expr, line: u32) -> Result<Option<Primitive>, CompilationError> {
        match expr {
            Expr::Constant(value) => Ok(Some(value.primitive())),
            Expr::Null => Ok(Some(Primitive::None)),
            Expr::Variable(var) => self.resolve_var(var, line).map(|ty| ty.and_then(scalar)),
            Expr::Binary(node) => {
                let left = self.resolve(&mut node.left, line)?;
                self.resolve(&mut node.right, line)?;
                node.result_type = node.infer_type(left);
                Ok(node.result_type)
            }
            Expr::Index(index) => {
                let base = self.resolve_var(&mut index.base, line)?;
                self.resolve(&mut index.index, line)?;
                Ok(base.and_then(|ty| match ty.element_type() {
                    Some(element) => scalar(element),
                    None if ty.primitive == Primitive::String => Some(Primitive::Char),
                    None => None,
                }))
            }
            Expr::Builtin(call) => {
                for arg in &mut call.args {
                    self.resolve(arg, line)?;
                }
                Ok(BuiltinId::try_from(call.id).ok().and_then(builtin_type))
            }
            Expr::Call(call) => {
                for arg in &mut call.args {
                    self.resolve(arg, line)?;
                }
                match self.ctx.callee(&call.name) {
                    Callee::Builtin(id) => {
                        let resolved = BuiltinCall {
                            id: id.into(),
                            name: std::mem::take(&mut call.name),
                            args: std::mem::take(&mut call.args),
                        };
                        *expr = Expr::Builtin(resolved);
                        Ok(builtin_type(id))
                    }
                    Callee::Function(function) => {
                        if call.args.len() != function.params.len() {
                            return Err(CompilationError::ArityMismatch {
                                name: call.name.clone(),
                                expected: function.params.len().to_string(),
                                got: call.args.len(),
                                line,
                            });
                        }
                        let id = self.ctx.function_id(&call.name).ok_or_else(|| {
                            CompilationError::Internal {
                                message: format!("'{}' was not prescanned", call.name),
                            }
                        })?;
                        call.target = CallTarget::Function { id, address: 0 };
                        Ok(scalar(&function.return_type))
                    }
                    Callee::Undefined => Err(CompilationError::UndefinedFunction {
                        name: call.name.clone(),
                        line,
                    }),
                }
            }
        }
    }

    fn resolve_var(&self, var: &mut VarRef, line: u32) -> Result<Option<&TypeDesc>, CompilationError> {
        match var {
            VarRef::Name(name) => {
                let slot = self.slot_of(name, line)?;
                let ty = self.type_of(name);
                *var = VarRef::Slot(slot);
                Ok(ty)
            }
            VarRef::Slot(_) => Ok(None),
        }
    }
}

/// Static result type of a builtin call.
fn builtin_type(id: BuiltinId) -> Option<Primitive> {
    match id {
        BuiltinId::Len => Some(Primitive::Int32),
        BuiltinId::ReadLine => Some(Primitive::String),
        BuiltinId::ReadChar => Some(Primitive::Char),
        BuiltinId::Print | BuiltinId::Println | BuiltinId::Printf => Some(Primitive::None),
        cast => cast.cast_target(),
    }
}
