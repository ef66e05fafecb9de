//! Builtin handlers, dispatched by numeric id.

use sable_core::{BuiltinId, RuntimeError, Value};
use sable_parser::BuiltinCall;
use tracing::trace;

use super::machine::{Executor, Operand};

impl Executor<'_> {
    pub(crate) fn call_builtin(&mut self, call: &BuiltinCall) -> Result<Value, RuntimeError> {
        let id = BuiltinId::try_from(call.id).map_err(|_| RuntimeError::UnknownBuiltin { id: call.id })?;
        let arity = id.arity();
        if !arity.accepts(call.args.len()) {
            return Err(RuntimeError::ArityMismatch {
                name: id.name().to_string(),
                expected: arity.to_string(),
                got: call.args.len(),
            });
        }
        trace!(builtin = id.name(), args = call.args.len(), "builtin");

        let args = call
            .args
            .iter()
            .map(|arg| self.resolve(arg).map(Operand::into_value))
            .collect::<Result<Vec<_>, _>>()?;

        match id {
            BuiltinId::Len => {
                let value = &args[0];
                let len = value.len().ok_or_else(|| RuntimeError::NotACollection {
                    found: value.type_name(),
                })?;
                Ok(Value::Int32(len as i32))
            }
            BuiltinId::Print => {
                self.console.write(&args[0].to_string())?;
                Ok(Value::None)
            }
            BuiltinId::Println => {
                let mut text = args.first().map(Value::to_string).unwrap_or_default();
                text.push('\n');
                self.console.write(&text)?;
                Ok(Value::None)
            }
            BuiltinId::Printf => {
                let text = format(&args[0], &args[1..])?;
                self.console.write(&text)?;
                Ok(Value::None)
            }
            BuiltinId::ReadLine => self.console.read_line().map(Value::String),
            BuiltinId::ReadChar => self.console.read_char().map(Value::Char),
            cast => match cast.cast_target() {
                Some(target) => args[0].cast(target),
                None => Err(RuntimeError::UnknownBuiltin { id: call.id }),
            },
        }
    }
}

/// Substitutes each `{}` in `template` with the next argument.
fn format(template: &Value, args: &[Value]) -> Result<String, RuntimeError> {
    let Value::String(template) = template else {
        return Err(RuntimeError::InvalidCast {
            from: template.type_name(),
            to: "string".to_string(),
        });
    };
    let pieces: Vec<&str> = template.split("{}").collect();
    let placeholders = pieces.len() - 1;
    if placeholders != args.len() {
        return Err(RuntimeError::FormatMismatch {
            placeholders,
            args: args.len(),
        });
    }

    let mut out = String::with_capacity(template.len());
    for (i, piece) in pieces.iter().enumerate() {
        out.push_str(piece);
        if let Some(arg) = args.get(i) {
            out.push_str(&arg.to_string());
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_substitutes_in_order() {
        let out = format(
            &Value::String("{} + {} = {}".into()),
            &[Value::Int32(1), Value::Int32(2), Value::Float64(3.5)],
        )
        .unwrap();
        assert_eq!(out, "1 + 2 = 3.5");
    }

    #[test]
    fn format_checks_argument_count() {
        let err = format(&Value::String("{} {}".into()), &[Value::Int32(1)]).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::FormatMismatch {
                placeholders: 2,
                args: 1
            }
        );
    }

    #[test]
    fn format_needs_string_template() {
        assert!(format(&Value::Int32(1), &[]).is_err());
        assert_eq!(format(&Value::String("plain".into()), &[]).unwrap(), "plain");
    }
}
