//! Line classifier for function bodies.
//!
//! Every body line is one statement. The leading keyword decides which
//! pattern the line must match; a line without a keyword is an assignment
//! when it has a top-level `=` and a bare expression otherwise.

use std::sync::LazyLock;

use regex::Regex;
use sable_core::{ParseError, ParseErrorKind, Result, SableError};

use super::expr::Expr;
use super::stmt::{Assignment, Operation, Statement};
use super::tree_builder::{parse_expression, parse_required};
use super::type_parser::parse_type;

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($re).expect(concat!(stringify!($name), " pattern")));
    };
}

const IDENT: &str = r"[A-Za-z_][A-Za-z0-9_.:]*";

pattern!(BIND, &format!(r"^let\s+({IDENT})\s*:\s*([^=]+?)\s*(?:=\s*(.+))?$"));
pattern!(
    FOR,
    &format!(
        r"^for\s*\(\s*let\s+({IDENT})\s*:\s*([^=]+?)\s*=\s*([^;]+?)\s*;\s*([^;]+?)\s*;\s*(.+?)\s*\)\s*\{{$"
    )
);
pattern!(WHILE, r"^while\b\s*(.+?)\s*\{$");
pattern!(IF, r"^if\b\s*(.+?)\s*\{$");
pattern!(ELSE, r"^\}\s*else\s*\{$");
pattern!(RETURN, r"^return(?:\s+(.+))?$");
pattern!(RESIZE, &format!(r"^(grow|shrink)\s+({IDENT})\s+by\s+(.+)$"));
pattern!(ASSIGN, &format!(r"^({IDENT})\s*(?:\[(.+?)\])?\s*=([^=].*)$"));

const KEYWORDS: &[&str] = &[
    "let", "for", "foreach", "while", "if", "else", "break", "return", "grow", "shrink",
];

/// Splits a function body into statements. `first_line` is the source line
/// the body text starts on.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn parse_body(first_line: u32, body: &str) -> Result<Vec<Statement>> {
    body.lines()
        .enumerate()
        .map(|(i, text)| {
            let line = first_line + i as u32;
            parse_statement(line, text).map(|op| Statement { line, op })
        })
        .collect()
}

/// Classifies a single line.
pub fn parse_statement(line: u32, text: &str) -> Result<Operation> {
    let text = text.trim();
    if text.is_empty() || text.starts_with("//") {
        return Ok(Operation::NoOp);
    }
    if text == "}" {
        return Ok(Operation::CloseBrace);
    }
    if ELSE.is_match(text) {
        return Ok(Operation::Else);
    }

    let malformed = || SableError::from(ParseError::malformed(line, text));
    let lex = |e| SableError::lex(line, e);
    let expr = |t: &str| parse_required(t, text).map_err(lex);

    if let Some(keyword) = leading_keyword(text) {
        // Headers keep their brace; simple statements may end with `;`.
        let simple = text.strip_suffix(';').unwrap_or(text).trim_end();
        return match keyword {
            "for" => {
                let caps = FOR.captures(text).ok_or_else(malformed)?;
                let update = parse_assignment(line, &caps[5])?.ok_or_else(malformed)?;
                Ok(Operation::ForHeader {
                    iterator: caps[1].to_string(),
                    ty: parse_type(&caps[2], false).map_err(|e| SableError::ty(line, e))?,
                    init: expr(&caps[3])?,
                    condition: expr(&caps[4])?,
                    update,
                })
            }
            "foreach" => Err(ParseError::new(
                ParseErrorKind::Unimplemented,
                line,
                "foreach loops are not supported",
            )
            .into()),
            "while" => {
                let caps = WHILE.captures(text).ok_or_else(malformed)?;
                Ok(Operation::While {
                    condition: expr(&caps[1])?,
                })
            }
            "if" => {
                let caps = IF.captures(text).ok_or_else(malformed)?;
                Ok(Operation::If {
                    condition: expr(&caps[1])?,
                })
            }
            "let" => {
                let caps = BIND.captures(simple).ok_or_else(malformed)?;
                let init = match caps.get(3) {
                    Some(m) => Some(expr(m.as_str())?),
                    None => None,
                };
                Ok(Operation::Bind {
                    name: caps[1].to_string(),
                    ty: parse_type(&caps[2], false).map_err(|e| SableError::ty(line, e))?,
                    init,
                })
            }
            "break" if simple == "break" => Ok(Operation::Break),
            "return" => {
                let caps = RETURN.captures(simple).ok_or_else(malformed)?;
                let value = match caps.get(1) {
                    Some(m) => parse_expression(m.as_str()).map_err(lex)?,
                    None => None,
                };
                Ok(Operation::Return(value))
            }
            "grow" | "shrink" => {
                let caps = RESIZE.captures(simple).ok_or_else(malformed)?;
                let name = caps[2].to_string();
                let amount = expr(&caps[3])?;
                Ok(if &caps[1] == "grow" {
                    Operation::Grow { name, amount }
                } else {
                    Operation::Shrink { name, amount }
                })
            }
            _ => Err(malformed()),
        };
    }

    let simple = text.strip_suffix(';').unwrap_or(text).trim_end();
    if let Some(assignment) = parse_assignment(line, simple)? {
        return Ok(Operation::Assign(assignment));
    }
    match parse_expression(simple).map_err(lex)? {
        Some(e) => Ok(Operation::Expression(e)),
        None => Ok(Operation::NoOp),
    }
}

/// Parses `name = value` / `name[index] = value`, or `None` when `text` is
/// not an assignment.
fn parse_assignment(line: u32, text: &str) -> Result<Option<Assignment>> {
    let Some(caps) = ASSIGN.captures(text.trim()) else {
        return Ok(None);
    };
    let lex = |e| SableError::lex(line, e);
    let index: Option<Expr> = match caps.get(2) {
        Some(m) => Some(parse_required(m.as_str(), text).map_err(lex)?),
        None => None,
    };
    let value = parse_required(caps[3].trim(), text).map_err(lex)?;
    Ok(Some(Assignment {
        name: caps[1].to_string(),
        index,
        value,
    }))
}

/// The statement keyword `text` starts with, if any.
fn leading_keyword(text: &str) -> Option<&'static str> {
    let end = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    let word = &text[..end];
    KEYWORDS.iter().copied().find(|k| *k == word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinaryOp;
    use sable_core::{LexError, Primitive, TypeDesc, TypeError, Value};

    fn op(text: &str) -> Operation {
        parse_statement(1, text).unwrap()
    }

    #[test]
    fn binding_with_initializer() {
        assert_eq!(
            op("let a: uint8 = 11;"),
            Operation::Bind {
                name: "a".into(),
                ty: TypeDesc::primitive(Primitive::UInt8),
                init: Some(Expr::constant(Value::Int32(11))),
            }
        );
    }

    #[test]
    fn binding_without_initializer() {
        let Operation::Bind { ty, init, .. } = op("let m: map<string, int32>") else {
            panic!("expected binding");
        };
        assert!(init.is_none());
        assert_eq!(ty.to_string(), "map<string, int32>");
    }

    #[test]
    fn binding_with_bad_type() {
        let err = parse_statement(7, "let v: vector<bool> = 1").unwrap_err();
        assert!(matches!(
            err,
            SableError::Type {
                line: 7,
                error: TypeError::ConstraintViolation { .. }
            }
        ));
    }

    #[test]
    fn for_header() {
        let Operation::ForHeader {
            iterator,
            init,
            condition,
            update,
            ..
        } = op("for (let i: int32 = 0; i < 10; i = i + 1) {")
        else {
            panic!("expected for header");
        };
        assert_eq!(iterator, "i");
        assert_eq!(init, Expr::constant(Value::Int32(0)));
        assert_eq!(
            condition,
            Expr::binary(
                Expr::variable("i"),
                BinaryOp::Less,
                Expr::constant(Value::Int32(10))
            )
        );
        assert_eq!(update.name, "i");
    }

    #[test]
    fn control_lines() {
        assert_eq!(op("break;"), Operation::Break);
        assert_eq!(op("}"), Operation::CloseBrace);
        assert_eq!(op("} else {"), Operation::Else);
        assert_eq!(op("return"), Operation::Return(None));
        assert!(matches!(op("while i < 3 {"), Operation::While { .. }));
        assert!(matches!(op("if (a == b) {"), Operation::If { .. }));
    }

    #[test]
    fn return_value() {
        assert_eq!(
            op("return a;"),
            Operation::Return(Some(Expr::variable("a")))
        );
    }

    #[test]
    fn assignments() {
        let Operation::Assign(a) = op("xs[i] = xs[i] * 2;") else {
            panic!("expected assignment");
        };
        assert_eq!(a.name, "xs");
        assert_eq!(a.index, Some(Expr::variable("i")));

        // comparisons are not assignments
        assert!(matches!(op("a == b"), Operation::Expression(_)));
        assert!(matches!(op("a <= b"), Operation::Expression(_)));
    }

    #[test]
    fn grow_and_shrink() {
        assert!(matches!(op("grow xs by 3;"), Operation::Grow { .. }));
        assert!(matches!(op("shrink xs by n - 1"), Operation::Shrink { .. }));
    }

    #[test]
    fn bare_expression_and_noop() {
        assert!(matches!(op("println(\"hi\");"), Operation::Expression(_)));
        assert_eq!(op("   "), Operation::NoOp);
        assert_eq!(op("// note"), Operation::NoOp);
    }

    #[test]
    fn keywords_need_their_shape() {
        let err = parse_statement(3, "for i in xs {").unwrap_err();
        assert!(matches!(
            err,
            SableError::Parse(ParseError {
                kind: ParseErrorKind::MalformedStatement,
                line: 3,
                ..
            })
        ));
        assert!(parse_statement(1, "while x").is_err());
        assert!(parse_statement(1, "break 2").is_err());
    }

    #[test]
    fn foreach_is_unimplemented() {
        let err = parse_statement(2, "foreach (x in xs) {").unwrap_err();
        assert!(matches!(
            err,
            SableError::Parse(ParseError {
                kind: ParseErrorKind::Unimplemented,
                ..
            })
        ));
    }

    #[test]
    fn lexical_errors_carry_line() {
        let err = parse_statement(9, "let a: int32 = (1 + 2").unwrap_err();
        assert!(matches!(
            err,
            SableError::Lex {
                line: 9,
                error: LexError::UnbalancedBrackets { .. }
            }
        ));
    }

    #[test]
    fn body_lines_are_numbered() {
        let body = "\n    let a: int32 = 1;\n    return a;\n";
        let stmts = parse_body(10, body).unwrap();
        assert_eq!(stmts.len(), 3);
        assert_eq!(stmts[0].op, Operation::NoOp);
        assert_eq!(stmts[1].line, 11);
        assert_eq!(stmts[2].line, 12);
    }
}
