//! Function extraction and program assembly.

use std::sync::LazyLock;

use regex::Regex;
use sable_core::{ParseError, ParseErrorKind, Result, SableError, TypeDesc};
use tracing::debug;

use super::stmt::Statement;
use super::stmt_parser::parse_body;
use super::type_parser::parse_type;
use crate::lexer::split_top_level;

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"func\s+([A-Za-z_][A-Za-z0-9_.:]*)\s*\(([^)]*)\)\s*(?:=>\s*([^{]*?))?\s*\{")
        .expect("function header pattern")
});
static PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_.:]*)\s*:\s*(.+)$").expect("parameter pattern")
});

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub ty: TypeDesc,
}

/// A parsed function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    /// `none` when the header has no `=> type`.
    pub return_type: TypeDesc,
    /// Body statements with no-ops removed.
    pub body: Vec<Statement>,
    /// Line of the `func` header.
    pub line: u32,
}

/// The parsed source: the entry function plus everything else.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub entry: FunctionDef,
    pub side_functions: Vec<FunctionDef>,
}

impl Program {
    /// Looks a function up by name, the entry included.
    pub fn function(&self, name: &str) -> Option<&FunctionDef> {
        std::iter::once(&self.entry)
            .chain(&self.side_functions)
            .find(|f| f.name == name)
    }

    pub fn function_count(&self) -> usize {
        1 + self.side_functions.len()
    }
}

/// Parses a whole source text and designates `entry` as the entry function.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn parse_program(source: &str, entry: &str) -> Result<Program> {
    let mut functions = extract_functions(source)?;

    let position = functions
        .iter()
        .position(|f| f.name == entry)
        .ok_or_else(|| {
            ParseError::new(
                ParseErrorKind::MissingEntry,
                1,
                format!("no function named '{}'", entry),
            )
        })?;
    let entry = functions.remove(position);

    debug!(
        entry = %entry.name,
        side_functions = functions.len(),
        "parsed program"
    );
    Ok(Program {
        entry,
        side_functions: functions,
    })
}

/// Extracts every `func` unit in source order.
pub fn extract_functions(source: &str) -> Result<Vec<FunctionDef>> {
    let mut functions: Vec<FunctionDef> = Vec::new();
    let mut cursor = 0;

    while let Some(caps) = HEADER.captures_at(source, cursor) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        check_gap(source, cursor, whole.start())?;

        let line = line_of(source, whole.start());
        let body_start = whole.end();
        let body_end = matching_brace(source, body_start).ok_or_else(|| {
            ParseError::new(
                ParseErrorKind::UnmatchedBrace,
                line,
                format!("function '{}' is never closed", name.as_str()),
            )
        })?;

        if functions.iter().any(|f| f.name == name.as_str()) {
            return Err(ParseError::new(
                ParseErrorKind::DuplicateFunction,
                line,
                format!("'{}' is defined more than once", name.as_str()),
            )
            .into());
        }

        let params = parse_params(line, caps.get(2).map_or("", |m| m.as_str()))?;
        let return_type = parse_type(caps.get(3).map_or("", |m| m.as_str()), true)
            .map_err(|e| SableError::ty(line, e))?;
        let mut body = parse_body(line, &source[body_start..body_end])?;
        body.retain(|s| !s.op.is_noop());

        functions.push(FunctionDef {
            name: name.as_str().to_string(),
            params,
            return_type,
            body,
            line,
        });
        cursor = body_end + 1;
    }

    check_gap(source, cursor, source.len())?;
    Ok(functions)
}

fn parse_params(line: u32, text: &str) -> Result<Vec<Param>> {
    let pieces = split_top_level(text, true).map_err(|e| SableError::lex(line, e))?;
    pieces
        .iter()
        .map(|piece| {
            let caps = PARAM.captures(piece).ok_or_else(|| {
                ParseError::new(
                    ParseErrorKind::MalformedParameter,
                    line,
                    format!("'{}'", piece),
                )
            })?;
            Ok(Param {
                name: caps[1].to_string(),
                ty: parse_type(&caps[2], false).map_err(|e| SableError::ty(line, e))?,
            })
        })
        .collect()
}

/// Only whitespace and comment lines may appear between functions.
fn check_gap(source: &str, from: usize, to: usize) -> Result<()> {
    let gap = &source[from..to];
    for (i, text) in gap.lines().enumerate() {
        let text = text.trim();
        if !text.is_empty() && !text.starts_with("//") {
            let line = line_of(source, from) + i as u32;
            return Err(ParseError::new(
                ParseErrorKind::MalformedHeader,
                line,
                format!("unexpected text outside of a function: '{}'", text),
            )
            .into());
        }
    }
    Ok(())
}

/// Byte offset of the `}` closing a block whose content starts at `start`.
fn matching_brace(source: &str, start: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut comment = false;
    let mut prev = '\0';

    for (offset, c) in source[start..].char_indices() {
        if comment {
            if c == '\n' {
                comment = false;
            }
        } else if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q || c == '\n' {
                quote = None;
            }
        } else {
            match c {
                '"' | '\'' => quote = Some(c),
                '/' if prev == '/' => comment = true,
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(start + offset);
                    }
                }
                _ => {}
            }
        }
        prev = c;
    }
    None
}

fn line_of(source: &str, offset: usize) -> u32 {
    source[..offset].matches('\n').count() as u32 + 1
}
