//! Error types for every stage of the pipeline.
//!
//! Each category has its own enum:
//!
//! - [`LexError`]: expression tokenizing and tree building
//! - [`ParseError`]: malformed statements and function headers
//! - [`TypeError`]: unknown or constraint-violating type text
//! - [`CompilationError`]: resolution and block structure during codegen
//! - [`RuntimeError`]: failures raised while the VM executes a program
//!
//! [`SableError`] unifies them for callers of the compile entry points.
//! None of these are recoverable; the first one raised aborts the stage.

use thiserror::Error;

use crate::types::TypeConstraint;

/// Result alias used by the compile pipeline.
pub type Result<T> = std::result::Result<T, SableError>;

/// Errors raised while tokenizing or building an expression tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unbalanced brackets in '{expr}'")]
    UnbalancedBrackets { expr: String },

    #[error("unterminated string literal in '{expr}'")]
    UnterminatedString { expr: String },

    #[error("unterminated character literal in '{expr}'")]
    UnterminatedChar { expr: String },

    #[error("expression '{expr}' ends on an operator")]
    TrailingOperator { expr: String },

    #[error("operator '{op}' is missing its left operand in '{expr}'")]
    MissingOperand { op: String, expr: String },

    #[error("dangling tokens in '{expr}'")]
    DanglingTokens { expr: String },

    #[error("empty bracket group in '{expr}'")]
    EmptyGroup { expr: String },

    #[error("invalid literal '{text}'")]
    InvalidLiteral { text: String },
}

/// Broad classes of statement-level syntax errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    MalformedStatement,
    MalformedHeader,
    MalformedParameter,
    UnmatchedBrace,
    MissingEntry,
    DuplicateFunction,
    Unimplemented,
}

impl ParseErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::MalformedStatement => "malformed statement",
            ParseErrorKind::MalformedHeader => "malformed function header",
            ParseErrorKind::MalformedParameter => "malformed parameter",
            ParseErrorKind::UnmatchedBrace => "unmatched brace",
            ParseErrorKind::MissingEntry => "missing entry function",
            ParseErrorKind::DuplicateFunction => "duplicate function",
            ParseErrorKind::Unimplemented => "unimplemented statement",
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A statement or function-level syntax error.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("line {line}: {kind}: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    /// 1-based source line.
    pub line: u32,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, line: u32, message: impl Into<String>) -> Self {
        Self {
            kind,
            line,
            message: message.into(),
        }
    }

    pub fn malformed(line: u32, text: &str) -> Self {
        Self::new(ParseErrorKind::MalformedStatement, line, format!("'{}'", text))
    }
}

/// Errors raised by the type descriptor parser.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TypeError {
    #[error("unknown type '{name}'")]
    UnknownType { name: String },

    #[error("a type is required here")]
    MissingType,

    #[error("type '{ty}' does not satisfy the {constraint} constraint")]
    ConstraintViolation {
        ty: String,
        constraint: TypeConstraint,
    },

    #[error("map type '{text}' needs a key and a value type")]
    MalformedMap { text: String },
}

/// Resolution and structure errors found while generating bytecode.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompilationError {
    #[error("line {line}: undeclared symbol '{name}'")]
    UndeclaredSymbol { name: String, line: u32 },

    #[error("line {line}: undefined function '{name}'")]
    UndefinedFunction { name: String, line: u32 },

    #[error("line {line}: '{name}' expects {expected} argument(s), got {got}")]
    ArityMismatch {
        name: String,
        expected: String,
        got: usize,
        line: u32,
    },

    #[error("line {line}: break outside of a loop")]
    BreakOutsideLoop { line: u32 },

    #[error("function '{function}': block opened on line {line} is never closed")]
    UnclosedBlock { function: String, line: u32 },

    #[error("line {line}: closing brace without an open block")]
    UnexpectedCloseBrace { line: u32 },

    #[error("line {line}: else without a matching if")]
    UnexpectedElse { line: u32 },

    #[error("line {line}: '{name}' of type {ty} is not a collection")]
    NotACollection { name: String, ty: String, line: u32 },

    #[error("internal error: {message}")]
    Internal { message: String },
}

/// Fatal errors raised by the virtual machine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("no operator '{op}' for {left} and {right}")]
    UnsupportedOperator {
        op: String,
        left: String,
        right: String,
    },

    #[error("condition must be bool, found {found}")]
    ConditionNotBool { found: String },

    #[error("slot {slot} read before it was bound")]
    UnboundSlot { slot: usize },

    #[error("slot {slot} is outside the symbol table (capacity {capacity})")]
    SlotOutOfRange { slot: usize, capacity: usize },

    #[error("cannot assign {found} to a cell of type {expected}")]
    AssignMismatch { expected: String, found: String },

    #[error("index {index} out of range for length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("{found} is not indexable")]
    NotIndexable { found: String },

    #[error("index must be numeric, found {found}")]
    InvalidIndex { found: String },

    #[error("key {key} not found")]
    KeyNotFound { key: String },

    #[error("{found} is not a collection")]
    NotACollection { found: String },

    #[error("builtin '{name}' expects {expected} argument(s), got {got}")]
    ArityMismatch {
        name: String,
        expected: String,
        got: usize,
    },

    #[error("cannot convert {from} to {to}")]
    InvalidCast { from: String, to: String },

    #[error("printf format has {placeholders} placeholder(s) but {args} argument(s) were given")]
    FormatMismatch { placeholders: usize, args: usize },

    #[error("unknown builtin id {id}")]
    UnknownBuiltin { id: u16 },

    #[error("placeholder '{name}' was never resolved")]
    UnresolvedPlaceholder { name: String },

    #[error("jump to invalid address {address}")]
    InvalidAddress { address: usize },

    #[error("call depth limit of {limit} exceeded")]
    CallDepthExceeded { limit: usize },

    #[error("end of input")]
    EndOfInput,

    #[error("i/o error: {message}")]
    Io { message: String },
}

impl From<std::io::Error> for RuntimeError {
    fn from(err: std::io::Error) -> Self {
        RuntimeError::Io {
            message: err.to_string(),
        }
    }
}

/// Top-level error type for the sable pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SableError {
    #[error("line {line}: {error}")]
    Lex {
        line: u32,
        #[source]
        error: LexError,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("line {line}: {error}")]
    Type {
        line: u32,
        #[source]
        error: TypeError,
    },

    #[error(transparent)]
    Compile(#[from] CompilationError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl SableError {
    pub fn lex(line: u32, error: LexError) -> Self {
        SableError::Lex { line, error }
    }

    pub fn ty(line: u32, error: TypeError) -> Self {
        SableError::Type { line, error }
    }

    /// True for errors raised before execution started.
    pub fn is_compile_time(&self) -> bool {
        !matches!(self, SableError::Runtime(_))
    }
}
