use std::fmt;

use crate::ast::BinaryOp;

/// The kind of an expression token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Number, identifier, `true`, `false` or `null`.
    Literal,
    /// `"string"` or `'c'`, quotes included in the text.
    Str,
    /// A parenthesized sub-expression; the text is the content.
    Group,
    /// `callee(args)`; the text is the raw argument list.
    Call { callee: String },
    /// `base[index]`; the text is the raw index expression.
    Index { base: String },
    Operator(BinaryOp),
    /// Synthetic token standing for an already reduced tree node.
    Reference(usize),
}

/// A single expression token.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Position of the token in the stream it was produced in.
    pub id: usize,
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(id: usize, kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            text: text.into(),
        }
    }

    pub fn operator(&self) -> Option<BinaryOp> {
        match self.kind {
            TokenKind::Operator(op) => Some(op),
            _ => None,
        }
    }

    pub fn is_operator(&self) -> bool {
        self.operator().is_some()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            TokenKind::Group => write!(f, "({})", self.text),
            TokenKind::Call { callee } => write!(f, "{}({})", callee, self.text),
            TokenKind::Index { base } => write!(f, "{}[{}]", base, self.text),
            TokenKind::Reference(node) => write!(f, "#{}", node),
            _ => f.write_str(&self.text),
        }
    }
}
