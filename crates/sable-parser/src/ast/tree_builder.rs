//! Builds expression trees from token streams.
//!
//! The builder works by repeated reduction: it picks the operator with the
//! highest binding power (leftmost on ties), replaces it and its two
//! neighbours with a [`TokenKind::Reference`] to a freshly built node, and
//! repeats until a single token is left. Leaves are realized as they are
//! consumed; groups, call arguments and index expressions recurse through
//! [`parse_expression`].

use std::sync::LazyLock;

use regex::Regex;
use sable_core::{LexError, Value};

use super::expr::{Expr, IndexExpr, VarRef};
use crate::lexer::{Token, TokenKind, split_top_level, tokenize};

static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+$").expect("integer pattern"));
static DECIMAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-?[0-9]+\.[0-9]+([eE][-+]?[0-9]+)?$").expect("decimal pattern")
});
static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.:]*$").expect("identifier pattern"));

/// Tokenizes and builds `text`. Returns `None` for an empty expression.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn parse_expression(text: &str) -> Result<Option<Expr>, LexError> {
    let tokens = tokenize(text)?;
    build(tokens, text)
}

/// Like [`parse_expression`] but an empty expression is an error.
pub(crate) fn parse_required(text: &str, context: &str) -> Result<Expr, LexError> {
    parse_expression(text)?.ok_or_else(|| LexError::EmptyGroup {
        expr: context.to_string(),
    })
}

/// Reduces `tokens` to a single tree.
pub fn build(tokens: Vec<Token>, source: &str) -> Result<Option<Expr>, LexError> {
    TreeBuilder {
        source,
        nodes: Vec::new(),
    }
    .run(tokens)
}

struct TreeBuilder<'src> {
    source: &'src str,
    /// Reduced nodes, addressed by reference tokens. Each is taken once.
    nodes: Vec<Option<Expr>>,
}

impl TreeBuilder<'_> {
    fn run(mut self, mut tokens: Vec<Token>) -> Result<Option<Expr>, LexError> {
        loop {
            match tokens.len() {
                0 => return Ok(None),
                1 => {
                    let token = tokens.remove(0);
                    return self.realize(token).map(Some);
                }
                _ => {}
            }

            let Some(at) = self.pick_operator(&tokens) else {
                return Err(LexError::DanglingTokens {
                    expr: self.source.to_string(),
                });
            };
            tokens = self.reduce(tokens, at)?;
        }
    }

    /// Position of the next operator to reduce.
    fn pick_operator(&self, tokens: &[Token]) -> Option<usize> {
        let mut best: Option<(usize, u8)> = None;
        for (i, token) in tokens.iter().enumerate() {
            if let Some(op) = token.operator() {
                let power = op.binding_power().0;
                if best.is_none_or(|(_, p)| power > p) {
                    best = Some((i, power));
                }
            }
        }
        best.map(|(i, _)| i)
    }

    fn reduce(&mut self, mut tokens: Vec<Token>, at: usize) -> Result<Vec<Token>, LexError> {
        let op = tokens[at].operator().ok_or_else(|| LexError::DanglingTokens {
            expr: self.source.to_string(),
        })?;

        let missing = |what: &str| LexError::MissingOperand {
            op: what.to_string(),
            expr: self.source.to_string(),
        };
        if at == 0 || tokens[at - 1].is_operator() {
            return Err(missing(op.as_str()));
        }
        if at + 1 >= tokens.len() {
            return Err(LexError::TrailingOperator {
                expr: self.source.to_string(),
            });
        }
        if tokens[at + 1].is_operator() {
            return Err(missing(tokens[at + 1].text.as_str()));
        }

        let right = tokens.remove(at + 1);
        tokens.remove(at);
        let left = tokens.remove(at - 1);

        let left = self.realize(left)?;
        let right = self.realize(right)?;
        let node = self.nodes.len();
        self.nodes.push(Some(Expr::binary(left, op, right)));

        tokens.insert(
            at - 1,
            Token::new(at - 1, TokenKind::Reference(node), format!("#{}", node)),
        );
        Ok(tokens)
    }

    /// Turns a leaf token into a tree node.
    fn realize(&mut self, token: Token) -> Result<Expr, LexError> {
        match token.kind {
            TokenKind::Reference(node) => {
                self.nodes
                    .get_mut(node)
                    .and_then(Option::take)
                    .ok_or_else(|| LexError::DanglingTokens {
                        expr: self.source.to_string(),
                    })
            }
            TokenKind::Literal => realize_literal(&token.text),
            TokenKind::Str => realize_quoted(&token.text),
            TokenKind::Group => parse_required(&token.text, self.source),
            TokenKind::Call { callee } => {
                if !IDENTIFIER.is_match(&callee) {
                    return Err(LexError::InvalidLiteral { text: callee });
                }
                let mut args = Vec::new();
                for piece in split_top_level(&token.text, false)? {
                    args.push(parse_required(&piece, self.source)?);
                }
                Ok(Expr::call(callee, args))
            }
            TokenKind::Index { base } => {
                if !IDENTIFIER.is_match(&base) {
                    return Err(LexError::InvalidLiteral { text: base });
                }
                let index = parse_required(&token.text, self.source)?;
                Ok(Expr::Index(IndexExpr {
                    base: VarRef::Name(base),
                    index: Box::new(index),
                }))
            }
            TokenKind::Operator(op) => Err(LexError::MissingOperand {
                op: op.to_string(),
                expr: self.source.to_string(),
            }),
        }
    }
}

fn realize_literal(text: &str) -> Result<Expr, LexError> {
    let invalid = || LexError::InvalidLiteral {
        text: text.to_string(),
    };
    match text {
        "true" => return Ok(Expr::constant(Value::Bool(true))),
        "false" => return Ok(Expr::constant(Value::Bool(false))),
        "null" => return Ok(Expr::Null),
        _ => {}
    }

    if INTEGER.is_match(text) {
        let value = text.parse::<i64>().map_err(|_| invalid())?;
        return Ok(Expr::constant(match i32::try_from(value) {
            Ok(v) => Value::Int32(v),
            Err(_) => Value::Int64(value),
        }));
    }
    if DECIMAL.is_match(text) {
        let value = text.parse::<f64>().map_err(|_| invalid())?;
        return Ok(Expr::constant(Value::Float64(value)));
    }
    if IDENTIFIER.is_match(text) {
        return Ok(Expr::variable(text));
    }
    Err(invalid())
}

/// Realizes a quoted token, quotes included.
fn realize_quoted(text: &str) -> Result<Expr, LexError> {
    let invalid = || LexError::InvalidLiteral {
        text: text.to_string(),
    };
    let quote = text.chars().next().ok_or_else(invalid)?;
    let body = text
        .get(1..text.len() - 1)
        .ok_or_else(invalid)?;
    let unescaped = unescape(body).ok_or_else(invalid)?;

    if quote == '"' {
        return Ok(Expr::constant(Value::String(unescaped)));
    }
    let mut it = unescaped.chars();
    match (it.next(), it.next()) {
        (Some(c), None) => Ok(Expr::constant(Value::Char(c))),
        _ => Err(invalid()),
    }
}

fn unescape(body: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        out.push(match chars.next()? {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            '0' => '\0',
            '\\' => '\\',
            '"' => '"',
            '\'' => '\'',
            _ => return None,
        });
    }
    Some(out)
}
