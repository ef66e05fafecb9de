//! Splits one expression into tokens.
//!
//! The tokenizer is deliberately shallow: bracket contents are copied
//! verbatim and only tokenized later, when the tree builder realizes the
//! group, call or index token that holds them.

use sable_core::LexError;

use super::token::{Token, TokenKind};
use crate::ast::BinaryOp;

struct Tokenizer<'src> {
    expr: &'src str,
    chars: Vec<char>,
    pos: usize,
    pending: String,
    tokens: Vec<Token>,
}

/// Tokenizes an expression.
///
/// Fails on unbalanced brackets, unterminated string or character literals
/// and expressions ending on an operator.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn tokenize(expr: &str) -> Result<Vec<Token>, LexError> {
    Tokenizer::new(expr).run()
}

impl<'src> Tokenizer<'src> {
    fn new(expr: &'src str) -> Self {
        Self {
            expr,
            chars: expr.chars().collect(),
            pos: 0,
            pending: String::new(),
            tokens: Vec::new(),
        }
    }

    fn run(mut self) -> Result<Vec<Token>, LexError> {
        while let Some(c) = self.chars.get(self.pos).copied() {
            match c {
                c if c.is_whitespace() => {
                    self.flush();
                    self.pos += 1;
                }
                '"' | '\'' => {
                    self.flush();
                    let end = self.scan_quoted(self.pos)?;
                    let text: String = self.chars[self.pos..=end].iter().collect();
                    self.push(TokenKind::Str, text);
                    self.pos = end + 1;
                }
                '(' | '[' => {
                    let close = self.matching_close(self.pos)?;
                    let inner: String = self.chars[self.pos + 1..close].iter().collect();
                    let callee = std::mem::take(&mut self.pending);
                    let kind = match (c, callee.is_empty()) {
                        ('(', true) => TokenKind::Group,
                        ('(', false) => TokenKind::Call { callee },
                        (_, false) => TokenKind::Index { base: callee },
                        (_, true) => {
                            return Err(LexError::InvalidLiteral {
                                text: format!("[{}]", inner),
                            });
                        }
                    };
                    self.push(kind, inner);
                    self.pos = close + 1;
                }
                ')' | ']' => {
                    return Err(LexError::UnbalancedBrackets {
                        expr: self.expr.to_string(),
                    });
                }
                _ => {
                    if c == '-' && self.starts_negative_literal() {
                        self.pending.push(c);
                        self.pos += 1;
                    } else if let Some((op, width)) = self.operator_at(self.pos) {
                        self.flush();
                        let text: String = self.chars[self.pos..self.pos + width].iter().collect();
                        self.push(TokenKind::Operator(op), text);
                        self.pos += width;
                    } else {
                        self.pending.push(c);
                        self.pos += 1;
                    }
                }
            }
        }
        self.flush();

        if self.tokens.last().is_some_and(Token::is_operator) {
            return Err(LexError::TrailingOperator {
                expr: self.expr.to_string(),
            });
        }
        Ok(self.tokens)
    }

    fn push(&mut self, kind: TokenKind, text: String) {
        let id = self.tokens.len();
        self.tokens.push(Token::new(id, kind, text));
    }

    fn flush(&mut self) {
        if !self.pending.is_empty() {
            let text = std::mem::take(&mut self.pending);
            self.push(TokenKind::Literal, text);
        }
    }

    /// Two-character operators win over their one-character prefixes.
    fn operator_at(&self, pos: usize) -> Option<(BinaryOp, usize)> {
        let first = *self.chars.get(pos)?;
        if let Some(second) = self.chars.get(pos + 1) {
            let pair: String = [first, *second].iter().collect();
            if let Some(op) = BinaryOp::from_symbol(&pair) {
                return Some((op, 2));
            }
        }
        BinaryOp::from_symbol(first.encode_utf8(&mut [0; 4])).map(|op| (op, 1))
    }

    /// A `-` begins a literal when nothing precedes it or an operator does,
    /// and a digit follows.
    fn starts_negative_literal(&self) -> bool {
        self.pending.is_empty()
            && self.tokens.last().is_none_or(Token::is_operator)
            && self
                .chars
                .get(self.pos + 1)
                .is_some_and(|c| c.is_ascii_digit())
    }

    /// Index of the closing quote matching the quote at `start`.
    fn scan_quoted(&self, start: usize) -> Result<usize, LexError> {
        let quote = self.chars[start];
        let mut i = start + 1;
        while let Some(&c) = self.chars.get(i) {
            match c {
                '\\' => i += 2,
                c if c == quote => return Ok(i),
                _ => i += 1,
            }
        }
        Err(if quote == '"' {
            LexError::UnterminatedString {
                expr: self.expr.to_string(),
            }
        } else {
            LexError::UnterminatedChar {
                expr: self.expr.to_string(),
            }
        })
    }

    /// Index of the bracket closing the one at `start`, skipping quoted text.
    fn matching_close(&self, start: usize) -> Result<usize, LexError> {
        let mut stack = vec![self.chars[start]];
        let mut i = start + 1;
        while let Some(&c) = self.chars.get(i) {
            match c {
                '"' | '\'' => {
                    i = self.scan_quoted(i)?;
                }
                '(' | '[' => stack.push(c),
                ')' | ']' => {
                    let open = stack.pop();
                    let expected = if c == ')' { '(' } else { '[' };
                    if open != Some(expected) {
                        break;
                    }
                    if stack.is_empty() {
                        return Ok(i);
                    }
                }
                _ => {}
            }
            i += 1;
        }
        Err(LexError::UnbalancedBrackets {
            expr: self.expr.to_string(),
        })
    }
}

/// Splits `text` on commas that are not nested in brackets or quotes.
/// With `angle` set, `<...>` also nests (type lists). Pieces are trimmed.
pub fn split_top_level(text: &str, angle: bool) -> Result<Vec<String>, LexError> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for c in text.chars() {
        if let Some(q) = quote {
            current.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '"' | '\'' => {
                quote = Some(c);
                current.push(c);
            }
            '(' | '[' => {
                depth += 1;
                current.push(c);
            }
            '<' if angle => {
                depth += 1;
                current.push(c);
            }
            ')' | ']' => {
                depth = depth.checked_sub(1).ok_or_else(|| LexError::UnbalancedBrackets {
                    expr: text.to_string(),
                })?;
                current.push(c);
            }
            '>' if angle => {
                depth = depth.checked_sub(1).ok_or_else(|| LexError::UnbalancedBrackets {
                    expr: text.to_string(),
                })?;
                current.push(c);
            }
            ',' if depth == 0 => pieces.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(c),
        }
    }

    if quote.is_some() {
        return Err(LexError::UnterminatedString {
            expr: text.to_string(),
        });
    }
    if depth != 0 {
        return Err(LexError::UnbalancedBrackets {
            expr: text.to_string(),
        });
    }
    if !current.trim().is_empty() || !pieces.is_empty() {
        pieces.push(current.trim().to_string());
    }
    Ok(pieces)
}
