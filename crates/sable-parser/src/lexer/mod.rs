//! Expression tokenizer.

mod token;
mod tokenizer;

pub use token::{Token, TokenKind};
pub use tokenizer::{split_top_level, tokenize};
