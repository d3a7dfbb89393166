//! 词法分析

mod lexer;
pub mod token_kind;

pub use lexer::{Lexer, Token};
pub use token_kind::TokenKind;
