pub mod comment;
pub mod cotoha;
pub mod josi;
pub mod lexer;
pub mod literal;
pub mod reserved;
pub mod rules;
pub mod symbol;
pub mod token;
pub mod word;

pub use lexer::Lexer;
pub use token::{Token, TokenKind, TokenValue};
