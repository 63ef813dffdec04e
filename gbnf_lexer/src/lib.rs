// Internal modules
pub mod config;
pub mod lexical;
#[macro_use]
pub mod logging;
pub mod tokens;
pub mod utils;

// Re-export key types for library consumers
pub use lexical::{tokenize_reader, tokenize_str, Lexer, LexerError};
pub use tokens::{Mark, Token, TokenKind};
