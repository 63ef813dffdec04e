//! Token system for extended BNF lexical analysis
//!
//! # Overview
//!
//! A grammar is turned into a flat sequence of [`Token`]s, each tagged with a
//! [`TokenKind`] and the line/column of the construct it came from.
//!
//! ## Token Kinds
//!
//! ### Symbols
//! - `TerminalSymbol`: quoted text (`"+"`, `'x'`) or a bare word/punctuation character
//! - `NonTerminalSymbol`: a name between angle brackets (`<expr>`)
//!
//! ### Operators
//! `::=`, `|`, `&`, `!`, `=` and dot sequences (`.`, `..`, `...`).
//!
//! ### Actions
//! `{ Name(arg, arg) }` produces one `Action` token followed by one
//! `ActionArg` per non-empty argument.
//!
//! ### Groups and markers
//! Parentheses and brackets, the `!!` end-of-rule marker, and a single
//! trailing `EndOfStream`.
//!
//! ## Token Stream
//!
//! [`TokenStream`] is the append-only buffer the lexer scans into. Its cursor
//! can be saved with `mark` and restored with `reset` so a parser can
//! backtrack over tokens that were already scanned.

pub mod token;
pub mod token_stream;

pub use token::{Token, TokenClass, TokenKind};
pub use token_stream::{Mark, TokenStream, TokenStreamError};
