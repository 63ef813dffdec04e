//! Shared location types used by the lexer, its errors and log events.

pub mod span;

pub use span::{Position, Span};
