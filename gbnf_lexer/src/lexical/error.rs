//! Lexical analysis errors

use crate::config::compile_time::lexical::{
    MAX_ENCLOSURE_DEPTH, MAX_LEXEME_LENGTH, MAX_TOKEN_COUNT,
};
use crate::logging::codes;
use crate::utils::Position;
use std::fmt;

/// What the lexer actually saw where something else was required
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Found {
    Char(char),
    EndOfInput,
}

impl fmt::Display for Found {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Found::Char(c) => write!(f, "'{}'", c.escape_debug()),
            Found::EndOfInput => f.write_str("end of input"),
        }
    }
}

impl From<char> for Found {
    fn from(value: char) -> Self {
        Found::Char(value)
    }
}

impl From<Option<char>> for Found {
    fn from(value: Option<char>) -> Self {
        value.map_or(Found::EndOfInput, Found::Char)
    }
}

/// Lexical analysis errors with compile-time security boundaries
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexerError {
    #[error("Unexpected {found} at {position}, expected {expected}")]
    UnexpectedCharacter {
        found: Found,
        expected: String,
        position: Position,
    },

    #[error("Mismatched delimiter '{found}' at {position}, expected '{expected}'")]
    MismatchedDelimiter {
        expected: char,
        found: char,
        position: Position,
    },

    #[error("Condition failed at {position}: expected {expected}")]
    ConditionFailed { expected: String, position: Position },

    #[error("Decode error at {position}: {message}")]
    Decode { message: String, position: Position },

    #[error("Lexeme too long at {position}: {length} characters (max {MAX_LEXEME_LENGTH})")]
    LexemeTooLong { length: usize, position: Position },

    #[error("Enclosures nested too deep at {position}: {depth} (max {MAX_ENCLOSURE_DEPTH})")]
    EnclosureTooDeep { depth: usize, position: Position },

    #[error("Too many tokens at {position}: {count} (max {MAX_TOKEN_COUNT})")]
    TooManyTokens { count: usize, position: Position },
}

impl LexerError {
    pub(crate) fn unexpected(
        found: impl Into<Found>,
        expected: impl Into<String>,
        position: Position,
    ) -> Self {
        LexerError::UnexpectedCharacter {
            found: found.into(),
            expected: expected.into(),
            position,
        }
    }

    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            LexerError::UnexpectedCharacter { .. } => codes::lexical::UNEXPECTED_CHARACTER,
            LexerError::MismatchedDelimiter { .. } => codes::lexical::MISMATCHED_DELIMITER,
            LexerError::ConditionFailed { .. } => codes::lexical::CONDITION_FAILED,
            LexerError::Decode { .. } => codes::lexical::DECODE_ERROR,
            LexerError::LexemeTooLong { .. } => codes::lexical::LEXEME_TOO_LONG,
            LexerError::EnclosureTooDeep { .. } => codes::lexical::ENCLOSURE_TOO_DEEP,
            LexerError::TooManyTokens { .. } => codes::lexical::TOO_MANY_TOKENS,
        }
    }

    /// Where in the source the error was detected
    pub fn position(&self) -> Position {
        match self {
            LexerError::UnexpectedCharacter { position, .. }
            | LexerError::MismatchedDelimiter { position, .. }
            | LexerError::ConditionFailed { position, .. }
            | LexerError::Decode { position, .. }
            | LexerError::LexemeTooLong { position, .. }
            | LexerError::EnclosureTooDeep { position, .. }
            | LexerError::TooManyTokens { position, .. } => *position,
        }
    }

    /// Soft failures are recovered inside the state machine
    pub fn is_soft(&self) -> bool {
        matches!(self, LexerError::ConditionFailed { .. })
    }
}
