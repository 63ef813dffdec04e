//! Lexical analysis for extended BNF grammars
//!
//! Streams tokens out of any `Read` source one at a time. Buffered tokens can
//! be replayed with `Lexer::mark` and `Lexer::reset`, so a parser gets
//! unbounded lookahead without re-reading characters.

pub mod analyzer;
pub mod char_source;
pub mod enclosure;
pub mod error;
pub mod reader;
pub mod state;

use crate::config::compile_time::lexical::*;
use crate::config::runtime::LexicalPreferences;
use crate::logging::codes;
use crate::tokens::{Token, TokenClass, TokenKind};
use std::io::{Cursor, Read};

pub use analyzer::{Lexer, LexicalMetrics};
pub use char_source::{CharSource, DecodeError};
pub use enclosure::{EnclosureFrame, EnclosureStack, FrameKind};
pub use error::{Found, LexerError};
pub use reader::CharReader;
pub use state::{State, StateMachine};

const LEXICAL_CODES: [crate::logging::Code; 8] = [
    codes::lexical::UNEXPECTED_CHARACTER,
    codes::lexical::UNCLOSED_ENCLOSURE,
    codes::lexical::MISMATCHED_DELIMITER,
    codes::lexical::CONDITION_FAILED,
    codes::lexical::DECODE_ERROR,
    codes::lexical::LEXEME_TOO_LONG,
    codes::lexical::TOO_MANY_TOKENS,
    codes::lexical::ENCLOSURE_TOO_DEEP,
];

// ============================================================================
// MODULE API
// ============================================================================

/// Tokenize an in-memory grammar, `EndOfStream` included
pub fn tokenize_str(source: &str) -> Result<Vec<Token>, LexerError> {
    Lexer::from_source(source).collect()
}

/// Tokenize everything a reader yields, `EndOfStream` included
pub fn tokenize_reader<R: Read>(reader: R) -> Result<Vec<Token>, LexerError> {
    Lexer::new(reader).collect()
}

/// Create a lexer over an in-memory grammar with default preferences
pub fn create_lexer(source: &str) -> Lexer<Cursor<String>> {
    Lexer::from_source(source)
}

/// Create a lexer with custom runtime preferences (security limits stay compile-time)
pub fn create_lexer_with_preferences<R: Read>(
    reader: R,
    preferences: LexicalPreferences,
) -> Lexer<R> {
    Lexer::with_preferences(reader, preferences)
}

// ============================================================================
// MODULE INITIALIZATION AND VALIDATION
// ============================================================================

/// Check that every lexical code is registered (for system startup)
pub fn init_lexical_analysis_logging() -> Result<(), String> {
    for code in &LEXICAL_CODES {
        if codes::get_error_metadata(code.as_str()).is_none() {
            return Err(format!(
                "Lexical error code {} not found in metadata registry",
                code.as_str()
            ));
        }
    }

    crate::log_debug!("Lexical security limits initialized",
        "max_lexeme_length" => MAX_LEXEME_LENGTH,
        "max_token_count" => MAX_TOKEN_COUNT,
        "max_enclosure_depth" => MAX_ENCLOSURE_DEPTH
    );

    Ok(())
}

/// Validate error code metadata and compile-time limits
pub fn validate_tokenization() -> Result<(), String> {
    for code in &LEXICAL_CODES {
        let description = codes::get_description(code.as_str());
        if description == "Unknown error" {
            return Err(format!(
                "Lexical error code {} has no description",
                code.as_str()
            ));
        }
    }

    if MAX_LEXEME_LENGTH == 0 {
        return Err("MAX_LEXEME_LENGTH cannot be zero".to_string());
    }
    if MAX_TOKEN_COUNT == 0 {
        return Err("MAX_TOKEN_COUNT cannot be zero".to_string());
    }
    if MAX_ENCLOSURE_DEPTH == 0 {
        return Err("MAX_ENCLOSURE_DEPTH cannot be zero".to_string());
    }

    if MAX_TOKEN_COUNT > 10_000_000 {
        return Err("MAX_TOKEN_COUNT exceeds reasonable limit".to_string());
    }

    Ok(())
}

/// Get the current compile-time security limits (for reporting/debugging)
pub fn get_security_limits() -> SecurityLimits {
    SecurityLimits {
        max_lexeme_length: MAX_LEXEME_LENGTH,
        max_token_count: MAX_TOKEN_COUNT,
        max_enclosure_depth: MAX_ENCLOSURE_DEPTH,
        metrics_buffer_size: METRICS_BUFFER_SIZE,
    }
}

/// Information about compile-time security limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityLimits {
    pub max_lexeme_length: usize,
    pub max_token_count: usize,
    pub max_enclosure_depth: usize,
    pub metrics_buffer_size: usize,
}

impl SecurityLimits {
    /// Conservative bounds for untrusted grammar input
    pub fn is_conservative(&self) -> bool {
        self.max_lexeme_length <= 1_048_576
            && self.max_token_count <= 5_000_000
            && self.max_enclosure_depth <= 1024
    }
}

// ============================================================================
// ANALYSIS HELPERS
// ============================================================================

/// Count tokens per class
pub fn get_token_counts(tokens: &[Token]) -> TokenCounts {
    let mut counts = TokenCounts::default();

    for token in tokens {
        counts.total += 1;
        match token.kind.class() {
            TokenClass::Symbol => {
                if token.kind == TokenKind::NonTerminalSymbol {
                    counts.non_terminals += 1;
                } else {
                    counts.terminals += 1;
                }
            }
            TokenClass::Operator => counts.operators += 1,
            TokenClass::Action => counts.actions += 1,
            TokenClass::Group => counts.groups += 1,
            TokenClass::Marker => {
                if token.kind == TokenKind::EndOfRule {
                    counts.rules += 1;
                }
            }
        }
    }

    counts
}

/// Token distribution of a scanned grammar
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TokenCounts {
    pub total: usize,
    pub terminals: usize,
    pub non_terminals: usize,
    pub operators: usize,
    pub actions: usize,
    pub groups: usize,
    /// `!!` markers seen
    pub rules: usize,
}

impl TokenCounts {
    /// True when at least one grammar symbol was scanned
    pub fn has_content(&self) -> bool {
        self.terminals > 0 || self.non_terminals > 0
    }

    pub fn is_within_security_limits(&self) -> bool {
        self.total <= MAX_TOKEN_COUNT
    }
}
