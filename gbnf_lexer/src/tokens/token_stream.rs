//! Append-only token buffer with a replay cursor
//!
//! Tokens are appended by the lexer as they are recognised and never removed
//! or rewritten. The cursor indexes the next token to hand out; `mark` and
//! `reset` save and restore it so already-scanned tokens can be replayed
//! without reading the source again.

use crate::config::compile_time::lexical::MAX_TOKEN_COUNT;
use crate::tokens::token::{Token, TokenKind};

/// Opaque saved cursor position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Mark(usize);

impl Mark {
    /// Buffer index the mark refers to
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct TokenStream {
    tokens: Vec<Token>,
    cursor: usize,
    finished: bool,
}

impl TokenStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a freshly scanned token.
    ///
    /// Appending `EndOfStream` closes the stream; nothing may follow it.
    pub fn push(&mut self, token: Token) -> Result<(), TokenStreamError> {
        if self.finished {
            return Err(TokenStreamError::AlreadyFinished {
                lexeme: token.lexeme,
            });
        }

        if self.tokens.len() >= MAX_TOKEN_COUNT {
            return Err(TokenStreamError::TooManyTokens {
                count: self.tokens.len() + 1,
            });
        }

        if token.kind == TokenKind::EndOfStream {
            self.finished = true;
        }
        self.tokens.push(token);
        Ok(())
    }

    // === CURSOR NAVIGATION ===

    /// Hand out the token under the cursor, if one is buffered
    pub fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.cursor).cloned()?;
        self.cursor += 1;
        Some(token)
    }

    /// Look at the token under the cursor without moving it
    pub fn current(&self) -> Option<&Token> {
        self.tokens.get(self.cursor)
    }

    pub fn mark(&self) -> Mark {
        Mark(self.cursor)
    }

    /// Restore a saved cursor; marks beyond the buffer clamp to its end
    pub fn reset(&mut self, mark: Mark) {
        self.cursor = mark.0.min(self.tokens.len());
    }

    /// True when every buffered token has been handed out
    pub fn is_caught_up(&self) -> bool {
        self.cursor >= self.tokens.len()
    }

    /// True once `EndOfStream` has been appended
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// True when the stream is finished and the cursor is past its end
    pub fn is_exhausted(&self) -> bool {
        self.finished && self.is_caught_up()
    }

    // === INSPECTION ===

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Buffered tokens ahead of the cursor
    pub fn remaining_buffered(&self) -> &[Token] {
        &self.tokens[self.cursor.min(self.tokens.len())..]
    }

    /// Up to `count` buffered tokens starting at the cursor
    pub fn lookahead(&self, count: usize) -> &[Token] {
        let remaining = self.remaining_buffered();
        &remaining[..count.min(remaining.len())]
    }

    /// Buffered tokens within `radius` of the cursor, for error context
    pub fn context_snippet(&self, radius: usize) -> &[Token] {
        let start = self.cursor.saturating_sub(radius);
        let end = (self.cursor + radius + 1).min(self.tokens.len());
        &self.tokens[start.min(end)..end]
    }

    pub fn diagnostic(&self) -> String {
        let current_info = match self.current() {
            Some(token) => token.to_string(),
            None if self.finished => "<end>".to_string(),
            None => "<unscanned>".to_string(),
        };

        format!(
            "TokenStream(pos: {}/{}, current: {}, finished: {})",
            self.cursor,
            self.tokens.len(),
            current_info,
            self.finished
        )
    }
}

/// Token buffer errors
#[derive(Debug, Clone, PartialEq)]
pub enum TokenStreamError {
    /// The compile-time token limit would be exceeded
    TooManyTokens { count: usize },
    /// A token was appended after `EndOfStream`
    AlreadyFinished { lexeme: String },
}

impl std::fmt::Display for TokenStreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TooManyTokens { count } => {
                write!(f, "Too many tokens: {} (max {})", count, MAX_TOKEN_COUNT)
            }
            Self::AlreadyFinished { lexeme } => {
                write!(f, "Token '{}' appended after end of stream", lexeme)
            }
        }
    }
}

impl std::error::Error for TokenStreamError {}

/// Validation helpers for scanned token sequences
pub mod validation {
    use super::*;

    /// Check that token positions never move backwards
    pub fn validate_position_order(tokens: &[Token]) -> Result<(), String> {
        for window in tokens.windows(2) {
            let (current, next) = (&window[0], &window[1]);

            if (next.line, next.column) < (current.line, current.column) {
                return Err(format!(
                    "Position order violation: {} is followed by {}",
                    current, next
                ));
            }
        }
        Ok(())
    }

    /// Check that `EndOfStream` appears once, as the final token
    pub fn validate_end_of_stream(tokens: &[Token]) -> Result<(), String> {
        let count = tokens.iter().filter(|t| t.is_end_of_stream()).count();
        match tokens.last() {
            Some(last) if last.is_end_of_stream() && count == 1 => Ok(()),
            _ => Err(format!(
                "Expected exactly one trailing EndOfStream, found {}",
                count
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(lexeme: &str, kind: TokenKind, column: u32) -> Token {
        Token::new(lexeme, kind, 1, column)
    }

    fn filled() -> TokenStream {
        let mut stream = TokenStream::new();
        stream
            .push(token("expr", TokenKind::NonTerminalSymbol, 1))
            .unwrap();
        stream
            .push(token("::=", TokenKind::ProductionRuleOp, 8))
            .unwrap();
        stream
            .push(token("term", TokenKind::NonTerminalSymbol, 12))
            .unwrap();
        stream
    }

    #[test]
    fn test_advance_and_caught_up() {
        let mut stream = filled();

        assert_eq!(stream.advance().unwrap().lexeme, "expr");
        assert_eq!(stream.current().unwrap().lexeme, "::=");
        stream.advance();
        stream.advance();

        assert!(stream.is_caught_up());
        assert!(!stream.is_exhausted());
        assert_eq!(stream.advance(), None);
        assert_eq!(stream.cursor(), 3);
    }

    #[test]
    fn test_mark_and_reset_replay() {
        let mut stream = filled();
        stream.advance();

        let mark = stream.mark();
        assert_eq!(mark.index(), 1);

        let first = stream.advance().unwrap();
        stream.advance();
        stream.reset(mark);

        assert_eq!(stream.advance().unwrap(), first);
        assert_eq!(stream.len(), 3);
    }

    #[test]
    fn test_reset_clamps_to_buffer() {
        let mut other = filled();
        other.advance();
        other.advance();
        other.advance();
        let far_mark = other.mark();

        let mut stream = TokenStream::new();
        stream
            .push(token("x", TokenKind::TerminalSymbol, 1))
            .unwrap();
        stream.reset(far_mark);
        assert_eq!(stream.cursor(), 1);
    }

    #[test]
    fn test_end_of_stream_closes_buffer() {
        let mut stream = filled();
        stream
            .push(token("", TokenKind::EndOfStream, 16))
            .unwrap();

        assert!(stream.is_finished());
        let result = stream.push(token("late", TokenKind::TerminalSymbol, 17));
        assert_eq!(
            result,
            Err(TokenStreamError::AlreadyFinished {
                lexeme: "late".to_string()
            })
        );
        assert_eq!(stream.len(), 4);
    }

    #[test]
    fn test_lookahead_and_context() {
        let mut stream = filled();
        stream.advance();

        let ahead: Vec<&str> = stream
            .lookahead(5)
            .iter()
            .map(|t| t.lexeme.as_str())
            .collect();
        assert_eq!(ahead, vec!["::=", "term"]);

        assert_eq!(stream.context_snippet(1).len(), 3);
        assert!(stream.diagnostic().contains("pos: 1/3"));
    }

    #[test]
    fn test_position_order_validation() {
        let stream = filled();
        assert!(validation::validate_position_order(stream.tokens()).is_ok());

        let reversed: Vec<Token> = stream.tokens().iter().rev().cloned().collect();
        assert!(validation::validate_position_order(&reversed).is_err());
    }

    #[test]
    fn test_end_of_stream_validation() {
        let mut stream = filled();
        assert!(validation::validate_end_of_stream(stream.tokens()).is_err());

        stream
            .push(token("", TokenKind::EndOfStream, 16))
            .unwrap();
        assert!(validation::validate_end_of_stream(stream.tokens()).is_ok());
    }
}
