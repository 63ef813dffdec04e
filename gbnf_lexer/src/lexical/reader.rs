//! Character reader: source, position tracker and lexeme accumulator
//!
//! Every bumped character advances the position and is appended to the
//! current lexeme. Skipped characters only advance the position and never
//! count toward `MAX_LEXEME_LENGTH`. State handlers clear the lexeme once it
//! has been turned into a token or when a prefix such as an opening quote is
//! not part of it.

use super::char_source::CharSource;
use super::error::LexerError;
use crate::config::compile_time::lexical::MAX_LEXEME_LENGTH;
use crate::utils::Position;
use std::io::Read;

pub struct CharReader<R: Read> {
    source: CharSource<R>,
    position: Position,
    lexeme: String,
    lexeme_chars: usize,
    token_start: Position,
}

impl<R: Read> CharReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            source: CharSource::new(reader),
            position: Position::start(),
            lexeme: String::new(),
            lexeme_chars: 0,
            token_start: Position::start(),
        }
    }

    /// Position of the next character to be consumed
    pub fn position(&self) -> Position {
        self.position
    }

    /// Lookahead without consuming
    pub fn peek(&mut self) -> Result<Option<char>, LexerError> {
        let position = self.position;
        self.source.peek().map_err(|e| LexerError::Decode {
            message: e.to_string(),
            position,
        })
    }

    pub fn peek_is(&mut self, expected: char) -> Result<bool, LexerError> {
        Ok(self.peek()? == Some(expected))
    }

    /// Consume one character into the lexeme; `None` at end of input
    pub fn bump(&mut self) -> Result<Option<char>, LexerError> {
        let position = self.position;
        let next = self.source.next_char().map_err(|e| LexerError::Decode {
            message: e.to_string(),
            position,
        })?;

        let Some(ch) = next else {
            return Ok(None);
        };

        self.lexeme_chars += 1;
        if self.lexeme_chars > MAX_LEXEME_LENGTH {
            return Err(LexerError::LexemeTooLong {
                length: self.lexeme_chars,
                position: self.token_start,
            });
        }

        self.position = self.position.advance(ch);
        self.lexeme.push(ch);
        Ok(Some(ch))
    }

    /// Consume characters while `predicate` holds; returns how many were taken
    pub fn bump_while<F>(&mut self, predicate: F) -> Result<usize, LexerError>
    where
        F: Fn(char) -> bool,
    {
        let mut count = 0;
        while let Some(ch) = self.peek()? {
            if !predicate(ch) {
                break;
            }
            self.bump()?;
            count += 1;
        }
        Ok(count)
    }

    /// Step over characters while `predicate` holds, leaving the lexeme untouched
    pub fn skip_while<F>(&mut self, predicate: F) -> Result<usize, LexerError>
    where
        F: Fn(char) -> bool,
    {
        let mut count = 0;
        while let Some(ch) = self.peek()? {
            if !predicate(ch) {
                break;
            }
            let position = self.position;
            self.source.next_char().map_err(|e| LexerError::Decode {
                message: e.to_string(),
                position,
            })?;
            self.position = self.position.advance(ch);
            count += 1;
        }
        Ok(count)
    }

    /// Consume characters up to, not including, `closer` or end of input
    pub fn bump_until(&mut self, closer: char) -> Result<usize, LexerError> {
        self.bump_while(|ch| ch != closer)
    }

    // === LEXEME ACCUMULATOR ===

    pub fn lexeme(&self) -> &str {
        &self.lexeme
    }

    /// Drop the accumulated text and start the next token here
    pub fn clear(&mut self) {
        self.lexeme.clear();
        self.lexeme_chars = 0;
        self.token_start = self.position;
    }

    /// Hand over the accumulated text and start the next token here
    pub fn take_lexeme(&mut self) -> String {
        let lexeme = std::mem::take(&mut self.lexeme);
        self.clear();
        lexeme
    }

    /// Where the token being accumulated started
    pub fn token_start(&self) -> Position {
        self.token_start
    }

    /// Pin the start of the current construct without clearing the lexeme
    pub fn mark_start(&mut self, position: Position) {
        self.token_start = position;
    }
}
