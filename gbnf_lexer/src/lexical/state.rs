//! Tokenizer state machine
//!
//! `State` is the handler that runs next. Each `step` runs exactly one
//! handler, which consumes characters, emits at most one token and names the
//! following state. `Dispatch` only looks at the lookahead character. The
//! current state together with the enclosure stack is the whole suspended
//! state between two tokens.

use super::enclosure::{EnclosureStack, FrameKind};
use super::error::{Found, LexerError};
use super::reader::CharReader;
use crate::tokens::{Token, TokenKind};
use crate::utils::Position;
use std::io::Read;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    /// Select a handler from the lookahead character
    Dispatch,
    Whitespace,
    /// `!` or `!!`
    EndOfRule,
    /// `::=`
    ProductionRuleOp,
    Or,
    Assign,
    And,
    /// One to three dots
    Sequence,
    /// `<`, `"` or `'`
    OpenEnclosure,
    /// Text up to the innermost closer
    ScanEnclosed,
    /// Consume the closer of a quoted or angle-bracketed construct
    CloseEnclosure,
    /// `(` or `[`
    OpenGroup,
    /// `)` or `]`
    CloseGroup,
    /// `{`
    ActionOpen,
    ActionName,
    ActionArgs,
    /// Trailing `}` of an action
    ActionClose,
    /// Word or single punctuation character
    BareTerminal,
    /// `EndOfStream` has been emitted
    Finished,
}

impl State {
    /// Handler selected by the lookahead character
    pub fn for_lookahead(ch: char, accept_carriage_return: bool) -> State {
        match ch {
            '!' => State::EndOfRule,
            ':' => State::ProductionRuleOp,
            '|' => State::Or,
            '=' => State::Assign,
            '&' => State::And,
            '.' => State::Sequence,
            '"' | '\'' | '<' => State::OpenEnclosure,
            '{' => State::ActionOpen,
            '(' | '[' => State::OpenGroup,
            ')' | ']' => State::CloseGroup,
            c if is_whitespace(c, accept_carriage_return) => State::Whitespace,
            _ => State::BareTerminal,
        }
    }
}

fn is_whitespace(ch: char, accept_carriage_return: bool) -> bool {
    matches!(ch, ' ' | '\t' | '\n') || (accept_carriage_return && ch == '\r')
}

/// Outcome of one handler run
type Step = (State, Option<Token>);

pub struct StateMachine {
    state: State,
    enclosures: EnclosureStack,
    accept_carriage_return: bool,
}

impl StateMachine {
    pub fn new(accept_carriage_return: bool) -> Self {
        Self {
            state: State::Dispatch,
            enclosures: EnclosureStack::new(),
            accept_carriage_return,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn enclosures(&self) -> &EnclosureStack {
        &self.enclosures
    }

    pub fn is_finished(&self) -> bool {
        self.state == State::Finished
    }

    /// Run the current handler once.
    ///
    /// On error the state is left unchanged and nothing is emitted; the
    /// session owning the machine must not step it again.
    pub fn step<R: Read>(&mut self, reader: &mut CharReader<R>) -> Result<Option<Token>, LexerError> {
        let (next, token) = match self.state {
            State::Dispatch => self.dispatch(reader)?,
            State::Whitespace => self.whitespace(reader)?,
            State::EndOfRule => end_of_rule(reader)?,
            State::ProductionRuleOp => production_rule_op(reader)?,
            State::Or => single(reader, TokenKind::Or)?,
            State::Assign => single(reader, TokenKind::Assign)?,
            State::And => single(reader, TokenKind::And)?,
            State::Sequence => sequence(reader)?,
            State::OpenEnclosure => self.open_enclosure(reader)?,
            State::ScanEnclosed => self.scan_enclosed(reader)?,
            State::CloseEnclosure => self.close_enclosure(reader)?,
            State::OpenGroup => self.open_group(reader)?,
            State::CloseGroup => self.close_group(reader)?,
            State::ActionOpen => self.action_open(reader)?,
            State::ActionName => self.action_name(reader)?,
            State::ActionArgs => self.action_args(reader)?,
            State::ActionClose => self.action_close(reader)?,
            State::BareTerminal => bare_terminal(reader)?,
            State::Finished => (State::Finished, None),
        };
        self.state = next;
        Ok(token)
    }

    // === DISPATCH ===

    fn dispatch<R: Read>(&mut self, reader: &mut CharReader<R>) -> Result<Step, LexerError> {
        reader.clear();
        match reader.peek()? {
            None => {
                let at = reader.position();
                Ok((State::Finished, Some(token_at("", TokenKind::EndOfStream, at))))
            }
            Some(ch) => Ok((State::for_lookahead(ch, self.accept_carriage_return), None)),
        }
    }

    fn whitespace<R: Read>(&mut self, reader: &mut CharReader<R>) -> Result<Step, LexerError> {
        let accept_cr = self.accept_carriage_return;
        reader.skip_while(|c| is_whitespace(c, accept_cr))?;
        reader.clear();
        Ok((State::Dispatch, None))
    }

    // === QUOTED AND ANGLE-BRACKETED CONSTRUCTS ===

    fn open_enclosure<R: Read>(&mut self, reader: &mut CharReader<R>) -> Result<Step, LexerError> {
        let start = reader.position();
        let opener = expect_any(reader, "'<' or quote")?;
        self.enclosures.open(opener, start)?;
        reader.clear();
        reader.mark_start(start);
        Ok((State::ScanEnclosed, None))
    }

    fn scan_enclosed<R: Read>(&mut self, reader: &mut CharReader<R>) -> Result<Step, LexerError> {
        let Some(frame) = self.enclosures.top().copied() else {
            return Ok((State::Dispatch, None));
        };

        // End of input before the closer still yields the token
        reader.bump_until(frame.closer)?;

        let kind = match frame.kind {
            FrameKind::NonTerminal => TokenKind::NonTerminalSymbol,
            _ => TokenKind::TerminalSymbol,
        };
        let token = emit(reader, kind);
        Ok((State::CloseEnclosure, Some(token)))
    }

    fn close_enclosure<R: Read>(&mut self, reader: &mut CharReader<R>) -> Result<Step, LexerError> {
        if let Some(frame) = self.enclosures.pop() {
            if reader.peek()? == Some(frame.closer) {
                reader.bump()?;
            }
        }
        reader.clear();
        Ok((State::Dispatch, None))
    }

    // === GROUPS ===

    fn open_group<R: Read>(&mut self, reader: &mut CharReader<R>) -> Result<Step, LexerError> {
        let start = reader.position();
        let opener = expect_any(reader, "'(' or '['")?;
        let kind = match self.enclosures.open(opener, start)?.kind {
            FrameKind::Bracket => TokenKind::BracketLeft,
            _ => TokenKind::ParenLeft,
        };
        Ok((State::Dispatch, Some(emit(reader, kind))))
    }

    fn close_group<R: Read>(&mut self, reader: &mut CharReader<R>) -> Result<Step, LexerError> {
        let at = reader.position();
        let Some(closer) = reader.peek()? else {
            return Ok((State::Dispatch, None));
        };

        match self.enclosures.close_group(closer, at) {
            Ok(frame) => {
                reader.bump()?;
                let kind = match frame.kind {
                    FrameKind::Bracket => TokenKind::BracketRight,
                    _ => TokenKind::ParenRight,
                };
                Ok((State::Dispatch, Some(emit(reader, kind))))
            }
            // No group open: the closer is plain punctuation
            Err(error) if error.is_soft() => Ok((State::BareTerminal, None)),
            Err(error) => Err(error),
        }
    }

    // === ACTIONS ===

    fn action_open<R: Read>(&mut self, reader: &mut CharReader<R>) -> Result<Step, LexerError> {
        let start = reader.position();
        expect(reader, '{')?;
        self.enclosures.open('{', start)?;
        reader.clear();
        Ok((State::ActionName, None))
    }

    fn action_name<R: Read>(&mut self, reader: &mut CharReader<R>) -> Result<Step, LexerError> {
        let accept_cr = self.accept_carriage_return;
        reader.skip_while(|c| is_whitespace(c, accept_cr))?;
        reader.clear();
        reader.bump_while(|c| c != '(' && c != '}')?;

        let at = reader.position();
        match reader.peek()? {
            Some('(') => {}
            found => return Err(LexerError::unexpected(found, "'('", at)),
        }

        let start = reader.token_start();
        let name = reader.take_lexeme();
        let name = name.trim_end();
        if name.is_empty() {
            return Err(LexerError::unexpected('(', "action name", at));
        }

        reader.bump()?;
        reader.clear();
        Ok((State::ActionArgs, Some(token_at(name, TokenKind::Action, start))))
    }

    fn action_args<R: Read>(&mut self, reader: &mut CharReader<R>) -> Result<Step, LexerError> {
        let accept_cr = self.accept_carriage_return;
        reader.skip_while(|c| c == ',' || is_whitespace(c, accept_cr))?;
        reader.clear();

        match reader.peek()? {
            None => Err(LexerError::unexpected(
                Found::EndOfInput,
                "')'",
                reader.position(),
            )),
            Some(')') => {
                reader.bump()?;
                reader.clear();
                Ok((State::ActionClose, None))
            }
            Some(_) => {
                reader.bump_while(|c| c != ')' && c != ',' && !is_whitespace(c, accept_cr))?;
                Ok((State::ActionArgs, Some(emit(reader, TokenKind::ActionArg))))
            }
        }
    }

    fn action_close<R: Read>(&mut self, reader: &mut CharReader<R>) -> Result<Step, LexerError> {
        let accept_cr = self.accept_carriage_return;
        reader.skip_while(|c| is_whitespace(c, accept_cr))?;

        match reader.peek()? {
            Some('}') => {
                reader.bump()?;
            }
            // Lenient on a truncated action
            None => {}
            Some(other) => {
                return Err(LexerError::unexpected(other, "'}'", reader.position()));
            }
        }
        self.enclosures.pop();
        reader.clear();
        Ok((State::Dispatch, None))
    }
}

// === STATELESS HANDLERS ===

fn end_of_rule<R: Read>(reader: &mut CharReader<R>) -> Result<Step, LexerError> {
    expect(reader, '!')?;
    let kind = if reader.peek_is('!')? {
        reader.bump()?;
        TokenKind::EndOfRule
    } else {
        TokenKind::Not
    };
    Ok((State::Dispatch, Some(emit(reader, kind))))
}

fn production_rule_op<R: Read>(reader: &mut CharReader<R>) -> Result<Step, LexerError> {
    for expected in [':', ':', '='] {
        expect(reader, expected).map_err(|error| match error {
            LexerError::UnexpectedCharacter { found, position, .. } => {
                LexerError::UnexpectedCharacter {
                    found,
                    expected: "'::='".to_string(),
                    position,
                }
            }
            other => other,
        })?;
    }
    Ok((State::Dispatch, Some(emit(reader, TokenKind::ProductionRuleOp))))
}

fn single<R: Read>(reader: &mut CharReader<R>, kind: TokenKind) -> Result<Step, LexerError> {
    reader.bump()?;
    Ok((State::Dispatch, Some(emit(reader, kind))))
}

fn sequence<R: Read>(reader: &mut CharReader<R>) -> Result<Step, LexerError> {
    expect(reader, '.')?;
    for _ in 0..2 {
        if !reader.peek_is('.')? {
            break;
        }
        reader.bump()?;
    }
    Ok((State::Dispatch, Some(emit(reader, TokenKind::Sequence))))
}

fn bare_terminal<R: Read>(reader: &mut CharReader<R>) -> Result<Step, LexerError> {
    let at = reader.position();
    match reader.peek()? {
        None => Ok((State::Dispatch, None)),
        Some(ch) if ch.is_alphanumeric() => {
            reader.bump_while(char::is_alphanumeric)?;
            Ok((State::Dispatch, Some(emit(reader, TokenKind::TerminalSymbol))))
        }
        Some(ch) if !ch.is_whitespace() && !ch.is_control() => {
            reader.bump()?;
            Ok((State::Dispatch, Some(emit(reader, TokenKind::TerminalSymbol))))
        }
        Some(ch) => Err(LexerError::unexpected(ch, "grammar symbol", at)),
    }
}

// === HELPERS ===

/// Consume `expected` or fail with what was there instead
fn expect<R: Read>(reader: &mut CharReader<R>, expected: char) -> Result<(), LexerError> {
    let at = reader.position();
    match reader.peek()? {
        Some(ch) if ch == expected => {
            reader.bump()?;
            Ok(())
        }
        found => Err(LexerError::unexpected(found, format!("'{}'", expected), at)),
    }
}

/// Consume whatever character is next; end of input is an error
fn expect_any<R: Read>(reader: &mut CharReader<R>, expected: &str) -> Result<char, LexerError> {
    let at = reader.position();
    reader
        .bump()?
        .ok_or_else(|| LexerError::unexpected(Found::EndOfInput, expected, at))
}

/// Turn the accumulated lexeme into a token at the construct's start
fn emit<R: Read>(reader: &mut CharReader<R>, kind: TokenKind) -> Token {
    let start = reader.token_start();
    token_at(reader.take_lexeme(), kind, start)
}

fn token_at(lexeme: impl Into<String>, kind: TokenKind, at: Position) -> Token {
    Token::new(lexeme, kind, at.line, at.column)
}
