//! Stack of expected closing delimiters
//!
//! One frame per open construct. The stack is empty exactly when scanning is
//! at top level.

use super::error::LexerError;
use crate::config::compile_time::lexical::MAX_ENCLOSURE_DEPTH;
use crate::utils::Position;

/// Construct a frame was opened for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// `<...>`
    NonTerminal,
    /// `"..."` or `'...'`
    Quote,
    /// `( ... )` group
    Paren,
    /// `[ ... ]` group
    Bracket,
    /// `{ Name(args) }`
    Action,
}

impl FrameKind {
    pub fn for_opener(opener: char) -> Option<Self> {
        match opener {
            '<' => Some(FrameKind::NonTerminal),
            '"' | '\'' => Some(FrameKind::Quote),
            '(' => Some(FrameKind::Paren),
            '[' => Some(FrameKind::Bracket),
            '{' => Some(FrameKind::Action),
            _ => None,
        }
    }

    /// Groups are closed by their own dispatch case; the others by their handler
    pub fn is_group(&self) -> bool {
        matches!(self, FrameKind::Paren | FrameKind::Bracket)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnclosureFrame {
    pub closer: char,
    pub kind: FrameKind,
    pub opened_at: Position,
}

#[derive(Debug, Clone, Default)]
pub struct EnclosureStack {
    frames: Vec<EnclosureFrame>,
    max_depth: usize,
}

impl EnclosureStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a frame for `opener`, which must be one of `< " ' ( [ {`
    pub fn open(&mut self, opener: char, opened_at: Position) -> Result<&EnclosureFrame, LexerError> {
        let (closer, kind) = match (opener, FrameKind::for_opener(opener)) {
            ('<', Some(kind)) => ('>', kind),
            ('(', Some(kind)) => (')', kind),
            ('[', Some(kind)) => (']', kind),
            ('{', Some(kind)) => ('}', kind),
            (quote, Some(kind)) => (quote, kind),
            (other, None) => {
                return Err(LexerError::unexpected(other, "opening delimiter", opened_at))
            }
        };
        self.push(EnclosureFrame {
            closer,
            kind,
            opened_at,
        })
    }

    pub fn push(&mut self, frame: EnclosureFrame) -> Result<&EnclosureFrame, LexerError> {
        if self.frames.len() >= MAX_ENCLOSURE_DEPTH {
            return Err(LexerError::EnclosureTooDeep {
                depth: self.frames.len() + 1,
                position: frame.opened_at,
            });
        }
        self.frames.push(frame);
        self.max_depth = self.max_depth.max(self.frames.len());
        Ok(&self.frames[self.frames.len() - 1])
    }

    pub fn top(&self) -> Option<&EnclosureFrame> {
        self.frames.last()
    }

    /// Closer the innermost frame is waiting for
    pub fn expected_closer(&self) -> Option<char> {
        self.top().map(|frame| frame.closer)
    }

    pub fn pop(&mut self) -> Option<EnclosureFrame> {
        self.frames.pop()
    }

    /// Close the innermost group with `found`.
    ///
    /// With no group open this is a soft `ConditionFailed`; a different
    /// innermost closer is a hard `MismatchedDelimiter`.
    pub fn close_group(&mut self, found: char, position: Position) -> Result<EnclosureFrame, LexerError> {
        match self.top().copied() {
            Some(frame) if frame.kind.is_group() && frame.closer == found => {
                self.frames.pop();
                Ok(frame)
            }
            Some(frame) if frame.kind.is_group() => Err(LexerError::MismatchedDelimiter {
                expected: frame.closer,
                found,
                position,
            }),
            _ => Err(LexerError::ConditionFailed {
                expected: format!("open group for '{}'", found),
                position,
            }),
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Deepest nesting seen over the stack's lifetime
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn frames(&self) -> &[EnclosureFrame] {
        &self.frames
    }
}
