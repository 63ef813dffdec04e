//! Token definitions for extended BNF grammars

use serde::{Deserialize, Serialize};
use std::fmt;

/// Every category of token the lexer can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TokenKind {
    /// Quoted text or a bare word/punctuation character
    TerminalSymbol,
    /// Name written between `<` and `>`
    NonTerminalSymbol,
    /// `::=`
    ProductionRuleOp,
    /// `|`
    Or,
    /// `&`
    And,
    /// Single `!`
    Not,
    /// Action name inside `{ ... }`
    Action,
    /// One argument of an action
    ActionArg,
    ParenLeft,
    ParenRight,
    BracketLeft,
    BracketRight,
    /// `=`
    Assign,
    /// One to three consecutive dots
    Sequence,
    /// `!!`
    EndOfRule,
    /// Emitted exactly once, after the last real token
    EndOfStream,
}

/// Broad token categories used for metrics and counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenClass {
    /// Terminal and non-terminal symbols
    Symbol,
    /// Rule, alternation, predicate, assignment and sequence operators
    Operator,
    /// Action names and their arguments
    Action,
    /// Parentheses and brackets
    Group,
    /// End-of-rule and end-of-stream markers
    Marker,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TerminalSymbol => "TerminalSymbol",
            Self::NonTerminalSymbol => "NonTerminalSymbol",
            Self::ProductionRuleOp => "ProductionRuleOp",
            Self::Or => "Or",
            Self::And => "And",
            Self::Not => "Not",
            Self::Action => "Action",
            Self::ActionArg => "ActionArg",
            Self::ParenLeft => "ParenLeft",
            Self::ParenRight => "ParenRight",
            Self::BracketLeft => "BracketLeft",
            Self::BracketRight => "BracketRight",
            Self::Assign => "Assign",
            Self::Sequence => "Sequence",
            Self::EndOfRule => "EndOfRule",
            Self::EndOfStream => "EndOfStream",
        }
    }

    pub fn class(&self) -> TokenClass {
        match self {
            Self::TerminalSymbol | Self::NonTerminalSymbol => TokenClass::Symbol,
            Self::ProductionRuleOp
            | Self::Or
            | Self::And
            | Self::Not
            | Self::Assign
            | Self::Sequence => TokenClass::Operator,
            Self::Action | Self::ActionArg => TokenClass::Action,
            Self::ParenLeft | Self::ParenRight | Self::BracketLeft | Self::BracketRight => {
                TokenClass::Group
            }
            Self::EndOfRule | Self::EndOfStream => TokenClass::Marker,
        }
    }

    pub fn is_symbol(&self) -> bool {
        self.class() == TokenClass::Symbol
    }

    pub fn is_operator(&self) -> bool {
        self.class() == TokenClass::Operator
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lexeme with its kind and the 1-based position of the construct's first character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub lexeme: String,
    pub kind: TokenKind,
    pub line: u32,
    pub column: u32,
}

impl Token {
    pub fn new(lexeme: impl Into<String>, kind: TokenKind, line: u32, column: u32) -> Self {
        Self {
            lexeme: lexeme.into(),
            kind,
            line,
            column,
        }
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.kind == TokenKind::EndOfStream
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}:{}:{}:{}]",
            self.lexeme, self.kind, self.line, self.column
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_display() {
        let token = Token::new("expr", TokenKind::NonTerminalSymbol, 1, 1);
        assert_eq!(token.to_string(), "[expr:NonTerminalSymbol:1:1]");
    }

    #[test]
    fn test_kind_classes() {
        assert_eq!(TokenKind::TerminalSymbol.class(), TokenClass::Symbol);
        assert_eq!(TokenKind::Sequence.class(), TokenClass::Operator);
        assert_eq!(TokenKind::ActionArg.class(), TokenClass::Action);
        assert_eq!(TokenKind::BracketRight.class(), TokenClass::Group);
        assert_eq!(TokenKind::EndOfRule.class(), TokenClass::Marker);
        assert!(TokenKind::Not.is_operator());
        assert!(!TokenKind::Action.is_symbol());
    }

    #[test]
    fn test_token_serializes_with_kind_name() {
        let token = Token::new("::=", TokenKind::ProductionRuleOp, 2, 8);
        let json = serde_json::to_value(&token).unwrap();

        assert_eq!(json["kind"], "ProductionRuleOp");
        assert_eq!(json["lexeme"], "::=");
        assert_eq!(json["column"], 8);
    }
}
