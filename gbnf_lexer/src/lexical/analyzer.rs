//! Lexer session: pull-based tokenization with a backtracking cursor
//!
//! A `Lexer` owns the character reader, the state machine and the token
//! buffer for one input. `next_token` replays buffered tokens after a
//! `reset` and only scans new characters once the cursor has caught up.

use super::error::{Found, LexerError};
use super::reader::CharReader;
use super::state::StateMachine;
use crate::config::compile_time::lexical::*;
use crate::config::runtime::LexicalPreferences;
use crate::logging::codes;
use crate::tokens::{Mark, Token, TokenClass, TokenKind, TokenStream, TokenStreamError};
use crate::utils::{Position, Span};
use crate::{log_debug, log_error, log_success, log_warning};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::path::Path;

/// Lexical analysis metrics with runtime preferences
#[derive(Debug, Default, Clone)]
pub struct LexicalMetrics {
    pub total_tokens: usize,
    pub symbol_tokens: usize,
    pub operator_tokens: usize,
    pub action_tokens: usize,
    pub group_tokens: usize,
    pub marker_tokens: usize,

    /// Tokens handed out again from the buffer instead of being scanned
    pub replayed_tokens: usize,

    // Runtime preference-controlled metrics
    pub max_lexeme_length: usize,
    pub max_enclosure_depth: usize,
    pub kind_usage: HashMap<TokenKind, usize>,
}

impl LexicalMetrics {
    pub(crate) fn record_token(&mut self, token: &Token, preferences: &LexicalPreferences) {
        self.total_tokens += 1;

        match token.kind.class() {
            TokenClass::Symbol => self.symbol_tokens += 1,
            TokenClass::Operator => self.operator_tokens += 1,
            TokenClass::Action => self.action_tokens += 1,
            TokenClass::Group => self.group_tokens += 1,
            TokenClass::Marker => self.marker_tokens += 1,
        }

        if preferences.collect_detailed_metrics {
            self.max_lexeme_length = self.max_lexeme_length.max(token.lexeme.chars().count());
        }

        if preferences.track_kind_patterns {
            *self.kind_usage.entry(token.kind).or_insert(0) += 1;
        }
    }

    pub(crate) fn record_enclosure_depth(&mut self, depth: usize, preferences: &LexicalPreferences) {
        if preferences.collect_detailed_metrics {
            self.max_enclosure_depth = self.max_enclosure_depth.max(depth);
        }
    }

    pub(crate) fn record_replay(&mut self) {
        self.replayed_tokens += 1;
    }
}

/// One lexing session over a single input
pub struct Lexer<R: Read> {
    reader: CharReader<R>,
    machine: StateMachine,
    stream: TokenStream,
    preferences: LexicalPreferences,
    metrics: LexicalMetrics,
    failure: Option<LexerError>,
    started: bool,
    iteration_done: bool,
}

impl<R: Read> Lexer<R> {
    pub fn new(reader: R) -> Self {
        Self::with_preferences(reader, LexicalPreferences::default())
    }

    pub fn with_preferences(reader: R, preferences: LexicalPreferences) -> Self {
        Self {
            reader: CharReader::new(reader),
            machine: StateMachine::new(preferences.accept_carriage_return),
            stream: TokenStream::new(),
            preferences,
            metrics: LexicalMetrics::default(),
            failure: None,
            started: false,
            iteration_done: false,
        }
    }

    // === TOKEN STREAM CONTRACT ===

    /// Next token, scanning only when no buffered token is ahead of the cursor.
    ///
    /// Returns `Ok(None)` once `EndOfStream` has been handed out. After a hard
    /// error every call that would need to scan returns that error again.
    pub fn next_token(&mut self) -> Result<Option<Token>, LexerError> {
        if let Some(token) = self.stream.advance() {
            self.metrics.record_replay();
            return Ok(Some(token));
        }

        if self.stream.is_finished() {
            return Ok(None);
        }

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        match self.scan_token() {
            Ok(token) => {
                self.commit(token.clone())?;
                self.stream.advance();
                Ok(Some(token))
            }
            Err(error) => Err(self.fail(error)),
        }
    }

    /// Next token without moving the cursor
    pub fn peek_token(&mut self) -> Result<Option<Token>, LexerError> {
        let mark = self.mark();
        let replayed = self.metrics.replayed_tokens;
        let result = self.next_token();
        self.reset(mark);

        // A peek is not a replay
        self.metrics.replayed_tokens = replayed;
        result
    }

    pub fn mark(&self) -> Mark {
        self.stream.mark()
    }

    pub fn reset(&mut self, mark: Mark) {
        self.stream.reset(mark);
    }

    // === SCANNING ===

    fn scan_token(&mut self) -> Result<Token, LexerError> {
        if !self.started {
            self.started = true;
            log_debug!("Starting lexical analysis",
                "max_tokens_allowed" => MAX_TOKEN_COUNT,
                "max_lexeme_length" => MAX_LEXEME_LENGTH,
                "max_enclosure_depth" => MAX_ENCLOSURE_DEPTH
            );
        }

        loop {
            let emitted = self.machine.step(&mut self.reader)?;
            self.metrics
                .record_enclosure_depth(self.machine.enclosures().depth(), &self.preferences);

            if let Some(token) = emitted {
                return Ok(token);
            }
        }
    }

    fn commit(&mut self, token: Token) -> Result<(), LexerError> {
        let position = self.reader.position();
        if let Err(error) = self.stream.push(token.clone()) {
            return Err(self.fail(stream_error(error, position)));
        }

        self.metrics.record_token(&token, &self.preferences);

        if self.preferences.log_token_events {
            log_debug!("Token recognised",
                "kind" => token.kind,
                "lexeme" => token.lexeme.as_str(),
                "line" => token.line,
                "column" => token.column
            );
        }

        if token.is_end_of_stream() {
            self.finish();
        }
        Ok(())
    }

    fn finish(&self) {
        let open = self.machine.enclosures().depth();
        if let Some(frame) = self.machine.enclosures().top() {
            log_warning!(code = codes::lexical::UNCLOSED_ENCLOSURE,
                "Input ended inside an open construct",
                "open_frames" => open,
                "expected_closer" => frame.closer,
                "opened_at" => frame.opened_at
            );
        }

        log_success!(codes::success::TOKENIZATION_COMPLETE,
            "Lexical analysis completed",
            "total_tokens" => self.metrics.total_tokens,
            "symbol_tokens" => self.metrics.symbol_tokens,
            "operator_tokens" => self.metrics.operator_tokens,
            "action_tokens" => self.metrics.action_tokens,
            "max_enclosure_depth" => self.metrics.max_enclosure_depth
        );
    }

    /// Poison the session and log the failure
    fn fail(&mut self, error: LexerError) -> LexerError {
        let message = error.to_string();
        if self.preferences.include_position_in_errors {
            log_error!(error.error_code(), &message,
                span = Span::single(error.position()),
                "tokens_scanned" => self.stream.len()
            );
        } else {
            log_error!(error.error_code(), &message,
                "tokens_scanned" => self.stream.len()
            );
        }

        self.failure = Some(error.clone());
        error
    }

    // === INTROSPECTION ===

    /// Every token scanned so far, in recognition order
    pub fn tokens(&self) -> &[Token] {
        self.stream.tokens()
    }

    pub fn stream(&self) -> &TokenStream {
        &self.stream
    }

    pub fn cursor(&self) -> usize {
        self.stream.cursor()
    }

    /// Position of the next unread character
    pub fn position(&self) -> Position {
        self.reader.position()
    }

    pub fn enclosure_depth(&self) -> usize {
        self.machine.enclosures().depth()
    }

    pub fn metrics(&self) -> &LexicalMetrics {
        &self.metrics
    }

    pub fn preferences(&self) -> &LexicalPreferences {
        &self.preferences
    }

    /// True once `EndOfStream` has been scanned
    pub fn is_finished(&self) -> bool {
        self.stream.is_finished()
    }

    pub fn failure(&self) -> Option<&LexerError> {
        self.failure.as_ref()
    }
}

impl Lexer<Cursor<String>> {
    /// Lex an in-memory grammar
    pub fn from_source(source: &str) -> Self {
        Self::new(Cursor::new(source.to_string()))
    }
}

impl Lexer<File> {
    /// Lex a grammar file; the reader is buffered internally
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

/// Buffer refusals surface as lexer errors at the reader's position
fn stream_error(error: TokenStreamError, position: Position) -> LexerError {
    match error {
        TokenStreamError::TooManyTokens { count } => LexerError::TooManyTokens { count, position },
        TokenStreamError::AlreadyFinished { .. } => LexerError::unexpected(
            Found::EndOfInput,
            "no token after end of stream",
            position,
        ),
    }
}

/// Yields every token including `EndOfStream`; stops after the end or the first error
impl<R: Read> Iterator for Lexer<R> {
    type Item = Result<Token, LexerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.iteration_done {
            return None;
        }

        match self.next_token() {
            Ok(Some(token)) => Some(Ok(token)),
            Ok(None) => {
                self.iteration_done = true;
                None
            }
            Err(error) => {
                self.iteration_done = true;
                Some(Err(error))
            }
        }
    }
}

impl<R: Read> std::iter::FusedIterator for Lexer<R> {}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Write;

    fn lex_all(source: &str) -> Vec<Token> {
        Lexer::from_source(source)
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    fn pairs(source: &str) -> Vec<(TokenKind, String)> {
        lex_all(source)
            .into_iter()
            .filter(|t| !t.is_end_of_stream())
            .map(|t| (t.kind, t.lexeme))
            .collect()
    }

    fn pair(kind: TokenKind, lexeme: &str) -> (TokenKind, String) {
        (kind, lexeme.to_string())
    }

    const TWO_LINE_RULE: &str =
        "<expr> ::= <term> \"+\" <expr> |  <term>\n<expr>   ::=   <term> \"+\"  <expr> |        <term>";

    #[test]
    fn test_non_terminal() {
        let mut lexer = Lexer::from_source("<symbol>");
        let token = lexer.next_token().unwrap().unwrap();

        assert_eq!(token.lexeme, "symbol");
        assert_eq!(token.kind, TokenKind::NonTerminalSymbol);
        assert_eq!((token.line, token.column), (1, 1));
    }

    #[test]
    fn test_production_rule_op() {
        let mut lexer = Lexer::from_source("::=");
        let token = lexer.next_token().unwrap().unwrap();
        assert_eq!(token.lexeme, "::=");
        assert_eq!(token.kind, TokenKind::ProductionRuleOp);
    }

    #[test]
    fn test_or() {
        assert_eq!(pairs("|"), vec![pair(TokenKind::Or, "|")]);
    }

    #[test]
    fn test_whitespace_is_skipped() {
        let plain = lex_all("<abc>");
        let padded = lex_all("       \t\n\n<abc>");
        let single = lex_all(" <abc>");

        for tokens in [&plain, &padded, &single] {
            assert_eq!(tokens[0].kind, TokenKind::NonTerminalSymbol);
            assert_eq!(tokens[0].lexeme, "abc");
        }
        assert_eq!((padded[0].line, padded[0].column), (3, 1));
        assert_eq!((single[0].line, single[0].column), (1, 2));
    }

    #[test]
    fn test_quoted_terminals() {
        assert_eq!(
            pairs("\"Hello, World!\" 'Hello, World!'"),
            vec![
                pair(TokenKind::TerminalSymbol, "Hello, World!"),
                pair(TokenKind::TerminalSymbol, "Hello, World!"),
            ]
        );
    }

    #[test]
    fn test_action_with_arguments() {
        assert_eq!(
            pairs("{Fn(Hello, World)}"),
            vec![
                pair(TokenKind::Action, "Fn"),
                pair(TokenKind::ActionArg, "Hello"),
                pair(TokenKind::ActionArg, "World"),
            ]
        );
    }

    #[test]
    fn test_action_separators_never_yield_empty_args() {
        assert_eq!(
            pairs("{ Build ( a,,  b\t,c\n) }"),
            vec![
                pair(TokenKind::Action, "Build"),
                pair(TokenKind::ActionArg, "a"),
                pair(TokenKind::ActionArg, "b"),
                pair(TokenKind::ActionArg, "c"),
            ]
        );
        assert_eq!(pairs("{Empty()}"), vec![pair(TokenKind::Action, "Empty")]);
    }

    #[test]
    fn test_action_missing_close_paren() {
        let mut lexer = Lexer::from_source("{Fn(a, b");
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        assert_matches!(
            lexer.next_token(),
            Err(LexerError::UnexpectedCharacter {
                found: Found::EndOfInput,
                ..
            })
        );
    }

    #[test]
    fn test_multiline_grammar() {
        let source = "\"Hello World!\"\n<term>\n   \t<abc>\n\n::=\nwhile | true | false";
        assert_eq!(
            pairs(source),
            vec![
                pair(TokenKind::TerminalSymbol, "Hello World!"),
                pair(TokenKind::NonTerminalSymbol, "term"),
                pair(TokenKind::NonTerminalSymbol, "abc"),
                pair(TokenKind::ProductionRuleOp, "::="),
                pair(TokenKind::TerminalSymbol, "while"),
                pair(TokenKind::Or, "|"),
                pair(TokenKind::TerminalSymbol, "true"),
                pair(TokenKind::Or, "|"),
                pair(TokenKind::TerminalSymbol, "false"),
            ]
        );

        let tokens = lex_all(source);
        assert_eq!((tokens[2].line, tokens[2].column), (3, 5));
        assert_eq!((tokens[3].line, tokens[3].column), (5, 1));
    }

    #[test]
    fn test_rule_round_trip_shape() {
        let mut lexer = Lexer::from_source("<expr> ::= <term> \"+\" <expr> | <term>");
        let mut tokens = Vec::new();
        for _ in 0..7 {
            tokens.push(lexer.next_token().unwrap().unwrap());
        }

        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        let lexemes: Vec<&str> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::NonTerminalSymbol,
                TokenKind::ProductionRuleOp,
                TokenKind::NonTerminalSymbol,
                TokenKind::TerminalSymbol,
                TokenKind::NonTerminalSymbol,
                TokenKind::Or,
                TokenKind::NonTerminalSymbol,
            ]
        );
        assert_eq!(lexemes, vec!["expr", "::=", "term", "+", "expr", "|", "term"]);
        assert_eq!((tokens[1].line, tokens[1].column), (1, 8));
        assert_eq!((tokens[2].line, tokens[2].column), (1, 12));
    }

    #[test]
    fn test_two_line_rule() {
        let tokens = lex_all(TWO_LINE_RULE);
        assert_eq!(tokens.len(), 15);
        assert!(tokens[14].is_end_of_stream());
        assert_eq!(tokens[7].lexeme, "expr");
        assert_eq!((tokens[7].line, tokens[7].column), (2, 1));
        assert_eq!(tokens[8].kind, TokenKind::ProductionRuleOp);
    }

    #[test]
    fn test_two_line_rule_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TWO_LINE_RULE.as_bytes()).unwrap();
        file.flush().unwrap();

        let from_file: Vec<Token> = Lexer::open(file.path())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(from_file, lex_all(TWO_LINE_RULE));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Lexer::open(dir.path().join("missing.bnf")).is_err());
    }

    #[test]
    fn test_sequence() {
        assert_eq!(pairs("..."), vec![pair(TokenKind::Sequence, "...")]);
        assert_eq!(
            pairs(". .."),
            vec![pair(TokenKind::Sequence, "."), pair(TokenKind::Sequence, "..")]
        );
    }

    #[test]
    fn test_end_of_rule_after_symbol() {
        assert_eq!(
            pairs("<term>!!"),
            vec![
                pair(TokenKind::NonTerminalSymbol, "term"),
                pair(TokenKind::EndOfRule, "!!"),
            ]
        );
    }

    #[test]
    fn test_predicates_and_groups() {
        use TokenKind::*;
        let source = "<expr> ::= !(<term> & \"+\" & <expr>) |  [<term> & + & \"test\" & ![a-Z]]!!";
        assert_eq!(
            pairs(source),
            vec![
                pair(NonTerminalSymbol, "expr"),
                pair(ProductionRuleOp, "::="),
                pair(Not, "!"),
                pair(ParenLeft, "("),
                pair(NonTerminalSymbol, "term"),
                pair(And, "&"),
                pair(TerminalSymbol, "+"),
                pair(And, "&"),
                pair(NonTerminalSymbol, "expr"),
                pair(ParenRight, ")"),
                pair(Or, "|"),
                pair(BracketLeft, "["),
                pair(NonTerminalSymbol, "term"),
                pair(And, "&"),
                pair(TerminalSymbol, "+"),
                pair(And, "&"),
                pair(TerminalSymbol, "test"),
                pair(And, "&"),
                pair(Not, "!"),
                pair(BracketLeft, "["),
                pair(TerminalSymbol, "a"),
                pair(TerminalSymbol, "-"),
                pair(TerminalSymbol, "Z"),
                pair(BracketRight, "]"),
                pair(BracketRight, "]"),
                pair(EndOfRule, "!!"),
            ]
        );
    }

    #[test]
    fn test_assign_in_rule() {
        assert_eq!(
            pairs("x = <y>"),
            vec![
                pair(TokenKind::TerminalSymbol, "x"),
                pair(TokenKind::Assign, "="),
                pair(TokenKind::NonTerminalSymbol, "y"),
            ]
        );
    }

    #[test]
    fn test_unterminated_non_terminal_is_lenient() {
        let tokens = lex_all("<expr");
        assert_eq!(tokens[0].kind, TokenKind::NonTerminalSymbol);
        assert_eq!(tokens[0].lexeme, "expr");
        assert!(tokens[1].is_end_of_stream());
    }

    #[test]
    fn test_carriage_return_handling() {
        assert_eq!(pairs("<a>\r\n::=\r\n"), pairs("<a>\n::=\n"));

        let preferences = LexicalPreferences {
            accept_carriage_return: false,
            ..LexicalPreferences::default()
        };
        let mut lexer = Lexer::with_preferences("<a>\r\n".as_bytes(), preferences);
        lexer.next_token().unwrap();
        assert_matches!(
            lexer.next_token(),
            Err(LexerError::UnexpectedCharacter {
                found: Found::Char('\r'),
                ..
            })
        );
    }

    #[test]
    fn test_mark_reset_replays_without_scanning() {
        let mut lexer = Lexer::from_source("<a> | <b>");
        lexer.next_token().unwrap();

        let mark = lexer.mark();
        let first = lexer.next_token().unwrap();
        let position = lexer.position();
        lexer.reset(mark);
        let again = lexer.next_token().unwrap();

        assert_eq!(first, again);
        assert_eq!(lexer.position(), position);
        assert_eq!(lexer.tokens().len(), 2);
        assert_eq!(lexer.metrics().replayed_tokens, 1);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let mut lexer = Lexer::from_source("<a> ::= b");
        let peeked = lexer.peek_token().unwrap();
        let peeked_again = lexer.peek_token().unwrap();
        let next = lexer.next_token().unwrap();

        assert_eq!(peeked, peeked_again);
        assert_eq!(peeked, next);
        assert_eq!(lexer.cursor(), 1);
        assert_eq!(lexer.tokens().len(), 1);
    }

    #[test]
    fn test_end_of_stream_emitted_once() {
        let mut lexer = Lexer::from_source("a");
        assert_eq!(lexer.next_token().unwrap().unwrap().lexeme, "a");
        let end = lexer.next_token().unwrap().unwrap();
        assert!(end.is_end_of_stream());
        assert_eq!((end.line, end.column), (1, 2));

        for _ in 0..3 {
            assert_eq!(lexer.next_token().unwrap(), None);
            assert_eq!(lexer.peek_token().unwrap(), None);
        }
        assert!(lexer.is_finished());
        assert_eq!(lexer.tokens().len(), 2);
    }

    #[test]
    fn test_empty_input() {
        let tokens = lex_all("");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::EndOfStream);
        assert_eq!(tokens[0].lexeme, "");
    }

    #[test]
    fn test_hard_error_poisons_session() {
        let mut lexer = Lexer::from_source("<a> :x");
        let mark = lexer.mark();
        lexer.next_token().unwrap();

        let error = lexer.next_token().unwrap_err();
        assert_matches!(
            &error,
            LexerError::UnexpectedCharacter {
                found: Found::Char('x'),
                ..
            }
        );
        assert_eq!(error.position().column, 6);
        assert_eq!(lexer.next_token().unwrap_err(), error);

        // Buffered tokens survive the failure
        lexer.reset(mark);
        assert_eq!(lexer.next_token().unwrap().unwrap().lexeme, "a");
        assert_eq!(lexer.next_token().unwrap_err(), error);
        assert_eq!(lexer.failure(), Some(&error));
    }

    #[test]
    fn test_incomplete_rule_op_at_end() {
        assert_matches!(
            Lexer::from_source(":").next_token(),
            Err(LexerError::UnexpectedCharacter {
                found: Found::EndOfInput,
                ..
            })
        );
    }

    #[test]
    fn test_decode_error_surfaces() {
        let mut lexer = Lexer::new(&[b'<', b'a', b'>', b' ', 0xFF][..]);
        lexer.next_token().unwrap();
        assert_matches!(lexer.next_token(), Err(LexerError::Decode { .. }));
    }

    #[test]
    fn test_iterator_fuses_after_error() {
        let mut lexer = Lexer::from_source("a (]");
        let results: Vec<_> = lexer.by_ref().collect();

        assert_eq!(results.len(), 3);
        assert_matches!(results[2], Err(LexerError::MismatchedDelimiter { .. }));
        assert!(lexer.next().is_none());
    }

    #[test]
    fn test_metrics_by_class() {
        let preferences = LexicalPreferences {
            track_kind_patterns: true,
            collect_detailed_metrics: true,
            ..LexicalPreferences::default()
        };
        let mut lexer = Lexer::with_preferences(
            "<rule> ::= [\"long terminal\"] {Make(x)} !!".as_bytes(),
            preferences,
        );
        while lexer.next_token().unwrap().is_some() {}

        let metrics = lexer.metrics();
        assert_eq!(metrics.total_tokens, 9);
        assert_eq!(metrics.symbol_tokens, 2);
        assert_eq!(metrics.operator_tokens, 1);
        assert_eq!(metrics.action_tokens, 2);
        assert_eq!(metrics.group_tokens, 2);
        assert_eq!(metrics.marker_tokens, 2);
        assert_eq!(metrics.max_lexeme_length, 13);
        assert_eq!(metrics.max_enclosure_depth, 2);
        assert_eq!(metrics.kind_usage.get(&TokenKind::BracketLeft), Some(&1));
    }

    #[test]
    fn test_session_events_reach_global_logger() {
        use crate::logging::{self, LogLevel, LoggingService, MemoryLogger};
        use std::sync::Arc;

        let memory = Arc::new(MemoryLogger::new());
        let service = LoggingService::new(memory.clone(), LogLevel::Debug);
        // Only this test installs a global logger
        logging::init_global_logging_with_service(Arc::new(service)).unwrap();

        let _ = tokenize_all("[<a> ) (");
        assert!(memory.has_error_with_code(codes::lexical::MISMATCHED_DELIMITER));

        let _ = tokenize_all("( <a>");
        assert!(memory.has_success_with_code(codes::success::TOKENIZATION_COMPLETE));
        assert!(memory
            .get_warnings()
            .iter()
            .any(|e| e.code == codes::lexical::UNCLOSED_ENCLOSURE));
    }

    #[test]
    fn test_long_whitespace_run_is_not_a_lexeme() {
        let source = format!("<a>{}<b>", " ".repeat(MAX_LEXEME_LENGTH + 1));
        let tokens = tokenize_all(&source).unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].lexeme, "b");
        assert_eq!(tokens[1].column as usize, MAX_LEXEME_LENGTH + 5);

        let source = format!("{{F(a{}b)}}", " ".repeat(MAX_LEXEME_LENGTH + 1));
        let kinds: Vec<_> = tokenize_all(&source)
            .unwrap()
            .into_iter()
            .map(|token| (token.kind, token.lexeme))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (TokenKind::Action, "F".to_string()),
                (TokenKind::ActionArg, "a".to_string()),
                (TokenKind::ActionArg, "b".to_string()),
                (TokenKind::EndOfStream, String::new()),
            ]
        );
    }

    #[test]
    fn test_overlong_quoted_lexeme_fails_at_opening_quote() {
        let source = format!("<a> ::= '{}'", "x".repeat(MAX_LEXEME_LENGTH + 1));
        let mut lexer = Lexer::from_source(&source);
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();

        let error = lexer.next_token().unwrap_err();
        assert_matches!(error, LexerError::LexemeTooLong { length, .. } if length == MAX_LEXEME_LENGTH + 1);
        assert_eq!(error.position(), Position::new(8, 1, 9));
        assert_eq!(error.error_code(), codes::lexical::LEXEME_TOO_LONG);
        assert_eq!(lexer.failure(), Some(&error));
    }

    #[test]
    fn test_group_nesting_limit_through_session() {
        let source = "(".repeat(MAX_ENCLOSURE_DEPTH + 1);
        let mut lexer = Lexer::from_source(&source);
        for _ in 0..MAX_ENCLOSURE_DEPTH {
            assert_eq!(lexer.next_token().unwrap().unwrap().kind, TokenKind::ParenLeft);
        }

        let error = lexer.next_token().unwrap_err();
        assert_matches!(error, LexerError::EnclosureTooDeep { depth, .. } if depth == MAX_ENCLOSURE_DEPTH + 1);
        assert_eq!(error.position().column as usize, MAX_ENCLOSURE_DEPTH + 1);
        assert_eq!(lexer.enclosure_depth(), MAX_ENCLOSURE_DEPTH);
        assert_matches!(lexer.next_token(), Err(LexerError::EnclosureTooDeep { .. }));
    }

    #[test]
    fn test_buffer_refusal_maps_to_lexer_error() {
        let at = Position::new(12, 2, 4);

        let error = stream_error(TokenStreamError::TooManyTokens { count: MAX_TOKEN_COUNT + 1 }, at);
        assert_matches!(error, LexerError::TooManyTokens { count, .. } if count == MAX_TOKEN_COUNT + 1);
        assert_eq!(error.position(), at);
        assert_eq!(error.error_code(), codes::lexical::TOO_MANY_TOKENS);
        assert!(!error.is_soft());
    }

    fn tokenize_all(source: &str) -> Result<Vec<Token>, LexerError> {
        Lexer::from_source(source).collect()
    }

    #[test]
    fn test_unclosed_group_is_not_an_error() {
        let tokens = lex_all("( <a>");
        assert_eq!(tokens.len(), 3);
        assert!(tokens[2].is_end_of_stream());
    }
}
