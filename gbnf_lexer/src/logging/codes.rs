//! Consolidated error codes and classification system
//!
//! Every code the crate logs, with its registry metadata.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for both error and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for a code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub requires_halt: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl ErrorMetadata {
    pub fn new(
        code: &'static str,
        category: &'static str,
        severity: Severity,
        recoverable: bool,
        requires_halt: bool,
        description: &'static str,
        recommended_action: &'static str,
    ) -> Self {
        Self {
            code,
            category,
            severity,
            recoverable,
            requires_halt,
            description,
            recommended_action,
        }
    }
}

// ============================================================================
// CODE CONSTANTS
// ============================================================================

/// System error codes
pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
}

/// Configuration error codes
pub mod configuration {
    use super::Code;

    pub const CONFIG_READ_ERROR: Code = Code::new("E005");
    pub const CONFIG_PARSE_ERROR: Code = Code::new("E006");
}

/// Lexical analysis codes
pub mod lexical {
    use super::Code;

    pub const UNEXPECTED_CHARACTER: Code = Code::new("E020");
    pub const UNCLOSED_ENCLOSURE: Code = Code::new("E021");
    pub const MISMATCHED_DELIMITER: Code = Code::new("E022");
    pub const CONDITION_FAILED: Code = Code::new("E023");
    pub const DECODE_ERROR: Code = Code::new("E024");

    // Compile-time limit violations
    pub const LEXEME_TOO_LONG: Code = Code::new("E025");
    pub const TOO_MANY_TOKENS: Code = Code::new("E026");
    pub const ENCLOSURE_TOO_DEEP: Code = Code::new("E027");
}

/// Success codes
pub mod success {
    use super::Code;

    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I004");
    pub const CONFIGURATION_LOADED: Code = Code::new("I010");
    pub const TOKENIZATION_COMPLETE: Code = Code::new("I020");
}

// ============================================================================
// ERROR METADATA REGISTRY
// ============================================================================

static ERROR_REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();

fn get_error_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| {
        let entries = [
            // System
            ErrorMetadata::new(
                "ERR001",
                "System",
                Severity::Critical,
                false,
                true,
                "Critical internal system error",
                "File a bug report with the input that triggered it",
            ),
            ErrorMetadata::new(
                "ERR002",
                "System",
                Severity::Critical,
                false,
                true,
                "System initialization failure",
                "Check logging configuration and initialise it only once",
            ),
            // Configuration
            ErrorMetadata::new(
                "E005",
                "Configuration",
                Severity::Medium,
                true,
                false,
                "Runtime configuration file could not be read",
                "Check the configuration path and file permissions",
            ),
            ErrorMetadata::new(
                "E006",
                "Configuration",
                Severity::Medium,
                true,
                false,
                "Runtime configuration file is not valid TOML",
                "Fix the reported key or remove it to use the default",
            ),
            // Lexical
            ErrorMetadata::new(
                "E020",
                "Lexical",
                Severity::High,
                false,
                true,
                "Character not allowed at this point of the grammar",
                "Check operators such as '::=' and the shape of action blocks",
            ),
            ErrorMetadata::new(
                "E021",
                "Lexical",
                Severity::Low,
                true,
                false,
                "Input ended while a quoted, angle-bracket, group or action construct was open",
                "Close every opened construct before the end of the grammar",
            ),
            ErrorMetadata::new(
                "E022",
                "Lexical",
                Severity::High,
                false,
                true,
                "Closing delimiter does not match the innermost open group",
                "Balance '(' with ')' and '[' with ']'",
            ),
            ErrorMetadata::new(
                "E023",
                "Lexical",
                Severity::Low,
                true,
                false,
                "Soft expectation check failed",
                "None; the lexer falls back to another interpretation",
            ),
            ErrorMetadata::new(
                "E024",
                "Lexical",
                Severity::High,
                false,
                true,
                "Input is not valid UTF-8 or could not be read",
                "Re-encode the grammar as UTF-8 and check the input source",
            ),
            ErrorMetadata::new(
                "E025",
                "Lexical",
                Severity::High,
                false,
                true,
                "Lexeme exceeds the compile-time length limit",
                "Split the symbol or raise max_lexeme_length in the build profile",
            ),
            ErrorMetadata::new(
                "E026",
                "Lexical",
                Severity::High,
                false,
                true,
                "Token count exceeds the compile-time limit",
                "Split the grammar or raise max_token_count in the build profile",
            ),
            ErrorMetadata::new(
                "E027",
                "Lexical",
                Severity::High,
                false,
                true,
                "Enclosure nesting exceeds the compile-time depth limit",
                "Flatten nested groups or raise max_enclosure_depth",
            ),
            // Success
            ErrorMetadata::new(
                "I004",
                "System",
                Severity::Low,
                true,
                false,
                "System initialization completed",
                "No action required",
            ),
            ErrorMetadata::new(
                "I010",
                "Configuration",
                Severity::Low,
                true,
                false,
                "Runtime configuration loaded",
                "No action required",
            ),
            ErrorMetadata::new(
                "I020",
                "Lexical",
                Severity::Low,
                true,
                false,
                "Tokenization completed successfully",
                "Token stream ready for parsing",
            ),
        ];

        entries
            .into_iter()
            .map(|metadata| (metadata.code, metadata))
            .collect()
    })
}

// ============================================================================
// CLASSIFICATION FUNCTIONS
// ============================================================================

pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code)
}

pub fn get_description(code: &str) -> &'static str {
    get_error_metadata(code)
        .map(|metadata| metadata.description)
        .unwrap_or("Unknown error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_lexical_code_is_registered() {
        let codes = [
            lexical::UNEXPECTED_CHARACTER,
            lexical::UNCLOSED_ENCLOSURE,
            lexical::MISMATCHED_DELIMITER,
            lexical::CONDITION_FAILED,
            lexical::DECODE_ERROR,
            lexical::LEXEME_TOO_LONG,
            lexical::TOO_MANY_TOKENS,
            lexical::ENCLOSURE_TOO_DEEP,
        ];

        for code in codes {
            let metadata = get_error_metadata(code.as_str());
            assert!(metadata.is_some(), "missing metadata for {}", code);
            assert_eq!(metadata.map(|m| m.category), Some("Lexical"));
        }
    }

    #[test]
    fn test_classification() {
        let flags = |code: Code| get_error_metadata(code.as_str()).map(|m| (m.severity, m.recoverable, m.requires_halt));

        assert_eq!(flags(system::INTERNAL_ERROR), Some((Severity::Critical, false, true)));
        assert_eq!(flags(lexical::UNEXPECTED_CHARACTER).map(|h| h.2), Some(true));
        assert_eq!(flags(lexical::CONDITION_FAILED).map(|h| h.1), Some(true));
        assert_eq!(flags(lexical::DECODE_ERROR).map(|h| h.1), Some(false));
    }

    #[test]
    fn test_unknown_code_defaults() {
        assert_eq!(get_description("X999"), "Unknown error");
        assert!(get_error_metadata("X999").is_none());
    }
}
