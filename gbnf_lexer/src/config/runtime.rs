// RUNTIME PREFERENCES (User Experience)

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LexicalPreferences {
    /// Whether to collect per-class token metrics
    pub collect_detailed_metrics: bool,

    /// Whether to count usage per token kind
    pub track_kind_patterns: bool,

    /// Whether to show position information in error log events
    pub include_position_in_errors: bool,

    /// Whether every recognised token is logged at debug level
    pub log_token_events: bool,

    /// Whether '\r' is skipped like other whitespace
    pub accept_carriage_return: bool,
}

impl Default for LexicalPreferences {
    fn default() -> Self {
        Self {
            collect_detailed_metrics: env::var(env_vars::LEXICAL_DETAILED_METRICS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            track_kind_patterns: env::var(env_vars::LEXICAL_TRACK_KINDS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            include_position_in_errors: env::var(env_vars::LEXICAL_INCLUDE_POSITIONS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
            log_token_events: env::var(env_vars::LEXICAL_LOG_TOKENS)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            accept_carriage_return: env::var(env_vars::LEXICAL_ACCEPT_CR)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingPreferences {
    /// Whether to use structured JSON logging
    pub use_structured_logging: bool,

    /// Whether to enable console output
    pub enable_console_logging: bool,

    /// Preferred minimum log level
    pub min_log_level: LogLevel,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env::var(env_vars::LOGGING_USE_STRUCTURED)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            enable_console_logging: env::var(env_vars::LOGGING_ENABLE_CONSOLE)
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            min_log_level: env::var(env_vars::LOGGING_MIN_LEVEL)
                .ok()
                .and_then(|v| parse_log_level(&v))
                .unwrap_or(LogLevel::Info),
        }
    }
}

/// Log severity levels, ordered from most to least severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse log level from string (used for environment variables)
pub fn parse_log_level(level: &str) -> Option<LogLevel> {
    match level.to_lowercase().as_str() {
        "error" | "0" => Some(LogLevel::Error),
        "warning" | "warn" | "1" => Some(LogLevel::Warning),
        "info" | "2" => Some(LogLevel::Info),
        "debug" | "3" => Some(LogLevel::Debug),
        _ => None,
    }
}

/// Errors raised while loading a runtime configuration file
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read configuration file '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Invalid configuration: {0}")]
    Parse(String),
}

impl ConfigError {
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            ConfigError::Io { .. } => crate::logging::codes::configuration::CONFIG_READ_ERROR,
            ConfigError::Parse(_) => crate::logging::codes::configuration::CONFIG_PARSE_ERROR,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub lexical: LexicalPreferences,
    pub logging: LoggingPreferences,
}

impl RuntimeConfig {
    /// Parse a TOML document; missing tables and keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let loaded = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            })
            .and_then(|content| Self::from_toml_str(&content));

        let config = match loaded {
            Ok(config) => config,
            Err(error) => {
                crate::log_error!(error.error_code(), &error.to_string(),
                    "path" => path.display()
                );
                return Err(error);
            }
        };

        crate::log_success!(
            crate::logging::codes::success::CONFIGURATION_LOADED,
            "Runtime configuration loaded",
            "path" => path.display()
        );

        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Environment variable names for configuration
pub mod env_vars {
    // Lexical
    pub const LEXICAL_DETAILED_METRICS: &str = "GBNF_LEXICAL_DETAILED_METRICS";
    pub const LEXICAL_TRACK_KINDS: &str = "GBNF_LEXICAL_TRACK_KINDS";
    pub const LEXICAL_INCLUDE_POSITIONS: &str = "GBNF_LEXICAL_INCLUDE_POSITIONS";
    pub const LEXICAL_LOG_TOKENS: &str = "GBNF_LEXICAL_LOG_TOKENS";
    pub const LEXICAL_ACCEPT_CR: &str = "GBNF_LEXICAL_ACCEPT_CR";

    // Logging
    pub const LOGGING_USE_STRUCTURED: &str = "GBNF_LOGGING_USE_STRUCTURED";
    pub const LOGGING_ENABLE_CONSOLE: &str = "GBNF_LOGGING_ENABLE_CONSOLE";
    pub const LOGGING_MIN_LEVEL: &str = "GBNF_LOGGING_MIN_LEVEL";
}
