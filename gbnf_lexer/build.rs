// build.rs - TOML-driven compile-time limit generation
use std::env;
use std::fs;
use std::path::Path;

#[derive(serde::Deserialize)]
struct CompileTimeConfig {
    lexical: LexicalLimits,
    logging: LoggingLimits,
}

#[derive(serde::Deserialize)]
struct LexicalLimits {
    max_lexeme_length: usize,
    max_token_count: usize,
    max_enclosure_depth: usize,
    metrics_buffer_size: usize,
}

#[derive(serde::Deserialize)]
struct LoggingLimits {
    log_buffer_size: usize,
    max_log_message_length: usize,
    security_min_log_level: u8,
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=GBNF_BUILD_PROFILE");
    println!("cargo:rerun-if-env-changed=GBNF_CONFIG_DIR");

    let profile = env::var("GBNF_BUILD_PROFILE").unwrap_or_else(|_| "development".to_string());
    let config_dir = env::var("GBNF_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

    // Workspace root is the parent of the crate directory
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = Path::new(&manifest_dir)
        .parent()
        .expect("Could not find workspace root (parent directory)");

    let config_path = workspace_root
        .join(&config_dir)
        .join(format!("{}.toml", profile));

    println!("cargo:rerun-if-changed={}", config_path.display());

    if !config_path.exists() {
        panic!(
            "Configuration file not found: {}\nWorkspace root: {}\nLooking for: {}/{}/{}.toml",
            config_path.display(),
            workspace_root.display(),
            workspace_root.display(),
            config_dir,
            profile
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", config_path.display(), e));

    let config: CompileTimeConfig = toml::from_str(&config_content)
        .unwrap_or_else(|e| panic!("Invalid TOML in {}: {}", config_path.display(), e));

    validate_security_constraints(&config, &profile);
    generate_constants(&config, &profile);
}

fn validate_security_constraints(config: &CompileTimeConfig, profile: &str) {
    const ABSOLUTE_MAX_LEXEME_LENGTH: usize = 100_000_000;
    const ABSOLUTE_MAX_TOKEN_COUNT: usize = 10_000_000;
    const ABSOLUTE_MAX_ENCLOSURE_DEPTH: usize = 100_000;

    if config.lexical.max_lexeme_length == 0
        || config.lexical.max_lexeme_length > ABSOLUTE_MAX_LEXEME_LENGTH
    {
        panic!("SECURITY: max_lexeme_length out of range");
    }

    if config.lexical.max_token_count == 0
        || config.lexical.max_token_count > ABSOLUTE_MAX_TOKEN_COUNT
    {
        panic!("SECURITY: max_token_count out of range");
    }

    if config.lexical.max_enclosure_depth == 0
        || config.lexical.max_enclosure_depth > ABSOLUTE_MAX_ENCLOSURE_DEPTH
    {
        panic!("SECURITY: max_enclosure_depth out of range");
    }

    if config.logging.security_min_log_level > 2 {
        panic!("SECURITY: security_min_log_level too high (max: 2)");
    }

    if profile == "production" && config.lexical.max_lexeme_length > 1_000_000 {
        panic!("PRODUCTION: max_lexeme_length too high for production");
    }
}

fn generate_constants(config: &CompileTimeConfig, profile: &str) {
    let out_dir = env::var("OUT_DIR").unwrap();
    let output_path = Path::new(&out_dir).join("constants.rs");

    let constants_code = format!(
        r#"
// Generated compile-time constants from TOML configuration
// Profile: {}
// DO NOT EDIT - Generated by build.rs

pub mod compile_time {{
    pub mod lexical {{
        pub const MAX_LEXEME_LENGTH: usize = {};
        pub const MAX_TOKEN_COUNT: usize = {};
        pub const MAX_ENCLOSURE_DEPTH: usize = {};
        pub const METRICS_BUFFER_SIZE: usize = {};
    }}

    pub mod logging {{
        pub const LOG_BUFFER_SIZE: usize = {};
        pub const MAX_LOG_MESSAGE_LENGTH: usize = {};
        pub const SECURITY_MIN_LOG_LEVEL: u8 = {};
    }}
}}
"#,
        profile,
        config.lexical.max_lexeme_length,
        config.lexical.max_token_count,
        config.lexical.max_enclosure_depth,
        config.lexical.metrics_buffer_size,
        config.logging.log_buffer_size,
        config.logging.max_log_message_length,
        config.logging.security_min_log_level,
    );

    fs::write(output_path, constants_code).unwrap();
}
