//! Bridge-Resolver: batch lookup of cross-chain bridge transfer pairs
//!
//! This crate resolves transaction hashes into bridge pair records (sender and
//! receiver transaction, address and chain) by querying a lookup service,
//! either through a two-step HTTP protocol or by rendering the lookup page in
//! a headless browser. Lookups run under bounded concurrency with exponential
//! backoff, and a failed lookup never aborts the rest of the batch.

pub mod config;
pub mod engine;
pub mod identifier;
pub mod input;
pub mod output;
pub mod pool;
pub mod resolver;

use thiserror::Error;

/// Main error type for Bridge-Resolver operations
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Invalid identifier: {0}")]
    Identifier(#[from] IdentifierError),

    #[error("Input error: {0}")]
    Input(#[from] input::InputError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid environment override {name}: {message}")]
    Environment { name: String, message: String },
}

/// Identifier-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("identifier is empty")]
    Empty,

    #[error("identifier '{identifier}' contains invalid character {character:?}")]
    InvalidCharacter { identifier: String, character: char },

    #[error("identifier is {0} characters long (max {max})", max = identifier::MAX_IDENTIFIER_LEN)]
    TooLong(usize),
}

/// Result type alias for Bridge-Resolver operations
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use engine::{ResolutionEngine, ResolverBackend, Strategy};
pub use identifier::Identifier;
pub use output::{ResolutionSummary, ResultSet};
pub use resolver::{LookupError, Outcome, ResolutionRecord, Resolver};
