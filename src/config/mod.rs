//! Configuration module for Bridge-Resolver
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, plus the environment overrides applied once at load time.
//!
//! # Example
//!
//! ```no_run
//! use bridge_resolver::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("resolver.toml")).unwrap();
//! println!("HTTP concurrency: {}", config.http.concurrency);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserSettings, Config, HttpConfig, InputConfig, OutputConfig, ProxyEntry, RetryConfig,
    TargetConfig, DEFAULT_RECEIVER_SELECTOR, DEFAULT_SENDER_SELECTOR, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_with_hash, parse_config,
};
pub use validation::validate;
