use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// Environment overrides (`MAX_WORKERS`, `HTTP_TIMEOUT`, `BROWSER_WORKERS`)
/// are applied from the process environment before validation.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use bridge_resolver::config::load_config;
///
/// let config = load_config(Path::new("resolver.toml")).unwrap();
/// println!("Attempts: {}", config.retry.max_attempts);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content, |name| std::env::var(name).ok())
}

/// Parses configuration text, applying overrides from `env`
///
/// `env` looks up an environment variable by name; tests pass a closure over
/// a fixed map instead of touching the process environment.
pub fn parse_config<F>(content: &str, env: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config: Config = toml::from_str(content)?;
    apply_env_overrides(&mut config, env)?;
    validate(&config)?;
    Ok(config)
}

/// Applies the supported environment overrides to a parsed configuration
///
/// | Variable | Field | Format |
/// |----------|-------|--------|
/// | `MAX_WORKERS` | `http.concurrency` | integer |
/// | `HTTP_TIMEOUT` | `http.timeout-ms` | seconds, may be fractional |
/// | `BROWSER_WORKERS` | `browser.workers` | integer |
pub fn apply_env_overrides<F>(config: &mut Config, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = env("MAX_WORKERS") {
        config.http.concurrency = parse_override("MAX_WORKERS", &value)?;
    }

    if let Some(value) = env("HTTP_TIMEOUT") {
        let seconds: f64 = parse_override("HTTP_TIMEOUT", &value)?;
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(ConfigError::Environment {
                name: "HTTP_TIMEOUT".to_string(),
                message: format!("must be a positive number of seconds, got {}", value),
            });
        }
        config.http.timeout_ms = (seconds * 1000.0).round() as u64;
    }

    if let Some(value) = env("BROWSER_WORKERS") {
        config.browser.workers = parse_override("BROWSER_WORKERS", &value)?;
    }

    Ok(())
}

fn parse_override<T>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::Environment {
            name: name.to_string(),
            message: format!("{} ({:?})", e, value),
        })
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a run's output can be matched to the exact
/// configuration that produced it.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
