use crate::config::types::{
    BrowserSettings, Config, HttpConfig, InputConfig, OutputConfig, ProxyEntry, RetryConfig,
    TargetConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_target_config(&config.target)?;
    validate_http_config(&config.http)?;
    validate_retry_config(&config.retry)?;
    validate_browser_settings(&config.browser)?;
    validate_proxies(&config.proxy)?;
    validate_input_config(&config.input)?;
    validate_output_config(&config.output)?;
    Ok(())
}

fn validate_target_config(config: &TargetConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "base-url '{}' has no host",
            config.base_url
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    for name in config.cookies.keys() {
        if name.is_empty() || name.contains(['=', ';', ' ']) {
            return Err(ConfigError::Validation(format!(
                "Invalid cookie name '{}'",
                name
            )));
        }
    }

    Ok(())
}

fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 512 {
        return Err(ConfigError::Validation(format!(
            "http concurrency must be between 1 and 512, got {}",
            config.concurrency
        )));
    }

    if config.timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "http timeout-ms must be >= 100ms, got {}ms",
            config.timeout_ms
        )));
    }

    Ok(())
}

fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(
            "retry max-attempts must be >= 1".to_string(),
        ));
    }

    if config.initial_backoff_ms > config.max_backoff_ms {
        return Err(ConfigError::Validation(format!(
            "retry initial-backoff-ms ({}) cannot exceed max-backoff-ms ({})",
            config.initial_backoff_ms, config.max_backoff_ms
        )));
    }

    Ok(())
}

fn validate_browser_settings(config: &BrowserSettings) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 64 {
        return Err(ConfigError::Validation(format!(
            "browser workers must be between 1 and 64, got {}",
            config.workers
        )));
    }

    if config.navigation_timeout_ms == 0 || config.element_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "browser timeouts must be non-zero".to_string(),
        ));
    }

    for (name, selector) in [
        ("sender-selector", &config.sender_selector),
        ("receiver-selector", &config.receiver_selector),
    ] {
        if scraper::Selector::parse(selector).is_err() {
            return Err(ConfigError::Validation(format!(
                "browser {} is not a valid CSS selector: '{}'",
                name, selector
            )));
        }
    }

    Ok(())
}

fn validate_proxies(proxies: &[ProxyEntry]) -> Result<(), ConfigError> {
    for proxy in proxies {
        let url = Url::parse(&proxy.server).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid proxy server '{}': {}", proxy.server, e))
        })?;

        if !matches!(url.scheme(), "http" | "https" | "socks5") {
            return Err(ConfigError::InvalidUrl(format!(
                "Proxy server '{}' must use http, https or socks5",
                proxy.server
            )));
        }

        if !url.username().is_empty() || url.password().is_some() {
            return Err(ConfigError::Validation(format!(
                "Proxy server '{}' must not embed credentials; use username/password",
                url.host_str().unwrap_or_default()
            )));
        }

        if proxy.password.is_some() && proxy.username.is_none() {
            return Err(ConfigError::Validation(format!(
                "Proxy '{}' has a password but no username",
                proxy.server
            )));
        }
    }

    Ok(())
}

fn validate_input_config(config: &InputConfig) -> Result<(), ConfigError> {
    if config.path.is_empty() {
        return Err(ConfigError::Validation(
            "input path cannot be empty".to_string(),
        ));
    }

    if config.column.trim().is_empty() {
        return Err(ConfigError::Validation(
            "input column cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.csv_path.is_empty() {
        return Err(ConfigError::Validation(
            "csv-path cannot be empty".to_string(),
        ));
    }

    if matches!(&config.database_path, Some(path) if path.is_empty()) {
        return Err(ConfigError::Validation(
            "database-path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}
