use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Default user agent presented to the lookup service
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";

/// Structural locator of the sender address node on the transaction page
pub const DEFAULT_SENDER_SELECTOR: &str = concat!(
    r"body > div > div.mx-4.md\:mx-20.flex.flex-col.items-center.justify-center.gap-4",
    r" > div.flex.flex-col.gap-5xl.w-full.mt-14 > div.whitespace-nowrap",
    r" > div.flex.flex-col.gap-11.pt-3xl > div.flex.flex-col.gap-5xl.w-full",
    r" > div.flex.flex-col.gap-9 > div:nth-child(1) > div.flex.flex-col.gap-1.w-full",
    r" > div.flex.flex-col.sm\:flex-row.gap-md.sm\:items-center.w-full",
    r" > div.flex.w-full.sm\:w-\[calc\(100\%-250px\)\].items-center",
    r" > div > div > div:nth-child(2)"
);

/// Structural locator of the receiver address node on the transaction page
pub const DEFAULT_RECEIVER_SELECTOR: &str = concat!(
    r"body > div > div.mx-4.md\:mx-20.flex.flex-col.items-center.justify-center.gap-4",
    r" > div.flex.flex-col.gap-5xl.w-full.mt-14 > div.whitespace-nowrap",
    r" > div.flex.flex-col.gap-11.pt-3xl > div.flex.flex-col.gap-5xl.w-full",
    r" > div.flex.flex-col.gap-9 > div:nth-child(2) > div.flex.flex-col.gap-1.w-full",
    r" > div.flex.flex-col.sm\:flex-row.gap-md.sm\:items-center.w-full",
    r" > div.flex.w-full.sm\:w-\[calc\(100\%-250px\)\].items-center",
    r" > div > div > div:nth-child(2)"
);

/// Main configuration structure for Bridge-Resolver
///
/// Built once at startup and shared read-only with every resolver and pool.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub target: TargetConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub browser: BrowserSettings,
    #[serde(default)]
    pub proxy: Vec<ProxyEntry>,
    pub input: InputConfig,
    pub output: OutputConfig,
}

/// Lookup service being queried
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TargetConfig {
    /// Base URL of the lookup service, e.g. `https://usdc.range.org`
    pub base_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Cookie domain; defaults to the host of `base_url`
    #[serde(default)]
    pub cookie_domain: Option<String>,

    /// Cookies preloaded into the shared session (name -> value)
    #[serde(default)]
    pub cookies: BTreeMap<String, String>,
}

/// HTTP strategy settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct HttpConfig {
    /// Per-request timeout (milliseconds)
    pub timeout_ms: u64,

    /// Maximum lookups in flight at once
    pub concurrency: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 6_000,
            concurrency: 32,
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Retry and backoff settings shared by both strategies
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 500,
            max_backoff_ms: 5_000,
        }
    }
}

/// Browser strategy settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BrowserSettings {
    /// Number of long-lived browser workers
    pub workers: u32,

    /// Bound on navigation plus network quiescence (milliseconds)
    pub navigation_timeout_ms: u64,

    /// Wait for each address node to render (milliseconds)
    pub element_timeout_ms: u64,

    pub headless: bool,

    /// Custom Chrome/Chromium binary
    pub chrome_bin: Option<String>,

    pub sender_selector: String,
    pub receiver_selector: String,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            workers: 4,
            navigation_timeout_ms: 30_000,
            element_timeout_ms: 10_000,
            headless: true,
            chrome_bin: None,
            sender_selector: DEFAULT_SENDER_SELECTOR.to_string(),
            receiver_selector: DEFAULT_RECEIVER_SELECTOR.to_string(),
        }
    }
}

impl BrowserSettings {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_timeout_ms)
    }
}

/// Proxy egress used by a resolver
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProxyEntry {
    /// Proxy URL without credentials, e.g. `http://proxy.example.net:2336`
    pub server: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl ProxyEntry {
    /// Whether the proxy expects basic credentials
    pub fn has_credentials(&self) -> bool {
        self.username.is_some()
    }
}

/// Identifier source settings
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InputConfig {
    /// CSV file (or plain text file with one identifier per line)
    pub path: String,

    /// CSV column holding the identifiers
    #[serde(default = "default_column")]
    pub column: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Path to the CSV result file
    pub csv_path: String,

    /// Optional SQLite database receiving the same records
    #[serde(default)]
    pub database_path: Option<String>,
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_column() -> String {
    "tx_hash".to_string()
}
