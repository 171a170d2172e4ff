//! Shared helpers for integration tests

use bridge_resolver::config::{parse_config, Config};
use bridge_resolver::resolver::RetryPolicy;
use bridge_resolver::ResolutionEngine;
use std::time::Duration;

pub const PAYLOAD: &str = r#"{
    "payment": {
        "sender_tx_hash": "0xsend",
        "receiver_tx_hash": "0xrecv",
        "sender": {"address": "0xA1", "network": "ethereum"},
        "receiver": {"address": "0xB2", "network": "base"},
        "type": "cctp",
        "status": "succeeded"
    }
}"#;

/// Builds a validated config pointing at `base_url`
pub fn test_config(base_url: &str, csv_path: &str) -> Config {
    let toml = format!(
        r#"
[target]
base-url = "{}"
user-agent = "IntegrationTest/1.0"

[target.cookies]
cf_clearance = "test-clearance"

[http]
timeout-ms = 2000
concurrency = 4

[input]
path = "unused.csv"

[output]
csv-path = "{}"
"#,
        base_url, csv_path
    );

    parse_config(&toml, |_| None).expect("test config is valid")
}

/// Engine with short backoffs so retry scenarios stay fast
pub fn test_engine(config: Config) -> ResolutionEngine {
    ResolutionEngine::new(config).with_retry_policy(RetryPolicy::new(
        5,
        Duration::from_millis(10),
        Duration::from_millis(50),
    ))
}
