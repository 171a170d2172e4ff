//! HTTP resolver implementation
//!
//! Resolves an identifier with two requests over one shared session:
//!
//! 1. `GET /transactions?s=<identifier>` - the HTML body embeds the job token
//!    as `id=<token>;`
//! 2. `GET /api/status?id=<token>` - JSON with a `payment` object
//!
//! # Outcome Classification
//!
//! | Condition | Result |
//! |-----------|--------|
//! | Non-200 on either step | Transient error |
//! | Timeout / connection error | Transient error |
//! | Step 1 body without a token | Unresolved |
//! | Step 2 body not JSON | Transient error |
//! | Step 2 JSON without a `payment` object | Unresolved |

use crate::config::{Config, HttpConfig, ProxyEntry, TargetConfig};
use crate::identifier::Identifier;
use crate::resolver::{LookupError, Resolution, ResolutionRecord, Resolver};
use crate::BridgeError;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::cookie::Jar;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use url::Url;

const SUBMIT_STAGE: &str = "/transactions";
const STATUS_STAGE: &str = "/api/status";

static JOB_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"id=([A-Za-z0-9_-]+);").expect("job token pattern is valid"));

#[derive(Debug, Deserialize)]
struct Payment {
    sender_tx_hash: Option<String>,
    receiver_tx_hash: Option<String>,
    sender: Option<Party>,
    receiver: Option<Party>,
    #[serde(rename = "type")]
    kind: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Party {
    address: Option<String>,
    network: Option<String>,
}

impl Payment {
    fn into_record(self, identifier: &Identifier, job_token: &str) -> ResolutionRecord {
        let sender = self.sender.unwrap_or_default();
        let receiver = self.receiver.unwrap_or_default();

        ResolutionRecord {
            query_id: identifier.normalized(),
            sender_tx_hash: self.sender_tx_hash,
            receiver_tx_hash: self.receiver_tx_hash,
            sender_address: sender.address,
            receiver_address: receiver.address,
            sender_chain: sender.network,
            receiver_chain: receiver.network,
            bridge_type: self.kind,
            status: self.status,
            job_token: Some(job_token.to_string()),
        }
    }
}

/// Builds the HTTP client shared by every lookup of a batch
///
/// The client carries the configured user agent and cookies for its whole
/// lifetime and is never mutated afterwards, so it can be shared across
/// tasks freely.
///
/// # Arguments
///
/// * `target` - Lookup service settings (base URL, user agent, cookies)
/// * `http` - Timeout and pool sizing
/// * `proxy` - Optional proxy egress for every request
pub fn build_http_client(
    target: &TargetConfig,
    http: &HttpConfig,
    proxy: Option<&ProxyEntry>,
) -> Result<Client, BridgeError> {
    let base_url = Url::parse(&target.base_url)?;

    let jar = Jar::default();
    for (name, value) in &target.cookies {
        let cookie = match &target.cookie_domain {
            Some(domain) => format!("{}={}; Domain={}; Path=/", name, value, domain),
            None => format!("{}={}; Path=/", name, value),
        };
        jar.add_cookie_str(&cookie, &base_url);
    }

    let mut builder = Client::builder()
        .user_agent(target.user_agent.as_str())
        .cookie_provider(Arc::new(jar))
        .timeout(http.timeout())
        .connect_timeout(http.timeout())
        .pool_max_idle_per_host(http.concurrency as usize)
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = proxy {
        let mut egress = reqwest::Proxy::all(proxy.server.as_str())?;
        if let Some(username) = &proxy.username {
            egress = egress.basic_auth(username, proxy.password.as_deref().unwrap_or_default());
        }
        builder = builder.proxy(egress);
    }

    Ok(builder.build()?)
}

/// Finds the job token embedded in a `/transactions` body
///
/// # Example
///
/// ```
/// use bridge_resolver::resolver::extract_job_token;
///
/// let body = r#"<script>document.cookie="id=Ab3_x-9;path=/"</script>"#;
/// assert_eq!(extract_job_token(body), Some("Ab3_x-9".to_string()));
/// assert_eq!(extract_job_token("<html>no job here</html>"), None);
/// ```
pub fn extract_job_token(body: &str) -> Option<String> {
    JOB_TOKEN
        .captures(body)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}

/// Interprets an `/api/status` body
///
/// A body that is not JSON is a transient failure (the service sometimes
/// serves a challenge page instead). JSON without a usable `payment` object
/// is a legitimate "no mapping" answer.
pub fn parse_status_body(
    body: &str,
    identifier: &Identifier,
    job_token: &str,
) -> Result<Resolution, LookupError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| LookupError::MalformedBody {
            stage: STATUS_STAGE,
            message: e.to_string(),
        })?;

    let Some(payment) = value.get("payment").filter(|p| p.is_object()) else {
        return Ok(Resolution::Unresolved);
    };

    match serde_json::from_value::<Payment>(payment.clone()) {
        Ok(payment) => Ok(Resolution::Resolved(
            payment.into_record(identifier, job_token),
        )),
        Err(e) => {
            tracing::debug!("Unusable payment payload for {}: {}", identifier, e);
            Ok(Resolution::Unresolved)
        }
    }
}

/// Resolver speaking the two-step HTTP protocol
#[derive(Debug, Clone)]
pub struct HttpResolver {
    client: Client,
    submit_endpoint: Url,
    status_endpoint: Url,
}

impl HttpResolver {
    /// Creates a resolver with a client built from the configuration
    ///
    /// Uses the first configured proxy, if any.
    pub fn new(config: &Config) -> Result<Self, BridgeError> {
        let client = build_http_client(&config.target, &config.http, config.proxy.first())?;
        Self::with_client(client, &config.target.base_url)
    }

    /// Creates a resolver around an existing client
    pub fn with_client(client: Client, base_url: &str) -> Result<Self, BridgeError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            client,
            submit_endpoint: base_url.join("transactions")?,
            status_endpoint: base_url.join("api/status")?,
        })
    }

    /// URL of the query submission page for `identifier`
    pub fn transactions_url(&self, identifier: &Identifier) -> Url {
        let mut url = self.submit_endpoint.clone();
        url.query_pairs_mut().append_pair("s", identifier.as_str());
        url
    }

    /// URL of the status endpoint for `job_token`
    pub fn status_url(&self, job_token: &str) -> Url {
        let mut url = self.status_endpoint.clone();
        url.query_pairs_mut().append_pair("id", job_token);
        url
    }

    async fn get_text(&self, url: Url, stage: &'static str) -> Result<String, LookupError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(e, stage))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(LookupError::Status {
                stage,
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| classify_error(e, stage))
    }
}

fn classify_error(error: reqwest::Error, stage: &'static str) -> LookupError {
    if error.is_timeout() {
        LookupError::Timeout { stage }
    } else {
        LookupError::Network {
            stage,
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl Resolver for HttpResolver {
    async fn resolve(&self, identifier: &Identifier) -> Result<Resolution, LookupError> {
        let body = self
            .get_text(self.transactions_url(identifier), SUBMIT_STAGE)
            .await?;

        let Some(job_token) = extract_job_token(&body) else {
            tracing::debug!("No job token for {}", identifier);
            return Ok(Resolution::Unresolved);
        };

        tracing::trace!("Job token for {}: {}", identifier, job_token);

        let body = self
            .get_text(self.status_url(&job_token), STATUS_STAGE)
            .await?;

        parse_status_body(&body, identifier, &job_token)
    }
}
