//! Browser resolver implementation
//!
//! Each `BrowserResolver` owns one Chromium process and one page for its
//! whole lifetime. It is bound to a single proxy egress at launch and must
//! be closed exactly once by the worker that owns it.
//!
//! A lookup navigates the page to the transaction URL, then polls the
//! rendered DOM until both address nodes show text. Navigation failures and
//! nodes that never render are transient: an absent node cannot be told
//! apart from a slow render.

use crate::config::{BrowserSettings, Config, ProxyEntry};
use crate::identifier::Identifier;
use crate::resolver::extract::{extract_text, AddressSelectors};
use crate::resolver::{LookupError, Resolution, ResolutionRecord, Resolver, ResolverFactory};
use crate::BridgeError;
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::fetch::{
    AuthChallengeResponse, AuthChallengeResponseResponse, ContinueRequestParams,
    ContinueWithAuthParams, EnableParams, EventAuthRequired, EventRequestPaused,
};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use scraper::Selector;
use std::future::Future;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use url::Url;

const ELEMENT_POLL_INTERVAL: Duration = Duration::from_millis(250);
const HANDLER_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Builds the transaction page URL for `identifier` under `base_url`
pub fn transactions_page_url(base_url: &Url, identifier: &Identifier) -> Result<Url, BridgeError> {
    let mut base = base_url.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    let mut url = base.join("transactions")?;
    url.query_pairs_mut().append_pair("s", identifier.as_str());
    Ok(url)
}

/// Creates a fresh Chromium profile directory for one worker
///
/// Every launch gets its own directory, since Chromium locks the profile it
/// runs with.
fn profile_dir(worker_index: usize) -> Result<TempDir, BridgeError> {
    Ok(tempfile::Builder::new()
        .prefix(&format!("bridge-resolver-w{}-", worker_index))
        .tempdir()?)
}

/// Browser process plus the task pumping its CDP connection
///
/// The profile directory is removed when the session is shut down, or when
/// it is dropped if launch never got that far.
struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    user_data_dir: TempDir,
}

impl BrowserSession {
    async fn shutdown(mut self) -> Result<(), String> {
        let closed = self
            .browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| format!("Error closing browser: {}", e));

        if tokio::time::timeout(HANDLER_SHUTDOWN_GRACE, &mut self.handler_task)
            .await
            .is_err()
        {
            tracing::debug!("Browser handler did not stop in time, aborting it");
            self.handler_task.abort();
        }

        let profile = self.user_data_dir.path().display().to_string();
        if let Err(e) = self.user_data_dir.close() {
            tracing::debug!("Failed to clean up user-data-dir {}: {}", profile, e);
        }

        closed
    }
}

/// Holds a session until it is taken for shutdown
struct SessionSlot<S> {
    inner: Mutex<Option<S>>,
}

impl<S> SessionSlot<S> {
    fn new(session: S) -> Self {
        Self {
            inner: Mutex::new(Some(session)),
        }
    }

    async fn is_open(&self) -> bool {
        self.inner.lock().await.is_some()
    }

    fn is_held(&mut self) -> bool {
        self.inner.get_mut().is_some()
    }

    /// Takes the session out; later calls get `None`
    fn take(&mut self) -> Option<S> {
        self.inner.get_mut().take()
    }
}

/// Resolver that scrapes the rendered transaction page
pub struct BrowserResolver {
    session: SessionSlot<BrowserSession>,
    page: Page,
    base_url: Url,
    selectors: AddressSelectors,
    navigation_timeout: Duration,
    element_timeout: Duration,
    worker_index: usize,
}

impl BrowserResolver {
    /// Launches a browser bound to `proxy` and opens its page
    ///
    /// On any failure after the process started, the process is shut down
    /// before the error is returned.
    pub async fn launch(
        settings: &BrowserSettings,
        base_url: &str,
        proxy: Option<&ProxyEntry>,
        worker_index: usize,
    ) -> Result<Self, BridgeError> {
        let base_url = Url::parse(base_url)?;
        let selectors = AddressSelectors::from_settings(settings)?;

        let user_data_dir = profile_dir(worker_index)?;

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .user_data_dir(user_data_dir.path());

        if !settings.headless {
            builder = builder.with_head();
        }

        if let Some(chrome_bin) = &settings.chrome_bin {
            builder = builder.chrome_executable(chrome_bin);
        }

        if let Some(proxy) = proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy.server));
        }

        let config = builder
            .build()
            .map_err(|e| BridgeError::Browser(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| BridgeError::Browser(format!("Failed to launch browser: {}", e)))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler error (ignoring): {}", e);
                }
            }
        });

        let session = BrowserSession {
            browser,
            handler_task,
            user_data_dir,
        };

        let page = match open_page(&session.browser, proxy).await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_err) = session.shutdown().await {
                    tracing::warn!("Worker {}: {}", worker_index, close_err);
                }
                return Err(e);
            }
        };

        tracing::info!(
            "Worker {}: browser ready (proxy: {})",
            worker_index,
            proxy.map(|p| p.server.as_str()).unwrap_or("none")
        );

        Ok(Self {
            session: SessionSlot::new(session),
            page,
            base_url,
            selectors,
            navigation_timeout: settings.navigation_timeout(),
            element_timeout: settings.element_timeout(),
            worker_index,
        })
    }

    async fn navigate(&self, url: &Url) -> Result<(), LookupError> {
        match tokio::time::timeout(self.navigation_timeout, self.page.goto(url.as_str())).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(LookupError::Navigation(e.to_string())),
            Err(_) => Err(LookupError::Navigation(format!(
                "no load event within {:?}",
                self.navigation_timeout
            ))),
        }
    }

    async fn wait_for_text(&self, name: &str, selector: &Selector) -> Result<String, LookupError> {
        let page = &self.page;
        poll_for_text(name, selector, self.element_timeout, || async move {
            page.content()
                .await
                .map_err(|e| LookupError::Navigation(e.to_string()))
        })
        .await
    }
}

/// Polls `fetch` for page HTML until `selector` yields text
///
/// The page is read once more at the deadline before giving up with
/// `ElementMissing(name)`. A failed read ends the wait immediately.
async fn poll_for_text<F, Fut>(
    name: &str,
    selector: &Selector,
    timeout: Duration,
    mut fetch: F,
) -> Result<String, LookupError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<String, LookupError>>,
{
    let deadline = Instant::now() + timeout;

    loop {
        let html = fetch().await?;

        if let Some(text) = extract_text(&html, selector) {
            return Ok(text);
        }

        if Instant::now() >= deadline {
            return Err(LookupError::ElementMissing(name.to_string()));
        }

        tokio::time::sleep(ELEMENT_POLL_INTERVAL).await;
    }
}

async fn open_page(browser: &Browser, proxy: Option<&ProxyEntry>) -> Result<Page, BridgeError> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| BridgeError::Browser(format!("Failed to create page: {}", e)))?;

    if let Some(proxy) = proxy.filter(|p| p.has_credentials()) {
        answer_proxy_auth(&page, proxy)
            .await
            .map_err(|e| BridgeError::Browser(format!("Failed to install proxy auth: {}", e)))?;
    }

    Ok(page)
}

/// Answers the proxy's basic-auth challenges for every request on `page`
///
/// Chromium ignores credentials in `--proxy-server`, so requests are paused
/// through the Fetch domain and resumed with the configured credentials.
async fn answer_proxy_auth(
    page: &Page,
    proxy: &ProxyEntry,
) -> Result<(), chromiumoxide::error::CdpError> {
    let mut paused = page.event_listener::<EventRequestPaused>().await?;
    let mut challenges = page.event_listener::<EventAuthRequired>().await?;

    page.execute(EnableParams {
        patterns: None,
        handle_auth_requests: Some(true),
    })
    .await?;

    let resumer = page.clone();
    tokio::spawn(async move {
        while let Some(event) = paused.next().await {
            let params = ContinueRequestParams::new(event.request_id.clone());
            if let Err(e) = resumer.execute(params).await {
                tracing::debug!("Failed to resume paused request: {}", e);
            }
        }
    });

    let username = proxy.username.clone();
    let password = proxy.password.clone();
    let responder = page.clone();
    tokio::spawn(async move {
        while let Some(event) = challenges.next().await {
            let response = AuthChallengeResponse {
                response: AuthChallengeResponseResponse::ProvideCredentials,
                username: username.clone(),
                password: password.clone(),
            };
            let params = ContinueWithAuthParams::new(event.request_id.clone(), response);
            if let Err(e) = responder.execute(params).await {
                tracing::debug!("Failed to answer proxy auth challenge: {}", e);
            }
        }
    });

    Ok(())
}

#[async_trait]
impl Resolver for BrowserResolver {
    async fn resolve(&self, identifier: &Identifier) -> Result<Resolution, LookupError> {
        if !self.session.is_open().await {
            return Err(LookupError::SessionClosed);
        }

        let url = transactions_page_url(&self.base_url, identifier)
            .map_err(|e| LookupError::InvalidIdentifier(e.to_string()))?;

        tracing::debug!("Worker {}: navigating to {}", self.worker_index, url);
        self.navigate(&url).await?;

        let sender = self
            .wait_for_text("sender", self.selectors.sender().1)
            .await?;
        let receiver = self
            .wait_for_text("receiver", self.selectors.receiver().1)
            .await?;

        let mut record = ResolutionRecord::for_query(identifier);
        record.sender_address = Some(sender);
        record.receiver_address = Some(receiver);
        Ok(Resolution::Resolved(record))
    }

    async fn close(&mut self) -> Result<(), LookupError> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };

        tracing::debug!("Worker {}: closing browser", self.worker_index);
        session.shutdown().await.map_err(LookupError::Worker)
    }
}

impl Drop for BrowserResolver {
    fn drop(&mut self) {
        if self.session.is_held() {
            tracing::warn!(
                "Worker {}: browser dropped without close; relying on process kill",
                self.worker_index
            );
        }
    }
}

/// Launches one `BrowserResolver` per stateful worker
///
/// Proxies are assigned round-robin by worker index so load is spread
/// across egress IPs.
#[derive(Debug, Clone)]
pub struct BrowserResolverFactory {
    settings: BrowserSettings,
    base_url: String,
    proxies: Vec<ProxyEntry>,
}

impl BrowserResolverFactory {
    pub fn new(config: &Config) -> Self {
        Self {
            settings: config.browser.clone(),
            base_url: config.target.base_url.clone(),
            proxies: config.proxy.clone(),
        }
    }

    /// Proxy assigned to worker `worker_index`, if any are configured
    pub fn proxy_for(&self, worker_index: usize) -> Option<&ProxyEntry> {
        if self.proxies.is_empty() {
            None
        } else {
            self.proxies.get(worker_index % self.proxies.len())
        }
    }
}

#[async_trait]
impl ResolverFactory for BrowserResolverFactory {
    async fn create(&self, worker_index: usize) -> Result<Box<dyn Resolver>, BridgeError> {
        let resolver = BrowserResolver::launch(
            &self.settings,
            &self.base_url,
            self.proxy_for(worker_index),
            worker_index,
        )
        .await?;
        Ok(Box::new(resolver))
    }
}
