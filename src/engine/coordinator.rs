//! Engine coordinator - batch orchestration
//!
//! A run is strictly staged: load identifiers, resolve them all through the
//! selected pool, aggregate, then write every sink once. Individual lookup
//! failures only show up in the counts; the run itself fails only when the
//! source cannot be read, the resolver cannot be built, or a sink fails.

use crate::config::Config;
use crate::engine::Strategy;
use crate::identifier::{dedup_identifiers, Identifier};
use crate::input::SourceProvider;
use crate::output::{ResultAggregator, ResultSet, SinkWriter};
use crate::pool::{log_progress, StatefulPool, StatelessPool};
use crate::resolver::{
    BrowserResolverFactory, HttpResolver, Resolver, ResolverFactory, RetryPolicy,
};
use crate::BridgeError;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// How resolvers are provided to the pool
#[derive(Clone)]
pub enum ResolverBackend {
    /// One resolver shared by every task (stateless pool)
    Shared(Arc<dyn Resolver>),

    /// One resolver per long-lived worker (stateful pool)
    PerWorker(Arc<dyn ResolverFactory>),
}

/// Façade over pools, aggregation and sinks
pub struct ResolutionEngine {
    config: Arc<Config>,
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl ResolutionEngine {
    /// Creates an engine for a validated configuration
    pub fn new(config: Config) -> Self {
        let policy = RetryPolicy::from_config(&config.retry);
        Self {
            config: Arc::new(config),
            policy,
            cancel: CancellationToken::new(),
        }
    }

    /// Overrides the retry policy derived from the configuration
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Token that stops the engine from starting new lookups when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Builds the resolver backend for `strategy`
    ///
    /// # Returns
    ///
    /// * `Ok(ResolverBackend)` - HTTP session or browser factory
    /// * `Err(BridgeError)` - The HTTP client could not be built
    pub fn backend_for(&self, strategy: Strategy) -> Result<ResolverBackend, BridgeError> {
        match strategy {
            Strategy::Http => Ok(ResolverBackend::Shared(Arc::new(HttpResolver::new(
                &self.config,
            )?))),
            Strategy::Browser => Ok(ResolverBackend::PerWorker(Arc::new(
                BrowserResolverFactory::new(&self.config),
            ))),
        }
    }

    /// Resolves `identifiers` through `backend`
    ///
    /// Identifiers are deduplicated case-insensitively before queueing, so
    /// the result holds at most one record per distinct identifier.
    pub async fn resolve(
        &self,
        identifiers: Vec<Identifier>,
        backend: &ResolverBackend,
    ) -> ResultSet {
        let identifiers = dedup_identifiers(identifiers);
        let mut aggregator = ResultAggregator::new(&identifiers);

        if identifiers.is_empty() {
            tracing::info!("No identifiers to resolve");
            return aggregator.finish();
        }

        match backend {
            ResolverBackend::Shared(resolver) => {
                let pool = StatelessPool::new(
                    self.config.http.concurrency as usize,
                    self.policy.clone(),
                )
                .with_cancellation(self.cancel.clone());
                let outcomes = pool
                    .run(identifiers, resolver.clone(), log_progress())
                    .await;
                aggregator.extend(outcomes);
            }
            ResolverBackend::PerWorker(factory) => {
                let pool =
                    StatefulPool::new(self.config.browser.workers as usize, self.policy.clone())
                        .with_cancellation(self.cancel.clone());
                let run = pool.run(identifiers, factory.clone(), log_progress()).await;
                aggregator.extend(run.outcomes);
            }
        }

        let result = aggregator.finish();
        let summary = &result.summary;
        tracing::info!(
            "Resolution finished: {} resolved, {} unresolved, {} failed of {} in {:.1}s",
            summary.resolved,
            summary.unresolved,
            summary.failed,
            summary.submitted,
            summary.elapsed.as_secs_f64()
        );
        result
    }

    /// Runs a full batch: source, resolution, sinks
    ///
    /// # Arguments
    ///
    /// * `source` - Where identifiers come from
    /// * `sinks` - Every sink receives the record set, even when empty
    /// * `backend` - Resolver backend (see `backend_for`)
    ///
    /// # Returns
    ///
    /// * `Ok(ResultSet)` - All sinks written
    /// * `Err(BridgeError)` - The source or a sink failed
    pub async fn run_with(
        &self,
        source: &dyn SourceProvider,
        sinks: &mut [Box<dyn SinkWriter>],
        backend: &ResolverBackend,
    ) -> Result<ResultSet, BridgeError> {
        tracing::info!("Loading identifiers from {}", source.name());
        let identifiers = source.load()?;

        let result = self.resolve(identifiers, backend).await;

        let mut first_error = None;
        for sink in sinks.iter_mut() {
            if let Err(e) = sink.write(&result.records) {
                tracing::error!("Failed to write {}: {}", sink.name(), e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(result),
        }
    }

    /// Runs a full batch with the backend for `strategy`
    pub async fn run(
        &self,
        source: &dyn SourceProvider,
        sinks: &mut [Box<dyn SinkWriter>],
        strategy: Strategy,
    ) -> Result<ResultSet, BridgeError> {
        tracing::info!("Starting resolution run (strategy: {})", strategy);
        let backend = self.backend_for(strategy)?;
        self.run_with(source, sinks, &backend).await
    }
}
