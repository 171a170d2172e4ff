//! One task per identifier over a shared resolver
//!
//! Every identifier is spawned up front; a semaphore caps how many run at
//! once. The resolver (and its HTTP session) is shared by all tasks.

use crate::identifier::Identifier;
use crate::pool::progress::{ProgressCallback, ProgressTracker};
use crate::pool::{fill_missing, log_outcome, panic_message};
use crate::resolver::{JobOutcome, LookupError, Outcome, Resolver, RetryPolicy};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Bounded-concurrency pool for stateless resolvers
#[derive(Debug, Clone)]
pub struct StatelessPool {
    concurrency: usize,
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl StatelessPool {
    /// Creates a pool running at most `concurrency` lookups at once
    pub fn new(concurrency: usize, policy: RetryPolicy) -> Self {
        Self {
            concurrency: concurrency.max(1),
            policy,
            cancel: CancellationToken::new(),
        }
    }

    /// Uses `cancel` to stop scheduling new lookups
    ///
    /// Lookups still waiting for a slot finish as `Cancelled`; in-flight
    /// attempts complete but are not retried.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Resolves every identifier, returning outcomes in completion order
    ///
    /// # Arguments
    ///
    /// * `identifiers` - Deduplicated identifiers to resolve
    /// * `resolver` - Resolver shared by all tasks
    /// * `progress` - Called on progress milestones
    ///
    /// # Returns
    ///
    /// Exactly one `JobOutcome` per identifier
    pub async fn run(
        &self,
        identifiers: Vec<Identifier>,
        resolver: Arc<dyn Resolver>,
        progress: ProgressCallback,
    ) -> Vec<JobOutcome> {
        let total = identifiers.len();
        tracing::info!(
            "Resolving {} identifier(s) with up to {} concurrent lookups",
            total,
            self.concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for identifier in identifiers.iter().cloned() {
            let semaphore = semaphore.clone();
            let resolver = resolver.clone();
            let policy = self.policy.clone();
            let cancel = self.cancel.clone();

            tasks.spawn(async move {
                let permit = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => {
                        return JobOutcome::not_started(identifier, LookupError::Cancelled);
                    }
                    permit = semaphore.acquire_owned() => permit,
                };

                let Ok(_permit) = permit else {
                    return JobOutcome::not_started(
                        identifier,
                        LookupError::Worker("concurrency limiter closed".to_string()),
                    );
                };

                let attempted = AssertUnwindSafe(
                    policy.execute(&cancel, || resolver.resolve(&identifier)),
                )
                .catch_unwind()
                .await;

                match attempted {
                    Ok(attempted) => JobOutcome {
                        identifier,
                        outcome: Outcome::from(attempted.result),
                        attempts: attempted.attempts,
                    },
                    Err(payload) => JobOutcome {
                        identifier,
                        outcome: Outcome::Failed(LookupError::Worker(panic_message(payload))),
                        attempts: 1,
                    },
                }
            });
        }

        let mut tracker = ProgressTracker::new(total, progress);
        let mut outcomes = Vec::with_capacity(total);

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => {
                    log_outcome(&outcome);
                    outcomes.push(outcome);
                    tracker.record();
                }
                Err(e) => tracing::error!("Lookup task failed to join: {}", e),
            }
        }

        fill_missing(&identifiers, &mut outcomes);
        outcomes
    }
}
