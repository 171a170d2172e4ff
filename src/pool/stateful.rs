//! Long-lived workers, each owning one resolver
//!
//! Used for resolvers that are expensive to create (a browser process per
//! worker). The pool starts exactly `workers` workers; each one:
//! 1. Builds its resolver through the factory
//! 2. Pops jobs from the shared `JobQueue` until it sees a termination marker
//! 3. Closes its resolver, whatever happened while processing
//!
//! A worker whose resolver cannot be created is logged and retired, which
//! lowers the effective concurrency without failing the batch.

use crate::identifier::Identifier;
use crate::pool::progress::{ProgressCallback, ProgressTracker};
use crate::pool::queue::{JobQueue, QueueItem};
use crate::pool::{fill_missing, log_outcome, panic_message};
use crate::resolver::{JobOutcome, LookupError, Outcome, Resolver, ResolverFactory, RetryPolicy};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

/// What one worker did during a run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub index: usize,

    /// Whether the worker's resolver was created
    pub started: bool,

    /// Jobs this worker popped, in the order it processed them
    pub processed: Vec<Identifier>,

    /// Whether the worker exited on its own termination marker
    pub consumed_marker: bool,
}

impl WorkerReport {
    fn new(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }
}

/// Result of a stateful run
#[derive(Debug)]
pub struct StatefulRun {
    /// One outcome per identifier, in completion order
    pub outcomes: Vec<JobOutcome>,

    /// One report per worker, ordered by worker index
    pub workers: Vec<WorkerReport>,

    /// Queue items acknowledged (jobs plus termination markers)
    pub acknowledged: usize,
}

/// Outcomes plus progress, the only state shared between workers
struct Collected {
    outcomes: Vec<JobOutcome>,
    tracker: ProgressTracker,
}

type SharedResults = Arc<Mutex<Collected>>;

fn record(results: &SharedResults, outcome: JobOutcome) {
    log_outcome(&outcome);
    let mut collected = lock(results);
    collected.outcomes.push(outcome);
    collected.tracker.record();
}

fn lock(results: &SharedResults) -> MutexGuard<'_, Collected> {
    results.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Pool of long-lived workers fed by a job queue
#[derive(Debug, Clone)]
pub struct StatefulPool {
    workers: usize,
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl StatefulPool {
    /// Creates a pool of `workers` workers (at least one)
    pub fn new(workers: usize, policy: RetryPolicy) -> Self {
        Self {
            workers: workers.max(1),
            policy,
            cancel: CancellationToken::new(),
        }
    }

    /// Uses `cancel` to stop processing queued jobs
    ///
    /// Jobs popped after cancellation finish as `Cancelled` without touching
    /// the resolver; workers still exit through their markers.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Resolves every identifier across the worker pool
    ///
    /// # Arguments
    ///
    /// * `identifiers` - Deduplicated identifiers to resolve
    /// * `factory` - Builds one resolver per worker
    /// * `progress` - Called on progress milestones
    ///
    /// # Returns
    ///
    /// A `StatefulRun` with exactly one outcome per identifier
    pub async fn run(
        &self,
        identifiers: Vec<Identifier>,
        factory: Arc<dyn ResolverFactory>,
        progress: ProgressCallback,
    ) -> StatefulRun {
        let total = identifiers.len();
        tracing::info!(
            "Resolving {} identifier(s) with {} long-lived worker(s)",
            total,
            self.workers
        );

        let queue = Arc::new(JobQueue::new(identifiers.clone(), self.workers));
        let results: SharedResults = Arc::new(Mutex::new(Collected {
            outcomes: Vec::with_capacity(total),
            tracker: ProgressTracker::new(total, progress),
        }));

        let handles: Vec<_> = (0..self.workers)
            .map(|index| {
                tokio::spawn(run_worker(
                    index,
                    queue.clone(),
                    factory.clone(),
                    self.policy.clone(),
                    self.cancel.clone(),
                    results.clone(),
                ))
            })
            .collect();

        let mut reports = Vec::with_capacity(self.workers);
        let mut lost = 0;
        for (index, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(report) => reports.push(report),
                Err(e) => {
                    tracing::error!("Worker {} died: {}", index, e);
                    lost += 1;
                    reports.push(WorkerReport::new(index));
                }
            }
        }

        // Every live worker has exited; remaining markers belong to dead ones
        for _ in 0..lost {
            for identifier in queue.retire_worker() {
                record(&results, orphaned(identifier));
            }
        }

        queue.join().await;

        let started = reports.iter().filter(|r| r.started).count();
        if started < self.workers {
            tracing::warn!(
                "Only {} of {} worker(s) started; ran with reduced concurrency",
                started,
                self.workers
            );
        }

        let mut outcomes = std::mem::take(&mut lock(&results).outcomes);
        fill_missing(&identifiers, &mut outcomes);

        StatefulRun {
            outcomes,
            workers: reports,
            acknowledged: queue.acknowledged(),
        }
    }
}

fn orphaned(identifier: Identifier) -> JobOutcome {
    JobOutcome::not_started(
        identifier,
        LookupError::Worker("no worker available".to_string()),
    )
}

async fn run_worker(
    index: usize,
    queue: Arc<JobQueue>,
    factory: Arc<dyn ResolverFactory>,
    policy: RetryPolicy,
    cancel: CancellationToken,
    results: SharedResults,
) -> WorkerReport {
    let mut report = WorkerReport::new(index);

    let created = AssertUnwindSafe(factory.create(index)).catch_unwind().await;
    let mut resolver = match created {
        Ok(Ok(resolver)) => resolver,
        Ok(Err(e)) => {
            tracing::warn!("Worker {} failed to start: {}", index, e);
            retire(&queue, &results);
            return report;
        }
        Err(payload) => {
            tracing::warn!("Worker {} failed to start: {}", index, panic_message(payload));
            retire(&queue, &results);
            return report;
        }
    };

    report.started = true;
    tracing::debug!("Worker {} started", index);

    process_jobs(
        resolver.as_ref(),
        &queue,
        &policy,
        &cancel,
        &results,
        &mut report,
    )
    .await;

    match AssertUnwindSafe(resolver.close()).catch_unwind().await {
        Ok(Ok(())) => tracing::debug!("Worker {} closed its resolver", index),
        Ok(Err(e)) => tracing::warn!("Worker {} failed to close its resolver: {}", index, e),
        Err(payload) => tracing::warn!(
            "Worker {} failed to close its resolver: {}",
            index,
            panic_message(payload)
        ),
    }

    if report.consumed_marker {
        queue.worker_finished();
    } else {
        retire(&queue, &results);
    }

    tracing::debug!(
        "Worker {} exited after {} job(s)",
        index,
        report.processed.len()
    );
    report
}

/// Pops and resolves jobs until a marker is reached or the resolver panics
async fn process_jobs(
    resolver: &dyn Resolver,
    queue: &JobQueue,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    results: &SharedResults,
    report: &mut WorkerReport,
) {
    while let Some(claim) = queue.pop() {
        let identifier = match claim.item() {
            QueueItem::Terminate => {
                report.consumed_marker = true;
                return;
            }
            QueueItem::Job(identifier) => identifier.clone(),
        };

        let attempted = AssertUnwindSafe(policy.execute(cancel, || resolver.resolve(&identifier)))
            .catch_unwind()
            .await;

        report.processed.push(identifier.clone());

        let (outcome, panicked) = match attempted {
            Ok(attempted) => (
                JobOutcome {
                    identifier,
                    outcome: Outcome::from(attempted.result),
                    attempts: attempted.attempts,
                },
                false,
            ),
            Err(payload) => {
                let message = panic_message(payload);
                tracing::error!("Worker {} stopping: {}", report.index, message);
                (
                    JobOutcome {
                        identifier,
                        outcome: Outcome::Failed(LookupError::Worker(message)),
                        attempts: 1,
                    },
                    true,
                )
            }
        };

        // Record before acknowledging so a finished join sees every outcome
        record(results, outcome);
        drop(claim);

        if panicked {
            return;
        }
    }
}

fn retire(queue: &JobQueue, results: &SharedResults) {
    for identifier in queue.retire_worker() {
        record(results, orphaned(identifier));
    }
}
