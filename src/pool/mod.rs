//! Worker pools driving resolvers over a batch of identifiers
//!
//! Two flavors share the same contract: one `JobOutcome` per input
//! identifier, failures isolated per job, progress reported through a
//! callback.
//! - `StatelessPool` spawns one task per identifier against a shared
//!   resolver, bounded by a semaphore (HTTP strategy)
//! - `StatefulPool` runs a fixed number of long-lived workers, each owning
//!   its own resolver and pulling from a `JobQueue` (browser strategy)

mod progress;
mod queue;
mod stateful;
mod stateless;

pub use progress::{log_progress, Progress, ProgressCallback, ProgressTracker};
pub use queue::{Claim, JobQueue, QueueItem};
pub use stateful::{StatefulPool, StatefulRun, WorkerReport};
pub use stateless::StatelessPool;

use crate::identifier::Identifier;
use crate::resolver::{JobOutcome, LookupError, Outcome};
use std::any::Any;
use std::collections::HashSet;

fn log_outcome(job: &JobOutcome) {
    match &job.outcome {
        Outcome::Resolved(_) => {
            tracing::debug!("Resolved {} after {} attempt(s)", job.identifier, job.attempts)
        }
        Outcome::Unresolved => tracing::debug!("No bridge pair for {}", job.identifier),
        Outcome::Failed(LookupError::Cancelled) => {
            tracing::debug!("Lookup for {} cancelled", job.identifier)
        }
        Outcome::Failed(e) => tracing::warn!(
            "Lookup for {} failed after {} attempt(s): {}",
            job.identifier,
            job.attempts,
            e
        ),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("resolver panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("resolver panicked: {}", message)
    } else {
        "resolver panicked".to_string()
    }
}

/// Adds a failed outcome for every identifier that has none
fn fill_missing(identifiers: &[Identifier], outcomes: &mut Vec<JobOutcome>) {
    let reported: HashSet<&Identifier> = outcomes.iter().map(|o| &o.identifier).collect();
    let missing: Vec<Identifier> = identifiers
        .iter()
        .filter(|id| !reported.contains(id))
        .cloned()
        .collect();

    for identifier in missing {
        tracing::error!("No outcome recorded for {}, marking it failed", identifier);
        outcomes.push(JobOutcome::not_started(
            identifier,
            LookupError::Worker("lookup task lost".to_string()),
        ));
    }
}
