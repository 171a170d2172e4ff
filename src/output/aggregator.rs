//! Folds job outcomes into the final record set and summary counts

use crate::identifier::Identifier;
use crate::resolver::{JobOutcome, LookupError, Outcome, ResolutionRecord};
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Counts describing one resolution run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolutionSummary {
    /// Identifiers handed to the pool
    pub submitted: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub failed: usize,

    /// Resolved records dropped as exact duplicates
    pub duplicates: usize,

    pub elapsed: Duration,
}

impl ResolutionSummary {
    /// Percentage of submitted identifiers that resolved
    pub fn success_rate(&self) -> f64 {
        if self.submitted == 0 {
            return 0.0;
        }
        (self.resolved as f64 / self.submitted as f64) * 100.0
    }
}

/// A lookup that ended in `Failed`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedLookup {
    pub identifier: Identifier,
    pub error: LookupError,
    pub attempts: u32,
}

/// Final output of a run
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// Unique resolved records, in input order
    pub records: Vec<ResolutionRecord>,
    pub failures: Vec<FailedLookup>,
    pub summary: ResolutionSummary,
}

impl ResultSet {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Accumulates outcomes as they arrive from a pool
#[derive(Debug)]
pub struct ResultAggregator {
    positions: HashMap<String, usize>,
    seen: HashSet<ResolutionRecord>,
    records: Vec<ResolutionRecord>,
    failures: Vec<FailedLookup>,
    summary: ResolutionSummary,
    started: Instant,
}

impl ResultAggregator {
    /// Starts aggregating for `identifiers`; elapsed time is measured from here
    pub fn new(identifiers: &[Identifier]) -> Self {
        let positions = identifiers
            .iter()
            .enumerate()
            .map(|(position, id)| (id.normalized(), position))
            .collect();

        Self {
            positions,
            seen: HashSet::new(),
            records: Vec::new(),
            failures: Vec::new(),
            summary: ResolutionSummary {
                submitted: identifiers.len(),
                ..ResolutionSummary::default()
            },
            started: Instant::now(),
        }
    }

    pub fn add(&mut self, job: JobOutcome) {
        match job.outcome {
            Outcome::Resolved(record) => {
                self.summary.resolved += 1;
                if self.seen.insert(record.clone()) {
                    self.records.push(record);
                } else {
                    self.summary.duplicates += 1;
                }
            }
            Outcome::Unresolved => self.summary.unresolved += 1,
            Outcome::Failed(error) => {
                self.summary.failed += 1;
                self.failures.push(FailedLookup {
                    identifier: job.identifier,
                    error,
                    attempts: job.attempts,
                });
            }
        }
    }

    /// Sorts records back into input order and stops the clock
    pub fn finish(mut self) -> ResultSet {
        let positions = &self.positions;
        let position = |id: &str| positions.get(id).copied().unwrap_or(usize::MAX);

        self.records.sort_by_key(|record| position(&record.query_id));
        self.failures
            .sort_by_key(|failure| position(&failure.identifier.normalized()));
        self.summary.elapsed = self.started.elapsed();

        ResultSet {
            records: self.records,
            failures: self.failures,
            summary: self.summary,
        }
    }
}

impl Extend<JobOutcome> for ResultAggregator {
    fn extend<I: IntoIterator<Item = JobOutcome>>(&mut self, iter: I) {
        for job in iter {
            self.add(job);
        }
    }
}
