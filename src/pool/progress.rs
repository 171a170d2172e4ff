//! Batch progress reporting

use std::fmt;
use std::time::{Duration, Instant};

/// Snapshot handed to progress callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub elapsed: Duration,
}

impl Progress {
    /// Completions per second so far
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.completed as f64 / secs
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} completed, {:.1}s elapsed, {:.2} lookups/sec",
            self.completed,
            self.total,
            self.elapsed.as_secs_f64(),
            self.rate()
        )
    }
}

/// Callback invoked on progress milestones
pub type ProgressCallback = Box<dyn FnMut(Progress) + Send>;

/// Logs progress through `tracing`
pub fn log_progress() -> ProgressCallback {
    Box::new(|progress: Progress| {
        tracing::info!("Progress: {}", progress);
    })
}

/// Counts completions and fires the callback every `max(5, total / 20)`
/// completions and once more on the final one
pub struct ProgressTracker {
    total: usize,
    interval: usize,
    completed: usize,
    started: Instant,
    callback: ProgressCallback,
}

impl ProgressTracker {
    pub fn new(total: usize, callback: ProgressCallback) -> Self {
        Self {
            total,
            interval: (total / 20).max(5),
            completed: 0,
            started: Instant::now(),
            callback,
        }
    }

    pub fn interval(&self) -> usize {
        self.interval
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Records one completion, reporting if it hits a milestone
    pub fn record(&mut self) {
        self.completed += 1;

        if self.completed % self.interval == 0 || self.completed == self.total {
            (self.callback)(Progress {
                completed: self.completed,
                total: self.total,
                elapsed: self.started.elapsed(),
            });
        }
    }
}
