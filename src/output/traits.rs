//! Sink trait and output errors
//!
//! A sink receives the final, deduplicated record set once per run.

use crate::resolver::ResolutionRecord;
use thiserror::Error;

/// Errors that can occur while writing results
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Destination for resolved records
///
/// `write` is called exactly once per run, including when there are no
/// records, so every sink produces a well-formed (possibly empty) artifact.
pub trait SinkWriter: Send {
    /// Human-readable sink name for logs
    fn name(&self) -> String;

    /// Writes the full record set
    ///
    /// # Arguments
    ///
    /// * `records` - Deduplicated records in input order
    fn write(&mut self, records: &[ResolutionRecord]) -> OutputResult<()>;
}

/// In-memory sink, useful for library callers and tests
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub records: Vec<ResolutionRecord>,
    pub writes: usize,
}

impl SinkWriter for MemorySink {
    fn name(&self) -> String {
        "memory".to_string()
    }

    fn write(&mut self, records: &[ResolutionRecord]) -> OutputResult<()> {
        self.records = records.to_vec();
        self.writes += 1;
        Ok(())
    }
}
