//! Output module for collecting and persisting resolution results
//!
//! This module handles:
//! - Aggregating job outcomes into a deduplicated record set
//! - Writing records to CSV and SQLite sinks
//! - Printing the run summary

mod aggregator;
mod csv_sink;
mod schema;
mod sqlite_sink;
pub mod stats;
mod traits;

pub use aggregator::{FailedLookup, ResolutionSummary, ResultAggregator, ResultSet};
pub use csv_sink::CsvSink;
pub use sqlite_sink::SqliteSink;
pub use stats::print_summary;
pub use traits::{MemorySink, OutputError, OutputResult, SinkWriter};

use crate::config::OutputConfig;
use std::path::Path;

/// Builds the sinks named in the output configuration
///
/// The CSV sink is always present; the SQLite sink is added when a
/// database path is configured.
pub fn build_sinks(config: &OutputConfig) -> OutputResult<Vec<Box<dyn SinkWriter>>> {
    let mut sinks: Vec<Box<dyn SinkWriter>> = vec![Box::new(CsvSink::new(&config.csv_path))];

    if let Some(database_path) = &config.database_path {
        sinks.push(Box::new(SqliteSink::open(Path::new(database_path))?));
    }

    Ok(sinks)
}
