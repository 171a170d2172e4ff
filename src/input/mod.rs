//! Input module for loading identifiers to resolve
//!
//! This module contains:
//! - The `SourceProvider` trait
//! - `CsvSource` for a named column of a CSV export
//! - `LineSource` for one identifier per line
//! - `StaticSource` for in-memory lists

mod csv_source;
mod line_source;
mod traits;

pub use csv_source::CsvSource;
pub use line_source::LineSource;
pub use traits::{InputError, InputResult, SourceProvider, StaticSource};

use crate::config::InputConfig;
use std::path::Path;

/// Picks a source for the configured input path
///
/// Files ending in `.csv` are read as CSV using the configured column;
/// anything else is read one identifier per line.
pub fn source_for(config: &InputConfig) -> Box<dyn SourceProvider> {
    let path = Path::new(&config.path);
    let is_csv = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    if is_csv {
        Box::new(CsvSource::new(path, config.column.clone()))
    } else {
        Box::new(LineSource::new(path))
    }
}
