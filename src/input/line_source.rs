//! Plain-text source: one identifier per line

use crate::identifier::{collect_identifiers, Identifier};
use crate::input::traits::{report, InputResult, SourceProvider};
use std::path::PathBuf;

/// Reads identifiers from a text file, skipping `#` comment lines
#[derive(Debug, Clone)]
pub struct LineSource {
    path: PathBuf,
}

impl LineSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SourceProvider for LineSource {
    fn name(&self) -> String {
        format!("lines:{}", self.path.display())
    }

    fn load(&self) -> InputResult<Vec<Identifier>> {
        let content = std::fs::read_to_string(&self.path)?;
        let lines = content
            .lines()
            .filter(|line| !line.trim_start().starts_with('#'));

        Ok(report(&self.name(), collect_identifiers(lines)))
    }
}
