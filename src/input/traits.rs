//! Source trait and input errors

use crate::identifier::{CollectedIdentifiers, Identifier};
use thiserror::Error;

/// Errors that can occur while loading identifiers
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("column '{column}' not found (available: {})", available.join(", "))]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },
}

/// Result type for input operations
pub type InputResult<T> = Result<T, InputError>;

/// Provider of identifiers to resolve
///
/// Implementations return identifiers that are trimmed, non-empty, well
/// formed and deduplicated case-insensitively, in first-seen order.
pub trait SourceProvider: Send + Sync {
    /// Human-readable source name for logs
    fn name(&self) -> String;

    fn load(&self) -> InputResult<Vec<Identifier>>;
}

/// Logs what was dropped while collecting and returns the identifiers
pub(crate) fn report(source: &str, collected: CollectedIdentifiers) -> Vec<Identifier> {
    if !collected.rejected.is_empty() {
        tracing::warn!(
            "{}: rejected {} malformed identifier(s)",
            source,
            collected.rejected.len()
        );
        for (value, reason) in collected.rejected.iter().take(5) {
            tracing::warn!("  {:?}: {}", value, reason);
        }
    }

    tracing::info!(
        "{}: loaded {} identifier(s) ({} duplicate, {} blank skipped)",
        source,
        collected.identifiers.len(),
        collected.duplicates,
        collected.blank
    );

    collected.identifiers
}

/// Identifiers held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    values: Vec<String>,
}

impl StaticSource {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl SourceProvider for StaticSource {
    fn name(&self) -> String {
        "static".to_string()
    }

    fn load(&self) -> InputResult<Vec<Identifier>> {
        let collected = crate::identifier::collect_identifiers(&self.values);
        Ok(report(&self.name(), collected))
    }
}
