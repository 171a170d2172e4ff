use crate::identifier::Identifier;
use crate::IdentifierError;
use std::collections::HashSet;

/// Result of turning raw input values into a queue-ready identifier list
#[derive(Debug, Clone, Default)]
pub struct CollectedIdentifiers {
    /// Valid, deduplicated identifiers in first-seen order
    pub identifiers: Vec<Identifier>,

    /// Values that failed the format check, with the reason
    pub rejected: Vec<(String, IdentifierError)>,

    /// Blank values skipped
    pub blank: usize,

    /// Valid values dropped as case-insensitive duplicates
    pub duplicates: usize,
}

/// Deduplicates identifiers case-insensitively, keeping the first spelling
///
/// # Examples
///
/// ```
/// use bridge_resolver::identifier::{dedup_identifiers, Identifier};
///
/// let ids = vec![
///     Identifier::parse("0xabc").unwrap(),
///     Identifier::parse("0XABC").unwrap(),
/// ];
/// let unique = dedup_identifiers(ids);
/// assert_eq!(unique.len(), 1);
/// assert_eq!(unique[0].as_str(), "0xabc");
/// ```
pub fn dedup_identifiers<I>(identifiers: I) -> Vec<Identifier>
where
    I: IntoIterator<Item = Identifier>,
{
    let mut seen = HashSet::new();
    identifiers
        .into_iter()
        .filter(|id| seen.insert(id.normalized()))
        .collect()
}

/// Validates and deduplicates raw input values
///
/// Blank values are skipped silently (exported hash columns routinely
/// contain empty cells); malformed values are rejected before they can
/// reach the job queue and never count against a retry budget.
pub fn collect_identifiers<I, S>(values: I) -> CollectedIdentifiers
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut collected = CollectedIdentifiers::default();
    let mut seen = HashSet::new();

    for value in values {
        let raw = value.as_ref();
        match Identifier::parse(raw) {
            Ok(id) => {
                if seen.insert(id.normalized()) {
                    collected.identifiers.push(id);
                } else {
                    collected.duplicates += 1;
                }
            }
            Err(IdentifierError::Empty) => collected.blank += 1,
            Err(e) => {
                tracing::debug!("Rejecting identifier {:?}: {}", raw, e);
                collected.rejected.push((raw.trim().to_string(), e));
            }
        }
    }

    collected
}
