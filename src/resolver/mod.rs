//! Resolver module for turning one identifier into a bridge pair record
//!
//! This module contains:
//! - The `Resolver` capability and its two implementations (HTTP and browser)
//! - The lookup error taxonomy (transient vs permanent)
//! - The retry policy shared by both implementations
//! - DOM extraction helpers used by the browser strategy

mod browser;
mod extract;
mod http;
mod record;
mod retry;

pub use browser::{BrowserResolver, BrowserResolverFactory};
pub use extract::{extract_text, AddressSelectors};
pub use http::{build_http_client, extract_job_token, parse_status_body, HttpResolver};
pub use record::{ResolutionRecord, RECORD_COLUMNS};
pub use retry::{Attempted, RetryPolicy};

use crate::identifier::Identifier;
use crate::BridgeError;
use async_trait::async_trait;
use thiserror::Error;

/// Errors produced by a single lookup attempt
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("{stage} returned HTTP {status}")]
    Status { stage: &'static str, status: u16 },

    #[error("request to {stage} timed out")]
    Timeout { stage: &'static str },

    #[error("request to {stage} failed: {message}")]
    Network { stage: &'static str, message: String },

    #[error("malformed response from {stage}: {message}")]
    MalformedBody { stage: &'static str, message: String },

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("element '{0}' did not render in time")]
    ElementMissing(String),

    #[error("browser session closed")]
    SessionClosed,

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("lookup cancelled")]
    Cancelled,

    #[error("worker failed: {0}")]
    Worker(String),
}

impl LookupError {
    /// Whether another attempt might succeed
    ///
    /// Network, timeout, non-200, malformed-body and rendering failures are
    /// transient. Input errors, cancellation and lost sessions are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Status { .. }
                | Self::Timeout { .. }
                | Self::Network { .. }
                | Self::MalformedBody { .. }
                | Self::Navigation(_)
                | Self::ElementMissing(_)
        )
    }
}

/// Non-error result of one lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The target produced a full record
    Resolved(ResolutionRecord),

    /// The target answered but has no mapping for the identifier
    Unresolved,
}

/// Final outcome of one identifier after retries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Resolved(ResolutionRecord),
    Unresolved,
    Failed(LookupError),
}

impl Outcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl From<Result<Resolution, LookupError>> for Outcome {
    fn from(result: Result<Resolution, LookupError>) -> Self {
        match result {
            Ok(Resolution::Resolved(record)) => Self::Resolved(record),
            Ok(Resolution::Unresolved) => Self::Unresolved,
            Err(e) => Self::Failed(e),
        }
    }
}

/// Outcome of one job, carrying the identifier it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub identifier: Identifier,
    pub outcome: Outcome,

    /// Number of resolve calls made (0 when the job never started)
    pub attempts: u32,
}

impl JobOutcome {
    pub fn not_started(identifier: Identifier, error: LookupError) -> Self {
        Self {
            identifier,
            outcome: Outcome::Failed(error),
            attempts: 0,
        }
    }
}

/// Capability of resolving one identifier through a specific protocol
///
/// Implementations hold whatever session they need (an HTTP client or a
/// browser page). `resolve` is called once per attempt; retries are the
/// caller's concern.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Performs a single lookup attempt
    async fn resolve(&self, identifier: &Identifier) -> Result<Resolution, LookupError>;

    /// Releases the resolver's session
    ///
    /// Called exactly once by the owning worker. The default does nothing.
    async fn close(&mut self) -> Result<(), LookupError> {
        Ok(())
    }
}

/// Builds one resolver per stateful worker
#[async_trait]
pub trait ResolverFactory: Send + Sync {
    /// Creates the resolver owned by worker `worker_index`
    async fn create(&self, worker_index: usize) -> Result<Box<dyn Resolver>, BridgeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(LookupError::Status {
            stage: "/transactions",
            status: 503
        }
        .is_transient());
        assert!(LookupError::Timeout { stage: "/api/status" }.is_transient());
        assert!(LookupError::ElementMissing("#sender".to_string()).is_transient());

        assert!(!LookupError::InvalidIdentifier("x y".to_string()).is_transient());
        assert!(!LookupError::Cancelled.is_transient());
        assert!(!LookupError::SessionClosed.is_transient());
    }

    #[test]
    fn test_outcome_from_result() {
        let record = ResolutionRecord::for_query(&Identifier::parse("0xABC").unwrap());

        assert_eq!(
            Outcome::from(Ok(Resolution::Resolved(record.clone()))),
            Outcome::Resolved(record)
        );
        assert_eq!(Outcome::from(Ok(Resolution::Unresolved)), Outcome::Unresolved);
        assert!(Outcome::from(Err(LookupError::Cancelled)).is_failed());
    }
}
