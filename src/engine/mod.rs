//! Resolution engine
//!
//! This module ties the pieces together:
//! - Loading identifiers from a `SourceProvider`
//! - Choosing the pool flavor for the selected strategy
//! - Aggregating outcomes into a `ResultSet`
//! - Handing the records to every `SinkWriter`

mod coordinator;

pub use coordinator::{ResolutionEngine, ResolverBackend};

use std::fmt;
use std::str::FromStr;

/// Resolution strategy selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    /// Two-step HTTP protocol over a shared session
    #[default]
    Http,

    /// Rendered page scrape with one browser per worker
    Browser,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Browser => write!(f, "browser"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "browser" => Ok(Self::Browser),
            other => Err(format!(
                "unknown strategy '{}' (expected 'http' or 'browser')",
                other
            )),
        }
    }
}
