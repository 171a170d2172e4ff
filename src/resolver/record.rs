use crate::identifier::Identifier;
use serde::{Deserialize, Serialize};

/// Column order of every tabular result (CSV header, SQLite columns)
pub const RECORD_COLUMNS: [&str; 10] = [
    "query_tx_hash",
    "sender_tx_hash",
    "receiver_tx_hash",
    "sender_address",
    "receiver_address",
    "sender_chain",
    "receiver_chain",
    "bridge_type",
    "status",
    "job_id",
];

/// Resolved bridge pair for one queried identifier
///
/// The HTTP strategy fills every field it finds in the status payload; the
/// browser strategy only fills the address pair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolutionRecord {
    /// Lower-cased queried identifier
    #[serde(rename = "query_tx_hash")]
    pub query_id: String,

    pub sender_tx_hash: Option<String>,
    pub receiver_tx_hash: Option<String>,
    pub sender_address: Option<String>,
    pub receiver_address: Option<String>,
    pub sender_chain: Option<String>,
    pub receiver_chain: Option<String>,
    pub bridge_type: Option<String>,
    pub status: Option<String>,

    /// Job token issued by the lookup target for this query
    #[serde(rename = "job_id")]
    pub job_token: Option<String>,
}

impl ResolutionRecord {
    /// Creates an empty record keyed by the normalized identifier
    pub fn for_query(identifier: &Identifier) -> Self {
        Self {
            query_id: identifier.normalized(),
            ..Self::default()
        }
    }

    /// Field values in `RECORD_COLUMNS` order; absent values are `None`
    pub fn values(&self) -> [Option<&str>; 10] {
        [
            Some(self.query_id.as_str()),
            self.sender_tx_hash.as_deref(),
            self.receiver_tx_hash.as_deref(),
            self.sender_address.as_deref(),
            self.receiver_address.as_deref(),
            self.sender_chain.as_deref(),
            self.receiver_chain.as_deref(),
            self.bridge_type.as_deref(),
            self.status.as_deref(),
            self.job_token.as_deref(),
        ]
    }
}
