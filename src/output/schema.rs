//! Database schema for the bridge pair table

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per resolved bridge pair from the latest run
CREATE TABLE IF NOT EXISTS bridge_pairs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    query_tx_hash TEXT NOT NULL,
    sender_tx_hash TEXT,
    receiver_tx_hash TEXT,
    sender_address TEXT,
    receiver_address TEXT,
    sender_chain TEXT,
    receiver_chain TEXT,
    bridge_type TEXT,
    status TEXT,
    job_id TEXT,
    resolved_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_bridge_pairs_query ON bridge_pairs(query_tx_hash);
CREATE INDEX IF NOT EXISTS idx_bridge_pairs_sender ON bridge_pairs(sender_tx_hash);
CREATE INDEX IF NOT EXISTS idx_bridge_pairs_receiver ON bridge_pairs(receiver_tx_hash);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)
}
