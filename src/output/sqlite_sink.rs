//! SQLite sink
//!
//! Each run replaces the contents of `bridge_pairs` with its record set,
//! inside one transaction, so the table always reflects the latest run.

use crate::output::schema::initialize_schema;
use crate::output::traits::{OutputResult, SinkWriter};
use crate::resolver::ResolutionRecord;
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

/// Writes records into a local SQLite database
pub struct SqliteSink {
    conn: Connection,
    path: PathBuf,
}

impl SqliteSink {
    /// Opens (or creates) the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteSink)` - Successfully opened/created database
    /// * `Err(OutputError)` - Failed to open database
    pub fn open(path: &Path) -> OutputResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;
        initialize_schema(&conn)?;

        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> OutputResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn,
            path: PathBuf::from(":memory:"),
        })
    }

    /// Number of rows currently stored
    pub fn count(&self) -> OutputResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM bridge_pairs", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Reads all stored records ordered by insertion
    pub fn load_records(&self) -> OutputResult<Vec<ResolutionRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT query_tx_hash, sender_tx_hash, receiver_tx_hash, sender_address,
                    receiver_address, sender_chain, receiver_chain, bridge_type, status, job_id
             FROM bridge_pairs ORDER BY id",
        )?;

        let records = stmt
            .query_map([], |row| {
                Ok(ResolutionRecord {
                    query_id: row.get(0)?,
                    sender_tx_hash: row.get(1)?,
                    receiver_tx_hash: row.get(2)?,
                    sender_address: row.get(3)?,
                    receiver_address: row.get(4)?,
                    sender_chain: row.get(5)?,
                    receiver_chain: row.get(6)?,
                    bridge_type: row.get(7)?,
                    status: row.get(8)?,
                    job_token: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }
}

impl SinkWriter for SqliteSink {
    fn name(&self) -> String {
        format!("sqlite:{}", self.path.display())
    }

    fn write(&mut self, records: &[ResolutionRecord]) -> OutputResult<()> {
        let resolved_at = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        tx.execute("DELETE FROM bridge_pairs", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO bridge_pairs (
                    query_tx_hash, sender_tx_hash, receiver_tx_hash, sender_address,
                    receiver_address, sender_chain, receiver_chain, bridge_type, status,
                    job_id, resolved_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;

            for record in records {
                stmt.execute(params![
                    record.query_id,
                    record.sender_tx_hash,
                    record.receiver_tx_hash,
                    record.sender_address,
                    record.receiver_address,
                    record.sender_chain,
                    record.receiver_chain,
                    record.bridge_type,
                    record.status,
                    record.job_token,
                    resolved_at,
                ])?;
            }
        }
        tx.commit()?;

        tracing::info!(
            "Stored {} bridge pair(s) in {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::Identifier;
    use tempfile::TempDir;

    fn record(id: &str, receiver: &str) -> ResolutionRecord {
        let mut record = ResolutionRecord::for_query(&Identifier::parse(id).unwrap());
        record.receiver_tx_hash = Some(receiver.to_string());
        record.job_token = Some("job-1".to_string());
        record
    }

    #[test]
    fn test_write_and_load() {
        let mut sink = SqliteSink::new_in_memory().unwrap();
        let records = vec![record("0xA", "0x1"), record("0xB", "0x2")];

        sink.write(&records).unwrap();

        assert_eq!(sink.count().unwrap(), 2);
        assert_eq!(sink.load_records().unwrap(), records);
    }

    #[test]
    fn test_each_run_replaces_table() {
        let mut sink = SqliteSink::new_in_memory().unwrap();
        sink.write(&[record("0xA", "0x1"), record("0xB", "0x2")])
            .unwrap();
        sink.write(&[record("0xC", "0x3")]).unwrap();

        let stored = sink.load_records().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].query_id, "0xc");
    }

    #[test]
    fn test_empty_write_clears_table() {
        let mut sink = SqliteSink::new_in_memory().unwrap();
        sink.write(&[record("0xA", "0x1")]).unwrap();
        sink.write(&[]).unwrap();
        assert_eq!(sink.count().unwrap(), 0);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/db/pairs.db");

        let mut sink = SqliteSink::open(&path).unwrap();
        sink.write(&[record("0xA", "0x1")]).unwrap();
        drop(sink);

        let reopened = SqliteSink::open(&path).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
    }
}
