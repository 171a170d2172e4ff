//! CSV sink
//!
//! The header row is always written, so an empty run still produces a file
//! with the full column set.

use crate::output::traits::{OutputResult, SinkWriter};
use crate::resolver::{ResolutionRecord, RECORD_COLUMNS};
use csv::WriterBuilder;
use std::path::{Path, PathBuf};

/// Writes records to a CSV file, replacing it on every run
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SinkWriter for CsvSink {
    fn name(&self) -> String {
        format!("csv:{}", self.path.display())
    }

    fn write(&mut self, records: &[ResolutionRecord]) -> OutputResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .from_path(&self.path)?;

        writer.write_record(RECORD_COLUMNS)?;
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;

        tracing::info!(
            "Wrote {} record(s) to {}",
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

    const HEADER: &str = "query_tx_hash,sender_tx_hash,receiver_tx_hash,sender_address,receiver_address,sender_chain,receiver_chain,bridge_type,status,job_id";

    #[test]
    fn test_empty_run_writes_header_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pairs.csv");

        CsvSink::new(&path).write(&[]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, format!("{}\n", HEADER));
    }

    #[test]
    fn test_rows_follow_header_with_blank_optionals() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/nested/pairs.csv");

        let mut record = ResolutionRecord::for_query(&Identifier::parse("0xABC").unwrap());
        record.sender_address = Some("0xS".to_string());
        record.receiver_address = Some("0xR".to_string());

        CsvSink::new(&path).write(&[record]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, vec![HEADER, "0xabc,,,0xS,0xR,,,,,"]);
    }

    #[test]
    fn test_rewrite_replaces_previous_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pairs.csv");
        let record = ResolutionRecord::for_query(&Identifier::parse("0x1").unwrap());

        let mut sink = CsvSink::new(&path);
        sink.write(&[record.clone(), record]).unwrap();
        sink.write(&[]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_output_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pairs.csv");

        let mut record = ResolutionRecord::for_query(&Identifier::parse("0xfeed").unwrap());
        record.status = Some("succeeded, finalized".to_string());
        record.job_token = Some("job-9".to_string());

        CsvSink::new(&path).write(&[record.clone()]).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let read: Vec<ResolutionRecord> = reader.deserialize().map(|r| r.unwrap()).collect();
        assert_eq!(read, vec![record]);
    }
}
