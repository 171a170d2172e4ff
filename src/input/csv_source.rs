//! CSV column source

use crate::identifier::{collect_identifiers, Identifier};
use crate::input::traits::{report, InputError, InputResult, SourceProvider};
use csv::{ReaderBuilder, Trim};
use std::path::PathBuf;

/// Reads identifiers from one named column of a CSV file with a header row
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    column: String,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>, column: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            column: column.into(),
        }
    }

    /// Finds the column by exact name, then case-insensitively
    fn column_index(&self, headers: &csv::StringRecord) -> InputResult<usize> {
        headers
            .iter()
            .position(|h| h == self.column)
            .or_else(|| {
                headers
                    .iter()
                    .position(|h| h.eq_ignore_ascii_case(&self.column))
            })
            .ok_or_else(|| InputError::MissingColumn {
                column: self.column.clone(),
                available: headers.iter().map(str::to_string).collect(),
            })
    }
}

impl SourceProvider for CsvSource {
    fn name(&self) -> String {
        format!("csv:{}", self.path.display())
    }

    fn load(&self) -> InputResult<Vec<Identifier>> {
        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::All)
            .from_path(&self.path)?;

        let index = self.column_index(reader.headers()?)?;

        let mut values = Vec::new();
        for row in reader.records() {
            let row = row?;
            values.push(row.get(index).unwrap_or_default().to_string());
        }

        Ok(report(&self.name(), collect_identifiers(values)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_reads_named_column() {
        let file = csv_file("chain,tx_hash\neth,0xAAA\nsol, 0xBBB \nbase,0xaaa\narb,\n");
        let ids = CsvSource::new(file.path(), "tx_hash").load().unwrap();

        let values: Vec<&str> = ids.iter().map(Identifier::as_str).collect();
        assert_eq!(values, vec!["0xAAA", "0xBBB"]);
    }

    #[test]
    fn test_column_match_is_case_insensitive_fallback() {
        let file = csv_file("TX_HASH\n0x1\n");
        let ids = CsvSource::new(file.path(), "tx_hash").load().unwrap();
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn test_short_rows_count_as_blank() {
        let file = csv_file("chain,tx_hash\neth\nsol,0x2\n");
        let ids = CsvSource::new(file.path(), "tx_hash").load().unwrap();
        assert_eq!(ids, vec![Identifier::parse("0x2").unwrap()]);
    }

    #[test]
    fn test_malformed_values_rejected() {
        let file = csv_file("tx_hash\n0x1\nnot a hash\n0x2;drop\n");
        let ids = CsvSource::new(file.path(), "tx_hash").load().unwrap();
        assert_eq!(ids, vec![Identifier::parse("0x1").unwrap()]);
    }

    #[test]
    fn test_missing_column() {
        let file = csv_file("hash\n0x1\n");
        let result = CsvSource::new(file.path(), "tx_hash").load();
        assert!(matches!(result, Err(InputError::MissingColumn { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = CsvSource::new("/nonexistent/hashes.csv", "tx_hash").load();
        assert!(result.is_err());
    }
}
