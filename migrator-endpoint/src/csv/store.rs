use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::errors::TabularStoreError;
use crate::interfaces::TabularStore;
use crate::types::TableData;

/// Tabular store backed by UTF-8 CSV files with a header row.
///
/// Writes go through a sibling temp file renamed into place, so a process
/// dying mid-write never leaves a half-written data file behind.
#[derive(Debug, Default, Clone)]
pub struct CsvTabularStore;

impl CsvTabularStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TabularStore for CsvTabularStore {
    async fn read_table(&self, path: &Path) -> Result<TableData, TabularStoreError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)?;
        let headers = reader.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }
        Ok(TableData { headers, rows })
    }

    async fn write_table(&self, path: &Path, table: &TableData) -> Result<(), TabularStoreError> {
        let temp_path = path.with_extension("csv.tmp");
        {
            let mut writer = csv::WriterBuilder::new()
                .flexible(true)
                .from_path(&temp_path)?;
            writer.write_record(&table.headers)?;
            for row in &table.rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        std::fs::rename(&temp_path, path)?;
        debug!(path = %path.display(), rows = table.rows.len(), "Wrote tabular file");
        Ok(())
    }

    async fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    async fn copy_table(
        &self,
        source: &Path,
        destination: &Path,
    ) -> Result<(), TabularStoreError> {
        std::fs::copy(source, destination)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> TableData {
        let mut table = TableData::new(vec!["Id".into(), "Name".into(), "City".into()]);
        table.push_row(vec!["1".into(), "ACME".into(), "Oslo".into()]);
        table.push_row(vec!["2".into(), "Globex".into(), "Bergen".into()]);
        table
    }

    #[tokio::test]
    async fn round_trip_preserves_headers_and_row_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Account.csv");
        let store = CsvTabularStore::new();

        let table = sample_table();
        store.write_table(&path, &table).await.unwrap();
        let read_back = store.read_table(&path).await.unwrap();

        assert_eq!(read_back, table);
        // No temp file left behind after the rename.
        assert!(!path.with_extension("csv.tmp").exists());
    }

    #[tokio::test]
    async fn copy_preserves_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("Account.csv");
        let destination = dir.path().join("Account_source.csv");
        let store = CsvTabularStore::new();

        store.write_table(&source, &sample_table()).await.unwrap();
        store.copy_table(&source, &destination).await.unwrap();

        assert_eq!(
            std::fs::read(&source).unwrap(),
            std::fs::read(&destination).unwrap()
        );
    }

    #[tokio::test]
    async fn exists_reflects_the_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Missing.csv");
        let store = CsvTabularStore::new();
        assert!(!store.exists(&path).await);
        store
            .write_table(&path, &TableData::new(vec!["Id".into()]))
            .await
            .unwrap();
        assert!(store.exists(&path).await);
    }

    #[tokio::test]
    async fn short_rows_survive_a_flexible_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Ragged.csv");
        std::fs::write(&path, "Id,Name,City\n1,ACME\n").unwrap();
        let store = CsvTabularStore::new();

        let table = store.read_table(&path).await.unwrap();
        assert_eq!(table.headers.len(), 3);
        assert_eq!(table.rows[0].len(), 2);
    }
}
