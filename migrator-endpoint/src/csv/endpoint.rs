use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use migrator_shared::types::ID_COLUMN;

use crate::errors::EndpointError;
use crate::interfaces::{RecordEndpoint, TabularStore};
use crate::types::{QueryDirection, RecordRow, TableData, UpdateDirection};

/// Record endpoint backed by one CSV file per object in a directory.
///
/// Rows are keyed by the object's external-id column; the `Id` column, when
/// present, supplies native record identifiers. A missing file behaves as an
/// object with no records, so a freshly created target directory is valid.
pub struct CsvRecordEndpoint {
    store: Arc<dyn TabularStore>,
    dir: PathBuf,
}

impl CsvRecordEndpoint {
    pub fn new(store: Arc<dyn TabularStore>, dir: impl Into<PathBuf>) -> Self {
        Self {
            store,
            dir: dir.into(),
        }
    }

    fn file_path(&self, object: &str) -> PathBuf {
        self.dir.join(format!("{object}.csv"))
    }

    fn row_fields(table: &TableData, row: &[String]) -> HashMap<String, String> {
        table
            .headers
            .iter()
            .enumerate()
            .map(|(index, header)| {
                (
                    header.clone(),
                    row.get(index).cloned().unwrap_or_default(),
                )
            })
            .collect()
    }

    async fn read_existing(&self, path: &Path) -> Result<Option<TableData>, EndpointError> {
        if !self.store.exists(path).await {
            return Ok(None);
        }
        Ok(Some(self.store.read_table(path).await?))
    }
}

#[async_trait]
impl RecordEndpoint for CsvRecordEndpoint {
    async fn query_records(
        &self,
        object: &str,
        _direction: QueryDirection,
        _reversed: bool,
        external_id: &str,
    ) -> Result<Vec<RecordRow>, EndpointError> {
        let path = self.file_path(object);
        let Some(table) = self.read_existing(&path).await? else {
            return Ok(Vec::new());
        };
        let Some(key_index) = table.column_index(external_id) else {
            return Err(EndpointError::query(format!(
                "file {} has no {external_id} column",
                path.display()
            )));
        };
        let id_index = table.column_index(ID_COLUMN);

        let mut rows = Vec::new();
        let mut skipped = 0usize;
        for row in &table.rows {
            let key = row.get(key_index).map(String::as_str).unwrap_or_default();
            if key.is_empty() {
                skipped += 1;
                continue;
            }
            let record_id = id_index
                .and_then(|index| row.get(index))
                .filter(|id| !id.is_empty())
                .cloned();
            rows.push(RecordRow {
                key: key.to_string(),
                record_id,
                fields: Self::row_fields(&table, row),
            });
        }
        if skipped > 0 {
            debug!(object, skipped, "Skipped rows without an external id value");
        }
        Ok(rows)
    }

    async fn apply_records(
        &self,
        object: &str,
        rows: &[RecordRow],
        _direction: UpdateDirection,
        external_id: &str,
    ) -> Result<usize, EndpointError> {
        if rows.is_empty() {
            return Ok(0);
        }
        let path = self.file_path(object);
        let mut table = match self.read_existing(&path).await? {
            Some(table) => table,
            None => {
                let mut headers = vec![ID_COLUMN.to_string()];
                if external_id != ID_COLUMN {
                    headers.push(external_id.to_string());
                }
                TableData::new(headers)
            }
        };

        // Extend the header set with any field names the file has not seen,
        // padding existing rows to the new width.
        let mut new_headers: Vec<String> = rows
            .iter()
            .flat_map(|row| row.fields.keys())
            .filter(|name| !table.headers.contains(*name))
            .cloned()
            .collect();
        new_headers.sort();
        new_headers.dedup();
        if !new_headers.is_empty() {
            table.headers.extend(new_headers);
            let width = table.headers.len();
            for row in &mut table.rows {
                row.resize(width, String::new());
            }
        }

        let Some(key_index) = table.column_index(external_id) else {
            return Err(EndpointError::dml(format!(
                "file {} has no {external_id} column",
                path.display()
            )));
        };
        let id_index = table.column_index(ID_COLUMN);
        let mut index_by_key: HashMap<String, usize> = table
            .rows
            .iter()
            .enumerate()
            .filter_map(|(position, row)| {
                row.get(key_index)
                    .filter(|key| !key.is_empty())
                    .map(|key| (key.clone(), position))
            })
            .collect();

        let width = table.headers.len();
        let mut applied = 0usize;
        for record in rows {
            if record.key.is_empty() {
                continue;
            }
            let position = match index_by_key.get(&record.key) {
                Some(&position) => position,
                None => {
                    let mut fresh = vec![String::new(); width];
                    if let (Some(id_index), Some(id)) = (id_index, record.record_id.as_ref()) {
                        fresh[id_index] = id.clone();
                    }
                    fresh[key_index] = record.key.clone();
                    table.rows.push(fresh);
                    let position = table.rows.len() - 1;
                    index_by_key.insert(record.key.clone(), position);
                    position
                }
            };
            let row = &mut table.rows[position];
            for (name, value) in &record.fields {
                // Field maps from another endpoint carry that endpoint's
                // native id; never overwrite this endpoint's Id cell.
                if name == ID_COLUMN {
                    continue;
                }
                if let Some(column) = table.headers.iter().position(|header| header == name) {
                    row[column] = value.clone();
                }
            }
            row[key_index] = record.key.clone();
            applied += 1;
        }

        self.store.write_table(&path, &table).await?;
        Ok(applied)
    }

    async fn count_records(&self, object: &str) -> Result<usize, EndpointError> {
        let path = self.file_path(object);
        match self.read_existing(&path).await? {
            Some(table) => Ok(table.rows.len()),
            None => Ok(0),
        }
    }

    async fn delete_records(&self, object: &str) -> Result<usize, EndpointError> {
        let path = self.file_path(object);
        let Some(table) = self.read_existing(&path).await? else {
            return Ok(0);
        };
        let deleted = table.rows.len();
        if deleted > 0 {
            let empty = TableData::new(table.headers);
            self.store.write_table(&path, &empty).await?;
        }
        Ok(deleted)
    }
}
