//! In-memory cache of tabular file content.
//!
//! The cache avoids redundant file reads and writes while the validate and
//! repair phases walk the interdependent source files. It tracks which files
//! were mutated so persistence can rewrite exactly those, and it owns the
//! sequential generator used to synthesize row identifiers for repaired
//! references.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use migrator_endpoint::{TableData, TabularStore};
use migrator_shared::types::ID_COLUMN;

use crate::errors::CsvError;

/// Prefix of synthesized row identifiers.
pub const RECORD_ID_PREFIX: &str = "ID";

/// One cached tabular file: headers plus rows keyed by their `Id` cell,
/// with the original row order preserved for rewriting.
#[derive(Debug)]
pub struct CachedCsvFile {
    headers: Vec<String>,
    row_order: Vec<String>,
    rows: HashMap<String, Vec<String>>,
    id_index: usize,
}

impl CachedCsvFile {
    fn from_table(table: &TableData) -> Option<Self> {
        let id_index = table.column_index(ID_COLUMN)?;
        let width = table.headers.len();
        let mut row_order = Vec::with_capacity(table.rows.len());
        let mut rows = HashMap::with_capacity(table.rows.len());
        for raw in &table.rows {
            let mut row = raw.clone();
            row.resize(width, String::new());
            let id = row[id_index].clone();
            // The first occurrence of a duplicated id wins; later ones are
            // unreachable through the key anyway.
            if !rows.contains_key(&id) {
                row_order.push(id.clone());
                rows.insert(id, row);
            }
        }
        Some(Self {
            headers: table.headers.clone(),
            row_order,
            rows,
            id_index,
        })
    }

    fn new_empty(headers: &[&str]) -> Self {
        let headers: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
        let id_index = headers
            .iter()
            .position(|h| h == ID_COLUMN)
            .unwrap_or_default();
        Self {
            headers,
            row_order: Vec::new(),
            rows: HashMap::new(),
            id_index,
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.row_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_order.is_empty()
    }

    fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    fn find_by_column(&self, column_index: usize, value: &str) -> Option<&str> {
        self.row_order
            .iter()
            .find(|id| {
                self.rows
                    .get(*id)
                    .and_then(|row| row.get(column_index))
                    .is_some_and(|cell| cell == value)
            })
            .map(String::as_str)
    }

    fn insert_row(&mut self, id: String, cells: &[(usize, String)]) {
        let mut row = vec![String::new(); self.headers.len()];
        row[self.id_index] = id.clone();
        for (index, value) in cells {
            row[*index] = value.clone();
        }
        self.row_order.push(id.clone());
        self.rows.insert(id, row);
    }

    fn to_table(&self) -> TableData {
        let mut table = TableData::new(self.headers.clone());
        for id in &self.row_order {
            if let Some(row) = self.rows.get(id) {
                table.push_row(row.clone());
            }
        }
        table
    }
}

/// Process-scoped cache mapping tabular file path → (row id → row).
///
/// Created fresh per job and explicitly cleared after validation completes
/// to free memory before the heavier retrieval and update phases. Access is
/// strictly sequential; the orchestrator passes it by reference through the
/// validate/repair phases.
#[derive(Debug)]
pub struct CachedCsvContent {
    files: HashMap<PathBuf, CachedCsvFile>,
    updated_files: HashSet<PathBuf>,
    next_id: u64,
}

impl Default for CachedCsvContent {
    fn default() -> Self {
        Self::new()
    }
}

impl CachedCsvContent {
    pub fn new() -> Self {
        let mut cache = Self {
            files: HashMap::new(),
            updated_files: HashSet::new(),
            next_id: 0,
        };
        cache.clear();
        cache
    }

    /// Empties the cache and resets the id counter to 1.
    pub fn clear(&mut self) {
        self.files.clear();
        self.updated_files.clear();
        self.next_id = 1;
    }

    /// Next synthesized row identifier: a two-letter prefix followed by a
    /// zero-padded 16-digit strictly increasing counter.
    pub fn next_record_id(&mut self) -> String {
        let id = format!("{RECORD_ID_PREFIX}{:016}", self.next_id);
        self.next_id += 1;
        id
    }

    /// Loads a file into the cache if it exists on disk and is not cached
    /// yet. Returns whether the file is cached afterwards.
    ///
    /// # Errors
    ///
    /// `CsvError::MissingColumn` when the file has no `Id` column to key
    /// rows by.
    pub async fn load_if_exists(
        &mut self,
        store: &dyn TabularStore,
        path: &Path,
    ) -> Result<bool, CsvError> {
        if self.files.contains_key(path) {
            return Ok(true);
        }
        if !store.exists(path).await {
            return Ok(false);
        }
        let table = store.read_table(path).await?;
        let file = CachedCsvFile::from_table(&table).ok_or_else(|| CsvError::MissingColumn {
            file: path.display().to_string(),
            column: ID_COLUMN.to_string(),
        })?;
        self.files.insert(path.to_path_buf(), file);
        Ok(true)
    }

    /// Loads a file into the cache, creating an empty cached file with the
    /// given headers when it does not exist on disk.
    pub async fn load_or_create(
        &mut self,
        store: &dyn TabularStore,
        path: &Path,
        headers: &[&str],
    ) -> Result<(), CsvError> {
        if self.load_if_exists(store, path).await? {
            return Ok(());
        }
        self.files
            .insert(path.to_path_buf(), CachedCsvFile::new_empty(headers));
        Ok(())
    }

    pub fn file(&self, path: &Path) -> Option<&CachedCsvFile> {
        self.files.get(path)
    }

    /// All (row id, cell value) pairs of the named column, in row order.
    /// `None` when the file is not cached or lacks the column.
    pub fn collect_column(&self, path: &Path, column: &str) -> Option<Vec<(String, String)>> {
        let file = self.files.get(path)?;
        let index = file.column_index(column)?;
        Some(
            file.row_order
                .iter()
                .filter_map(|id| {
                    file.rows
                        .get(id)
                        .and_then(|row| row.get(index))
                        .map(|cell| (id.clone(), cell.clone()))
                })
                .collect(),
        )
    }

    /// Overwrites one cell, marking the file updated when the value changed.
    /// Returns whether a change was made.
    pub fn set_cell(&mut self, path: &Path, row_id: &str, column: &str, value: &str) -> bool {
        let Some(file) = self.files.get_mut(path) else {
            return false;
        };
        let Some(index) = file.column_index(column) else {
            return false;
        };
        let Some(row) = file.rows.get_mut(row_id) else {
            return false;
        };
        if row[index] == value {
            return false;
        }
        row[index] = value.to_string();
        self.updated_files.insert(path.to_path_buf());
        true
    }

    /// Ensures the cached file contains a row whose `key_column` cell equals
    /// `value`, synthesizing one (with a generated `Id`) when absent.
    ///
    /// Returns `Some(true)` when a row was synthesized, `Some(false)` when
    /// the reference already resolved, and `None` when the file is not
    /// cached or lacks `key_column`.
    pub fn ensure_reference(
        &mut self,
        path: &Path,
        key_column: &str,
        value: &str,
    ) -> Option<bool> {
        let (key_index, id_index, resolved) = {
            let file = self.files.get(path)?;
            let key_index = file.column_index(key_column)?;
            (
                key_index,
                file.id_index,
                file.find_by_column(key_index, value).is_some(),
            )
        };
        if resolved {
            return Some(false);
        }

        if key_index == id_index {
            // The reference column is the id column itself; the referenced
            // value becomes the new row's id.
            let file = self.files.get_mut(path)?;
            file.insert_row(value.to_string(), &[]);
        } else {
            let id = self.next_record_id();
            let file = self.files.get_mut(path)?;
            file.insert_row(id, &[(key_index, value.to_string())]);
        }
        self.updated_files.insert(path.to_path_buf());
        Some(true)
    }

    pub fn is_updated(&self, path: &Path) -> bool {
        self.updated_files.contains(path)
    }

    pub fn updated_count(&self) -> usize {
        self.updated_files.len()
    }

    /// Rewrites every file marked updated from the cached content and clears
    /// the updated set. Returns how many files were written.
    pub async fn save_updated(&mut self, store: &dyn TabularStore) -> Result<usize, CsvError> {
        let mut paths: Vec<PathBuf> = self.updated_files.drain().collect();
        paths.sort();
        for path in &paths {
            if let Some(file) = self.files.get(path) {
                store.write_table(path, &file.to_table()).await?;
            }
        }
        Ok(paths.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthesized_ids_are_zero_padded_and_strictly_increasing() {
        let mut cache = CachedCsvContent::new();
        assert_eq!(cache.next_record_id(), "ID0000000000000001");
        assert_eq!(cache.next_record_id(), "ID0000000000000002");
        assert_eq!(cache.next_record_id(), "ID0000000000000003");
    }

    #[test]
    fn clear_resets_the_id_counter() {
        let mut cache = CachedCsvContent::new();
        cache.next_record_id();
        cache.next_record_id();
        cache.clear();
        assert_eq!(cache.next_record_id(), "ID0000000000000001");
    }

    #[test]
    fn ensure_reference_synthesizes_once() {
        let mut cache = CachedCsvContent::new();
        let path = Path::new("Account.csv");
        cache
            .files
            .insert(path.to_path_buf(), CachedCsvFile::new_empty(&["Id", "Name"]));

        assert_eq!(cache.ensure_reference(path, "Name", "ACME"), Some(true));
        // Second resolution finds the synthesized row.
        assert_eq!(cache.ensure_reference(path, "Name", "ACME"), Some(false));
        assert!(cache.is_updated(path));

        let file = cache.file(path).unwrap();
        assert_eq!(file.len(), 1);
        let table = file.to_table();
        assert_eq!(table.rows[0][0], "ID0000000000000001");
        assert_eq!(table.rows[0][1], "ACME");
    }

    #[test]
    fn set_cell_marks_updated_only_on_change() {
        let mut cache = CachedCsvContent::new();
        let path = Path::new("Contact.csv");
        let mut file = CachedCsvFile::new_empty(&["Id", "AccountId"]);
        file.insert_row("1".to_string(), &[(1, "ACME".to_string())]);
        cache.files.insert(path.to_path_buf(), file);

        assert!(!cache.set_cell(path, "1", "AccountId", "ACME"));
        assert!(!cache.is_updated(path));
        assert!(cache.set_cell(path, "1", "AccountId", "Globex"));
        assert!(cache.is_updated(path));
    }

    #[test]
    fn collect_column_preserves_row_order() {
        let mut cache = CachedCsvContent::new();
        let path = Path::new("Contact.csv");
        let mut file = CachedCsvFile::new_empty(&["Id", "AccountId"]);
        file.insert_row("2".to_string(), &[(1, "B".to_string())]);
        file.insert_row("1".to_string(), &[(1, "A".to_string())]);
        cache.files.insert(path.to_path_buf(), file);

        let column = cache.collect_column(path, "AccountId").unwrap();
        assert_eq!(
            column,
            vec![("2".into(), "B".into()), ("1".into(), "A".into())]
        );
        assert!(cache.collect_column(path, "Missing").is_none());
    }
}
