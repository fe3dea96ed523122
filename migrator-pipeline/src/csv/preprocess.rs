//! Preprocessing of file-based source data.
//!
//! Runs before validation on file-sourced jobs: merges the user and group
//! files into one combined lookup file, loads the optional value-mapping
//! file, and copies every working file aside as a pristine reference.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::{debug, warn};

use migrator_endpoint::{TableData, TabularStore};
use migrator_shared::types::{ID_COLUMN, ScriptObject};

use crate::errors::CsvError;

pub const USER_FILENAME: &str = "User.csv";
pub const GROUP_FILENAME: &str = "Group.csv";
pub const USER_AND_GROUP_FILENAME: &str = "UserAndGroup.csv";
pub const VALUE_MAPPING_FILENAME: &str = "ValueMapping.csv";

const NAME_COLUMN: &str = "Name";

/// Raw-value → replacement maps keyed by (object name, field name).
///
/// Loaded from the optional value-mapping file; repair consults it before
/// synthesizing missing parent rows, so configured renames never produce
/// placeholder records.
#[derive(Debug, Clone, Default)]
pub struct ValueMapping {
    entries: HashMap<(String, String), HashMap<String, String>>,
}

impl ValueMapping {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn insert(
        &mut self,
        object: impl Into<String>,
        field: impl Into<String>,
        raw: impl Into<String>,
        mapped: impl Into<String>,
    ) {
        self.entries
            .entry((object.into(), field.into()))
            .or_default()
            .insert(raw.into(), mapped.into());
    }

    /// Replacement for `raw` under (object, field), if one is configured.
    pub fn map_value(&self, object: &str, field: &str, raw: &str) -> Option<&str> {
        self.entries
            .get(&(object.to_string(), field.to_string()))
            .and_then(|values| values.get(raw))
            .map(String::as_str)
    }
}

/// Merges the user and group files into the combined file when both exist.
///
/// The combined file carries the identifier and name columns only; rows are
/// the case-sensitive union of both inputs keyed by identifier (first
/// occurrence wins), user rows first. Returns the merged row count, or
/// `None` when either input file is absent.
pub async fn merge_user_and_group(
    store: &dyn TabularStore,
    dir: &Path,
) -> Result<Option<usize>, CsvError> {
    let user_path = dir.join(USER_FILENAME);
    let group_path = dir.join(GROUP_FILENAME);
    if !store.exists(&user_path).await || !store.exists(&group_path).await {
        return Ok(None);
    }

    let mut merged = TableData::new(vec![ID_COLUMN.to_string(), NAME_COLUMN.to_string()]);
    let mut seen: HashSet<String> = HashSet::new();
    for path in [&user_path, &group_path] {
        let table = store.read_table(path).await?;
        let id_index = table
            .column_index(ID_COLUMN)
            .ok_or_else(|| CsvError::MissingColumn {
                file: path.display().to_string(),
                column: ID_COLUMN.to_string(),
            })?;
        let name_index =
            table
                .column_index(NAME_COLUMN)
                .ok_or_else(|| CsvError::MissingColumn {
                    file: path.display().to_string(),
                    column: NAME_COLUMN.to_string(),
                })?;
        for row in &table.rows {
            let id = row.get(id_index).cloned().unwrap_or_default();
            if id.is_empty() || !seen.insert(id.clone()) {
                continue;
            }
            let name = row.get(name_index).cloned().unwrap_or_default();
            merged.push_row(vec![id, name]);
        }
    }

    let count = merged.rows.len();
    store
        .write_table(&dir.join(USER_AND_GROUP_FILENAME), &merged)
        .await?;
    Ok(Some(count))
}

/// Loads the optional value-mapping file.
///
/// An absent or empty file yields an empty mapping; a present file with an
/// unusable header is skipped with a warning rather than failing the job.
pub async fn load_value_mapping(
    store: &dyn TabularStore,
    dir: &Path,
) -> Result<ValueMapping, CsvError> {
    let path = dir.join(VALUE_MAPPING_FILENAME);
    if !store.exists(&path).await {
        return Ok(ValueMapping::default());
    }
    let table = store.read_table(&path).await?;

    let columns = ["ObjectName", "FieldName", "RawValue", "Value"]
        .map(|name| table.column_index(name));
    let [Some(object_index), Some(field_index), Some(raw_index), Some(value_index)] = columns
    else {
        warn!(
            file = %path.display(),
            "Value-mapping file lacks the expected columns, ignoring it"
        );
        return Ok(ValueMapping::default());
    };

    let mut mapping = ValueMapping::default();
    let mut skipped = 0usize;
    for row in &table.rows {
        let object = row.get(object_index).cloned().unwrap_or_default();
        let field = row.get(field_index).cloned().unwrap_or_default();
        if object.is_empty() || field.is_empty() {
            skipped += 1;
            continue;
        }
        mapping.insert(
            object,
            field,
            row.get(raw_index).cloned().unwrap_or_default(),
            row.get(value_index).cloned().unwrap_or_default(),
        );
    }
    if skipped > 0 {
        warn!(
            file = %path.display(),
            skipped,
            "Some value-mapping rows had no object or field name"
        );
    }
    Ok(mapping)
}

/// Copies every existing working file to its pristine `_source` sibling
/// before repair mutates anything. Returns how many files were copied.
pub async fn copy_source_files(
    store: &dyn TabularStore,
    dir: &Path,
    objects: &[&ScriptObject],
) -> Result<usize, CsvError> {
    let mut copied = 0usize;
    for object in objects {
        let working = dir.join(object.working_csv_filename());
        if !store.exists(&working).await {
            continue;
        }
        let pristine = dir.join(object.source_copy_csv_filename());
        store.copy_table(&working, &pristine).await?;
        debug!(object = object.name, "Copied working file aside");
        copied += 1;
    }
    Ok(copied)
}
