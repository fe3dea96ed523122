//! Structural validation and cross-reference repair of file-based records.
//!
//! Validation reads the raw files and reports structural defects; repair
//! walks the declared parent relationships through the shared cache,
//! substituting configured value mappings and synthesizing missing parent
//! rows so every foreign key resolves. Findings of both phases accumulate
//! as [`CsvIssue`] rows and are flushed to a fixed-name report file.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::debug;

use migrator_endpoint::{TableData, TabularStore};
use migrator_shared::types::{CsvIssue, ID_COLUMN, ScriptObject};

use crate::csv::cache::CachedCsvContent;
use crate::csv::preprocess::ValueMapping;
use crate::errors::CsvError;

/// Fixed name of the issues report file.
pub const ISSUES_REPORT_FILENAME: &str = "csv-issues-report.csv";

/// Structural validation of one object's working file.
///
/// Checks that the file exists, that it carries the `Id` column, the
/// object's external-id column, and a reference column for every declared
/// parent, and that every row matches the header width. Findings append to
/// `issues`; only operational failures return an error.
pub async fn validate_object_file(
    store: &dyn TabularStore,
    dir: &Path,
    object: &ScriptObject,
    declared: &HashSet<String>,
    issues: &mut Vec<CsvIssue>,
) -> Result<(), CsvError> {
    let path = dir.join(object.working_csv_filename());
    if !store.exists(&path).await {
        issues.push(CsvIssue::structural(
            &object.name,
            "",
            "",
            "Source file not found",
        ));
        return Ok(());
    }

    let table = store.read_table(&path).await?;
    let mut required: Vec<String> = vec![ID_COLUMN.to_string(), object.external_id.clone()];
    for parent in object.parents() {
        if parent != &object.name && declared.contains(parent) {
            required.push(format!("{parent}Id"));
        }
    }
    required.dedup();
    for column in &required {
        if table.column_index(column).is_none() {
            issues.push(CsvIssue::structural(
                &object.name,
                column,
                "",
                "Missing required column",
            ));
        }
    }

    let width = table.headers.len();
    for (row_number, row) in table.rows.iter().enumerate() {
        if row.len() != width {
            issues.push(CsvIssue::structural(
                &object.name,
                "",
                format!("row {}", row_number + 2),
                format!(
                    "Malformed row: expected {width} columns, found {}",
                    row.len()
                ),
            ));
        }
    }
    Ok(())
}

/// Cross-reference repair of one object's working file.
///
/// For every declared parent present among the migrated objects, each
/// non-empty reference cell is resolved against the parent file: a
/// configured value mapping rewrites the cell first, then a missing parent
/// row is synthesized with a generated identifier. Every mutation is made
/// through `cache`, which tracks the files to rewrite.
pub async fn repair_object_references(
    cache: &mut CachedCsvContent,
    store: &dyn TabularStore,
    dir: &Path,
    object: &ScriptObject,
    objects_by_name: &HashMap<&str, &ScriptObject>,
    mapping: &ValueMapping,
    issues: &mut Vec<CsvIssue>,
) -> Result<(), CsvError> {
    if object.is_object_without_relationships {
        return Ok(());
    }

    let child_path = dir.join(object.working_csv_filename());
    if !cache.load_if_exists(store, &child_path).await? {
        return Ok(());
    }

    for parent_name in object.parents() {
        if parent_name == &object.name {
            continue;
        }
        let Some(parent) = objects_by_name.get(parent_name.as_str()) else {
            continue;
        };
        let reference_column = parent.reference_column();
        let Some(entries) = cache.collect_column(&child_path, &reference_column) else {
            // Reference column missing; already reported structurally.
            continue;
        };

        let parent_path = dir.join(parent.working_csv_filename());
        cache
            .load_or_create(store, &parent_path, &[ID_COLUMN, parent.external_id.as_str()])
            .await?;

        for (row_id, raw_value) in entries {
            if raw_value.is_empty() {
                continue;
            }
            let mapped = mapping.map_value(&parent.name, &parent.external_id, &raw_value);
            if let Some(mapped) = mapped {
                if mapped != raw_value {
                    cache.set_cell(&child_path, &row_id, &reference_column, mapped);
                }
            }
            let value = mapped.unwrap_or(raw_value.as_str()).to_string();

            match cache.ensure_reference(&parent_path, &parent.external_id, &value) {
                Some(true) => {
                    issues.push(CsvIssue::reference(
                        &object.name,
                        &reference_column,
                        &raw_value,
                        &parent.name,
                        &parent.external_id,
                        &value,
                        "Missing parent record was created",
                    ));
                }
                Some(false) | None => {}
            }
        }
    }
    Ok(())
}

/// Writes every accumulated issue to the fixed-name report file in `dir`.
/// Returns the report path.
pub async fn write_issue_report(
    store: &dyn TabularStore,
    dir: &Path,
    issues: &[CsvIssue],
) -> Result<PathBuf, CsvError> {
    let path = dir.join(ISSUES_REPORT_FILENAME);
    let mut table = TableData::new(
        CsvIssue::REPORT_HEADERS
            .iter()
            .map(|h| h.to_string())
            .collect(),
    );
    for issue in issues {
        table.push_row(issue.report_row());
    }
    store.write_table(&path, &table).await?;
    debug!(report = %path.display(), issues = issues.len(), "Wrote issues report");
    Ok(path)
}
