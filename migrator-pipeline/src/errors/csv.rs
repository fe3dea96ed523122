//! Error types for the CSV cache and preprocessing modules.
//!
//! Structural and referential findings in the data itself are not errors;
//! they accumulate as `CsvIssue` report rows. This enum covers operational
//! failures only.
use thiserror::Error;

use migrator_endpoint::TabularStoreError;

/// Represents operational errors during CSV preprocessing and repair.
#[derive(Debug, Error)]
pub enum CsvError {
    /// The underlying tabular file store failed.
    #[error("Tabular store error: {0}")]
    Store(#[from] TabularStoreError),

    /// A file that must participate in preprocessing lacks a required column.
    #[error("file {file} is missing required column {column}")]
    MissingColumn { file: String, column: String },
}
