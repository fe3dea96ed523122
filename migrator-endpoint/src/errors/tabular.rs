//! Error types for tabular file store implementations.
use thiserror::Error;

/// Represents errors that can occur while reading or writing tabular files.
#[derive(Debug, Error)]
pub enum TabularStoreError {
    /// Filesystem-level failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed tabular content.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
