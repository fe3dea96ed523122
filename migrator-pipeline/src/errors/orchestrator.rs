//! Error types for the job orchestrator.
use thiserror::Error;

use crate::errors::{CsvError, OrderingError, TaskError};

/// Represents errors that can occur while running a migration job.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Ordering error: {0}")]
    Ordering(#[from] OrderingError),

    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    /// The user declined a continuation prompt.
    #[error("migration aborted by the user")]
    Aborted,
}
