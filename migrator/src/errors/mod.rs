//! Error types for the migrator application.

use thiserror::Error;

use migrator_pipeline::OrchestratorError;

/// Errors that can occur during migrator initialization or execution.
#[derive(Error, Debug)]
pub enum MigrationError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Pipeline error.
    #[error("Orchestrator error: {0}")]
    Orchestrator(#[from] OrchestratorError),
}

impl MigrationError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
