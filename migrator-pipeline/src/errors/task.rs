//! Error types for per-task retrieval and update operations.
use thiserror::Error;

use migrator_endpoint::EndpointError;

/// Represents errors that can occur while a task talks to an endpoint.
#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Endpoint error: {0}")]
    Endpoint(#[from] EndpointError),
}
