//! Error types for record endpoint implementations.
use thiserror::Error;

use crate::errors::TabularStoreError;

/// Represents errors that can occur while querying or applying records
/// against a source or target endpoint.
#[derive(Debug, Error)]
pub enum EndpointError {
    /// A record query failed.
    #[error("Query error: {0}")]
    Query(String),

    /// An insert/update/delete operation failed.
    #[error("DML error: {0}")]
    Dml(String),

    /// The underlying tabular file store failed.
    #[error("Tabular store error: {0}")]
    Store(#[from] TabularStoreError),
}

impl EndpointError {
    /// Create a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Create a DML error.
    pub fn dml(msg: impl Into<String>) -> Self {
        Self::Dml(msg.into())
    }
}
