//! Record endpoint trait definition.
//!
//! This module defines the abstract interface for record query and DML
//! operations against one data endpoint (the source or the target store),
//! allowing for different backend implementations (remote API, tabular
//! files, in-memory mocks).

use async_trait::async_trait;

use crate::errors::EndpointError;
use crate::types::{QueryDirection, RecordRow, UpdateDirection};

/// Abstracts one data endpoint keyed by object name.
///
/// Implementations are injected into the migration pipeline to enable
/// dependency injection and easy testing with mock implementations. All
/// methods return `Result<T, EndpointError>` for consistent error handling
/// across backends.
///
/// The orchestrator awaits every call before starting the next task, so
/// implementations never see concurrent calls for the same job.
#[async_trait]
pub trait RecordEndpoint: Send + Sync {
    /// Query records of the given object.
    ///
    /// `direction` and `reversed` describe which retrieval pass is running;
    /// backends that resolve references incrementally may return different
    /// row sets per pass, while simple backends may return the same rows
    /// every time (the caller merges by external id).
    ///
    /// # Arguments
    ///
    /// * `object` - Object type name to query.
    /// * `direction` - Which retrieval pass is running.
    /// * `reversed` - Reversed-mode flag of the final forward pass.
    /// * `external_id` - Field whose value keys the returned rows.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<RecordRow>)` - Matching rows, possibly empty.
    /// * `Err(EndpointError)` - If the query fails.
    async fn query_records(
        &self,
        object: &str,
        direction: QueryDirection,
        reversed: bool,
        external_id: &str,
    ) -> Result<Vec<RecordRow>, EndpointError>;

    /// Apply inserts/updates for the given object.
    ///
    /// Rows are matched by the value of `external_id` (upsert semantics);
    /// a row carrying a `record_id` additionally addresses a known existing
    /// record on this endpoint.
    ///
    /// # Returns
    ///
    /// * `Ok(usize)` - Number of records applied.
    /// * `Err(EndpointError)` - If the operation fails.
    async fn apply_records(
        &self,
        object: &str,
        rows: &[RecordRow],
        direction: UpdateDirection,
        external_id: &str,
    ) -> Result<usize, EndpointError>;

    /// Count records of the given object currently stored on the endpoint.
    async fn count_records(&self, object: &str) -> Result<usize, EndpointError>;

    /// Delete all records of the given object, returning how many were
    /// removed.
    async fn delete_records(&self, object: &str) -> Result<usize, EndpointError>;
}
