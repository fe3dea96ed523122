//! Tabular file store trait definition.

use std::path::Path;

use async_trait::async_trait;

use crate::errors::TabularStoreError;
use crate::types::TableData;

/// Abstracts reading and writing header-named tabular files.
///
/// Implementations must preserve column header order and row order across a
/// read/write round trip. Writes replace the whole file; partial updates are
/// never performed through this interface.
#[async_trait]
pub trait TabularStore: Send + Sync {
    /// Read a whole tabular file.
    async fn read_table(&self, path: &Path) -> Result<TableData, TabularStoreError>;

    /// Replace a tabular file with the given content.
    async fn write_table(&self, path: &Path, table: &TableData) -> Result<(), TabularStoreError>;

    /// Whether a tabular file exists at the given path.
    async fn exists(&self, path: &Path) -> bool;

    /// Copy a tabular file byte-for-byte.
    async fn copy_table(&self, source: &Path, destination: &Path)
        -> Result<(), TabularStoreError>;
}
