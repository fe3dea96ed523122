//! Per-object unit of migration work.
//!
//! A `Task` wraps one [`ScriptObject`] for the duration of a job, owning the
//! record sets retrieved from both endpoints and exposing the retrieval,
//! update, count, and delete operations the orchestrator drives.

use migrator_endpoint::{QueryDirection, RecordEndpoint, RecordRow, UpdateDirection};
use migrator_shared::types::{RecordSet, ScriptObject};

use crate::errors::TaskError;

/// The unit of work for one migrated object type.
///
/// `is_master_detail_target` is derived once from the declared relationships
/// when the job is set up; it never changes afterwards.
#[derive(Debug)]
pub struct Task {
    object: ScriptObject,
    /// Records retrieved from the source endpoint, keyed by external id.
    pub source_data: RecordSet,
    /// Records retrieved from the target endpoint, keyed by external id.
    pub target_data: RecordSet,
    is_master_detail_target: bool,
}

impl Task {
    pub fn new(object: ScriptObject, is_master_detail_target: bool) -> Self {
        Self {
            object,
            source_data: RecordSet::new(),
            target_data: RecordSet::new(),
            is_master_detail_target,
        }
    }

    pub fn object(&self) -> &ScriptObject {
        &self.object
    }

    pub fn name(&self) -> &str {
        &self.object.name
    }

    /// Whether another task in the job depends on this one through a
    /// master-detail relationship.
    pub fn is_master_detail_target(&self) -> bool {
        self.is_master_detail_target
    }

    /// Runs one source retrieval pass, merging rows into `source_data` by
    /// external id. Returns how many records were new to this task.
    pub async fn retrieve_source(
        &mut self,
        endpoint: &dyn RecordEndpoint,
        direction: QueryDirection,
        reversed: bool,
    ) -> Result<usize, TaskError> {
        let rows = endpoint
            .query_records(&self.object.name, direction, reversed, &self.object.external_id)
            .await?;
        let mut added = 0;
        for row in rows {
            if self.source_data.insert(row.key, row.record_id, row.fields) {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Runs the target retrieval pass, merging rows into `target_data`.
    /// Returns how many records were new to this task.
    pub async fn retrieve_target(
        &mut self,
        endpoint: &dyn RecordEndpoint,
    ) -> Result<usize, TaskError> {
        let rows = endpoint
            .query_records(
                &self.object.name,
                QueryDirection::Target,
                false,
                &self.object.external_id,
            )
            .await?;
        let mut added = 0;
        for row in rows {
            if self.target_data.insert(row.key, row.record_id, row.fields) {
                added += 1;
            }
        }
        Ok(added)
    }

    /// Applies the source-side records to the target endpoint. Rows whose
    /// external id is already known on the target carry the target's native
    /// record id. Read-only objects never receive DML.
    pub async fn update_target(
        &self,
        endpoint: &dyn RecordEndpoint,
        direction: UpdateDirection,
    ) -> Result<usize, TaskError> {
        if self.object.is_readonly_object || self.source_data.is_empty() {
            return Ok(0);
        }
        let rows: Vec<RecordRow> = self
            .source_data
            .iter()
            .map(|(key, fields)| RecordRow {
                key: key.clone(),
                record_id: self.target_data.record_id(key).map(str::to_string),
                fields: fields.clone(),
            })
            .collect();
        let applied = endpoint
            .apply_records(&self.object.name, &rows, direction, &self.object.external_id)
            .await?;
        Ok(applied)
    }

    /// Number of records currently on the source endpoint for this object.
    pub async fn count_source(&self, endpoint: &dyn RecordEndpoint) -> Result<usize, TaskError> {
        Ok(endpoint.count_records(&self.object.name).await?)
    }

    /// Removes the old target-side records of this object. Read-only objects
    /// are left untouched.
    pub async fn delete_old_target(
        &self,
        endpoint: &dyn RecordEndpoint,
    ) -> Result<usize, TaskError> {
        if self.object.is_readonly_object {
            return Ok(0);
        }
        Ok(endpoint.delete_records(&self.object.name).await?)
    }
}
