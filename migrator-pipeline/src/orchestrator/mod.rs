//! Job orchestrator.
//!
//! Coordinates one migration job end to end: computes the dependency-safe
//! task and query orders, runs the CSV preprocessing pipeline for
//! file-sourced jobs, and drives the count, delete, multi-pass retrieval,
//! and two-pass update stages against the injected endpoints. Stages run
//! strictly in sequence; a stage does not start until the previous stage's
//! per-task loop completes.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use migrator_endpoint::{
    ConfirmationPrompt, Decision, PromptOptions, QueryDirection, RecordEndpoint, TabularStore,
    UpdateDirection,
};
use migrator_shared::types::{CsvIssue, ScriptObject};

use crate::csv::cache::CachedCsvContent;
use crate::csv::preprocess::{self, ValueMapping};
use crate::csv::repair;
use crate::errors::OrchestratorError;
use crate::ordering;
use crate::task::Task;

/// Kind of the configured source endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// Source records live in tabular files; the CSV preprocessing pipeline
    /// runs before retrieval.
    File,
    /// Source records live on a remote store; no file preprocessing.
    Remote,
}

/// Configuration for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub source_kind: SourceKind,
    /// Directory holding the tabular source files of a file-sourced job.
    pub source_dir: PathBuf,
    /// Skip validate-and-repair and import the files as they are.
    pub import_csv_as_is: bool,
    /// Stop the job, successfully, once validation has run.
    pub validate_only: bool,
    /// Number of backward passes in retrieval step 2; one forwards pass in
    /// reversed mode always follows them.
    pub backward_passes: usize,
    /// Decision assumed when a continuation prompt gets no explicit answer.
    pub prompt_default: Decision,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            source_kind: SourceKind::Remote,
            source_dir: PathBuf::from("."),
            import_csv_as_is: false,
            validate_only: false,
            backward_passes: 2,
            prompt_default: Decision::Continue,
        }
    }
}

/// How a job run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// Every stage ran; carries the total number of records updated.
    Completed { records_updated: usize },
    /// The job stopped cleanly after validation, as requested.
    ValidateOnly,
}

enum CsvOutcome {
    Continue,
    ValidateOnly,
}

/// Orchestrator that coordinates one migration job.
///
/// Holds the injected endpoint, file store, and prompt capabilities,
/// enabling a flexible and testable pipeline.
pub struct Orchestrator {
    objects: Vec<ScriptObject>,
    source: Arc<dyn RecordEndpoint>,
    target: Arc<dyn RecordEndpoint>,
    store: Arc<dyn TabularStore>,
    prompt: Arc<dyn ConfirmationPrompt>,
    config: OrchestratorConfig,
    tasks: Vec<Task>,
    query_order: Vec<usize>,
    value_mapping: ValueMapping,
}

impl Orchestrator {
    pub fn new(
        objects: Vec<ScriptObject>,
        source: Arc<dyn RecordEndpoint>,
        target: Arc<dyn RecordEndpoint>,
        store: Arc<dyn TabularStore>,
        prompt: Arc<dyn ConfirmationPrompt>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            objects,
            source,
            target,
            store,
            prompt,
            config,
            tasks: Vec::new(),
            query_order: Vec::new(),
            value_mapping: ValueMapping::default(),
        }
    }

    /// Computes the task and query orders and builds the per-object tasks.
    pub fn setup(&mut self) -> Result<(), OrchestratorError> {
        let order = ordering::compute_task_order(&self.objects)?;
        let targets = ordering::master_detail_targets(&self.objects);
        self.tasks = order
            .iter()
            .map(|&index| {
                let object = self.objects[index].clone();
                let is_target = targets.contains(&object.name);
                Task::new(object, is_target)
            })
            .collect();

        let task_objects: Vec<&ScriptObject> =
            self.tasks.iter().map(|task| task.object()).collect();
        self.query_order = ordering::compute_query_order(&task_objects);

        let query_names: Vec<&str> = self
            .query_order
            .iter()
            .map(|&index| self.tasks[index].name())
            .collect();
        let task_names: Vec<&str> = self.tasks.iter().map(Task::name).collect();
        info!(order = query_names.join(", "), "Computed query order");
        info!(order = task_names.join(", "), "Computed execution order");

        for task in &self.tasks {
            if task.object().has_autonumber_external_id {
                warn!(
                    object = task.name(),
                    "External id is an autonumber field; cross-endpoint matching relies on preserved values"
                );
            }
        }
        Ok(())
    }

    /// Runs the whole job: setup, CSV preprocessing for file-sourced jobs,
    /// record counting, old-record deletion, multi-pass retrieval, and the
    /// two-pass update.
    pub async fn run(&mut self) -> Result<JobOutcome, OrchestratorError> {
        self.setup()?;

        if self.config.source_kind == SourceKind::File {
            if let CsvOutcome::ValidateOnly = self.prepare_csv_files().await? {
                info!("Validation finished; stopping before retrieval as requested");
                return Ok(JobOutcome::ValidateOnly);
            }
        }

        let total = self.total_records_count().await?;
        info!(total_records = total, "Total records to process");

        self.delete_old_records().await?;
        self.retrieve_records().await?;
        let records_updated = self.update_records().await?;

        info!(records_updated, "Migration job finished");
        Ok(JobOutcome::Completed { records_updated })
    }

    /// CSV preprocessing pipeline for file-sourced jobs: user/group merge,
    /// value-mapping load, pristine copies, then validate-and-repair unless
    /// the caller opted to import the files as-is.
    async fn prepare_csv_files(&mut self) -> Result<CsvOutcome, OrchestratorError> {
        let dir = self.config.source_dir.clone();
        let store = Arc::clone(&self.store);

        if let Some(rows) = preprocess::merge_user_and_group(store.as_ref(), &dir).await? {
            info!(
                rows,
                file = preprocess::USER_AND_GROUP_FILENAME,
                "Merged user and group files"
            );
        }

        self.value_mapping = preprocess::load_value_mapping(store.as_ref(), &dir).await?;
        if !self.value_mapping.is_empty() {
            info!(
                mappings = self.value_mapping.len(),
                "Loaded value-mapping file"
            );
        }

        let task_objects: Vec<&ScriptObject> =
            self.tasks.iter().map(|task| task.object()).collect();
        let copied = preprocess::copy_source_files(store.as_ref(), &dir, &task_objects).await?;
        debug!(files = copied, "Copied source files aside");

        if self.config.import_csv_as_is {
            info!("Importing CSV files as-is; validation and repair skipped");
            return Ok(CsvOutcome::Continue);
        }

        // The cache lives exactly as long as validate-and-repair needs it;
        // clearing afterwards frees the row maps before retrieval starts.
        let mut cache = CachedCsvContent::new();
        let result = self.validate_and_repair(&mut cache).await;
        cache.clear();
        result?;

        if self.config.validate_only {
            return Ok(CsvOutcome::ValidateOnly);
        }
        Ok(CsvOutcome::Continue)
    }

    /// Validate-and-repair: structural validation of every task file, a
    /// single continuation prompt when problems exist, cross-reference
    /// repair through the shared cache, full rewrite of every mutated file,
    /// and issue reporting.
    async fn validate_and_repair(
        &mut self,
        cache: &mut CachedCsvContent,
    ) -> Result<(), OrchestratorError> {
        let dir = self.config.source_dir.clone();
        let store = Arc::clone(&self.store);
        let declared: HashSet<String> =
            self.tasks.iter().map(|task| task.name().to_string()).collect();

        let mut issues: Vec<CsvIssue> = Vec::new();
        let mut invalid_objects: HashSet<String> = HashSet::new();
        for task in &self.tasks {
            let before = issues.len();
            repair::validate_object_file(store.as_ref(), &dir, task.object(), &declared, &mut issues)
                .await?;
            if issues.len() > before {
                invalid_objects.insert(task.name().to_string());
            }
        }

        let prompt_options = PromptOptions {
            default: self.config.prompt_default,
        };
        let mut prompted = false;
        if !issues.is_empty() {
            warn!(
                issues = issues.len(),
                "Structural problems found in the source files"
            );
            prompted = true;
            let decision = self
                .prompt
                .confirm(
                    "Structural problems were found in the source files. Continue?",
                    &prompt_options,
                )
                .await;
            if decision == Decision::Abort {
                return Err(OrchestratorError::Aborted);
            }
        }
        let structural_count = issues.len();

        let objects_by_name: HashMap<&str, &ScriptObject> = self
            .tasks
            .iter()
            .map(|task| (task.name(), task.object()))
            .collect();
        for task in &self.tasks {
            if invalid_objects.contains(task.name()) {
                continue;
            }
            repair::repair_object_references(
                cache,
                store.as_ref(),
                &dir,
                task.object(),
                &objects_by_name,
                &self.value_mapping,
                &mut issues,
            )
            .await?;
        }

        let rewritten = cache.save_updated(store.as_ref()).await?;
        debug!(files = rewritten, "Rewrote repaired source files");

        let repair_count = issues.len() - structural_count;
        if issues.is_empty() {
            info!("No issues found in the source files");
        } else if repair_count > 0 && !prompted {
            // The report is flushed before the question so an aborting user
            // still gets the findings on disk.
            let report = repair::write_issue_report(store.as_ref(), &dir, &issues).await?;
            warn!(
                issues = issues.len(),
                report = %report.display(),
                "Cross-reference issues found; report written"
            );
            let decision = self
                .prompt
                .confirm(
                    "Cross-reference issues were found in the source files. Continue?",
                    &prompt_options,
                )
                .await;
            if decision == Decision::Abort {
                return Err(OrchestratorError::Aborted);
            }
        } else {
            let report = repair::write_issue_report(store.as_ref(), &dir, &issues).await?;
            warn!(
                issues = issues.len(),
                report = %report.display(),
                "Issues were written to the report file"
            );
        }
        Ok(())
    }

    /// Sums the source-side record counts across all tasks, in task order.
    pub async fn total_records_count(&self) -> Result<usize, OrchestratorError> {
        let source = Arc::clone(&self.source);
        let mut total = 0usize;
        for task in &self.tasks {
            let count = task.count_source(source.as_ref()).await?;
            debug!(object = task.name(), count, "Counted source records");
            total += count;
        }
        Ok(total)
    }

    /// Deletes old target-side records in reverse task order, children
    /// before parents. Returns whether anything was deleted.
    pub async fn delete_old_records(&mut self) -> Result<bool, OrchestratorError> {
        info!("Deleting old target records");
        let target = Arc::clone(&self.target);
        let mut any_deleted = false;
        for task in self.tasks.iter().rev() {
            let deleted = task.delete_old_target(target.as_ref()).await?;
            if deleted > 0 {
                info!(object = task.name(), deleted, "Deleted old target records");
                any_deleted = true;
            }
        }
        if !any_deleted {
            info!("No old records required deletion");
        }
        Ok(any_deleted)
    }

    /// Multi-pass retrieval protocol.
    ///
    /// Step 1 queries the source forwards; step 2 runs the configured number
    /// of backward passes plus one forward pass in reversed mode, catching
    /// records resolvable only after earlier passes added parent context and
    /// self-referencing or circular chains; step 3 queries the target. Each
    /// step iterates the query order and reports when no task in the step
    /// retrieved anything.
    pub async fn retrieve_records(&mut self) -> Result<(), OrchestratorError> {
        info!(step = 1, "Retrieving source records, forward pass");
        let any = self
            .retrieve_source_step(QueryDirection::Forwards, false)
            .await?;
        if !any {
            info!(step = 1, "No records were retrieved in this step");
        }

        info!(
            step = 2,
            backward_passes = self.config.backward_passes,
            "Retrieving source records, backward passes"
        );
        let mut any = false;
        for pass in 0..self.config.backward_passes {
            debug!(step = 2, pass = pass + 1, "Backward retrieval pass");
            any |= self
                .retrieve_source_step(QueryDirection::Backwards, false)
                .await?;
        }
        // Final forward pass in reversed mode resolves self-referencing and
        // circular chains the backward passes left behind.
        any |= self
            .retrieve_source_step(QueryDirection::Forwards, true)
            .await?;
        if !any {
            info!(step = 2, "No records were retrieved in this step");
        }

        info!(step = 3, "Retrieving target records");
        let any = self.retrieve_target_step().await?;
        if !any {
            info!(step = 3, "No records were retrieved in this step");
        }

        for task in &self.tasks {
            info!(
                object = task.name(),
                counts = format!("{}/{}", task.source_data.len(), task.target_data.len()),
                "Retrieved records, source/target"
            );
        }
        Ok(())
    }

    async fn retrieve_source_step(
        &mut self,
        direction: QueryDirection,
        reversed: bool,
    ) -> Result<bool, OrchestratorError> {
        let order = self.query_order.clone();
        let source = Arc::clone(&self.source);
        let mut any = false;
        for index in order {
            let task = &mut self.tasks[index];
            let added = task
                .retrieve_source(source.as_ref(), direction, reversed)
                .await?;
            if added > 0 {
                debug!(object = task.name(), added, ?direction, reversed, "Retrieved source records");
                any = true;
            }
        }
        Ok(any)
    }

    async fn retrieve_target_step(&mut self) -> Result<bool, OrchestratorError> {
        let order = self.query_order.clone();
        let target = Arc::clone(&self.target);
        let mut any = false;
        for index in order {
            let task = &mut self.tasks[index];
            let added = task.retrieve_target(target.as_ref()).await?;
            if added > 0 {
                debug!(object = task.name(), added, "Retrieved target records");
                any = true;
            }
        }
        Ok(any)
    }

    /// Two-pass update protocol: a forward pass applies inserts/updates in
    /// task order, then a backward pass populates cross-references that
    /// could not resolve until sibling and parent records existed. Returns
    /// the total number of records updated.
    pub async fn update_records(&mut self) -> Result<usize, OrchestratorError> {
        let forward = self.update_step(UpdateDirection::Forwards).await?;
        if forward > 0 {
            info!(records = forward, "Forward update pass completed");
        } else {
            info!("Nothing was updated in the forward pass");
        }

        let backward = self.update_step(UpdateDirection::Backwards).await?;
        if backward > 0 {
            info!(records = backward, "Backward update pass completed");
        } else {
            info!("Nothing was updated in the backward pass");
        }
        Ok(forward + backward)
    }

    async fn update_step(&mut self, direction: UpdateDirection) -> Result<usize, OrchestratorError> {
        let target = Arc::clone(&self.target);
        let mut updated = 0usize;
        for task in &self.tasks {
            let applied = task.update_target(target.as_ref(), direction).await?;
            if applied > 0 {
                debug!(object = task.name(), applied, ?direction, "Updated target records");
            }
            updated += applied;
        }
        Ok(updated)
    }

    /// First task matching the given object name, if any.
    pub fn task_by_object_name(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.name() == name)
    }

    /// Tasks in execution order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Retrieval order as indices into [`Self::tasks`].
    pub fn query_order(&self) -> &[usize] {
        &self.query_order
    }
}
