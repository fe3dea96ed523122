//! Dependency initialization and wiring for the migrator.

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use migrator_endpoint::{
    ConsolePrompt, CsvRecordEndpoint, CsvTabularStore, Decision, TabularStore,
};
use migrator_pipeline::{Orchestrator, OrchestratorConfig, SourceKind};
use migrator_shared::types::ScriptObject;

use crate::MigrationError;

/// Default path of the job description file.
const DEFAULT_JOB_FILE: &str = "migration.json";

fn default_source_dir() -> PathBuf {
    PathBuf::from("data/source")
}

fn default_target_dir() -> PathBuf {
    PathBuf::from("data/target")
}

fn default_backward_passes() -> usize {
    2
}

/// Job description as declared by the caller: the ordered object list plus
/// the per-job options. Declaration order is the ordering tie-break.
#[derive(Debug, Deserialize)]
pub struct JobDescription {
    pub objects: Vec<ScriptObject>,
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,
    #[serde(default = "default_target_dir")]
    pub target_dir: PathBuf,
    #[serde(default)]
    pub import_csv_as_is: bool,
    #[serde(default)]
    pub validate_only: bool,
    #[serde(default = "default_backward_passes")]
    pub backward_passes: usize,
}

impl JobDescription {
    /// Parse a job description from its JSON text.
    pub fn from_json(raw: &str) -> Result<Self, MigrationError> {
        let description: JobDescription = serde_json::from_str(raw)
            .map_err(|e| MigrationError::config(format!("Invalid job description: {e}")))?;
        if description.objects.is_empty() {
            return Err(MigrationError::config(
                "The job description declares no objects",
            ));
        }
        Ok(description)
    }
}

/// Parse the default prompt decision from the environment.
///
/// Valid values: "continue" or "abort" (case-insensitive).
/// Defaults to "continue" if not set or invalid.
fn prompt_default_from_env() -> Decision {
    match env::var("PROMPT_DEFAULT")
        .unwrap_or_else(|_| "continue".to_string())
        .to_lowercase()
        .as_str()
    {
        "abort" => Decision::Abort,
        "continue" => Decision::Continue,
        _ => {
            warn!("Invalid PROMPT_DEFAULT, defaulting to 'continue'");
            Decision::Continue
        }
    }
}

/// Container for all initialized dependencies.
pub struct Dependencies {
    /// The configured orchestrator ready to run.
    pub orchestrator: Orchestrator,
}

impl Dependencies {
    /// Initialize all dependencies from environment variables and the job
    /// description file.
    ///
    /// # Environment Variables
    ///
    /// - `MIGRATION_CONFIG`: path of the job description file
    ///   (default: migration.json)
    /// - `SOURCE_DIR`: overrides the job description's source directory
    /// - `TARGET_DIR`: overrides the job description's target directory
    /// - `PROMPT_DEFAULT`: decision assumed on an unanswered prompt -
    ///   "continue" or "abort" (default: continue)
    ///
    /// # Returns
    ///
    /// * `Ok(Dependencies)` - Initialized dependencies
    /// * `Err(MigrationError)` - If the job description is missing or invalid
    pub async fn new() -> Result<Self, MigrationError> {
        let job_file =
            env::var("MIGRATION_CONFIG").unwrap_or_else(|_| DEFAULT_JOB_FILE.to_string());
        let raw = std::fs::read_to_string(&job_file).map_err(|e| {
            MigrationError::config(format!("Failed to read job description {job_file}: {e}"))
        })?;
        let description = JobDescription::from_json(&raw)?;

        let source_dir = env::var("SOURCE_DIR")
            .map(PathBuf::from)
            .unwrap_or(description.source_dir);
        let target_dir = env::var("TARGET_DIR")
            .map(PathBuf::from)
            .unwrap_or(description.target_dir);

        info!(
            job_file = %job_file,
            objects = description.objects.len(),
            source_dir = %source_dir.display(),
            target_dir = %target_dir.display(),
            validate_only = description.validate_only,
            "Initializing dependencies"
        );

        let store: Arc<dyn TabularStore> = Arc::new(CsvTabularStore::new());
        let source = Arc::new(CsvRecordEndpoint::new(Arc::clone(&store), source_dir.clone()));
        let target = Arc::new(CsvRecordEndpoint::new(Arc::clone(&store), target_dir));
        let prompt = Arc::new(ConsolePrompt::new());

        let config = OrchestratorConfig {
            source_kind: SourceKind::File,
            source_dir,
            import_csv_as_is: description.import_csv_as_is,
            validate_only: description.validate_only,
            backward_passes: description.backward_passes,
            prompt_default: prompt_default_from_env(),
        };

        let orchestrator = Orchestrator::new(
            description.objects,
            source,
            target,
            store,
            prompt,
            config,
        );
        Ok(Self { orchestrator })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_description_parses_with_defaults() {
        let description = JobDescription::from_json(
            r#"{
                "objects": [
                    {"name": "Account"},
                    {"name": "Contact", "external_id": "Email",
                     "lookup_parents": ["Account"]}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(description.objects.len(), 2);
        assert_eq!(description.source_dir, default_source_dir());
        assert_eq!(description.backward_passes, 2);
        assert!(!description.validate_only);
        assert_eq!(description.objects[1].lookup_parents, vec!["Account"]);
    }

    #[test]
    fn empty_object_list_is_rejected() {
        let err = JobDescription::from_json(r#"{"objects": []}"#).unwrap_err();
        assert!(matches!(err, MigrationError::ConfigError(_)));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = JobDescription::from_json("{").unwrap_err();
        assert!(matches!(err, MigrationError::ConfigError(_)));
    }
}
