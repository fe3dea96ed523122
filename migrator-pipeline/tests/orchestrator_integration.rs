//! Integration tests for the migration orchestrator.
//!
//! These tests use the real Orchestrator but mock dependencies
//! (RecordEndpoint and ConfirmationPrompt) to ensure reliable testing;
//! file-sourced scenarios run against real CSV files in a temp directory.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use migrator_endpoint::{
    ConfirmationPrompt, CsvRecordEndpoint, CsvTabularStore, Decision, EndpointError,
    PromptOptions, QueryDirection, RecordEndpoint, RecordRow, TabularStore, UpdateDirection,
};
use migrator_pipeline::csv::repair::ISSUES_REPORT_FILENAME;
use migrator_pipeline::{
    JobOutcome, Orchestrator, OrchestratorConfig, OrchestratorError, OrderingError, SourceKind,
};
use migrator_shared::types::ScriptObject;

// Mock endpoint serving canned rows per object and recording every call.
struct MockEndpoint {
    rows_by_object: HashMap<String, Vec<RecordRow>>,
    calls: Mutex<Vec<String>>,
}

impl MockEndpoint {
    fn empty() -> Self {
        Self {
            rows_by_object: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn with_rows(rows_by_object: HashMap<String, Vec<RecordRow>>) -> Self {
        Self {
            rows_by_object,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordEndpoint for MockEndpoint {
    async fn query_records(
        &self,
        object: &str,
        direction: QueryDirection,
        reversed: bool,
        _external_id: &str,
    ) -> Result<Vec<RecordRow>, EndpointError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("query:{object}:{direction:?}:{reversed}"));
        Ok(self.rows_by_object.get(object).cloned().unwrap_or_default())
    }

    async fn apply_records(
        &self,
        object: &str,
        rows: &[RecordRow],
        direction: UpdateDirection,
        _external_id: &str,
    ) -> Result<usize, EndpointError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("apply:{object}:{direction:?}"));
        Ok(rows.len())
    }

    async fn count_records(&self, object: &str) -> Result<usize, EndpointError> {
        self.calls.lock().unwrap().push(format!("count:{object}"));
        Ok(self.rows_by_object.get(object).map_or(0, Vec::len))
    }

    async fn delete_records(&self, object: &str) -> Result<usize, EndpointError> {
        self.calls.lock().unwrap().push(format!("delete:{object}"));
        Ok(0)
    }
}

// Mock prompt recording every question.
struct MockPrompt {
    decision: Decision,
    questions: Mutex<Vec<String>>,
}

impl MockPrompt {
    fn continuing() -> Self {
        Self {
            decision: Decision::Continue,
            questions: Mutex::new(Vec::new()),
        }
    }

    fn aborting() -> Self {
        Self {
            decision: Decision::Abort,
            questions: Mutex::new(Vec::new()),
        }
    }

    fn question_count(&self) -> usize {
        self.questions.lock().unwrap().len()
    }
}

#[async_trait]
impl ConfirmationPrompt for MockPrompt {
    async fn confirm(&self, message: &str, _options: &PromptOptions) -> Decision {
        self.questions.lock().unwrap().push(message.to_string());
        self.decision
    }
}

fn record(key: &str, pairs: &[(&str, &str)]) -> RecordRow {
    RecordRow {
        key: key.to_string(),
        record_id: None,
        fields: pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

fn remote_orchestrator(
    objects: Vec<ScriptObject>,
    source: Arc<MockEndpoint>,
    target: Arc<MockEndpoint>,
    prompt: Arc<MockPrompt>,
) -> Orchestrator {
    Orchestrator::new(
        objects,
        source,
        target,
        Arc::new(CsvTabularStore::new()),
        prompt,
        OrchestratorConfig::default(),
    )
}

fn write_clean_files(dir: &Path) {
    std::fs::write(
        dir.join("Account.csv"),
        "Id,Name,City\n001,ACME,Oslo\n002,Globex,Bergen\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("Contact.csv"),
        "Id,Email,AccountId\n101,a@x.no,ACME\n102,b@x.no,Globex\n",
    )
    .unwrap();
}

fn file_job_objects() -> Vec<ScriptObject> {
    vec![
        ScriptObject::new("Contact")
            .with_external_id("Email")
            .with_lookup_parent("Account"),
        ScriptObject::new("Account"),
    ]
}

#[tokio::test]
async fn file_sourced_job_migrates_and_repairs() {
    let source_dir = tempfile::tempdir().unwrap();
    let target_dir = tempfile::tempdir().unwrap();
    // Contact 102 references an Account that does not exist in Account.csv.
    std::fs::write(
        source_dir.path().join("Account.csv"),
        "Id,Name,City\n001,ACME,Oslo\n",
    )
    .unwrap();
    std::fs::write(
        source_dir.path().join("Contact.csv"),
        "Id,Email,AccountId\n101,a@x.no,ACME\n102,b@x.no,Globex\n",
    )
    .unwrap();

    let store: Arc<dyn TabularStore> = Arc::new(CsvTabularStore::new());
    let source = Arc::new(CsvRecordEndpoint::new(
        Arc::clone(&store),
        source_dir.path(),
    ));
    let target = Arc::new(CsvRecordEndpoint::new(
        Arc::clone(&store),
        target_dir.path(),
    ));
    let prompt = Arc::new(MockPrompt::continuing());

    let config = OrchestratorConfig {
        source_kind: SourceKind::File,
        source_dir: source_dir.path().to_path_buf(),
        ..OrchestratorConfig::default()
    };
    let mut orchestrator = Orchestrator::new(
        file_job_objects(),
        source,
        target,
        Arc::clone(&store),
        Arc::clone(&prompt) as Arc<dyn ConfirmationPrompt>,
        config,
    );

    let outcome = orchestrator.run().await.unwrap();
    match outcome {
        JobOutcome::Completed { records_updated } => assert!(records_updated > 0),
        other => panic!("unexpected outcome: {other:?}"),
    }

    // Repair synthesized the missing Account row before retrieval.
    let repaired = store
        .read_table(&source_dir.path().join("Account.csv"))
        .await
        .unwrap();
    assert_eq!(repaired.rows.len(), 2);

    // One prompt: repair issues existed but no structural ones.
    assert_eq!(prompt.question_count(), 1);
    assert!(source_dir.path().join(ISSUES_REPORT_FILENAME).exists());

    // Pristine copies were made before repair mutated the working files.
    let pristine = store
        .read_table(&source_dir.path().join("Account_source.csv"))
        .await
        .unwrap();
    assert_eq!(pristine.rows.len(), 1);

    // Both objects reached the target.
    let target_accounts = store
        .read_table(&target_dir.path().join("Account.csv"))
        .await
        .unwrap();
    assert_eq!(target_accounts.rows.len(), 2);
    let target_contacts = store
        .read_table(&target_dir.path().join("Contact.csv"))
        .await
        .unwrap();
    assert_eq!(target_contacts.rows.len(), 2);
}

#[tokio::test]
async fn validate_only_stops_before_any_retrieval() {
    let source_dir = tempfile::tempdir().unwrap();
    write_clean_files(source_dir.path());

    let source = Arc::new(MockEndpoint::empty());
    let target = Arc::new(MockEndpoint::empty());
    let prompt = Arc::new(MockPrompt::continuing());
    let config = OrchestratorConfig {
        source_kind: SourceKind::File,
        source_dir: source_dir.path().to_path_buf(),
        validate_only: true,
        ..OrchestratorConfig::default()
    };
    let mut orchestrator = Orchestrator::new(
        file_job_objects(),
        Arc::clone(&source) as Arc<dyn RecordEndpoint>,
        Arc::clone(&target) as Arc<dyn RecordEndpoint>,
        Arc::new(CsvTabularStore::new()),
        Arc::clone(&prompt) as Arc<dyn ConfirmationPrompt>,
        config,
    );

    let outcome = orchestrator.run().await.unwrap();
    assert_eq!(outcome, JobOutcome::ValidateOnly);

    // Clean files: no prompt, and neither endpoint was ever touched.
    assert_eq!(prompt.question_count(), 0);
    assert!(source.calls().is_empty());
    assert!(target.calls().is_empty());
}

#[tokio::test]
async fn remote_job_with_no_records_completes_without_updates() {
    let objects = file_job_objects();
    let source = Arc::new(MockEndpoint::empty());
    let target = Arc::new(MockEndpoint::empty());
    let prompt = Arc::new(MockPrompt::continuing());
    let mut orchestrator = remote_orchestrator(
        objects,
        Arc::clone(&source),
        Arc::clone(&target),
        prompt,
    );

    let outcome = orchestrator.run().await.unwrap();
    assert_eq!(outcome, JobOutcome::Completed { records_updated: 0 });
}

#[tokio::test]
async fn deletion_runs_in_reverse_task_order() {
    let objects = file_job_objects();
    let source = Arc::new(MockEndpoint::empty());
    let target = Arc::new(MockEndpoint::empty());
    let prompt = Arc::new(MockPrompt::continuing());
    let mut orchestrator = remote_orchestrator(
        objects,
        Arc::clone(&source),
        Arc::clone(&target),
        prompt,
    );
    orchestrator.run().await.unwrap();

    // Task order is [Account, Contact]; deletion visits children first.
    let deletes: Vec<String> = target
        .calls()
        .into_iter()
        .filter(|call| call.starts_with("delete:"))
        .collect();
    assert_eq!(deletes, vec!["delete:Contact", "delete:Account"]);
}

#[tokio::test]
async fn retrieval_runs_the_configured_pass_structure() {
    let rows = HashMap::from([(
        "Account".to_string(),
        vec![record("ACME", &[("Name", "ACME")])],
    )]);
    let objects = vec![ScriptObject::new("Account")];
    let source = Arc::new(MockEndpoint::with_rows(rows));
    let target = Arc::new(MockEndpoint::empty());
    let prompt = Arc::new(MockPrompt::continuing());
    let mut orchestrator = remote_orchestrator(
        objects,
        Arc::clone(&source),
        Arc::clone(&target),
        prompt,
    );
    orchestrator.run().await.unwrap();

    let queries: Vec<String> = source
        .calls()
        .into_iter()
        .filter(|call| call.starts_with("query:"))
        .collect();
    // Step 1 forwards, two backward passes, one forwards reversed.
    assert_eq!(
        queries,
        vec![
            "query:Account:Forwards:false",
            "query:Account:Backwards:false",
            "query:Account:Backwards:false",
            "query:Account:Forwards:true",
        ]
    );
    let target_queries: Vec<String> = target
        .calls()
        .into_iter()
        .filter(|call| call.starts_with("query:"))
        .collect();
    assert_eq!(target_queries, vec!["query:Account:Target:false"]);
}

#[tokio::test]
async fn updates_run_two_passes_in_task_order() {
    let rows = HashMap::from([
        (
            "Account".to_string(),
            vec![record("ACME", &[("Name", "ACME")])],
        ),
        (
            "Contact".to_string(),
            vec![record("a@x.no", &[("Email", "a@x.no")])],
        ),
    ]);
    let objects = file_job_objects();
    let source = Arc::new(MockEndpoint::with_rows(rows));
    let target = Arc::new(MockEndpoint::empty());
    let prompt = Arc::new(MockPrompt::continuing());
    let mut orchestrator = remote_orchestrator(
        objects,
        Arc::clone(&source),
        Arc::clone(&target),
        prompt,
    );

    let outcome = orchestrator.run().await.unwrap();
    // Two records, applied once per pass.
    assert_eq!(outcome, JobOutcome::Completed { records_updated: 4 });

    let applies: Vec<String> = target
        .calls()
        .into_iter()
        .filter(|call| call.starts_with("apply:"))
        .collect();
    assert_eq!(
        applies,
        vec![
            "apply:Account:Forwards",
            "apply:Contact:Forwards",
            "apply:Account:Backwards",
            "apply:Contact:Backwards",
        ]
    );
}

#[tokio::test]
async fn declined_structural_prompt_aborts_the_job() {
    let source_dir = tempfile::tempdir().unwrap();
    // Contact.csv is missing entirely, a structural issue.
    std::fs::write(
        source_dir.path().join("Account.csv"),
        "Id,Name\n001,ACME\n",
    )
    .unwrap();

    let source = Arc::new(MockEndpoint::empty());
    let target = Arc::new(MockEndpoint::empty());
    let prompt = Arc::new(MockPrompt::aborting());
    let config = OrchestratorConfig {
        source_kind: SourceKind::File,
        source_dir: source_dir.path().to_path_buf(),
        ..OrchestratorConfig::default()
    };
    let mut orchestrator = Orchestrator::new(
        file_job_objects(),
        Arc::clone(&source) as Arc<dyn RecordEndpoint>,
        Arc::clone(&target) as Arc<dyn RecordEndpoint>,
        Arc::new(CsvTabularStore::new()),
        Arc::clone(&prompt) as Arc<dyn ConfirmationPrompt>,
        config,
    );

    let err = orchestrator.run().await.unwrap_err();
    assert!(matches!(err, OrchestratorError::Aborted));
    assert_eq!(prompt.question_count(), 1);
    assert!(source.calls().is_empty());
}

#[tokio::test]
async fn master_detail_cycle_fails_setup() {
    let objects = vec![
        ScriptObject::new("A").with_master_detail_parent("B"),
        ScriptObject::new("B").with_master_detail_parent("A"),
    ];
    let source = Arc::new(MockEndpoint::empty());
    let target = Arc::new(MockEndpoint::empty());
    let prompt = Arc::new(MockPrompt::continuing());
    let mut orchestrator = remote_orchestrator(objects, source, target, prompt);

    let err = orchestrator.run().await.unwrap_err();
    let OrchestratorError::Ordering(OrderingError::MasterDetailCycle { objects }) = err else {
        panic!("expected a master-detail cycle error, got {err:?}");
    };
    assert_eq!(objects.len(), 2);
}

#[tokio::test]
async fn master_detail_parents_are_flagged_on_their_tasks() {
    let objects = vec![
        ScriptObject::new("Detail").with_master_detail_parent("Master"),
        ScriptObject::new("Master"),
    ];
    let source = Arc::new(MockEndpoint::empty());
    let target = Arc::new(MockEndpoint::empty());
    let prompt = Arc::new(MockPrompt::continuing());
    let mut orchestrator = remote_orchestrator(objects, source, target, prompt);
    orchestrator.setup().unwrap();

    assert!(
        orchestrator
            .task_by_object_name("Master")
            .unwrap()
            .is_master_detail_target()
    );
    assert!(
        !orchestrator
            .task_by_object_name("Detail")
            .unwrap()
            .is_master_detail_target()
    );
}

#[tokio::test]
async fn task_lookup_finds_first_match_by_name() {
    let objects = file_job_objects();
    let source = Arc::new(MockEndpoint::empty());
    let target = Arc::new(MockEndpoint::empty());
    let prompt = Arc::new(MockPrompt::continuing());
    let mut orchestrator = remote_orchestrator(objects, source, target, prompt);
    orchestrator.run().await.unwrap();

    assert!(orchestrator.task_by_object_name("Account").is_some());
    assert!(orchestrator.task_by_object_name("Unknown").is_none());

    // Account is a lookup parent of Contact, so it executes first while the
    // query order keeps the declared retrieval priority.
    let tasks: Vec<&str> = orchestrator.tasks().iter().map(|t| t.name()).collect();
    assert_eq!(tasks, vec!["Account", "Contact"]);
}
