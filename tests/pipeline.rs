//! Integration tests for the extraction pipeline.
//!
//! The pipeline is driven through a scripted [`AssistantsApi`] mock, so the
//! poller, extractor, and orchestration are exercised end to end without a
//! live service. One live test at the bottom is gated behind environment
//! variables and skipped in CI.
//!
//! Run the live test with:
//!   E2E_ENABLED=1 RFI2JSON_E2E_DOC=path/to/rfi.docx cargo test --test pipeline -- --nocapture

use async_trait::async_trait;
use rfi2json::api::{
    AssistantsApi, ContentBlock, FileObject, MessageObject, RunObject, RunStatus, TextPayload,
};
use rfi2json::pipeline::{poll, upload};
use rfi2json::{extract_with, ExtractError, ExtractionConfig, NO_FILENAME};
use std::collections::VecDeque;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

// ── Mock service ─────────────────────────────────────────────────────────────

/// Scripted Assistants API: `create_run` reports the first status in the
/// script, each `retrieve_run` pops the next one, and `list_messages`
/// returns a single assistant message with the configured text payload.
struct MockApi {
    statuses: Mutex<VecDeque<RunStatus>>,
    reply_text: Option<String>,
    file_id: String,
    retrieves: AtomicU32,
    lists: AtomicU32,
    assistants_created: AtomicU32,
    vector_stores_created: AtomicU32,
    assistant_store: Mutex<Option<String>>,
}

impl MockApi {
    fn new(statuses: &[RunStatus], reply_text: Option<&str>) -> Self {
        Self {
            statuses: Mutex::new(statuses.iter().cloned().collect()),
            reply_text: reply_text.map(String::from),
            file_id: "file_mock".to_string(),
            retrieves: AtomicU32::new(0),
            lists: AtomicU32::new(0),
            assistants_created: AtomicU32::new(0),
            vector_stores_created: AtomicU32::new(0),
            assistant_store: Mutex::new(None),
        }
    }

    fn with_file_id(mut self, id: &str) -> Self {
        self.file_id = id.to_string();
        self
    }

    fn next_status(&self) -> RunStatus {
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .expect("status script exhausted — the poller polled more than scripted")
    }
}

#[async_trait]
impl AssistantsApi for MockApi {
    async fn upload_file(&self, _path: &Path) -> Result<FileObject, ExtractError> {
        Ok(FileObject {
            id: self.file_id.clone(),
            filename: Some("rfi.docx".to_string()),
        })
    }

    async fn create_vector_store(
        &self,
        _name: &str,
        _file_id: &str,
    ) -> Result<String, ExtractError> {
        self.vector_stores_created.fetch_add(1, Ordering::SeqCst);
        Ok("vs_mock".to_string())
    }

    async fn create_assistant(
        &self,
        _name: &str,
        _model: &str,
        _instructions: &str,
        vector_store_id: Option<&str>,
    ) -> Result<String, ExtractError> {
        self.assistants_created.fetch_add(1, Ordering::SeqCst);
        *self.assistant_store.lock().unwrap() = vector_store_id.map(String::from);
        Ok("asst_mock".to_string())
    }

    async fn create_thread(&self) -> Result<String, ExtractError> {
        Ok("thread_mock".to_string())
    }

    async fn create_message(
        &self,
        _thread_id: &str,
        _text: &str,
        _file_id: &str,
    ) -> Result<String, ExtractError> {
        Ok("msg_user".to_string())
    }

    async fn create_run(
        &self,
        _thread_id: &str,
        _assistant_id: &str,
    ) -> Result<RunObject, ExtractError> {
        Ok(RunObject {
            id: "run_mock".to_string(),
            status: self.next_status(),
            last_error: None,
        })
    }

    async fn retrieve_run(
        &self,
        _thread_id: &str,
        _run_id: &str,
    ) -> Result<RunObject, ExtractError> {
        self.retrieves.fetch_add(1, Ordering::SeqCst);
        Ok(RunObject {
            id: "run_mock".to_string(),
            status: self.next_status(),
            last_error: None,
        })
    }

    async fn list_messages(&self, _thread_id: &str) -> Result<Vec<MessageObject>, ExtractError> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        let content = match self.reply_text {
            Some(ref text) => vec![ContentBlock::Text {
                text: TextPayload {
                    value: text.clone(),
                },
            }],
            None => vec![ContentBlock::Other],
        };
        Ok(vec![MessageObject {
            id: "msg_reply".to_string(),
            role: "assistant".to_string(),
            content,
        }])
    }
}

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Config with millisecond polling so tests finish instantly.
fn fast_config() -> ExtractionConfig {
    ExtractionConfig::builder()
        .poll_interval_ms(1)
        .poll_interval_cap_ms(2)
        .max_polls(10)
        .build()
        .expect("valid config")
}

/// A small on-disk document for the upload stage to validate.
fn sample_document() -> tempfile::NamedTempFile {
    let mut tmp = tempfile::NamedTempFile::new().expect("temp file");
    tmp.write_all(b"1. Describe your encryption at rest.\n2. Do you hold SOC 2?\n")
        .expect("write");
    tmp
}

const FENCED_REPLY: &str = "```json\n{\"filename\":\"x.docx\",\"questions\":[\"Q1?\"]}\n```";

// ── Poller behaviour ─────────────────────────────────────────────────────────

#[tokio::test]
async fn poller_returns_messages_once_after_terminal_status() {
    let api = MockApi::new(
        &[
            RunStatus::Queued,
            RunStatus::InProgress,
            RunStatus::Completed,
        ],
        Some(FENCED_REPLY),
    );
    let config = fast_config();

    let outcome = poll::run_to_completion(&api, &config, "thread_mock", "asst_mock")
        .await
        .expect("run should complete");

    // Two polls moved queued → in_progress → completed; the terminal status
    // was not polled again.
    assert_eq!(outcome.polls, 2);
    assert_eq!(api.retrieves.load(Ordering::SeqCst), 2);
    assert_eq!(api.lists.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.messages.len(), 1);
}

#[tokio::test]
async fn poller_raises_run_failed_without_fetching_messages() {
    let api = MockApi::new(&[RunStatus::Queued, RunStatus::Failed], Some(FENCED_REPLY));
    let config = fast_config();

    let err = poll::run_to_completion(&api, &config, "thread_mock", "asst_mock")
        .await
        .unwrap_err();

    match err {
        ExtractError::RunFailed { status, .. } => assert_eq!(status, "failed"),
        other => panic!("expected RunFailed, got: {other}"),
    }
    assert_eq!(api.lists.load(Ordering::SeqCst), 0, "no data on failure");
}

#[tokio::test]
async fn poller_stops_at_budget_with_poll_timeout() {
    // Far more non-terminal statuses than the budget allows.
    let statuses = vec![RunStatus::InProgress; 50];
    let api = MockApi::new(&statuses, None);
    let config = ExtractionConfig::builder()
        .poll_interval_ms(1)
        .poll_interval_cap_ms(1)
        .max_polls(5)
        .build()
        .unwrap();

    let err = poll::run_to_completion(&api, &config, "thread_mock", "asst_mock")
        .await
        .unwrap_err();

    match err {
        ExtractError::PollTimeout { polls, status, .. } => {
            assert_eq!(polls, 5);
            assert_eq!(status, "in_progress");
        }
        other => panic!("expected PollTimeout, got: {other}"),
    }
    assert_eq!(api.retrieves.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn run_already_terminal_at_creation_needs_no_polls() {
    let api = MockApi::new(&[RunStatus::Completed], Some(FENCED_REPLY));
    let config = fast_config();

    let outcome = poll::run_to_completion(&api, &config, "thread_mock", "asst_mock")
        .await
        .unwrap();

    assert_eq!(outcome.polls, 0);
    assert_eq!(api.retrieves.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn requires_action_is_treated_as_failure() {
    let api = MockApi::new(&[RunStatus::RequiresAction], None);
    let config = fast_config();

    let err = poll::run_to_completion(&api, &config, "thread_mock", "asst_mock")
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::RunFailed { .. }));
}

// ── Uploader behaviour ───────────────────────────────────────────────────────

#[tokio::test]
async fn uploader_rejects_empty_file_id() {
    let api = MockApi::new(&[], None).with_file_id("");
    let doc = sample_document();

    let err = upload::upload_document(&api, doc.path()).await.unwrap_err();
    assert!(matches!(err, ExtractError::UploadRejected { .. }));
}

#[tokio::test]
async fn uploader_returns_the_service_id() {
    let api = MockApi::new(&[], None);
    let doc = sample_document();

    let id = upload::upload_document(&api, doc.path()).await.unwrap();
    assert_eq!(id, "file_mock");
}

// ── Full pipeline ────────────────────────────────────────────────────────────

#[tokio::test]
async fn full_pipeline_extracts_fenced_reply() {
    let api = MockApi::new(
        &[
            RunStatus::Queued,
            RunStatus::InProgress,
            RunStatus::Completed,
        ],
        Some(FENCED_REPLY),
    );
    let doc = sample_document();
    let config = fast_config();

    let output = extract_with(&api, doc.path().to_str().unwrap(), &config)
        .await
        .expect("pipeline should succeed");

    assert_eq!(output.question_set.filename, "x.docx");
    assert_eq!(output.question_set.questions, vec![serde_json::json!("Q1?")]);
    assert_eq!(output.stats.question_count, 1);
    assert_eq!(output.stats.polls, 2);
    assert_eq!(output.file_id, "file_mock");
    assert_eq!(output.thread_id, "thread_mock");
    assert_eq!(output.run_id, "run_mock");
    // No assistant id configured, so one was created for the run.
    assert_eq!(output.assistant_id, "asst_mock");
    assert_eq!(api.assistants_created.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn configured_assistant_id_skips_creation() {
    let api = MockApi::new(&[RunStatus::Completed], Some(FENCED_REPLY));
    let doc = sample_document();
    let config = ExtractionConfig::builder()
        .assistant_id("asst_pinned")
        .poll_interval_ms(1)
        .build()
        .unwrap();

    let output = extract_with(&api, doc.path().to_str().unwrap(), &config)
        .await
        .unwrap();

    assert_eq!(output.assistant_id, "asst_pinned");
    assert_eq!(api.assistants_created.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn knowledge_document_is_indexed_for_new_assistant() {
    let api = MockApi::new(&[RunStatus::Completed], Some(FENCED_REPLY));
    let doc = sample_document();
    let knowledge = sample_document();
    let config = ExtractionConfig::builder()
        .knowledge_document(knowledge.path())
        .poll_interval_ms(1)
        .build()
        .unwrap();

    let output = extract_with(&api, doc.path().to_str().unwrap(), &config)
        .await
        .unwrap();

    assert_eq!(output.assistant_id, "asst_mock");
    assert_eq!(api.vector_stores_created.load(Ordering::SeqCst), 1);
    assert_eq!(
        api.assistant_store.lock().unwrap().as_deref(),
        Some("vs_mock"),
        "new assistant should be bound to the knowledge store"
    );
}

#[tokio::test]
async fn knowledge_document_ignored_with_pinned_assistant() {
    let api = MockApi::new(&[RunStatus::Completed], Some(FENCED_REPLY));
    let doc = sample_document();
    let knowledge = sample_document();
    let config = ExtractionConfig::builder()
        .assistant_id("asst_pinned")
        .knowledge_document(knowledge.path())
        .poll_interval_ms(1)
        .build()
        .unwrap();

    let output = extract_with(&api, doc.path().to_str().unwrap(), &config)
        .await
        .unwrap();

    assert_eq!(output.assistant_id, "asst_pinned");
    assert_eq!(api.vector_stores_created.load(Ordering::SeqCst), 0);
    assert_eq!(api.assistants_created.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn unfenced_reply_parses_unchanged() {
    let api = MockApi::new(
        &[RunStatus::Completed],
        Some("{\"filename\":\"y.docx\",\"questions\":[]}"),
    );
    let doc = sample_document();

    let output = extract_with(&api, doc.path().to_str().unwrap(), &fast_config())
        .await
        .unwrap();
    assert_eq!(output.question_set.filename, "y.docx");
    assert!(output.question_set.questions.is_empty());
}

#[tokio::test]
async fn missing_fields_default_in_full_pipeline() {
    let api = MockApi::new(&[RunStatus::Completed], Some("{}"));
    let doc = sample_document();

    let output = extract_with(&api, doc.path().to_str().unwrap(), &fast_config())
        .await
        .unwrap();
    assert_eq!(output.question_set.filename, NO_FILENAME);
    assert!(output.question_set.questions.is_empty());
}

#[tokio::test]
async fn reply_without_text_is_not_found_error() {
    let api = MockApi::new(&[RunStatus::Completed], None);
    let doc = sample_document();

    let err = extract_with(&api, doc.path().to_str().unwrap(), &fast_config())
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::NoTextContent { .. }));
}

#[tokio::test]
async fn missing_document_fails_before_any_network_call() {
    let api = MockApi::new(&[], None);

    let err = extract_with(&api, "/no/such/questionnaire.docx", &fast_config())
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::FileNotFound { .. }));
    assert_eq!(api.retrieves.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn pipeline_result_persists_and_round_trips() {
    let api = MockApi::new(&[RunStatus::Completed], Some(FENCED_REPLY));
    let doc = sample_document();
    let out_dir = tempfile::tempdir().unwrap();
    let out_path = out_dir.path().join("answers.json");

    let output = extract_with(&api, doc.path().to_str().unwrap(), &fast_config())
        .await
        .unwrap();
    rfi2json::write_question_set(&output.question_set, &out_path)
        .await
        .unwrap();

    let on_disk: rfi2json::QuestionSet =
        serde_json::from_str(&std::fs::read_to_string(&out_path).unwrap()).unwrap();
    assert_eq!(on_disk, output.question_set);
}

// ── Live e2e (gated) ─────────────────────────────────────────────────────────

/// Runs the real pipeline against the live API. Needs E2E_ENABLED=1,
/// OPENAI_API_KEY, and RFI2JSON_E2E_DOC pointing at a questionnaire file.
#[tokio::test]
async fn live_extraction() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP — set E2E_ENABLED=1 to run live tests");
        return;
    }
    let doc = match std::env::var("RFI2JSON_E2E_DOC") {
        Ok(p) => p,
        Err(_) => {
            println!("SKIP — set RFI2JSON_E2E_DOC to a questionnaire document");
            return;
        }
    };

    let config = ExtractionConfig::builder()
        .max_polls(60)
        .build()
        .expect("valid config");

    let output = rfi2json::extract(&doc, &config)
        .await
        .expect("live extraction should succeed");

    assert!(!output.file_id.is_empty());
    assert!(!output.question_set.filename.is_empty());
    println!(
        "[live] {} questions from {} in {} polls",
        output.stats.question_count, output.question_set.filename, output.stats.polls
    );
}
