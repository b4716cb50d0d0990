//! Top-level extraction entry points.
//!
//! One invocation is one strictly sequential pass: upload → session → run →
//! extract. Each stage's output is the next stage's sole input, and any
//! error aborts the run — there is no partial-success mode. The only
//! suspension point is the poller's backoff sleep.

use crate::api::{AssistantsApi, HttpAssistantsClient};
use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::output::{ExtractionOutput, ExtractionStats};
use crate::pipeline::{extract as reply, poll, session, upload};
use crate::prompts::{ASSISTANT_NAME, DEFAULT_INSTRUCTIONS};
use std::path::Path;
use std::time::Instant;
use tracing::{info, warn};

/// Name given to the vector store holding a knowledge document.
const KNOWLEDGE_STORE_NAME: &str = "rfi2json Knowledge Store";

/// Extract the questions from a local document.
///
/// This is the primary entry point for the library. The HTTP client is
/// constructed from the config (API key resolved once, reused for every
/// call in the run).
///
/// # Arguments
/// * `input` — path to the local document (.xlsx, .pptx, .docx, …)
/// * `config` — extraction configuration
///
/// # Errors
/// Every failure is fatal and surfaces as an [`ExtractError`]: bad path,
/// rejected upload, session-creation failure, failed or timed-out run,
/// missing text content, or malformed JSON in the reply.
pub async fn extract(
    input: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let api = HttpAssistantsClient::new(config)?;
    extract_with(&api, input.as_ref(), config).await
}

/// Like [`extract`], but against a caller-supplied [`AssistantsApi`].
///
/// This is the seam integration tests use to drive the pipeline with a
/// scripted mock; it is also the hook for callers that need custom
/// middleware around the HTTP client.
pub async fn extract_with(
    api: &dyn AssistantsApi,
    input: &str,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let total_start = Instant::now();
    info!("Starting extraction: {}", input);

    // ── Step 1: Validate and upload the document ─────────────────────────
    let path = upload::validate_document(input)?;
    let upload_start = Instant::now();
    let file_id = upload::upload_document(api, &path).await?;
    let upload_duration_ms = upload_start.elapsed().as_millis() as u64;

    // ── Step 2: Resolve the assistant ────────────────────────────────────
    let assistant_id = resolve_assistant(api, config).await?;

    // ── Step 3: Create the session ───────────────────────────────────────
    let session = session::start_session(api, config, &file_id).await?;

    // ── Step 4: Run and poll to completion ───────────────────────────────
    let poll_start = Instant::now();
    let outcome = poll::run_to_completion(api, config, &session.thread_id, &assistant_id).await?;
    let poll_duration_ms = poll_start.elapsed().as_millis() as u64;

    // ── Step 5: Extract the question set from the reply ──────────────────
    let question_set = reply::extract_question_set(&outcome.messages)?;

    let stats = ExtractionStats {
        question_count: question_set.questions.len(),
        polls: outcome.polls,
        upload_duration_ms,
        poll_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Extraction complete: {} questions, {} polls, {}ms total",
        stats.question_count, stats.polls, stats.total_duration_ms
    );

    Ok(ExtractionOutput {
        question_set,
        stats,
        file_id,
        thread_id: session.thread_id,
        run_id: outcome.run_id,
        assistant_id,
    })
}

/// Extract and persist the result to `output_path` in one call.
///
/// Nothing is written unless extraction succeeded end to end.
pub async fn extract_to_file(
    input: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    let output = extract(input, config).await?;
    crate::persist::write_question_set(&output.question_set, output_path).await?;
    Ok(output)
}

/// Synchronous wrapper around [`extract`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    input: impl AsRef<str>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, ExtractError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ExtractError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(extract(input, config))
}

/// Use the configured assistant, or create one for this run.
///
/// Creation uses the configured instructions (or the built-in default) and
/// enables `file_search`. If a knowledge document is configured, it is
/// uploaded, indexed into a vector store, and bound to the new assistant's
/// tool resources. The id of a per-run assistant is surfaced in
/// [`ExtractionOutput::assistant_id`] so callers can pin it in their own
/// configuration instead of creating a fresh one every run.
async fn resolve_assistant(
    api: &dyn AssistantsApi,
    config: &ExtractionConfig,
) -> Result<String, ExtractError> {
    if let Some(ref id) = config.assistant_id {
        if config.knowledge_document.is_some() {
            warn!(
                "Ignoring knowledge document: assistant {} already carries its tool resources",
                id
            );
        }
        return Ok(id.clone());
    }

    let vector_store_id = match config.knowledge_document {
        Some(ref doc) => Some(index_knowledge_document(api, doc).await?),
        None => None,
    };

    let instructions = config
        .instructions
        .as_deref()
        .unwrap_or(DEFAULT_INSTRUCTIONS);
    let id = api
        .create_assistant(
            ASSISTANT_NAME,
            &config.model,
            instructions,
            vector_store_id.as_deref(),
        )
        .await?;
    info!(
        "Created assistant {} (model: {}); pass --assistant {} to reuse it",
        id, config.model, id
    );
    Ok(id)
}

/// Upload a knowledge document and index it into a fresh vector store.
async fn index_knowledge_document(
    api: &dyn AssistantsApi,
    doc: &Path,
) -> Result<String, ExtractError> {
    let path = upload::validate_document(&doc.to_string_lossy())?;
    let file_id = upload::upload_document(api, &path).await?;
    let store_id = api
        .create_vector_store(KNOWLEDGE_STORE_NAME, &file_id)
        .await?;
    info!(
        "Indexed knowledge document '{}' into vector store {}",
        path.display(),
        store_id
    );
    Ok(store_id)
}
