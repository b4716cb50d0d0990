//! Error types for the rfi2json library.
//!
//! Every error here is fatal: the pipeline has no partial-success mode.
//! Either a complete question set is extracted and persisted, or the run
//! aborts and nothing is written. Variants are grouped by where in the
//! pipeline they can occur so a caller reading a message can tell a local
//! problem (bad path, unwritable output) from a remote one (rejected
//! upload, failed run).

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the rfi2json library.
#[derive(Debug, Error)]
pub enum ExtractError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Source document was not found at the given path.
    #[error("Document not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the document.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The source document exists but is empty.
    #[error("Document is empty: '{path}'")]
    EmptyDocument { path: PathBuf },

    /// The instructions file could not be read.
    #[error("Failed to read instructions from '{path}': {source}")]
    InstructionsUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Remote-service errors ─────────────────────────────────────────────
    /// No API key was configured or present in the environment.
    #[error("No API key configured.\nSet OPENAI_API_KEY or pass one explicitly via ExtractionConfig.")]
    MissingApiKey,

    /// The service rejected the file upload (size/type limits, auth).
    #[error("Upload rejected by the service: {detail}")]
    UploadRejected { detail: String },

    /// Creating the assistant, thread, message, or run failed.
    #[error("Failed to create remote {resource}: {detail}")]
    SessionFailed { resource: String, detail: String },

    /// A request to the service failed at the HTTP level.
    #[error("API request to '{endpoint}' failed: {detail}")]
    ApiRequest { endpoint: String, detail: String },

    /// The service returned a response body we could not deserialise.
    #[error("Unexpected response from '{endpoint}': {detail}")]
    ApiResponse { endpoint: String, detail: String },

    // ── Run errors ────────────────────────────────────────────────────────
    /// The remote run reached a terminal status other than `completed`.
    #[error("Assistant run {run_id} ended with status '{status}'{}", detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    RunFailed {
        run_id: String,
        status: String,
        detail: Option<String>,
    },

    /// The polling budget was exhausted before the run reached a terminal
    /// status. The run may still complete remotely; raise `max_polls` or
    /// the backoff cap to wait longer.
    #[error("Run {run_id} still '{status}' after {polls} polls ({elapsed_ms}ms)\nIncrease --max-polls to wait longer.")]
    PollTimeout {
        run_id: String,
        status: String,
        polls: u32,
        elapsed_ms: u64,
    },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// The assistant's reply carried no content block with a text payload.
    #[error("No text content found in the assistant's reply ({blocks} content blocks scanned)")]
    NoTextContent { blocks: usize },

    /// The thread contained no messages at all.
    #[error("No messages found in the thread")]
    EmptyThread,

    /// The text payload was not valid JSON after fence stripping.
    #[error("Failed to parse assistant reply as JSON: {source}\nPayload started with: {snippet:?}")]
    MalformedReply {
        snippet: String,
        #[source]
        source: serde_json::Error,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the output JSON file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}
