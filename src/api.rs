//! Remote-service boundary: the Assistants API trait and its HTTP client.
//!
//! The pipeline never talks to reqwest directly — it goes through the
//! [`AssistantsApi`] trait, so tests can drive the poller and extractor with
//! a scripted mock instead of a live service, and a future provider swap
//! only touches this module.
//!
//! ## Wire format
//!
//! Types here target the **Assistants API v2** (`OpenAI-Beta: assistants=v2`).
//! Earlier revisions of the API exposed message content both as plain dicts
//! and as typed blocks; v2 settled on tagged content blocks
//! (`{"type": "text", "text": {"value": …}}`) and that is the one schema
//! this crate deserialises. Unknown block types are tolerated and skipped.

use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

// ── Wire types ───────────────────────────────────────────────────────────

/// Status enumeration of a remote run.
///
/// Transitions are driven entirely by the service; this crate only observes
/// them. `Unknown` absorbs statuses added by future API revisions so a new
/// status string degrades to a poll-until-budget rather than a parse error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Whether the run can make no further progress.
    ///
    /// `requires_action` is terminal for this crate: the extraction
    /// pipeline submits no tool outputs, so a run waiting on them will
    /// never resume.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed
                | RunStatus::Failed
                | RunStatus::Cancelled
                | RunStatus::Expired
                | RunStatus::Incomplete
                | RunStatus::RequiresAction
        )
    }

    /// Stable lowercase name, matching the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Expired => "expired",
            RunStatus::Unknown => "unknown",
        }
    }
}

/// An uploaded file, as reported by the service.
#[derive(Debug, Clone, Deserialize)]
pub struct FileObject {
    /// Opaque reference id, valid for the lifetime of the remote file.
    pub id: String,
    /// Original filename echoed back by the service.
    #[serde(default)]
    pub filename: Option<String>,
}

/// One run of an assistant against a thread.
#[derive(Debug, Clone, Deserialize)]
pub struct RunObject {
    pub id: String,
    pub status: RunStatus,
    /// Populated by the service when `status` is `failed`.
    #[serde(default)]
    pub last_error: Option<RunError>,
}

/// Error details attached to a failed run.
#[derive(Debug, Clone, Deserialize)]
pub struct RunError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl RunError {
    /// Single-line human-readable summary.
    pub fn summary(&self) -> String {
        match (&self.code, &self.message) {
            (Some(c), Some(m)) => format!("{c}: {m}"),
            (Some(c), None) => c.clone(),
            (None, Some(m)) => m.clone(),
            (None, None) => "no error details provided".to_string(),
        }
    }
}

/// A message in a thread.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageObject {
    pub id: String,
    pub role: String,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

/// One unit of a message's body.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// A text payload (the only kind the extractor reads).
    Text { text: TextPayload },
    /// Any block type this crate does not understand (images, files, …).
    #[serde(other)]
    Other,
}

impl ContentBlock {
    /// The text value, if this block carries one.
    pub fn text_value(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(&text.value),
            ContentBlock::Other => None,
        }
    }
}

/// The inner payload of a text content block.
#[derive(Debug, Clone, Deserialize)]
pub struct TextPayload {
    pub value: String,
}

#[derive(Debug, Deserialize)]
struct ObjectId {
    id: String,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    data: Vec<MessageObject>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<ApiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: Option<String>,
}

// ── The seam ─────────────────────────────────────────────────────────────

/// The remote operations the pipeline needs, one method each.
///
/// Implemented by [`HttpAssistantsClient`] in production and by scripted
/// mocks in tests.
#[async_trait]
pub trait AssistantsApi: Send + Sync {
    /// Upload a local file tagged for assistant use; returns its reference.
    async fn upload_file(&self, path: &Path) -> Result<FileObject, ExtractError>;

    /// Create a vector store containing `file_id`, indexing it for
    /// `file_search`. Returns the store id.
    async fn create_vector_store(
        &self,
        name: &str,
        file_id: &str,
    ) -> Result<String, ExtractError>;

    /// Create a new assistant with the `file_search` tool enabled,
    /// optionally bound to a vector store of knowledge documents.
    /// Returns its id.
    async fn create_assistant(
        &self,
        name: &str,
        model: &str,
        instructions: &str,
        vector_store_id: Option<&str>,
    ) -> Result<String, ExtractError>;

    /// Create a new, empty thread. Returns its id.
    async fn create_thread(&self) -> Result<String, ExtractError>;

    /// Append a role-`user` message to the thread, attaching `file_id` for
    /// `file_search`. Returns the message id.
    async fn create_message(
        &self,
        thread_id: &str,
        text: &str,
        file_id: &str,
    ) -> Result<String, ExtractError>;

    /// Start a run of `assistant_id` against `thread_id`.
    async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
    ) -> Result<RunObject, ExtractError>;

    /// Fetch the current state of a run.
    async fn retrieve_run(
        &self,
        thread_id: &str,
        run_id: &str,
    ) -> Result<RunObject, ExtractError>;

    /// List the thread's messages, newest first (the API's default order).
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<MessageObject>, ExtractError>;
}

// ── HTTP implementation ──────────────────────────────────────────────────

/// reqwest-backed [`AssistantsApi`] implementation.
///
/// The API key is resolved once at construction (explicit config value,
/// else `OPENAI_API_KEY`) and reused for every call in the run.
pub struct HttpAssistantsClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl HttpAssistantsClient {
    /// Build a client from the config, resolving the API key.
    pub fn new(config: &ExtractionConfig) -> Result<Self, ExtractError> {
        let api_key = match config.api_key.clone() {
            Some(k) if !k.is_empty() => k,
            _ => std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.is_empty())
                .ok_or(ExtractError::MissingApiKey)?,
        };

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_secs))
            .build()
            .map_err(|e| ExtractError::Internal(format!("HTTP client build failed: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    /// Common request decoration: bearer auth plus the v2 beta header.
    fn decorate(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req.bearer_auth(&self.api_key)
            .header("OpenAI-Beta", "assistants=v2")
    }

    /// Check status and deserialise, mapping failures to typed errors.
    async fn read_response<T: serde::de::DeserializeOwned>(
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<T, ExtractError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or(body);
            return Err(ExtractError::ApiRequest {
                endpoint: endpoint.to_string(),
                detail: format!("HTTP {status}: {detail}"),
            });
        }
        response
            .json::<T>()
            .await
            .map_err(|e| ExtractError::ApiResponse {
                endpoint: endpoint.to_string(),
                detail: e.to_string(),
            })
    }

    async fn post_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
        body: serde_json::Value,
    ) -> Result<T, ExtractError> {
        let response = self
            .decorate(self.http.post(self.url(endpoint)))
            .json(&body)
            .send()
            .await
            .map_err(|e| ExtractError::ApiRequest {
                endpoint: endpoint.to_string(),
                detail: e.to_string(),
            })?;
        Self::read_response(endpoint, response).await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        endpoint: &str,
    ) -> Result<T, ExtractError> {
        let response = self
            .decorate(self.http.get(self.url(endpoint)))
            .send()
            .await
            .map_err(|e| ExtractError::ApiRequest {
                endpoint: endpoint.to_string(),
                detail: e.to_string(),
            })?;
        Self::read_response(endpoint, response).await
    }
}

#[async_trait]
impl AssistantsApi for HttpAssistantsClient {
    async fn upload_file(&self, path: &Path) -> Result<FileObject, ExtractError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => ExtractError::FileNotFound {
                    path: path.to_path_buf(),
                },
                std::io::ErrorKind::PermissionDenied => ExtractError::PermissionDenied {
                    path: path.to_path_buf(),
                },
                _ => ExtractError::Internal(format!("read '{}': {e}", path.display())),
            })?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());

        let form = reqwest::multipart::Form::new()
            .text("purpose", "assistants")
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(filename),
            );

        let response = self
            .decorate(self.http.post(self.url("files")))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ExtractError::UploadRejected {
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiErrorBody>(&body)
                .ok()
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or(body);
            return Err(ExtractError::UploadRejected {
                detail: format!("HTTP {status}: {detail}"),
            });
        }

        let file: FileObject =
            response
                .json()
                .await
                .map_err(|e| ExtractError::ApiResponse {
                    endpoint: "files".to_string(),
                    detail: e.to_string(),
                })?;
        debug!("Uploaded '{}' as {}", path.display(), file.id);
        Ok(file)
    }

    async fn create_vector_store(
        &self,
        name: &str,
        file_id: &str,
    ) -> Result<String, ExtractError> {
        let body = json!({
            "name": name,
            "file_ids": [file_id],
        });
        let created: ObjectId = self
            .post_json("vector_stores", body)
            .await
            .map_err(|e| wrap_session("vector store", e))?;
        debug!("Created vector store {}", created.id);
        Ok(created.id)
    }

    async fn create_assistant(
        &self,
        name: &str,
        model: &str,
        instructions: &str,
        vector_store_id: Option<&str>,
    ) -> Result<String, ExtractError> {
        let mut body = json!({
            "name": name,
            "model": model,
            "instructions": instructions,
            "tools": [{"type": "file_search"}],
        });
        if let Some(store) = vector_store_id {
            body["tool_resources"] = json!({
                "file_search": {"vector_store_ids": [store]},
            });
        }
        let created: ObjectId = self
            .post_json("assistants", body)
            .await
            .map_err(|e| wrap_session("assistant", e))?;
        debug!("Created assistant {}", created.id);
        Ok(created.id)
    }

    async fn create_thread(&self) -> Result<String, ExtractError> {
        let created: ObjectId = self
            .post_json("threads", json!({}))
            .await
            .map_err(|e| wrap_session("thread", e))?;
        debug!("Created thread {}", created.id);
        Ok(created.id)
    }

    async fn create_message(
        &self,
        thread_id: &str,
        text: &str,
        file_id: &str,
    ) -> Result<String, ExtractError> {
        let body = json!({
            "role": "user",
            "content": text,
            "attachments": [{
                "file_id": file_id,
                "tools": [{"type": "file_search"}],
            }],
        });
        let endpoint = format!("threads/{thread_id}/messages");
        let created: ObjectId = self
            .post_json(&endpoint, body)
            .await
            .map_err(|e| wrap_session("message", e))?;
        Ok(created.id)
    }

    async fn create_run(
        &self,
        thread_id: &str,
        assistant_id: &str,
    ) -> Result<RunObject, ExtractError> {
        let endpoint = format!("threads/{thread_id}/runs");
        let run: RunObject = self
            .post_json(&endpoint, json!({"assistant_id": assistant_id}))
            .await
            .map_err(|e| wrap_session("run", e))?;
        debug!("Created run {} (status: {})", run.id, run.status.as_str());
        Ok(run)
    }

    async fn retrieve_run(
        &self,
        thread_id: &str,
        run_id: &str,
    ) -> Result<RunObject, ExtractError> {
        self.get_json(&format!("threads/{thread_id}/runs/{run_id}"))
            .await
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<MessageObject>, ExtractError> {
        let list: MessageList = self
            .get_json(&format!("threads/{thread_id}/messages"))
            .await?;
        Ok(list.data)
    }
}

/// Re-tag an API transport error as a session-creation failure so the
/// message names the resource that could not be created.
fn wrap_session(resource: &str, err: ExtractError) -> ExtractError {
    match err {
        ExtractError::ApiRequest { detail, .. } | ExtractError::ApiResponse { detail, .. } => {
            ExtractError::SessionFailed {
                resource: resource.to_string(),
                detail,
            }
        }
        other => other,
    }
}
