//! Session initiation: create a thread and post the instruction message.
//!
//! Exactly one user message is ever sent. It carries the uploaded document
//! as an attachment and declares `file_search` as the capability the
//! assistant should use to answer, so the service indexes the file into the
//! thread's search scope before the run starts. Any creation failure aborts
//! the run — there is nothing sensible to retry at this layer.

use crate::api::AssistantsApi;
use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use crate::prompts::DEFAULT_USER_MESSAGE;
use tracing::{debug, info};

/// A freshly initiated remote session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Id of the thread holding the conversation.
    pub thread_id: String,
    /// Id of the single user message that was posted.
    pub message_id: String,
}

/// Create a thread and post the instruction message referencing `file_id`.
pub async fn start_session(
    api: &dyn AssistantsApi,
    config: &ExtractionConfig,
    file_id: &str,
) -> Result<Session, ExtractError> {
    let thread_id = api.create_thread().await?;
    debug!("Created thread {}", thread_id);

    let text = config.user_message.as_deref().unwrap_or(DEFAULT_USER_MESSAGE);
    let message_id = api.create_message(&thread_id, text, file_id).await?;

    info!("Session ready: thread {} message {}", thread_id, message_id);
    Ok(Session {
        thread_id,
        message_id,
    })
}
