//! Reply extraction: locate the text payload and parse the question set.
//!
//! Assistants frequently wrap JSON replies in a ```` ```json ```` fence even
//! when told not to. The fence is detected by an anchored prefix/suffix
//! regex and stripped only when actually present — an unfenced payload
//! passes through untouched. Slicing a fixed number of characters off each
//! end would silently corrupt unfenced replies, so that is never done here.

use crate::api::MessageObject;
use crate::error::ExtractError;
use crate::output::QuestionSet;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static RE_JSON_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:json)?\s*\n?(.*?)\n?```\s*$").unwrap());

/// Strip an optional outer ```json fence from the payload.
///
/// No-op when the fence is absent. The language tag is optional; a bare
/// ``` ``` ``` fence is stripped too.
pub fn strip_json_fence(payload: &str) -> &str {
    match RE_JSON_FENCE.captures(payload.trim()) {
        Some(caps) => caps.get(1).map_or("", |m| m.as_str()),
        None => payload.trim(),
    }
}

/// Extract the canonical question set from a thread's message list.
///
/// Reads the first message (the list arrives newest first, so that is the
/// assistant's reply), scans its content blocks for the first one exposing
/// a text value, strips an optional fence, parses the remainder as JSON,
/// and applies the field defaults from [`QuestionSet::from_reply`].
pub fn extract_question_set(messages: &[MessageObject]) -> Result<QuestionSet, ExtractError> {
    let message = messages.first().ok_or(ExtractError::EmptyThread)?;
    debug!(
        "Extracting from message {} (role: {}, {} blocks)",
        message.id,
        message.role,
        message.content.len()
    );

    let text = message
        .content
        .iter()
        .find_map(|block| block.text_value())
        .ok_or(ExtractError::NoTextContent {
            blocks: message.content.len(),
        })?;

    let stripped = strip_json_fence(text);
    let reply: serde_json::Value =
        serde_json::from_str(stripped).map_err(|source| ExtractError::MalformedReply {
            snippet: stripped.chars().take(40).collect(),
            source,
        })?;

    Ok(QuestionSet::from_reply(&reply))
}
