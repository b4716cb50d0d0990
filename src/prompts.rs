//! Instruction text for the extraction assistant.
//!
//! Centralising the prompts here serves two purposes:
//!
//! 1. **Single source of truth** — changing the extraction behaviour (e.g.
//!    asking for per-section grouping) requires editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the prompts directly without
//!    a live service, making regressions easy to catch.
//!
//! Callers can override both via [`crate::config::ExtractionConfig`]; the
//! constants here are used only when no override is provided.

/// Default instructions for an assistant created by this crate.
///
/// Used when `ExtractionConfig::instructions` is `None` and no existing
/// assistant id is configured. The JSON shape demanded here is what
/// [`crate::pipeline::extract`] parses, so the two must stay in sync.
pub const DEFAULT_INSTRUCTIONS: &str = r#"You are a questionnaire analyst. You receive RFI/RFP documents (spreadsheets, presentations, or word-processor files) and extract every question they contain.

Follow these rules precisely:

1. COMPLETENESS
   - Extract ALL questions, including numbered items phrased as requests ("Describe your...", "Provide details of...")
   - Keep the document's original ordering
   - Do not merge, split, or rephrase questions

2. OUTPUT FORMAT
   - Respond with a single JSON object and nothing else
   - Top-level keys: "filename" (the source document's name) and "questions" (an array)
   - Do not add commentary before or after the JSON"#;

/// Default text of the single user message posted to the thread.
pub const DEFAULT_USER_MESSAGE: &str =
    "Extract all questions from the attached document and format them in JSON.";

/// Name given to assistants created by this crate.
pub const ASSISTANT_NAME: &str = "rfi2json Question Extractor";

use crate::error::ExtractError;
use std::path::Path;

/// Read override instructions from a text file.
///
/// The CLI's `--instructions` flag routes through here; library callers can
/// use it to load instruction text they keep alongside their own config.
pub async fn load_instructions(path: impl AsRef<Path>) -> Result<String, ExtractError> {
    let path = path.as_ref();
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ExtractError::InstructionsUnreadable {
            path: path.to_path_buf(),
            source,
        })
}
