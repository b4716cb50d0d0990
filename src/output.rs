//! Output types: the extracted question set plus run statistics.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinel filename used when the assistant's reply omits one.
pub const NO_FILENAME: &str = "No filename found";

/// The canonical structure extracted from the assistant's reply.
///
/// Both fields always have a value: a reply that omits `filename` gets the
/// [`NO_FILENAME`] sentinel, and a reply that omits `questions` gets an
/// empty list. Downstream consumers never see null or missing keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSet {
    /// Name of the source document as reported by the assistant.
    pub filename: String,
    /// Ordered question entries. The element shape is whatever the
    /// assistant produced — plain strings for some instruction sets,
    /// objects with section/answer fields for others — so it stays untyped.
    pub questions: Vec<Value>,
}

impl QuestionSet {
    /// Build a `QuestionSet` from a parsed reply, applying the defaults.
    pub fn from_reply(reply: &Value) -> Self {
        let filename = reply
            .get("filename")
            .and_then(Value::as_str)
            .unwrap_or(NO_FILENAME)
            .to_string();
        let questions = reply
            .get("questions")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Self {
            filename,
            questions,
        }
    }
}

/// Statistics for one extraction run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Number of questions in the extracted set.
    pub question_count: usize,
    /// Status polls issued before the run reached a terminal status.
    pub polls: u32,
    /// Wall-clock time spent uploading the document.
    pub upload_duration_ms: u64,
    /// Wall-clock time from run creation to the terminal status.
    pub poll_duration_ms: u64,
    /// Total wall-clock time for the whole extraction.
    pub total_duration_ms: u64,
}

/// Result of a successful extraction.
///
/// Carries the remote resource ids alongside the data so callers can pin a
/// per-run-created assistant in their configuration, or correlate a run
/// with the service's dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// The extracted questions.
    pub question_set: QuestionSet,
    /// Run statistics.
    pub stats: ExtractionStats,
    /// Id of the uploaded document (remote-side, valid for this run only).
    pub file_id: String,
    /// Id of the thread the extraction ran in.
    pub thread_id: String,
    /// Id of the run.
    pub run_id: String,
    /// Id of the assistant used. When the config supplied no
    /// `assistant_id`, this is the id of the assistant created for the run.
    pub assistant_id: String,
}
