//! # rfi2json
//!
//! Extract questionnaire questions from RFI/RFP documents into structured
//! JSON using the OpenAI Assistants API.
//!
//! ## Why this crate?
//!
//! Security questionnaires arrive as spreadsheets, slide decks, and Word
//! documents with wildly inconsistent layouts — numbered lists, tables,
//! prose paragraphs containing three questions each. Instead of a parser
//! per layout, this crate uploads the document to an assistant configured
//! for document search and lets the model read it as a human would,
//! producing one canonical `{filename, questions}` JSON structure.
//!
//! ## Pipeline Overview
//!
//! ```text
//! document
//!  │
//!  ├─ 1. Upload    validate the local file, obtain a remote file id
//!  ├─ 2. Session   create a thread + post one instruction message
//!  ├─ 3. Run       start the assistant run, poll with bounded backoff
//!  ├─ 4. Extract   first text block → strip optional ```json fence → parse
//!  └─ 5. Persist   pretty-printed JSON, written atomically
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rfi2json::{extract, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key read once from OPENAI_API_KEY
//!     let config = ExtractionConfig::builder()
//!         .assistant_id("asst_dTGzcEDkc4gsweh3FaEidJ9l")
//!         .build()?;
//!     let output = extract("questionnaire.docx", &config).await?;
//!     println!("{}", serde_json::to_string_pretty(&output.question_set)?);
//!     eprintln!("{} questions in {} polls",
//!         output.stats.question_count,
//!         output.stats.polls);
//!     Ok(())
//! }
//! ```
//!
//! Omit `assistant_id` and a new assistant is created for the run from the
//! built-in instructions; its id comes back in the output so you can pin it
//! for subsequent runs.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `rfi2json` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library to avoid pulling in CLI-only deps:
//! ```toml
//! rfi2json = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod persist;
pub mod pipeline;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use api::{AssistantsApi, ContentBlock, HttpAssistantsClient, MessageObject, RunStatus};
pub use config::{ExtractionConfig, ExtractionConfigBuilder, PollCallback, PollObserver};
pub use error::ExtractError;
pub use extract::{extract, extract_sync, extract_to_file, extract_with};
pub use output::{ExtractionOutput, ExtractionStats, QuestionSet, NO_FILENAME};
pub use persist::write_question_set;
