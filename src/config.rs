//! Configuration types for questionnaire extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across calls, log them, and diff two runs to
//! understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A dozen-field constructor is unreadable and breaks on every new field.
//! The builder lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::error::ExtractError;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default base URL for the Assistants API.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model used when the config creates a new assistant.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Observer invoked on every poll of a running extraction.
///
/// The CLI uses this to drive a spinner; library callers can ignore it.
/// Implementations must be cheap — they run inline in the polling loop.
pub trait PollObserver: Send + Sync {
    /// Called after each status check with the 1-based poll count and the
    /// raw status string the service reported.
    fn on_poll(&self, poll: u32, status: &str);
}

/// Shared handle to a [`PollObserver`].
pub type PollCallback = Arc<dyn PollObserver>;

/// Configuration for one questionnaire extraction.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use rfi2json::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .assistant_id("asst_dTGzcEDkc4gsweh3FaEidJ9l")
///     .poll_interval_ms(1000)
///     .max_polls(60)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Identifier of an existing assistant to run against.
    ///
    /// When `None`, a new assistant is created for the run from
    /// [`instructions`](Self::instructions) and its id is reported in
    /// [`crate::output::ExtractionOutput::assistant_id`] so the caller can
    /// pin it in their own configuration for subsequent runs.
    pub assistant_id: Option<String>,

    /// Model used when creating a new assistant. Default: "gpt-4o".
    ///
    /// Ignored when `assistant_id` is set — an existing assistant already
    /// carries its model.
    pub model: String,

    /// System-prompt-equivalent instruction text for a newly created
    /// assistant. If `None`, the built-in default from [`crate::prompts`]
    /// is used.
    pub instructions: Option<String>,

    /// Text of the single user message posted to the thread. If `None`,
    /// uses [`crate::prompts::DEFAULT_USER_MESSAGE`].
    pub user_message: Option<String>,

    /// Optional knowledge document indexed into a vector store and bound to
    /// a newly created assistant for `file_search`, giving it domain context
    /// beyond the questionnaire itself.
    ///
    /// Only relevant when `assistant_id` is `None`: an existing assistant
    /// already carries its own tool resources, so the document is ignored
    /// (with a warning) when both are set.
    pub knowledge_document: Option<PathBuf>,

    /// Initial delay between run-status polls, in milliseconds. Default: 2000.
    ///
    /// 2 s matches the latency profile of assistant runs: most finish within
    /// a handful of polls, and polling faster only burns rate-limit budget.
    pub poll_interval_ms: u64,

    /// Upper bound the exponential backoff grows to, in milliseconds.
    /// Default: 15 000.
    ///
    /// The delay doubles after each poll (2 s → 4 s → 8 s → 15 s → 15 s …)
    /// so long-running runs are checked less and less often without the
    /// caller ever waiting more than the cap between checks.
    pub poll_interval_cap_ms: u64,

    /// Maximum number of status polls before giving up. Default: 150.
    ///
    /// With the default backoff this bounds the wait at roughly 37 minutes.
    /// A bounded budget turns a hung remote run into a
    /// [`crate::error::ExtractError::PollTimeout`] instead of an unkillable
    /// process.
    pub max_polls: u32,

    /// Per-API-call timeout in seconds. Default: 120.
    ///
    /// Applies to each individual HTTP request, including the multipart
    /// upload — large .pptx/.docx documents can take a while on slow links.
    pub api_timeout_secs: u64,

    /// Base URL of the Assistants API. Default: `https://api.openai.com/v1`.
    ///
    /// Override to point at a proxy or a compatible self-hosted endpoint.
    pub base_url: String,

    /// Explicit API key. If `None`, `OPENAI_API_KEY` is read once when the
    /// HTTP client is constructed and reused for every call in the run.
    pub api_key: Option<String>,

    /// Optional per-poll observer (progress reporting).
    pub poll_observer: Option<PollCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            assistant_id: None,
            model: DEFAULT_MODEL.to_string(),
            instructions: None,
            user_message: None,
            knowledge_document: None,
            poll_interval_ms: 2000,
            poll_interval_cap_ms: 15_000,
            max_polls: 150,
            api_timeout_secs: 120,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            poll_observer: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("assistant_id", &self.assistant_id)
            .field("model", &self.model)
            .field("instructions", &self.instructions.as_ref().map(|s| s.len()))
            .field("user_message", &self.user_message)
            .field("knowledge_document", &self.knowledge_document)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .field("poll_interval_cap_ms", &self.poll_interval_cap_ms)
            .field("max_polls", &self.max_polls)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field(
                "poll_observer",
                &self.poll_observer.as_ref().map(|_| "<dyn PollObserver>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn assistant_id(mut self, id: impl Into<String>) -> Self {
        self.config.assistant_id = Some(id.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn instructions(mut self, text: impl Into<String>) -> Self {
        self.config.instructions = Some(text.into());
        self
    }

    pub fn user_message(mut self, text: impl Into<String>) -> Self {
        self.config.user_message = Some(text.into());
        self
    }

    pub fn knowledge_document(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.knowledge_document = Some(path.into());
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_ms = ms.max(1);
        self
    }

    pub fn poll_interval_cap_ms(mut self, ms: u64) -> Self {
        self.config.poll_interval_cap_ms = ms;
        self
    }

    pub fn max_polls(mut self, n: u32) -> Self {
        self.config.max_polls = n.max(1);
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn poll_observer(mut self, observer: PollCallback) -> Self {
        self.config.poll_observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, ExtractError> {
        let c = &self.config;
        if c.max_polls == 0 {
            return Err(ExtractError::InvalidConfig("max_polls must be ≥ 1".into()));
        }
        if c.poll_interval_cap_ms < c.poll_interval_ms {
            return Err(ExtractError::InvalidConfig(format!(
                "poll_interval_cap_ms ({}) must be ≥ poll_interval_ms ({})",
                c.poll_interval_cap_ms, c.poll_interval_ms
            )));
        }
        if c.model.is_empty() {
            return Err(ExtractError::InvalidConfig("model must not be empty".into()));
        }
        if let Some(ref id) = c.assistant_id {
            if id.is_empty() {
                return Err(ExtractError::InvalidConfig(
                    "assistant_id must not be empty when set".into(),
                ));
            }
        }
        Ok(self.config)
    }
}
