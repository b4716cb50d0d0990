//! CLI binary for rfi2json.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig` and prints results.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rfi2json::{
    extract, write_question_set, ExtractionConfig, PollCallback, PollObserver,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI poll observer using indicatif ────────────────────────────────────────

/// Terminal spinner that reports the run's status on every poll.
struct CliPollObserver {
    bar: ProgressBar,
}

impl CliPollObserver {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Extracting");
        bar.set_message("uploading document…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl PollObserver for CliPollObserver {
    fn on_poll(&self, poll: u32, status: &str) {
        self.bar
            .set_message(format!("run is {status} (poll {poll})"));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract to stdout with a one-off assistant
  rfi2json questionnaire.docx

  # Extract to a file, reusing an existing assistant
  rfi2json --assistant asst_abc123 questionnaire.xlsx -o answers.json

  # Custom instructions and model
  rfi2json --instructions instructions.txt --model gpt-4o rfi.pptx

  # Give the new assistant a knowledge document to search while answering
  rfi2json --knowledge product-sheet.docx questionnaire.docx

  # Full run details as JSON (stats, ids)
  rfi2json --json questionnaire.docx > run.json

  # Impatient polling for small documents
  rfi2json --poll-interval 500 --max-polls 60 small.docx

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY        API key (read once at startup, required)
  RFI2JSON_ASSISTANT    Default assistant id
  RFI2JSON_MODEL        Default model for created assistants
  RFI2JSON_KNOWLEDGE    Default knowledge document for created assistants

SETUP:
  1. Set API key:    export OPENAI_API_KEY=sk-...
  2. Extract:        rfi2json questionnaire.docx -o answers.json

  The first run without --assistant creates an assistant and prints its id;
  pass it back via --assistant (or RFI2JSON_ASSISTANT) to avoid creating a
  new one every run.
"#;

/// Extract questionnaire questions from RFI/RFP documents to JSON.
#[derive(Parser, Debug)]
#[command(
    name = "rfi2json",
    version,
    about = "Extract questionnaire questions from RFI/RFP documents to JSON",
    long_about = "Upload an RFI/RFP document (spreadsheet, presentation, or word-processor \
file) to an OpenAI assistant configured for document search, wait for the run to finish, \
and write the extracted questions as structured JSON.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local document path (.xlsx, .pptx, .docx, …).
    input: String,

    /// Write the question set to this file instead of stdout.
    #[arg(short, long, env = "RFI2JSON_OUTPUT")]
    output: Option<PathBuf>,

    /// Existing assistant id to run against.
    #[arg(
        long,
        env = "RFI2JSON_ASSISTANT",
        long_help = "Id of an existing assistant (asst_…). When omitted, a new assistant is \
created from the instructions for this run and its id is printed so you can reuse it."
    )]
    assistant: Option<String>,

    /// Model for a newly created assistant.
    #[arg(long, env = "RFI2JSON_MODEL", default_value = "gpt-4o")]
    model: String,

    /// Path to a text file with custom assistant instructions.
    #[arg(long, env = "RFI2JSON_INSTRUCTIONS")]
    instructions: Option<PathBuf>,

    /// Knowledge document to index for a newly created assistant.
    #[arg(
        long,
        env = "RFI2JSON_KNOWLEDGE",
        long_help = "Path to a document uploaded into a vector store and bound to the new \
assistant's file_search tool, giving it reference material beyond the questionnaire. \
Ignored when --assistant is set."
    )]
    knowledge: Option<PathBuf>,

    /// Override the user message posted to the thread.
    #[arg(long, env = "RFI2JSON_MESSAGE")]
    message: Option<String>,

    /// Initial delay between run-status polls, in milliseconds.
    #[arg(long, env = "RFI2JSON_POLL_INTERVAL", default_value_t = 2000)]
    poll_interval: u64,

    /// Upper bound for the poll backoff, in milliseconds.
    #[arg(long, env = "RFI2JSON_POLL_CAP", default_value_t = 15_000)]
    poll_cap: u64,

    /// Maximum number of status polls before giving up.
    #[arg(long, env = "RFI2JSON_MAX_POLLS", default_value_t = 150)]
    max_polls: u32,

    /// Per-API-call timeout in seconds.
    #[arg(long, env = "RFI2JSON_API_TIMEOUT", default_value_t = 120)]
    api_timeout: u64,

    /// Base URL of the Assistants API.
    #[arg(long, env = "RFI2JSON_BASE_URL", default_value = "https://api.openai.com/v1")]
    base_url: String,

    /// Print the full run output (stats, ids) as JSON instead of just the
    /// question set.
    #[arg(long, env = "RFI2JSON_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "RFI2JSON_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "RFI2JSON_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the result.
    #[arg(short, long, env = "RFI2JSON_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the spinner is active; the
    // spinner provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let observer = show_progress.then(CliPollObserver::new);
    let config = build_config(&cli, observer.clone().map(|o| o as PollCallback)).await?;

    // ── Run extraction ───────────────────────────────────────────────────
    let result = extract(&cli.input, &config).await;
    if let Some(ref obs) = observer {
        obs.finish();
    }
    let output = result.context("Extraction failed")?;

    // ── Persist / print ──────────────────────────────────────────────────
    if let Some(ref output_path) = cli.output {
        write_question_set(&output.question_set, output_path)
            .await
            .context("Failed to write output")?;

        if !cli.quiet {
            eprintln!(
                "{}  {} questions  {} polls  {}ms  →  {}",
                green("✔"),
                bold(&output.stats.question_count.to_string()),
                output.stats.polls,
                output.stats.total_duration_ms,
                bold(&output_path.display().to_string()),
            );
        }
    } else if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    } else {
        let json = serde_json::to_string_pretty(&output.question_set)
            .context("Failed to serialise question set")?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(json.as_bytes())
            .context("Failed to write to stdout")?;
        handle.write_all(b"\n").ok();

        if !cli.quiet {
            eprintln!(
                "   {} questions  {} polls  {}ms total",
                dim(&output.stats.question_count.to_string()),
                output.stats.polls,
                output.stats.total_duration_ms,
            );
        }
    }

    // Surface a per-run-created assistant id so the user can pin it.
    if cli.assistant.is_none() && !cli.quiet {
        eprintln!(
            "   created assistant {} — pass --assistant {} to reuse it",
            dim(&output.assistant_id),
            output.assistant_id,
        );
    }

    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli, observer: Option<PollCallback>) -> Result<ExtractionConfig> {
    let instructions = match cli.instructions {
        Some(ref path) => Some(rfi2json::prompts::load_instructions(path).await?),
        None => None,
    };

    let mut builder = ExtractionConfig::builder()
        .model(cli.model.clone())
        .poll_interval_ms(cli.poll_interval)
        .poll_interval_cap_ms(cli.poll_cap)
        .max_polls(cli.max_polls)
        .api_timeout_secs(cli.api_timeout)
        .base_url(cli.base_url.clone());

    if let Some(ref id) = cli.assistant {
        builder = builder.assistant_id(id.clone());
    }
    if let Some(text) = instructions {
        builder = builder.instructions(text);
    }
    if let Some(ref msg) = cli.message {
        builder = builder.user_message(msg.clone());
    }
    if let Some(ref doc) = cli.knowledge {
        builder = builder.knowledge_document(doc.clone());
    }
    if let Some(obs) = observer {
        builder = builder.poll_observer(obs);
    }

    builder.build().context("Invalid configuration")
}
