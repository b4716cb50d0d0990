//! Run polling: drive a remote run to a terminal status.
//!
//! The run's status transitions are owned entirely by the service; this
//! stage only observes them. The delay between checks doubles from
//! `poll_interval_ms` up to `poll_interval_cap_ms`, and the total number of
//! checks is bounded by `max_polls` — a hung remote run surfaces as
//! [`ExtractError::PollTimeout`] instead of waiting forever.
//!
//! Polling stops at the first terminal status observed; no further status
//! requests are issued after that.

use crate::api::{AssistantsApi, MessageObject, RunObject, RunStatus};
use crate::config::ExtractionConfig;
use crate::error::ExtractError;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

/// Result of a completed run.
#[derive(Debug)]
pub struct RunOutcome {
    /// Id of the run that completed.
    pub run_id: String,
    /// Number of status polls issued (0 if the run was already terminal
    /// when created).
    pub polls: u32,
    /// The thread's messages, newest first.
    pub messages: Vec<MessageObject>,
}

/// Start a run and poll until it completes, fails, or the budget runs out.
///
/// On `completed`, fetches and returns the thread's message list. Every
/// other terminal status is an error: this pipeline submits no tool
/// outputs, so `requires_action` can never resume, and `failed` /
/// `cancelled` / `expired` / `incomplete` runs carry no usable reply.
pub async fn run_to_completion(
    api: &dyn AssistantsApi,
    config: &ExtractionConfig,
    thread_id: &str,
    assistant_id: &str,
) -> Result<RunOutcome, ExtractError> {
    let mut run = api.create_run(thread_id, assistant_id).await?;
    info!("Run {} started (status: {})", run.id, run.status.as_str());

    let start = Instant::now();
    let mut polls: u32 = 0;

    while !run.status.is_terminal() {
        if polls >= config.max_polls {
            return Err(ExtractError::PollTimeout {
                run_id: run.id,
                status: run.status.as_str().to_string(),
                polls,
                elapsed_ms: start.elapsed().as_millis() as u64,
            });
        }

        let delay = backoff_delay(config, polls);
        debug!(
            "Run {} is '{}'; next check in {:?}",
            run.id,
            run.status.as_str(),
            delay
        );
        sleep(delay).await;

        run = api.retrieve_run(thread_id, &run.id).await?;
        polls += 1;

        if let Some(ref observer) = config.poll_observer {
            observer.on_poll(polls, run.status.as_str());
        }
    }

    finish(api, thread_id, run, polls, start).await
}

/// Handle the first observed terminal status.
async fn finish(
    api: &dyn AssistantsApi,
    thread_id: &str,
    run: RunObject,
    polls: u32,
    start: Instant,
) -> Result<RunOutcome, ExtractError> {
    match run.status {
        RunStatus::Completed => {
            info!(
                "Run {} completed after {} polls ({}ms)",
                run.id,
                polls,
                start.elapsed().as_millis()
            );
            let messages = api.list_messages(thread_id).await?;
            Ok(RunOutcome {
                run_id: run.id,
                polls,
                messages,
            })
        }
        status => {
            warn!("Run {} ended with status '{}'", run.id, status.as_str());
            Err(ExtractError::RunFailed {
                run_id: run.id,
                status: status.as_str().to_string(),
                detail: run.last_error.map(|e| e.summary()),
            })
        }
    }
}

/// The delay before poll number `polls + 1`.
///
/// Doubles per poll from the configured base, saturating at the cap:
/// 2 s → 4 s → 8 s → 15 s → 15 s … with the defaults.
fn backoff_delay(config: &ExtractionConfig, polls: u32) -> Duration {
    let factor = 1u64.checked_shl(polls.min(16)).unwrap_or(u64::MAX);
    let ms = config
        .poll_interval_ms
        .saturating_mul(factor)
        .min(config.poll_interval_cap_ms);
    Duration::from_millis(ms)
}
