//! Pipeline stages for questionnaire extraction.
//!
//! Each submodule implements exactly one step. Keeping stages separate makes
//! each independently testable and lets us swap implementations (e.g. a
//! different remote service) without touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ session ──▶ poll ──▶ extract
//! (file id)  (thread +   (run to  (fence strip +
//!             message)   terminal) JSON parse)
//! ```
//!
//! 1. [`upload`]  — validate the local document and upload it, obtaining a
//!    file id
//! 2. [`session`] — create a thread and post the single instruction message
//!    with the file attached
//! 3. [`poll`]    — start the run and poll, with bounded exponential
//!    backoff, until a terminal status; the only stage that waits
//! 4. [`extract`] — locate the text payload in the reply, strip an optional
//!    ```json fence, and parse the canonical question set
//!
//! Control flow is strictly sequential: each stage's output is the next
//! stage's sole input.

pub mod extract;
pub mod poll;
pub mod session;
pub mod upload;
