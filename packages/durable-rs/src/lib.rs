//! Durable - journaled task execution for orchestration code.
//!
//! Orchestrations are plain async functions that take a [`WorkflowContext`]
//! and route every side effect (HTTP calls, database writes, clock reads)
//! through [`WorkflowContext::run`]. Each task:
//!
//! - runs under a [`TaskOptions`] start-to-close timeout,
//! - is retried with exponential backoff per its [`RetryPolicy`] while it
//!   returns [`TaskError::Retryable`],
//! - has its final outcome recorded in a [`Journal`].
//!
//! Re-running an orchestration against the same journal replays recorded
//! outcomes instead of executing tasks again, so the orchestration makes the
//! same decisions it made the first time.
//!
//! # Example
//!
//! ```rust,ignore
//! use durable::{InMemoryJournal, TaskOptions, WorkflowContext};
//!
//! let ctx = WorkflowContext::new("crawl:https://acme.com/careers", Arc::new(InMemoryJournal::new()));
//!
//! let page = ctx
//!     .run("fetch_page", TaskOptions::crawl(), || async {
//!         Ok(fetcher.fetch_page(&url).await?)
//!     })
//!     .await?;
//!
//! let scored = ctx
//!     .fan_out("score", links, 10, |branch, link| async move {
//!         branch.run("score_job", TaskOptions::crawl(), || scorer.score(&link)).await
//!     })
//!     .await;
//! ```
//!
//! # Determinism
//!
//! Orchestration code must not read the clock, generate randomness or perform
//! I/O outside of a task. Use [`WorkflowContext::now`] for timestamps.

mod context;
mod error;
mod executor;
mod journal;
mod retry;

pub use context::{WorkflowContext, UNBOUNDED};
pub use error::{JournalError, TaskError, WorkflowError};
pub use journal::{InMemoryJournal, Journal, JournalEntry};
pub use retry::{RetryPolicy, TaskOptions};
