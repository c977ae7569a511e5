//! Error types for task execution.
//!
//! Two layers:
//! - [`TaskError`] is what a task body returns. It carries the retry decision
//!   (`Retryable` vs `Terminal`), the same split the job worker uses for
//!   `ErrorKind::Retryable` / `ErrorKind::NonRetryable`.
//! - [`WorkflowError`] is what an orchestration sees when it awaits a step:
//!   retries exhausted, cancelled, or the journal itself failed.
//!
//! `anyhow::Error` converts into `TaskError::Retryable`, so activities can keep
//! using `?` and `.context(..)` and only opt into `Terminal` explicitly.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned by a single task attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum TaskError {
    /// Transient failure (timeouts, 5xx, connection resets). Retried per policy.
    #[error("{0}")]
    Retryable(String),
    /// Permanent failure. Never retried.
    #[error("{0}")]
    Terminal(String),
}

impl TaskError {
    pub fn retryable(message: impl Into<String>) -> Self {
        TaskError::Retryable(message.into())
    }

    pub fn terminal(message: impl Into<String>) -> Self {
        TaskError::Terminal(message.into())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, TaskError::Retryable(_))
    }

    pub fn message(&self) -> &str {
        match self {
            TaskError::Retryable(message) | TaskError::Terminal(message) => message,
        }
    }
}

impl From<anyhow::Error> for TaskError {
    fn from(error: anyhow::Error) -> Self {
        TaskError::Retryable(format!("{error:#}"))
    }
}

/// Errors from the journal backend.
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("journal backend error: {0}")]
    Backend(String),

    #[error("corrupt journal entry at {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Error surfaced to orchestration code when awaiting a step.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The task failed terminally or exhausted its retry policy.
    #[error("task '{task}' failed after {attempts} attempt(s): {message}")]
    TaskFailed {
        task: String,
        attempts: u32,
        message: String,
    },

    /// The enclosing scope was cancelled before the task completed.
    #[error("task '{task}' cancelled")]
    Cancelled { task: String },

    #[error(transparent)]
    Journal(#[from] JournalError),

    #[error("failed to (de)serialize result of task '{task}': {source}")]
    Serialization {
        task: String,
        #[source]
        source: serde_json::Error,
    },
}

impl WorkflowError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkflowError::Cancelled { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anyhow_errors_are_retryable_and_keep_context() {
        let error = anyhow::anyhow!("connection reset").context("Failed to call crawler service");
        let task_error = TaskError::from(error);

        assert!(task_error.is_retryable());
        assert_eq!(
            task_error.message(),
            "Failed to call crawler service: connection reset"
        );
    }

    #[test]
    fn terminal_errors_are_not_retryable() {
        assert!(!TaskError::terminal("bad request").is_retryable());
    }
}
