use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{TaskError, WorkflowError};
use crate::executor::{self, Execution};
use crate::journal::{Journal, JournalEntry};
use crate::retry::TaskOptions;

/// Concurrency limit for [`WorkflowContext::fan_out`] meaning "all at once".
pub const UNBOUNDED: usize = usize::MAX;

/// Handle an orchestration uses to run journaled tasks.
///
/// Step keys are `"{scope}/{sequence}:{name}"`. The sequence is allocated when
/// the step is *created* (not when it is first polled), so a scope that creates
/// steps in a fixed order produces the same keys on every run no matter how the
/// underlying futures interleave. Concurrent branches get their own scope via
/// [`fan_out`](Self::fan_out) or [`child`](Self::child).
pub struct WorkflowContext {
    scope: String,
    journal: Arc<dyn Journal>,
    cancel: CancellationToken,
    sequence: AtomicU64,
}

impl fmt::Debug for WorkflowContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkflowContext")
            .field("scope", &self.scope)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("sequence", &self.sequence.load(Ordering::SeqCst))
            .finish()
    }
}

impl WorkflowContext {
    pub fn new(workflow_id: impl Into<String>, journal: Arc<dyn Journal>) -> Self {
        Self::with_cancellation(workflow_id, journal, CancellationToken::new())
    }

    pub fn with_cancellation(
        workflow_id: impl Into<String>,
        journal: Arc<dyn Journal>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            scope: workflow_id.into(),
            journal,
            cancel,
            sequence: AtomicU64::new(0),
        }
    }

    /// Scope path of this context (workflow id for the root).
    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancel this scope and everything started beneath it.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    fn next_key(&self, name: &str) -> String {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        format!("{}/{}:{}", self.scope, sequence, name)
    }

    fn branch(&self, scope: String, cancel: CancellationToken) -> WorkflowContext {
        WorkflowContext {
            scope,
            journal: Arc::clone(&self.journal),
            cancel,
            sequence: AtomicU64::new(0),
        }
    }

    /// Context for a child workflow. Cancelling the parent cancels the child;
    /// cancelling the child leaves the parent running.
    pub fn child(&self, name: &str) -> WorkflowContext {
        let scope = self.next_key(name);
        self.branch(scope, self.cancel.child_token())
    }

    /// Run a task with retries and timeouts, journaling its outcome.
    ///
    /// If the step already has a journaled outcome it is returned as-is and
    /// `task` is never invoked.
    pub fn run<'a, T, F, Fut>(
        &'a self,
        name: &str,
        options: TaskOptions,
        task: F,
    ) -> impl Future<Output = Result<T, WorkflowError>> + Send + 'a
    where
        T: Serialize + DeserializeOwned + Send + 'a,
        F: Fn() -> Fut + Send + Sync + 'a,
        Fut: Future<Output = Result<T, TaskError>> + Send + 'a,
    {
        let key = self.next_key(name);
        let task_name = name.to_owned();

        async move {
            if let Some(entry) = self.journal.load(&key).await? {
                debug!(step = %key, "Replaying journaled step");
                return entry.into_result(&task_name);
            }

            if self.cancel.is_cancelled() {
                return Err(WorkflowError::Cancelled { task: task_name });
            }

            match executor::execute(&task_name, &options, &self.cancel, &task).await {
                Execution::Completed { value, attempts } => {
                    let json =
                        serde_json::to_value(&value).map_err(|source| {
                            WorkflowError::Serialization {
                                task: task_name.clone(),
                                source,
                            }
                        })?;
                    self.journal
                        .record(&key, JournalEntry::Completed { value: json, attempts })
                        .await?;
                    Ok(value)
                }
                Execution::Failed { error, attempts } => {
                    let message = error.message().to_owned();
                    self.journal
                        .record(
                            &key,
                            JournalEntry::Failed {
                                message: message.clone(),
                                attempts,
                            },
                        )
                        .await?;
                    Err(WorkflowError::TaskFailed {
                        task: task_name,
                        attempts,
                        message,
                    })
                }
                Execution::Cancelled => Err(WorkflowError::Cancelled { task: task_name }),
            }
        }
    }

    /// Current time, journaled so replays observe the same instant.
    pub fn now(&self) -> impl Future<Output = Result<DateTime<Utc>, WorkflowError>> + Send + '_ {
        self.run("now", TaskOptions::local(), || async { Ok(Utc::now()) })
    }

    /// Durable timer. Once it has fired, replays return immediately.
    pub fn sleep_until(
        &self,
        deadline: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), WorkflowError>> + Send + '_ {
        let key = self.next_key("sleep");

        async move {
            if self.journal.load(&key).await?.is_some() {
                return Ok(());
            }

            let remaining = (deadline - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    return Err(WorkflowError::Cancelled { task: "sleep".to_string() });
                }
                _ = tokio::time::sleep(remaining) => {}
            }

            self.journal
                .record(
                    &key,
                    JournalEntry::Completed {
                        value: serde_json::Value::Null,
                        attempts: 1,
                    },
                )
                .await?;
            Ok(())
        }
    }

    /// Run one branch per item with at most `limit` in flight, returning the
    /// branch outputs in input order.
    ///
    /// Each branch receives its own scoped context (`"{label}[{index}]"`), so
    /// its step keys do not depend on how branches interleave.
    pub fn fan_out<I, T, F, Fut>(
        &self,
        label: &str,
        items: Vec<I>,
        limit: usize,
        mut branch: F,
    ) -> impl Future<Output = Vec<T>>
    where
        F: FnMut(WorkflowContext, I) -> Fut,
        Fut: Future<Output = T>,
    {
        let scope = self.next_key(label);
        let branches: Vec<Fut> = items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                let ctx = self.branch(format!("{scope}[{index}]"), self.cancel.clone());
                branch(ctx, item)
            })
            .collect();

        stream::iter(branches).buffered(limit.max(1)).collect::<Vec<T>>()
    }
}
