//! Attempt loop: timeout per attempt, backoff between attempts, cancellation.

use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

use crate::error::TaskError;
use crate::retry::TaskOptions;

#[derive(Debug)]
pub(crate) enum Execution<T> {
    Completed { value: T, attempts: u32 },
    Failed { error: TaskError, attempts: u32 },
    Cancelled,
}

/// Run `task` until it succeeds, fails terminally, exhausts its attempts or
/// `cancel` fires. A timed-out attempt counts as a retryable failure.
pub(crate) async fn execute<T, F, Fut>(
    name: &str,
    options: &TaskOptions,
    cancel: &CancellationToken,
    task: &F,
) -> Execution<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, TaskError>>,
{
    let max_attempts = options.retry.attempts();
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Execution::Cancelled,
            outcome = tokio::time::timeout(options.start_to_close_timeout, task()) => outcome,
        };

        let error = match outcome {
            Ok(Ok(value)) => {
                return Execution::Completed {
                    value,
                    attempts: attempt,
                }
            }
            Ok(Err(error)) => error,
            Err(_) => TaskError::retryable(format!(
                "timed out after {:?}",
                options.start_to_close_timeout
            )),
        };

        if !error.is_retryable() || attempt >= max_attempts {
            error!(task = name, attempt, error = %error, "Task failed");
            return Execution::Failed {
                error,
                attempts: attempt,
            };
        }

        let delay = options.retry.backoff(attempt);
        warn!(
            task = name,
            attempt,
            max_attempts,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Task attempt failed, retrying"
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Execution::Cancelled,
            _ = tokio::time::sleep(delay) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::retry::RetryPolicy;

    fn options(attempts: u32) -> TaskOptions {
        TaskOptions::new(
            Duration::from_secs(5),
            RetryPolicy::new(Duration::from_secs(1), 2.0, Duration::from_secs(10), attempts),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success() {
        let calls = &AtomicU32::new(0);
        let task = move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n < 3 {
                Err(TaskError::retryable("flaky"))
            } else {
                Ok(n)
            }
        };

        let result = execute("flaky", &options(3), &CancellationToken::new(), &task).await;

        assert!(matches!(result, Execution::Completed { value: 3, attempts: 3 }));
    }

    #[tokio::test(start_paused = true)]
    async fn terminal_error_is_not_retried() {
        let calls = &AtomicU32::new(0);
        let task = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(TaskError::terminal("not found"))
        };

        let result = execute("lookup", &options(5), &CancellationToken::new(), &task).await;

        assert!(matches!(result, Execution::Failed { attempts: 1, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = &AtomicU32::new(0);
        let task = move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>(TaskError::retryable("503"))
        };

        let result = execute("fetch", &options(3), &CancellationToken::new(), &task).await;

        match result {
            Execution::Failed { error, attempts } => {
                assert_eq!(attempts, 3);
                assert_eq!(error.message(), "503");
            }
            other => panic!("expected failure, got {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_attempt_times_out_and_is_retried() {
        let calls = &AtomicU32::new(0);
        let task = move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            Ok::<_, TaskError>("done")
        };

        let result = execute("slow", &options(2), &CancellationToken::new(), &task).await;

        assert!(matches!(result, Execution::Completed { value: "done", attempts: 2 }));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_backoff() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let task = || {
            let trigger = trigger.clone();
            async move {
                trigger.cancel();
                Err::<(), _>(TaskError::retryable("retry me"))
            }
        };

        let result = execute("cancelled", &options(3), &cancel, &task).await;

        assert!(matches!(result, Execution::Cancelled));
    }
}
