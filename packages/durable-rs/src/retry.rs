//! Retry policies and per-task execution options.

use std::time::Duration;

/// Exponential backoff policy applied between attempts of a task.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub initial_interval: Duration,
    pub backoff_coefficient: f64,
    pub maximum_interval: Duration,
    /// Total attempts including the first one. Zero is treated as one.
    pub maximum_attempts: u32,
}

impl RetryPolicy {
    pub const fn new(
        initial_interval: Duration,
        backoff_coefficient: f64,
        maximum_interval: Duration,
        maximum_attempts: u32,
    ) -> Self {
        Self {
            initial_interval,
            backoff_coefficient,
            maximum_interval,
            maximum_attempts,
        }
    }

    /// Single attempt, no retries.
    pub const fn no_retry() -> Self {
        Self::new(Duration::ZERO, 1.0, Duration::ZERO, 1)
    }

    /// Delay to wait after the given (1-based) failed attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.initial_interval.as_secs_f64() * self.backoff_coefficient.powi(exponent);
        let capped = secs.min(self.maximum_interval.as_secs_f64());
        if capped.is_finite() && capped > 0.0 {
            Duration::from_secs_f64(capped)
        } else {
            Duration::ZERO
        }
    }

    pub fn attempts(&self) -> u32 {
        self.maximum_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(2), 2.0, Duration::from_secs(120), 3)
    }
}

/// Timeout and retry settings for one task invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaskOptions {
    /// Bound on a single attempt.
    pub start_to_close_timeout: Duration,
    pub retry: RetryPolicy,
}

impl TaskOptions {
    pub const fn new(start_to_close_timeout: Duration, retry: RetryPolicy) -> Self {
        Self {
            start_to_close_timeout,
            retry,
        }
    }

    /// Local, side-effect free steps (clock reads, id generation).
    pub const fn local() -> Self {
        Self::new(Duration::from_secs(10), RetryPolicy::no_retry())
    }

    /// Database reads and writes.
    pub const fn database() -> Self {
        Self::new(
            Duration::from_secs(10),
            RetryPolicy::new(Duration::from_secs(1), 2.0, Duration::from_secs(30), 3),
        )
    }

    /// Page fetches, parsing and scoring calls.
    pub const fn crawl() -> Self {
        Self::new(
            Duration::from_secs(5 * 60),
            RetryPolicy::new(Duration::from_secs(2), 2.0, Duration::from_secs(30), 3),
        )
    }

    /// Company, career-page and subdomain discovery calls.
    pub const fn discovery() -> Self {
        Self::new(
            Duration::from_secs(15 * 60),
            RetryPolicy::new(Duration::from_secs(2), 2.0, Duration::from_secs(120), 3),
        )
    }

    /// Long sweeps that fan out over many external calls.
    pub const fn long_running() -> Self {
        Self::new(
            Duration::from_secs(30 * 60),
            RetryPolicy::new(Duration::from_secs(2), 2.0, Duration::from_secs(300), 3),
        )
    }

    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.start_to_close_timeout = timeout;
        self
    }

    pub const fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

impl Default for TaskOptions {
    fn default() -> Self {
        Self::crawl()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_until_capped() {
        let policy = RetryPolicy::new(Duration::from_secs(2), 2.0, Duration::from_secs(30), 10);

        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
        assert_eq!(policy.backoff(3), Duration::from_secs(8));
        assert_eq!(policy.backoff(4), Duration::from_secs(16));
        assert_eq!(policy.backoff(5), Duration::from_secs(30));
        assert_eq!(policy.backoff(60), Duration::from_secs(30));
    }

    #[test]
    fn zero_attempts_still_runs_once() {
        let policy = RetryPolicy::new(Duration::from_secs(1), 2.0, Duration::from_secs(1), 0);
        assert_eq!(policy.attempts(), 1);
        assert_eq!(RetryPolicy::no_retry().attempts(), 1);
    }

    #[test]
    fn presets_match_task_classes() {
        assert_eq!(
            TaskOptions::crawl().start_to_close_timeout,
            Duration::from_secs(300)
        );
        assert_eq!(
            TaskOptions::discovery().retry.maximum_interval,
            Duration::from_secs(120)
        );
        assert_eq!(
            TaskOptions::long_running().start_to_close_timeout,
            Duration::from_secs(1800)
        );
        assert_eq!(TaskOptions::database().retry.attempts(), 3);
    }
}
