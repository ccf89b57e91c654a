//! Executor configuration

use std::time::Duration;

/// Default number of concurrently executing workers.
pub const DEFAULT_WORKERS: usize = 5;

/// Default bound on a single wait for the next completion.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Tuning knobs for the executor's worker pool and driver loop.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum number of workers executing at once.
    pub workers: usize,
    /// Upper bound on one wait for the next completion. Elapsing is not an
    /// error: the driver re-checks its termination condition and waits again.
    pub poll_interval: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ExecutorConfig {
    /// Create a config with the default pool width and poll interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pool width.
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set the completion-wait bound.
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Pool width with a floor of one worker.
    #[must_use]
    pub fn effective_workers(&self) -> usize {
        self.workers.max(1)
    }
}
