//! Dynamic dependency-driven executor
//!
//! Drives a [`TaskGraph`] to quiescence over a bounded worker pool. The
//! driver loop submits the free frontier, waits (with a bounded timeout)
//! for one completion, removes the completed node from the graph, and
//! recomputes the frontier, so tasks become runnable the moment their last
//! prerequisite succeeds rather than on a precomputed schedule. The first task
//! failure aborts the run: nothing new is submitted and in-flight workers
//! are drained before the aggregate result is returned.

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::{self, JoinError, JoinSet};
use tokio::time::timeout;

use crate::config::ExecutorConfig;
use crate::error::{ExecutorError, TaskError};
use crate::graph::TaskGraph;
use crate::worker::{TaskOutcome, WorkerFactory};

/// Aggregate result of one run.
#[derive(Debug, Clone)]
pub struct RunResult<T> {
    /// Whether every executed task succeeded.
    pub success: bool,
    /// Message of the first failing worker; absent on success.
    pub error_message: Option<String>,
    /// Every task value handed to the worker factory, in submission order.
    pub tasks_run: Vec<T>,
    /// Total wall-clock duration of the run.
    pub duration: Duration,
}

/// One pool completion, normalized.
enum Completion<T> {
    /// The worker ran to completion and reported an outcome.
    Outcome(TaskOutcome<T>),
    /// The worker panicked; folded into a synthetic task failure.
    Panic(String),
    /// The worker raised a domain fault; surfaces to the caller unchanged.
    Fault(TaskError),
}

/// Dependency-driven task executor.
///
/// Holds exclusive access to the graph for the duration of [`run`]: the
/// driver is the sole graph mutator, and workers only ever see task values
/// by clone. The pool has a fixed width ([`ExecutorConfig::workers`],
/// default 5) and deposits finished results in completion order.
///
/// [`run`]: Executor::run
pub struct Executor<'g, T, F> {
    graph: &'g mut TaskGraph<T>,
    factory: F,
    config: ExecutorConfig,
}

impl<'g, T, F> Executor<'g, T, F>
where
    T: Eq + Hash + Clone + Debug + Send + 'static,
    F: WorkerFactory<T>,
{
    /// Create an executor with the default configuration.
    #[must_use]
    pub fn new(graph: &'g mut TaskGraph<T>, factory: F) -> Self {
        Self::with_config(graph, factory, ExecutorConfig::default())
    }

    /// Create an executor with an explicit configuration.
    #[must_use]
    pub fn with_config(graph: &'g mut TaskGraph<T>, factory: F, config: ExecutorConfig) -> Self {
        Self {
            graph,
            factory,
            config,
        }
    }

    /// Drive the graph to completion.
    ///
    /// Returns the aggregate outcome: success once the graph is quiescent,
    /// or the first failing worker's message. Worker panics are absorbed as
    /// synthetic failures. The worker pool accepts no submissions after the
    /// first failure and is fully drained on every exit path.
    ///
    /// # Errors
    /// Returns [`ExecutorError::Task`] when a worker raises a [`TaskError`];
    /// the fault is re-raised unchanged after the pool drains.
    #[tracing::instrument(
        name = "executor_run",
        skip_all,
        fields(tasks = self.graph.len(), workers = self.config.effective_workers())
    )]
    pub async fn run(&mut self) -> Result<RunResult<T>, ExecutorError> {
        let start = Instant::now();
        let semaphore = Arc::new(Semaphore::new(self.config.effective_workers()));
        let mut pool = JoinSet::new();

        let mut running = 0usize;
        let mut nodes_run: HashSet<T> = HashSet::new();
        let mut tasks_run: Vec<T> = Vec::new();
        let mut new_free: Vec<T> = self.graph.free_nodes().into_iter().collect();

        let mut failed = false;
        let mut failure_message: Option<String> = None;
        let mut fault: Option<TaskError> = None;

        while !failed && fault.is_none() && (running > 0 || !new_free.is_empty()) {
            if !new_free.is_empty() {
                tracing::debug!(count = new_free.len(), "submitting free frontier");
                nodes_run.extend(new_free.iter().cloned());
                tasks_run.extend(new_free.iter().cloned());

                let workers = self.factory.create_workers(&new_free);
                running += workers.len();
                for worker in workers {
                    tracing::trace!(priority = worker.priority(), "submitting worker");
                    let semaphore = Arc::clone(&semaphore);
                    pool.spawn(async move {
                        let _permit = semaphore.acquire_owned().await;
                        task::spawn_blocking(move || worker.call()).await
                    });
                }
                new_free.clear();
            }

            let joined = match timeout(self.config.poll_interval, pool.join_next()).await {
                // The bounded wait elapsing is not a failure; re-check the
                // termination condition and wait again.
                Err(_) => continue,
                // Pool empty: the factory coalesced the frontier away.
                Ok(None) => continue,
                Ok(Some(joined)) => joined,
            };
            running -= 1;

            match Self::unpack(joined) {
                Completion::Outcome(outcome) if outcome.success => {
                    tracing::debug!(task = ?outcome.value, "task completed");
                    self.graph.remove_node(&outcome.value);
                    tracing::trace!(remaining = self.graph.len(), "graph updated");
                    new_free = self
                        .graph
                        .free_nodes()
                        .into_iter()
                        .filter(|value| !nodes_run.contains(value))
                        .collect();
                }
                Completion::Outcome(outcome) => {
                    tracing::warn!(
                        task = ?outcome.value,
                        error = outcome.error_message.as_deref().unwrap_or_default(),
                        "task failed, aborting run"
                    );
                    failed = true;
                    failure_message = outcome.error_message;
                    new_free.clear();
                }
                Completion::Panic(message) => {
                    tracing::error!(error = %message, "worker panicked, aborting run");
                    failed = true;
                    failure_message = Some(message);
                    new_free.clear();
                }
                Completion::Fault(task_error) => {
                    tracing::error!(error = %task_error, "task raised a fault, aborting run");
                    fault = Some(task_error);
                    new_free.clear();
                }
            }
        }

        // Drain whatever is still in flight; nothing new is submitted past
        // this point. The first abnormal completion already decided the
        // result, so late successes are discarded without touching the
        // graph and late failures are logged only.
        while running > 0 {
            let Some(joined) = pool.join_next().await else {
                break;
            };
            running -= 1;
            match Self::unpack(joined) {
                Completion::Outcome(outcome) if outcome.success => {
                    tracing::debug!(task = ?outcome.value, "late completion discarded");
                }
                Completion::Outcome(outcome) => {
                    tracing::warn!(task = ?outcome.value, "additional task failure absorbed");
                }
                Completion::Panic(message) => {
                    tracing::warn!(error = %message, "additional worker panic absorbed");
                }
                Completion::Fault(task_error) => {
                    tracing::warn!(error = %task_error, "additional task fault absorbed");
                }
            }
        }

        // The pool is drained on every path that reaches here; if the driver
        // unwinds instead, the `JoinSet` drop aborts whatever is left.
        if let Some(task_error) = fault {
            return Err(ExecutorError::Task(task_error));
        }

        let duration = start.elapsed();
        let duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        if failed {
            tracing::warn!(
                tasks = tasks_run.len(),
                duration_ms,
                "run aborted on task failure"
            );
        } else {
            tracing::info!(tasks = tasks_run.len(), duration_ms, "run complete");
        }

        Ok(RunResult {
            success: !failed,
            error_message: failure_message,
            tasks_run,
            duration,
        })
    }

    /// Normalize one `join_next` result.
    ///
    /// The outer layer is the pool task, the inner layer the blocking call;
    /// a `JoinError` on either means the worker never produced an outcome.
    fn unpack(
        joined: Result<Result<Result<TaskOutcome<T>, TaskError>, JoinError>, JoinError>,
    ) -> Completion<T> {
        match joined {
            Ok(Ok(Ok(outcome))) => Completion::Outcome(outcome),
            Ok(Ok(Err(task_error))) => Completion::Fault(task_error),
            Ok(Err(join_error)) | Err(join_error) => Completion::Panic(join_error.to_string()),
        }
    }
}
