//! Worker abstraction
//!
//! The executor never runs task logic itself. A caller-supplied factory
//! turns each batch of runnable task values into boxed workers, and each
//! worker reports back an outcome carrying the task value it ran, so the
//! driver can find the node in the graph without a submission-order side
//! table.

use crate::error::TaskError;

/// Outcome of one worker invocation.
#[derive(Debug, Clone)]
pub struct TaskOutcome<T> {
    /// Whether the task succeeded.
    pub success: bool,
    /// Failure message, if any.
    pub error_message: Option<String>,
    /// The task value this outcome belongs to.
    pub value: T,
}

impl<T> TaskOutcome<T> {
    /// Create a successful outcome for `value`
    #[must_use]
    pub fn ok(value: T) -> Self {
        Self {
            success: true,
            error_message: None,
            value,
        }
    }

    /// Create a failed outcome for `value`
    #[must_use]
    pub fn failed(value: T, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            value,
        }
    }
}

/// A unit of executable work wrapping one task value.
///
/// Any `FnOnce() -> Result<TaskOutcome<T>, TaskError> + Send` closure is a
/// worker.
pub trait Worker<T>: Send {
    /// Scheduling hint. The pool currently submits whole frontiers at once
    /// and does not consult it; it stays on the contract for future
    /// scheduling refinement.
    fn priority(&self) -> i32 {
        0
    }

    /// Run the task to completion.
    ///
    /// A failed [`TaskOutcome`] is an ordinary task failure: the run is
    /// abandoned and the message lands in the aggregate result. `Err` raises
    /// a [`TaskError`] that surfaces from
    /// [`Executor::run`](crate::Executor::run) unchanged.
    fn call(self: Box<Self>) -> Result<TaskOutcome<T>, TaskError>;
}

impl<T, F> Worker<T> for F
where
    F: FnOnce() -> Result<TaskOutcome<T>, TaskError> + Send,
{
    fn call(self: Box<Self>) -> Result<TaskOutcome<T>, TaskError> {
        (*self)()
    }
}

/// Converts a batch of runnable task values into workers.
///
/// The factory may return fewer workers than input values (coalescing) or
/// more (fanning out); the executor tracks in-flight work by the number of
/// workers it actually submitted, and maps completions back to the graph
/// through [`TaskOutcome::value`].
pub trait WorkerFactory<T>: Send + Sync {
    /// Build workers for the given runnable task values
    fn create_workers(&self, tasks: &[T]) -> Vec<Box<dyn Worker<T>>>;
}

impl<T, F> WorkerFactory<T> for F
where
    F: Fn(&[T]) -> Vec<Box<dyn Worker<T>>> + Send + Sync,
{
    fn create_workers(&self, tasks: &[T]) -> Vec<Box<dyn Worker<T>>> {
        self(tasks)
    }
}
