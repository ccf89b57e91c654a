//! Error types for the gantry crate

use thiserror::Error;

/// A fault raised by task logic itself.
///
/// An ordinary task failure is a worker returning an unsuccessful
/// [`TaskOutcome`](crate::TaskOutcome): the run is abandoned and the message
/// is folded into the aggregate result. A `TaskError` is stronger: it means
/// the task logic hit a condition the caller must see verbatim, so the
/// executor drains the pool and re-raises it from
/// [`Executor::run`](crate::Executor::run) unchanged.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct TaskError {
    message: String,
}

impl TaskError {
    /// Create a task fault with the given message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The fault message, as the task logic raised it
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error types for executor runs
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// Task logic raised a fault that must reach the caller unchanged
    #[error(transparent)]
    Task(#[from] TaskError),
}

/// Result type for gantry operations
pub type Result<T> = std::result::Result<T, ExecutorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_error_display_is_bare_message() {
        let err = TaskError::new("manifest missing for module 'app'");
        assert_eq!(err.to_string(), "manifest missing for module 'app'");
        assert_eq!(err.message(), "manifest missing for module 'app'");
    }

    #[test]
    fn test_executor_error_is_transparent() {
        let err = ExecutorError::from(TaskError::new("boom"));
        assert_eq!(err.to_string(), "boom");
    }
}
