// Task outcome error types

use thiserror::Error;

/// Failure side of a submitted task's outcome.
///
/// `Failed` carries the task's own error untouched. The other variants are
/// produced by the queue itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError<E> {
    #[error("Task failed: {0}")]
    Failed(E),

    #[error("Task panicked: {0}")]
    Panicked(String),

    /// Discarded by `clear()` on a queue using
    /// [`ClearPolicy::Reject`](crate::domain::ClearPolicy::Reject).
    #[error("Task abandoned before it was admitted")]
    Abandoned,
}

impl<E> TaskError<E> {
    /// Unwraps the task's own failure, if that is what this is.
    pub fn into_failure(self) -> Option<E> {
        match self {
            TaskError::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, TaskError::Failed(_))
    }

    pub fn is_panicked(&self) -> bool {
        matches!(self, TaskError::Panicked(_))
    }
}
