// Central Error Type for queue construction and submission

use thiserror::Error;

/// Errors raised synchronously by queue construction and `submit`.
///
/// A task's own failure never shows up here; it travels through the
/// submission future as [`TaskError`](crate::domain::TaskError).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No async runtime available to drive submitted tasks")]
    NoRuntime,

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type alias using QueueError
pub type Result<T> = std::result::Result<T, QueueError>;
