// Domain Layer - Task handles, queue configuration, outcome errors

pub mod error;
pub mod queue;
pub mod task;

// Re-exports
pub use error::TaskError;
pub use queue::{ClearPolicy, QueueConfig, DEFAULT_MAX_SIZE, DEFAULT_QUEUE_NAME};
pub use task::{
    FailureCallback, SuccessCallback, TaskGenerator, TaskHandle, TaskHandleBuilder, TaskId,
};
