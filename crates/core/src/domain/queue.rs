// Queue Domain Model

use serde::{Deserialize, Serialize};

use crate::error::{QueueError, Result};

/// Queue name used when none is configured
pub const DEFAULT_QUEUE_NAME: &str = "default";

/// Concurrency limit of an eager queue when none is given
pub const DEFAULT_MAX_SIZE: usize = 4;

/// What happens to waiting submissions discarded by `clear()`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClearPolicy {
    /// Discarded submissions never resolve.
    #[default]
    Abandon,
    /// Discarded submissions resolve to `TaskError::Abandoned`.
    Reject,
}

/// Queue configuration
///
/// Deserializable so it can live inside an application's own config file;
/// missing fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Label attached to every log line emitted by the queue
    pub name: String,
    /// Maximum number of concurrently running tasks
    pub max_size: usize,
    pub clear_policy: ClearPolicy,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_QUEUE_NAME.to_string(),
            max_size: DEFAULT_MAX_SIZE,
            clear_policy: ClearPolicy::default(),
        }
    }
}

impl QueueConfig {
    pub fn new(name: impl Into<String>, max_size: usize) -> Self {
        Self {
            name: name.into(),
            max_size,
            clear_policy: ClearPolicy::default(),
        }
    }

    pub fn with_clear_policy(mut self, clear_policy: ClearPolicy) -> Self {
        self.clear_policy = clear_policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(QueueError::InvalidArgument(
                "max_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
