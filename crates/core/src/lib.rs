//! Taskgate Core - bounded-concurrency task admission queue
//!
//! Submit deferred tasks; at most `max_size` of them run at once, the rest
//! wait and are admitted in submission order. Every submission returns a
//! future that resolves with that task's own outcome.
//!
//! # Example
//!
//! ```no_run
//! use taskgate_core::{Batcher, TaskError};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let queue = Batcher::eager_queue(Some(2))?;
//!
//!     let first = queue.submit(|| async { Ok::<_, String>(1) })?;
//!     let second = queue.submit(|| async { Err::<u32, _>("boom".to_string()) })?;
//!
//!     assert_eq!(first.await, Ok(1));
//!     assert_eq!(second.await, Err(TaskError::Failed("boom".to_string())));
//!     Ok(())
//! }
//! ```

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{AdmissionQueue, AdmissionQueueBuilder, Batcher, Submission};
pub use domain::{ClearPolicy, QueueConfig, TaskError, TaskHandle, TaskId};
pub use error::{QueueError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
