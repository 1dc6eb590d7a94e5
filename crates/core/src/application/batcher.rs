// Batcher - named queue configurations

use super::admission::AdmissionQueue;
use crate::domain::DEFAULT_MAX_SIZE;
use crate::error::Result;

/// Concurrency limit of a serial queue
pub const SERIAL_MAX_SIZE: usize = 1;

/// Factory for the two stock queue shapes.
///
/// Uninhabited: there is nothing to instantiate, only the constructors.
pub enum Batcher {}

impl Batcher {
    /// Queue that runs up to `max_size` tasks concurrently in FIFO order
    /// (4 when `None`).
    ///
    /// # Errors
    /// `QueueError::InvalidArgument` when `max_size` is `Some(0)`.
    pub fn eager_queue(max_size: Option<usize>) -> Result<AdmissionQueue> {
        AdmissionQueue::builder()
            .name("eager")
            .max_size(max_size.unwrap_or(DEFAULT_MAX_SIZE))
            .build()
    }

    /// Queue that runs tasks one at a time in FIFO order
    pub fn serial_queue() -> AdmissionQueue {
        AdmissionQueue::builder()
            .name("serial")
            .max_size(SERIAL_MAX_SIZE)
            .assemble()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueueError;

    #[test]
    fn test_eager_queue_default_size() {
        let queue = Batcher::eager_queue(None).unwrap();
        assert_eq!(queue.max_size(), 4);
        assert_eq!(queue.active_size(), 0);
        assert_eq!(queue.waiting_size(), 0);
        assert_eq!(queue.name(), "eager");
    }

    #[test]
    fn test_eager_queue_custom_size() {
        let queue = Batcher::eager_queue(Some(16)).unwrap();
        assert_eq!(queue.max_size(), 16);
    }

    #[test]
    fn test_eager_queue_rejects_zero() {
        let result = Batcher::eager_queue(Some(0));
        assert!(matches!(result, Err(QueueError::InvalidArgument(_))));
    }

    #[test]
    fn test_serial_queue() {
        let queue = Batcher::serial_queue();
        assert_eq!(queue.max_size(), 1);
        assert_eq!(queue.name(), "serial");
    }
}
