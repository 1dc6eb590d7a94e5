//! Shared task generators for the black-box queue tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use taskgate_core::AdmissionQueue;

/// Test error type
pub type TestError = String;

/// Task body that resolves to `value` after `delay`
pub async fn delayed<T>(delay: Duration, value: T) -> Result<T, TestError> {
    tokio::time::sleep(delay).await;
    Ok(value)
}

/// Task body that fails with `message` after yielding once
pub async fn failing<T>(message: &str) -> Result<T, TestError> {
    tokio::task::yield_now().await;
    Err(message.to_string())
}

/// Task body that never completes
pub fn never<T>() -> futures::future::Pending<Result<T, TestError>> {
    futures::future::pending()
}

/// Records the highest `active_size()` seen from inside running tasks.
#[derive(Clone, Default)]
pub struct ActiveProbe {
    peak: Arc<AtomicUsize>,
}

impl ActiveProbe {
    pub fn observe(&self, queue: &AdmissionQueue) {
        self.peak.fetch_max(queue.active_size(), Ordering::SeqCst);
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}
