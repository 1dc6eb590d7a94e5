// Panic isolation for admitted tasks
use std::any::Any;
use std::future::Future;
use std::panic::{catch_unwind, AssertUnwindSafe};

use futures::FutureExt;
use tracing::warn;

/// Result of a panic-guarded execution
#[derive(Debug)]
pub(crate) enum PanicGuardResult<T> {
    /// Execution completed without panicking
    Success(T),
    /// Execution panicked
    Panicked(String),
}

/// Execute a closure with panic isolation
///
/// Used around generator invocation so a generator that panics turns into a
/// failed outcome instead of unwinding through the queue.
pub(crate) fn execute_guarded<F, T>(f: F) -> PanicGuardResult<T>
where
    F: FnOnce() -> T + std::panic::UnwindSafe,
{
    match catch_unwind(f) {
        Ok(result) => PanicGuardResult::Success(result),
        Err(panic_info) => {
            let panic_msg = panic_message(&*panic_info);
            warn!(panic_msg = %panic_msg, "Task generator panicked");
            PanicGuardResult::Panicked(panic_msg)
        }
    }
}

/// Drive a future to completion with panic isolation
///
/// Each poll runs inside `catch_unwind`, so a panic anywhere in the task body
/// is reported here rather than killing the spawned driver.
pub(crate) async fn execute_guarded_async<F, T>(future: F) -> PanicGuardResult<T>
where
    F: Future<Output = T>,
{
    match AssertUnwindSafe(future).catch_unwind().await {
        Ok(result) => PanicGuardResult::Success(result),
        Err(panic_info) => {
            let panic_msg = panic_message(&*panic_info);
            warn!(panic_msg = %panic_msg, "Task panicked while running");
            PanicGuardResult::Panicked(panic_msg)
        }
    }
}

fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
