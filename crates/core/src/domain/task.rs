// Task Handle Domain Model

use std::fmt;
use std::future::Future;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};

use super::error::TaskError;
use crate::error::{QueueError, Result};

/// Opaque task identifier (UUID v4 unless an `IdProvider` says otherwise)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Fresh random identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deferred unit of work: called once, yields the task's eventual outcome.
pub type TaskGenerator<T, E> =
    Box<dyn FnOnce() -> BoxFuture<'static, std::result::Result<T, E>> + Send>;

/// Success side of a handle's outcome channel.
pub type SuccessCallback<T> = Box<dyn FnOnce(T) + Send>;

/// Failure side of a handle's outcome channel.
pub type FailureCallback<E> = Box<dyn FnOnce(TaskError<E>) + Send>;

/// A submitted task paired with its identity and its completion callbacks.
///
/// The generator is invoked at most once. Settling consumes the handle, so
/// exactly one of the two callbacks can ever fire.
pub struct TaskHandle<T, E> {
    id: TaskId,
    generator: Option<TaskGenerator<T, E>>,
    on_success: SuccessCallback<T>,
    on_failure: FailureCallback<E>,
}

impl<T, E> TaskHandle<T, E> {
    pub fn id(&self) -> &TaskId {
        &self.id
    }

    /// True until the generator has been invoked.
    pub fn is_pending(&self) -> bool {
        self.generator.is_some()
    }
}

impl<T, E> TaskHandle<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    pub fn builder() -> TaskHandleBuilder<T, E> {
        TaskHandleBuilder::default()
    }

    /// Invoke the generator and return the future of its outcome.
    ///
    /// The generator is taken out before it runs, so a panic inside it still
    /// leaves the handle (and its callbacks) usable for settling.
    pub fn invoke(&mut self) -> Result<BoxFuture<'static, std::result::Result<T, E>>> {
        let generator = self.generator.take().ok_or_else(|| {
            QueueError::InvalidState(format!("task {} was already started", self.id))
        })?;
        Ok(generator())
    }

    pub fn settle_success(self, value: T) {
        (self.on_success)(value);
    }

    pub fn settle_failure(self, error: TaskError<E>) {
        (self.on_failure)(error);
    }

    /// Route an outcome to the matching callback
    pub fn settle(self, outcome: std::result::Result<T, TaskError<E>>) {
        match outcome {
            Ok(value) => self.settle_success(value),
            Err(error) => self.settle_failure(error),
        }
    }
}

impl<T, E> fmt::Debug for TaskHandle<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id)
            .field("pending", &self.is_pending())
            .finish()
    }
}

/// Builder for [`TaskHandle`]; `build()` rejects a handle missing any part.
pub struct TaskHandleBuilder<T, E> {
    id: Option<TaskId>,
    generator: Option<TaskGenerator<T, E>>,
    on_success: Option<SuccessCallback<T>>,
    on_failure: Option<FailureCallback<E>>,
}

impl<T, E> Default for TaskHandleBuilder<T, E> {
    fn default() -> Self {
        Self {
            id: None,
            generator: None,
            on_success: None,
            on_failure: None,
        }
    }
}

impl<T, E> TaskHandleBuilder<T, E>
where
    T: Send + 'static,
    E: Send + 'static,
{
    /// Use a caller-supplied id instead of a random one
    pub fn id(mut self, id: TaskId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn generator<F, Fut>(mut self, generator: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        self.generator = Some(Box::new(move || generator().boxed()));
        self
    }

    pub fn on_success<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(T) + Send + 'static,
    {
        self.on_success = Some(Box::new(callback));
        self
    }

    pub fn on_failure<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(TaskError<E>) + Send + 'static,
    {
        self.on_failure = Some(Box::new(callback));
        self
    }

    pub fn build(self) -> Result<TaskHandle<T, E>> {
        let generator = self.generator.ok_or_else(|| {
            QueueError::InvalidArgument("TaskHandle missing generator".to_string())
        })?;
        let on_success = self.on_success.ok_or_else(|| {
            QueueError::InvalidArgument("TaskHandle missing on_success callback".to_string())
        })?;
        let on_failure = self.on_failure.ok_or_else(|| {
            QueueError::InvalidArgument("TaskHandle missing on_failure callback".to_string())
        })?;

        Ok(TaskHandle {
            id: self.id.unwrap_or_else(TaskId::generate),
            generator: Some(generator),
            on_success,
            on_failure,
        })
    }
}
