//! Admission Queue - bounded-concurrency FIFO task admission
//!
//! At most `max_size` tasks run at once. Everything else waits in FIFO order
//! and is admitted one at a time as running tasks complete.
//!
//! ## Invariants
//! - `active_size() <= max_size()` at every observable point.
//! - If `active_size() < max_size()` then `waiting_size() == 0` (capacity is
//!   never left idle while work waits).
//! - Waiting tasks join the active set strictly in submission order. Their
//!   generators are invoked after the lock is released, so two tasks released
//!   by concurrent completions on different threads may start in either
//!   order. With `max_size() == 1` start order is submission order too.
//! - A task whose driver is dropped unfinished (its runtime shut down) still
//!   frees its slot.
//!
//! All bookkeeping runs inside one mutex-guarded critical section. Generators,
//! settle callbacks and drops of discarded tasks always run outside it, so a
//! task may freely submit more work to the queue that is running it.

mod panic_guard;
mod submission;


pub use submission::Submission;

use std::collections::VecDeque;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::runtime::Handle;
use tracing::{debug, error, warn};

use crate::domain::{ClearPolicy, QueueConfig, TaskError, TaskHandle, TaskId};
use crate::error::{QueueError, Result};
use crate::port::{IdProvider, UuidProvider};

use panic_guard::{execute_guarded, execute_guarded_async, PanicGuardResult};

/// Type-erased start routine of a queued handle: invokes the generator and
/// returns the future that drives it to completion.
type Launch = Box<dyn FnOnce(Arc<Shared>) -> BoxFuture<'static, ()> + Send>;

/// A handle that has been accepted by the queue but not yet started
struct PendingTask {
    id: TaskId,
    runtime: Handle,
    launch: Launch,
}

#[derive(Default)]
struct QueueState {
    active: Vec<TaskId>,
    waiting: VecDeque<PendingTask>,
}

struct Shared {
    name: String,
    capacity: usize,
    clear_policy: ClearPolicy,
    id_provider: Arc<dyn IdProvider>,
    runtime: Option<Handle>,
    state: Mutex<QueueState>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, QueueState> {
        // User code never runs under this lock, so a poisoned guard still
        // holds consistent bookkeeping.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn runtime(&self) -> Result<Handle> {
        match &self.runtime {
            Some(handle) => Ok(handle.clone()),
            None => Handle::try_current().map_err(|_| QueueError::NoRuntime),
        }
    }

    /// Start an already-admitted task: its id is in `active` by now.
    fn start(self: &Arc<Self>, task: PendingTask) {
        let PendingTask {
            id,
            runtime,
            launch,
        } = task;
        debug!(queue = %self.name, task_id = %id, "Starting task");
        let driver = launch(Arc::clone(self));
        runtime.spawn(driver);
    }

    /// Completion notification: drop `id` from the active set and, in the
    /// same critical section, admit the head of the waiting list if a slot
    /// is free. `settle` runs after the lock is released and only when the
    /// handle was still active.
    fn complete(self: &Arc<Self>, id: &TaskId, settle: impl FnOnce()) {
        let (found, next, active, waiting) = {
            let mut state = self.state();
            let found = match state.active.iter().position(|a| a == id) {
                Some(pos) => {
                    state.active.remove(pos);
                    true
                }
                None => false,
            };
            let next = self.release(&mut state);
            (found, next, state.active.len(), state.waiting.len())
        };

        if found {
            settle();
        } else {
            error!(
                queue = %self.name,
                task_id = %id,
                "Completed task missing from active set; outcome dropped"
            );
        }

        debug!(
            queue = %self.name,
            task_id = %id,
            active,
            waiting,
            released = next.is_some(),
            "Task completed"
        );

        if let Some(next) = next {
            self.start(next);
        }
    }

    /// Release procedure: admits at most one waiting task.
    fn release(&self, state: &mut QueueState) -> Option<PendingTask> {
        if state.active.len() >= self.capacity {
            return None;
        }
        let next = state.waiting.pop_front()?;
        state.active.push(next.id.clone());
        Some(next)
    }
}

/// Bounded-concurrency FIFO admission queue.
///
/// Cheap to clone; clones share the same active set and waiting list.
#[derive(Clone)]
pub struct AdmissionQueue {
    shared: Arc<Shared>,
}

impl AdmissionQueue {
    /// Create a queue that runs at most `max_size` tasks at once
    pub fn new(max_size: usize) -> Result<Self> {
        Self::builder().max_size(max_size).build()
    }

    pub fn from_config(config: QueueConfig) -> Result<Self> {
        AdmissionQueueBuilder::from_config(config).build()
    }

    pub fn builder() -> AdmissionQueueBuilder {
        AdmissionQueueBuilder::default()
    }

    /// Queue a task generator.
    ///
    /// The generator is invoked once, when the task is admitted: immediately
    /// if a slot is free, otherwise after every earlier submission has been
    /// admitted. Sizes reflect this decision as soon as `submit` returns.
    ///
    /// # Errors
    /// `QueueError::NoRuntime` when called outside a tokio runtime on a queue
    /// built without an explicit runtime handle. The queue is left untouched.
    pub fn submit<F, Fut, T, E>(&self, generator: F) -> Result<Submission<T, E>>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Send + 'static,
    {
        let shared = &self.shared;
        let runtime = shared.runtime()?;

        let id = shared.id_provider.generate_id();
        let (on_success, on_failure, submission) =
            submission::channel(id.clone(), shared.clear_policy);
        let handle = TaskHandle::builder()
            .id(id.clone())
            .generator(generator)
            .on_success(on_success)
            .on_failure(on_failure)
            .build()?;

        let task = PendingTask {
            id: id.clone(),
            runtime,
            launch: launch(handle),
        };

        let (admitted, active, waiting) = {
            let mut state = shared.state();
            let admitted = if state.active.len() < shared.capacity {
                debug_assert!(state.waiting.is_empty(), "free slot while tasks wait");
                state.active.push(id.clone());
                Some(task)
            } else {
                state.waiting.push_back(task);
                None
            };
            (admitted, state.active.len(), state.waiting.len())
        };

        match admitted {
            Some(task) => {
                debug!(queue = %shared.name, task_id = %id, active, waiting, "Task admitted");
                shared.start(task);
            }
            None => {
                debug!(queue = %shared.name, task_id = %id, active, waiting, "Task queued");
            }
        }

        Ok(submission)
    }

    /// Number of tasks currently running
    pub fn active_size(&self) -> usize {
        self.shared.state().active.len()
    }

    /// Number of tasks waiting for a free slot
    pub fn waiting_size(&self) -> usize {
        self.shared.state().waiting.len()
    }

    pub fn max_size(&self) -> usize {
        self.shared.capacity
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn clear_policy(&self) -> ClearPolicy {
        self.shared.clear_policy
    }

    /// Discard every waiting task without running or settling it.
    ///
    /// Running tasks are unaffected. Under `ClearPolicy::Abandon` (the
    /// default) the discarded submissions never resolve. Returns the number
    /// of discarded tasks.
    pub fn clear(&self) -> usize {
        let discarded = std::mem::take(&mut self.shared.state().waiting);
        let count = discarded.len();
        drop(discarded);

        if count > 0 {
            warn!(
                queue = %self.shared.name,
                discarded = count,
                policy = ?self.shared.clear_policy,
                "Cleared waiting tasks"
            );
        }
        count
    }
}

impl std::fmt::Debug for AdmissionQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state();
        f.debug_struct("AdmissionQueue")
            .field("name", &self.shared.name)
            .field("max_size", &self.shared.capacity)
            .field("active", &state.active.len())
            .field("waiting", &state.waiting.len())
            .finish()
    }
}

/// Erase a typed handle into its start routine.
///
/// The returned closure runs at admission: it invokes the generator (panics
/// become `TaskError::Panicked`) and yields the driver future, which awaits
/// the outcome and hands it to [`Shared::complete`].
fn launch<T, E>(mut handle: TaskHandle<T, E>) -> Launch
where
    T: Send + 'static,
    E: Send + 'static,
{
    Box::new(move |shared: Arc<Shared>| {
        let slot = SlotGuard::new(shared, handle.id().clone());
        let invoked = execute_guarded(AssertUnwindSafe(|| handle.invoke()));

        async move {
            let outcome = match invoked {
                PanicGuardResult::Success(Ok(task)) => match execute_guarded_async(task).await {
                    PanicGuardResult::Success(Ok(value)) => Ok(value),
                    PanicGuardResult::Success(Err(e)) => Err(TaskError::Failed(e)),
                    PanicGuardResult::Panicked(msg) => Err(TaskError::Panicked(msg)),
                },
                PanicGuardResult::Success(Err(e)) => {
                    // A handle only reaches admission once
                    error!(task_id = %slot.id, error = %e, "Admitted task could not be started");
                    slot.complete(|| drop(handle));
                    return;
                }
                PanicGuardResult::Panicked(msg) => Err(TaskError::Panicked(msg)),
            };

            slot.complete(move || handle.settle(outcome));
        }
        .boxed()
    })
}

/// Owns an admitted task's place in the active set.
///
/// Lives inside the driver future. If the future is dropped before it
/// completes, the slot is still released and the handle is dropped unsettled.
struct SlotGuard {
    shared: Arc<Shared>,
    id: TaskId,
    armed: bool,
}

impl SlotGuard {
    fn new(shared: Arc<Shared>, id: TaskId) -> Self {
        Self {
            shared,
            id,
            armed: true,
        }
    }

    fn complete(mut self, settle: impl FnOnce()) {
        self.armed = false;
        self.shared.complete(&self.id, settle);
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        if self.armed {
            warn!(
                queue = %self.shared.name,
                task_id = %self.id,
                "Task dropped before completing; releasing its slot"
            );
            self.shared.complete(&self.id, || {});
        }
    }
}

/// Builder for [`AdmissionQueue`]
#[derive(Default)]
pub struct AdmissionQueueBuilder {
    config: QueueConfig,
    id_provider: Option<Arc<dyn IdProvider>>,
    runtime: Option<Handle>,
}

impl AdmissionQueueBuilder {
    pub fn from_config(config: QueueConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn max_size(mut self, max_size: usize) -> Self {
        self.config.max_size = max_size;
        self
    }

    pub fn clear_policy(mut self, clear_policy: ClearPolicy) -> Self {
        self.config.clear_policy = clear_policy;
        self
    }

    /// Source of task ids (UUID v4 by default)
    pub fn id_provider(mut self, id_provider: Arc<dyn IdProvider>) -> Self {
        self.id_provider = Some(id_provider);
        self
    }

    /// Runtime that drives admitted tasks. Without one, `submit` uses the
    /// runtime it is called from.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn build(self) -> Result<AdmissionQueue> {
        self.config.validate()?;
        Ok(self.assemble())
    }

    /// `build` minus validation, for sizes known to be valid
    pub(crate) fn assemble(self) -> AdmissionQueue {
        debug_assert!(self.config.max_size > 0);
        let QueueConfig {
            name,
            max_size,
            clear_policy,
        } = self.config;

        debug!(queue = %name, max_size, ?clear_policy, "Admission queue created");

        AdmissionQueue {
            shared: Arc::new(Shared {
                name,
                capacity: max_size,
                clear_policy,
                id_provider: self.id_provider.unwrap_or_else(|| Arc::new(UuidProvider)),
                runtime: self.runtime,
                state: Mutex::new(QueueState::default()),
            }),
        }
    }
}
