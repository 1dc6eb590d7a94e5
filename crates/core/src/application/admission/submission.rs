// Submission - the caller's side of a queued task's outcome

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::domain::{ClearPolicy, FailureCallback, SuccessCallback, TaskError, TaskId};

type Outcome<T, E> = Result<T, TaskError<E>>;
type Slot<T, E> = Arc<Mutex<Option<oneshot::Sender<Outcome<T, E>>>>>;

/// Future returned by [`AdmissionQueue::submit`](super::AdmissionQueue::submit).
///
/// Resolves with the task's own outcome. If the task is dropped before it
/// settles (see `clear()`), the submission follows the queue's
/// [`ClearPolicy`]: under `Abandon` it stays pending forever, under `Reject`
/// it resolves to [`TaskError::Abandoned`].
#[must_use = "a submission does nothing to the task, but dropping it discards the outcome"]
#[derive(Debug)]
pub struct Submission<T, E> {
    id: TaskId,
    rx: oneshot::Receiver<Outcome<T, E>>,
    clear_policy: ClearPolicy,
    abandoned: bool,
}

impl<T, E> Submission<T, E> {
    pub fn id(&self) -> &TaskId {
        &self.id
    }
}

impl<T, E> Future for Submission<T, E> {
    type Output = Outcome<T, E>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.abandoned {
            return Poll::Pending;
        }
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            // Both callbacks were dropped without firing
            Poll::Ready(Err(_)) => match self.clear_policy {
                ClearPolicy::Abandon => {
                    self.abandoned = true;
                    Poll::Pending
                }
                ClearPolicy::Reject => Poll::Ready(Err(TaskError::Abandoned)),
            },
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Create the two settle callbacks for a task and the submission they settle.
pub(crate) fn channel<T, E>(
    id: TaskId,
    clear_policy: ClearPolicy,
) -> (SuccessCallback<T>, FailureCallback<E>, Submission<T, E>)
where
    T: Send + 'static,
    E: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let slot: Slot<T, E> = Arc::new(Mutex::new(Some(tx)));

    let success_slot = Arc::clone(&slot);
    let on_success: SuccessCallback<T> = Box::new(move |value| deliver(&success_slot, Ok(value)));
    let on_failure: FailureCallback<E> = Box::new(move |error| deliver(&slot, Err(error)));

    let submission = Submission {
        id,
        rx,
        clear_policy,
        abandoned: false,
    };
    (on_success, on_failure, submission)
}

fn deliver<T, E>(slot: &Slot<T, E>, outcome: Outcome<T, E>) {
    let sender = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
    if let Some(tx) = sender {
        // Receiver gone means the caller stopped listening
        let _ = tx.send(outcome);
    }
}
