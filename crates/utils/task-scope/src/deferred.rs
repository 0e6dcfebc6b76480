use std::sync::{Arc, OnceLock};

use crate::{
    error::{TaskError, TaskResult, TaskStop},
    handle::{TaskHandle, TaskState},
    CancelCause,
};

/// Terminal outcome of a value-producing task.
///
/// Cancellation is reported apart from failure; callers can always tell
/// "stopped on request" from "blew up".
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum TaskOutcome<T> {
    Completed(T),
    Failed(TaskError),
    Cancelled(CancelCause),
}

impl<T> TaskOutcome<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, TaskOutcome::Completed(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, TaskOutcome::Cancelled(_))
    }
}

/// Handle to a task that also yields a value on successful completion.
///
/// The outcome slot is write-once: the supervisor fills it exactly once,
/// before publishing the terminal state, and it never changes afterwards.
#[derive(Debug, Clone)]
pub struct DeferredHandle<T> {
    pub(crate) handle: TaskHandle,
    pub(crate) slot: Arc<OnceLock<TaskOutcome<T>>>,
}

impl<T> DeferredHandle<T> {
    pub fn handle(&self) -> &TaskHandle {
        &self.handle
    }

    pub fn state(&self) -> TaskState {
        self.handle.state()
    }

    /// Request cooperative cancellation; identical to [`TaskHandle::cancel`].
    pub fn cancel(&self) {
        self.handle.cancel();
    }
}

impl<T: Clone> DeferredHandle<T> {
    /// Suspend until the task is terminal, then read the stored outcome.
    ///
    /// Idempotent: repeated calls return the same stored outcome. A fault
    /// carries the originating task's name.
    pub async fn outcome(&self) -> TaskOutcome<T> {
        self.handle.join().await;
        self.slot
            .get()
            .cloned()
            .expect("outcome slot is written before the terminal state is published")
    }

    /// Like [`DeferredHandle::outcome`], flattened into a `TaskResult`.
    pub async fn value(&self) -> TaskResult<T> {
        match self.outcome().await {
            TaskOutcome::Completed(value) => Ok(value),
            TaskOutcome::Failed(err) => Err(TaskStop::Fault(err)),
            TaskOutcome::Cancelled(cause) => Err(TaskStop::Cancelled(cause)),
        }
    }
}
