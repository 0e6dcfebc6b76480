use std::sync::{Arc, OnceLock};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::CancelCause;

/// Lifecycle of one unit of work under a scope.
///
/// Transitions flow one way: `Pending -> Running -> (Cancelling) ->` one of
/// the terminal states. Only the supervisor publishes transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Pending,
    Running,
    Cancelling,
    Completed,
    Failed,
    Cancelled,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Cancelled
        )
    }
}

/// Identifier of a child within its scope, in spawn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub(crate) u64);

impl TaskId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Observer handle to one spawned task.
///
/// Cloneable; every clone watches the same state machine and cancels the same
/// token. Dropping handles never affects the task itself.
#[derive(Debug, Clone)]
pub struct TaskHandle {
    pub(crate) id: TaskId,
    pub(crate) name: Arc<str>,
    pub(crate) token: CancellationToken,
    pub(crate) cause: Arc<OnceLock<CancelCause>>,
    pub(crate) state: watch::Receiver<TaskState>,
}

impl TaskHandle {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state, non-blocking.
    pub fn state(&self) -> TaskState {
        *self.state.borrow()
    }

    /// Request cooperative cancellation of this task only and return
    /// immediately. The work stops at its next cancellation check; a body
    /// that never checks its token never stops.
    pub fn cancel(&self) {
        let _ = self.cause.set(CancelCause::Requested);
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Suspend until the task reaches a terminal state.
    ///
    /// Never propagates the task's failure; inspect [`TaskHandle::state`] or
    /// the owning scope for that.
    pub async fn join(&self) {
        let mut state = self.state.clone();
        // The supervisor publishes a terminal state before releasing the
        // sender, so a closed channel already carries a terminal value.
        let _ = state.wait_for(TaskState::is_terminal).await;
    }

    pub(crate) fn cancel_cause(&self) -> CancelCause {
        self.cause.get().copied().unwrap_or(CancelCause::Requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(TaskState::Completed.is_terminal());
        assert!(TaskState::Failed.is_terminal());
        assert!(TaskState::Cancelled.is_terminal());
        assert!(!TaskState::Pending.is_terminal());
        assert!(!TaskState::Running.is_terminal());
        assert!(!TaskState::Cancelling.is_terminal());
    }
}
