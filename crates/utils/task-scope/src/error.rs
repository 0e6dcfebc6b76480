use std::{borrow::Cow, sync::Arc, time::Duration};
use thiserror::Error;

/// Error recorded when a unit of work under a scope fails.
#[derive(Debug, Clone, Error)]
#[error("task '{task_name}' failed: {kind}")]
#[non_exhaustive]
pub struct TaskError {
    pub task_name: String,
    #[source]
    pub kind: TaskErrorKind,
}

impl TaskError {
    pub fn new(task_name: impl Into<String>, kind: TaskErrorKind) -> Self {
        Self {
            task_name: task_name.into(),
            kind,
        }
    }

    pub fn execution<E>(task_name: impl Into<String>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::new(
            task_name,
            TaskErrorKind::Execution {
                source: Arc::from(source.into()),
            },
        )
    }

    pub fn panic(task_name: impl Into<String>, message: impl Into<Cow<'static, str>>) -> Self {
        Self::new(
            task_name,
            TaskErrorKind::Panic {
                message: message.into(),
            },
        )
    }

    /// Same error attributed to a different task name.
    pub(crate) fn tagged(self, task_name: &str) -> Self {
        Self {
            task_name: task_name.to_string(),
            kind: self.kind,
        }
    }
}

/// Faults are shared between the scope's failure log and deferred outcome
/// slots, so the source is reference-counted rather than boxed.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum TaskErrorKind {
    #[error("execution error")]
    #[non_exhaustive]
    Execution {
        #[source]
        source: Arc<dyn std::error::Error + Send + Sync>,
    },

    #[error("task panicked: {message}")]
    #[non_exhaustive]
    Panic { message: Cow<'static, str> },
}

/// Why a cancellation was requested.
///
/// A deadline is a specialization of cancellation, never a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum CancelCause {
    /// `cancel`/`cancel_all` was called.
    Requested,
    /// A bounded-wait deadline elapsed.
    Deadline(Duration),
}

impl std::fmt::Display for CancelCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CancelCause::Requested => write!(f, "cancellation requested"),
            CancelCause::Deadline(limit) => write!(f, "deadline of {:?} elapsed", limit),
        }
    }
}

/// Terminal reason a unit of work stopped without completing.
///
/// Work bodies return `Err(TaskStop::cancelled())` after observing their
/// token; that exit is not an error and is kept apart from faults everywhere
/// downstream.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum TaskStop {
    #[error(transparent)]
    Fault(#[from] TaskError),

    #[error("cancelled: {0}")]
    Cancelled(CancelCause),
}

impl TaskStop {
    /// Cooperative exit after observing a cancelled token.
    pub fn cancelled() -> Self {
        Self::Cancelled(CancelCause::Requested)
    }

    /// Fault raised by a work body that does not know its registered name;
    /// the supervisor re-tags it with the child's name.
    pub fn execution<E>(source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Fault(TaskError::execution("unknown", source))
    }
}

pub type TaskResult<T> = Result<T, TaskStop>;

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn test_task_error_display() {
        let err = TaskError::execution(
            "test_task",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        let display = err.to_string();
        assert!(display.contains("test_task"));
        assert!(display.contains("failed"));
    }

    #[test]
    fn test_task_error_kinds() {
        let err = TaskError::panic("panic_task", "unexpected panic");
        assert!(matches!(err.kind, TaskErrorKind::Panic { .. }));
        assert_eq!(err.task_name, "panic_task");
    }

    #[test]
    fn test_error_source_chain() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let task_err = TaskError::execution("file_reader", io_err);

        assert!(task_err.source().is_some());
        let kind_err = task_err.source().unwrap();
        assert!(kind_err.source().is_some());
    }

    #[test]
    fn test_fault_survives_clone() {
        let err = TaskError::execution("worker", std::io::Error::other("boom"));
        let copy = err.clone();
        assert_eq!(copy.to_string(), err.to_string());
        assert!(copy.source().is_some());
    }

    #[test]
    fn test_stop_is_not_a_fault_when_cancelled() {
        let stop = TaskStop::cancelled();
        assert!(matches!(stop, TaskStop::Cancelled(CancelCause::Requested)));

        let stop = TaskStop::Cancelled(CancelCause::Deadline(Duration::from_millis(5)));
        assert!(stop.to_string().contains("deadline"));
    }

    #[test]
    fn test_retagging_keeps_kind() {
        let err = TaskError::execution("unknown", std::io::Error::other("boom"));
        let err = err.tagged("worker-3");
        assert_eq!(err.task_name, "worker-3");
        assert!(matches!(err.kind, TaskErrorKind::Execution { .. }));
    }
}
