pub use tokio_util::sync::CancellationToken;
pub mod error;
pub use error::{CancelCause, TaskError, TaskErrorKind, TaskResult, TaskStop};
pub use counter::{AtomicCounter, GuardedCounter, MutexCounter};
pub use deferred::{DeferredHandle, TaskOutcome};
pub use handle::{TaskHandle, TaskId, TaskState};
pub use scope::Scope;
pub use tasks::ScopedTask;
pub mod counter;
pub mod deferred;
pub mod handle;
pub mod scope;
pub mod tasks;
