use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::TaskResult;

/// Trait-based unit of work for tasks that carry their own identity and
/// cleanup, registered via [`crate::Scope::register`]. One-shot closures go
/// through [`crate::Scope::spawn`] instead.
#[async_trait]
pub trait ScopedTask: Send + Sync + 'static {
    fn name(&self) -> &str;

    /// Main execution - receives a cancellation token for cooperative
    /// shutdown.
    ///
    /// The CancellationToken provides:
    /// - `token.cancelled().await` - Wait for the cancellation signal
    /// - `token.is_cancelled()` - Check if cancellation was requested
    ///
    /// Return `Err(TaskStop::cancelled())` after observing the token to end
    /// in the `Cancelled` state rather than `Completed`.
    async fn run(&self, token: CancellationToken) -> TaskResult<()>;

    /// Cleanup hook, run on every exit path (completion, fault, or
    /// cancellation) before the terminal state is published.
    async fn on_stop(&self) -> TaskResult<()> {
        Ok(())
    }
}
