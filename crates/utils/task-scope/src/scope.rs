use std::{
    borrow::Cow,
    future::Future,
    panic::AssertUnwindSafe,
    sync::{
        Arc, Mutex, OnceLock,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use futures::FutureExt;
use logger::{debug, warn};
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    deferred::{DeferredHandle, TaskOutcome},
    error::{CancelCause, TaskError, TaskResult, TaskStop},
    handle::{TaskHandle, TaskId, TaskState},
    tasks::ScopedTask,
};

/// Owner of a set of concurrent children.
///
/// A scope's lifetime strictly contains its children's lifetimes: spawn
/// children, then call [`Scope::await_all`] before letting control pass the
/// scope boundary. One child's fault cancels the scope token, so siblings
/// stop at their next cooperative check instead of running to completion.
///
/// Cancellation is advisory everywhere: a work body that never consults its
/// token never stops. That is a caller obligation, not something the scope
/// patches over.
pub struct Scope {
    name: Arc<str>,
    token: CancellationToken,
    children: Mutex<Vec<Child>>,
    failures: Arc<Mutex<Vec<TaskError>>>,
    next_id: AtomicU64,
}

struct Child {
    handle: TaskHandle,
    join: Option<JoinHandle<()>>,
}

impl Scope {
    /// Scope with a fresh cancellation token.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_token(name, CancellationToken::new())
    }

    /// Scope whose token is derived from `parent`: cancelling the parent is
    /// observed here, never the reverse.
    pub fn with_parent(name: impl Into<String>, parent: &CancellationToken) -> Self {
        Self::with_token(name, parent.child_token())
    }

    /// Nested scope derived from this scope's token.
    pub fn child_scope(&self, name: impl Into<String>) -> Scope {
        Self::with_token(name, self.token.child_token())
    }

    fn with_token(name: impl Into<String>, token: CancellationToken) -> Self {
        Self {
            name: Arc::from(name.into().as_str()),
            token,
            children: Mutex::new(Vec::new()),
            failures: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Spawn a fire-and-forget child. The child is registered before this
    /// returns; execution start is up to the runtime scheduler.
    pub fn spawn<F, Fut>(&self, name: impl Into<String>, work: F) -> TaskHandle
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = TaskResult<()>> + Send + 'static,
    {
        let (handle, _slot) = self.spawn_inner::<(), F, Fut>(name.into(), None, work);
        handle
    }

    /// [`Scope::spawn`] with a bounded wait: when `limit` elapses the child's
    /// token is cancelled with [`CancelCause::Deadline`]; otherwise identical
    /// to [`TaskHandle::cancel`].
    pub fn spawn_with_deadline<F, Fut>(
        &self,
        name: impl Into<String>,
        limit: Duration,
        work: F,
    ) -> TaskHandle
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = TaskResult<()>> + Send + 'static,
    {
        let (handle, _slot) = self.spawn_inner::<(), F, Fut>(name.into(), Some(limit), work);
        handle
    }

    /// Spawn a value-producing child.
    pub fn spawn_deferred<T, F, Fut>(&self, name: impl Into<String>, work: F) -> DeferredHandle<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = TaskResult<T>> + Send + 'static,
    {
        let (handle, slot) = self.spawn_inner::<T, F, Fut>(name.into(), None, work);
        DeferredHandle { handle, slot }
    }

    /// Value-producing child with a bounded wait.
    pub fn spawn_deferred_with_deadline<T, F, Fut>(
        &self,
        name: impl Into<String>,
        limit: Duration,
        work: F,
    ) -> DeferredHandle<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = TaskResult<T>> + Send + 'static,
    {
        let (handle, slot) = self.spawn_inner::<T, F, Fut>(name.into(), Some(limit), work);
        DeferredHandle { handle, slot }
    }

    /// Spawn `instances` uniform children named `{name}-{i}`.
    pub fn spawn_many<F, Fut>(&self, name: &str, instances: usize, factory: F) -> Vec<TaskHandle>
    where
        F: Fn(usize, CancellationToken) -> Fut,
        Fut: Future<Output = TaskResult<()>> + Send + 'static,
    {
        (0..instances)
            .map(|i| self.spawn(format!("{name}-{i}"), |token| factory(i, token)))
            .collect()
    }

    /// Register a trait task. Its `on_stop` hook runs on every exit path
    /// before the terminal state is published; a failing hook is logged, not
    /// surfaced.
    pub fn register<S: ScopedTask>(&self, task: S) -> TaskHandle {
        let task = Arc::new(task);
        let name = task.name().to_string();
        self.spawn(name, move |token| async move {
            let res = task.run(token).await;
            if let Err(stop) = task.on_stop().await {
                warn!(task = %task.name(), error = %stop, "cleanup hook failed");
            }
            res
        })
    }

    /// Request cancellation of every current and future child. Idempotent,
    /// non-blocking; children stop at their next cooperative check.
    pub fn cancel_all(&self) {
        debug!(scope = %self.name, "cancelling all children");
        self.token.cancel();
    }

    /// Suspend until every child (including ones spawned while waiting) has
    /// reached a terminal state, then surface the first-recorded fault if
    /// any child failed. Zero children: returns `Ok(())` immediately.
    ///
    /// Never returns early on failure; a faulted child's siblings are
    /// cancelled and still awaited to termination first.
    pub async fn await_all(&self) -> Result<(), TaskError> {
        loop {
            let pending: Vec<JoinHandle<()>> = {
                let mut children = self.children.lock().unwrap();
                children.iter_mut().filter_map(|c| c.join.take()).collect()
            };
            if pending.is_empty() {
                break;
            }
            for join in pending {
                // The supervisor shields the work body, so the only join
                // error left is an abort, and the scope never aborts.
                let _ = join.await;
            }
        }

        match self.first_failure() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Handles of all children in spawn order.
    pub fn handles(&self) -> Vec<TaskHandle> {
        self.children
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.handle.clone())
            .collect()
    }

    /// All recorded faults, in record order.
    pub fn failures(&self) -> Vec<TaskError> {
        self.failures.lock().unwrap().clone()
    }

    /// First-recorded fault, the one [`Scope::await_all`] surfaces.
    pub fn first_failure(&self) -> Option<TaskError> {
        self.failures.lock().unwrap().first().cloned()
    }

    fn spawn_inner<T, F, Fut>(
        &self,
        name: String,
        deadline: Option<Duration>,
        work: F,
    ) -> (TaskHandle, Arc<OnceLock<TaskOutcome<T>>>)
    where
        T: Send + Sync + 'static,
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = TaskResult<T>> + Send + 'static,
    {
        let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let token = self.token.child_token();
        let cause = Arc::new(OnceLock::new());
        let (state_tx, state_rx) = watch::channel(TaskState::Pending);
        let slot: Arc<OnceLock<TaskOutcome<T>>> = Arc::new(OnceLock::new());
        let name: Arc<str> = Arc::from(name.as_str());

        let handle = TaskHandle {
            id,
            name: name.clone(),
            token: token.clone(),
            cause: cause.clone(),
            state: state_rx,
        };

        let ctx = ChildContext {
            scope: self.name.clone(),
            name,
            token: token.clone(),
            cause,
            deadline,
            state: state_tx,
            failures: self.failures.clone(),
            scope_token: self.token.clone(),
        };

        let fut = work(token);
        let join = tokio::spawn(supervise(ctx, slot.clone(), fut));

        self.children.lock().unwrap().push(Child {
            handle: handle.clone(),
            join: Some(join),
        });
        debug!(scope = %self.name, task = %handle.name, id = handle.id.as_u64(), "child registered");

        (handle, slot)
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        let live = self
            .children
            .get_mut()
            .map(|cs| {
                cs.iter()
                    .filter(|c| !c.handle.state().is_terminal())
                    .count()
            })
            .unwrap_or(0);

        if live > 0 {
            warn!(scope = %self.name, live, "scope dropped with non-terminal children; cancelling");
            self.token.cancel();
        }
    }
}

struct ChildContext {
    scope: Arc<str>,
    name: Arc<str>,
    token: CancellationToken,
    cause: Arc<OnceLock<CancelCause>>,
    deadline: Option<Duration>,
    state: watch::Sender<TaskState>,
    failures: Arc<Mutex<Vec<TaskError>>>,
    scope_token: CancellationToken,
}

impl ChildContext {
    fn cancel_cause(&self) -> CancelCause {
        self.cause.get().copied().unwrap_or(CancelCause::Requested)
    }
}

/// Wrapper every child runs under: publishes state transitions, maps the
/// work's exit to an outcome, records faults, and triggers fail-together.
async fn supervise<T, Fut>(ctx: ChildContext, slot: Arc<OnceLock<TaskOutcome<T>>>, fut: Fut)
where
    T: Send + Sync + 'static,
    Fut: Future<Output = TaskResult<T>> + Send,
{
    if ctx.token.is_cancelled() {
        // Cancelled before the first poll: the work body never runs.
        debug!(scope = %ctx.scope, task = %ctx.name, "child cancelled before start");
        finish(&ctx, &slot, TaskOutcome::Cancelled(ctx.cancel_cause()), TaskState::Cancelled);
        return;
    }

    let _ = ctx.state.send(TaskState::Running);
    debug!(scope = %ctx.scope, task = %ctx.name, "child started");

    let work = AssertUnwindSafe(fut).catch_unwind();
    tokio::pin!(work);

    let res = tokio::select! {
        res = &mut work => res,
        _ = watch_for_cancel(&ctx) => {
            let _ = ctx.state.send(TaskState::Cancelling);
            work.await
        }
    };

    match res {
        Ok(Ok(value)) => {
            debug!(scope = %ctx.scope, task = %ctx.name, "child completed");
            finish(&ctx, &slot, TaskOutcome::Completed(value), TaskState::Completed);
        }
        Ok(Err(TaskStop::Cancelled(cause))) => {
            // A recorded cause (deadline watcher, explicit cancel) wins over
            // the generic one the work body returned.
            let cause = ctx.cause.get().copied().unwrap_or(cause);
            debug!(scope = %ctx.scope, task = %ctx.name, %cause, "child cancelled");
            finish(&ctx, &slot, TaskOutcome::Cancelled(cause), TaskState::Cancelled);
        }
        Ok(Err(TaskStop::Fault(err))) => {
            fail(&ctx, &slot, err.tagged(&ctx.name));
        }
        Err(payload) => {
            fail(&ctx, &slot, TaskError::panic(ctx.name.as_ref(), panic_message(payload)));
        }
    }
}

/// Resolves once cancellation is requested, from the token or from the
/// deadline elapsing.
async fn watch_for_cancel(ctx: &ChildContext) {
    match ctx.deadline {
        Some(limit) => {
            tokio::select! {
                _ = ctx.token.cancelled() => {}
                _ = tokio::time::sleep(limit) => {
                    let _ = ctx.cause.set(CancelCause::Deadline(limit));
                    ctx.token.cancel();
                }
            }
        }
        None => ctx.token.cancelled().await,
    }
}

fn fail<T>(ctx: &ChildContext, slot: &Arc<OnceLock<TaskOutcome<T>>>, err: TaskError) {
    warn!(scope = %ctx.scope, task = %ctx.name, error = %err, "child failed; cancelling siblings");
    ctx.failures.lock().unwrap().push(err.clone());
    ctx.scope_token.cancel();
    finish(ctx, slot, TaskOutcome::Failed(err), TaskState::Failed);
}

fn finish<T>(
    ctx: &ChildContext,
    slot: &Arc<OnceLock<TaskOutcome<T>>>,
    outcome: TaskOutcome<T>,
    state: TaskState,
) {
    // Slot before state: an observer that saw a terminal state must find
    // the slot filled.
    let _ = slot.set(outcome);
    let _ = ctx.state.send(state);
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> Cow<'static, str> {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        Cow::Borrowed(*msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        Cow::Owned(msg.clone())
    } else {
        Cow::Borrowed("opaque panic payload")
    }
}
