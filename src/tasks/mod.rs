//! Named, cancelable units of async work scoped to an owner's lifetime.
//!
//! A [`TaskRegistry`] lives as long as the screen or controller that owns
//! it. Every spawned task gets a [`CancelToken`]; cancellation is
//! cooperative, so a task must watch its token and unwind without
//! publishing anything once it fires. Dropping the registry cancels
//! everything still registered.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

pub type TaskId = String;

/// Cooperative cancellation signal handed to a registered task.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation has been requested. Never resolves
    /// for a task that is allowed to run to completion.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// A running unit of work plus the switch that cancels it.
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    cancel: watch::Sender<bool>,
    join: JoinHandle<()>,
}

impl TaskHandle {
    /// Spawn `work` on the current tokio runtime under `id`.
    pub fn spawn<F, Fut>(id: impl Into<TaskId>, work: F) -> Self
    where
        F: FnOnce(CancelToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (cancel, rx) = watch::channel(false);
        let join = tokio::spawn(work(CancelToken { rx }));
        Self {
            id: id.into(),
            cancel,
            join,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Signal cancellation. Safe to call on a finished task.
    pub fn cancel(&self) {
        self.cancel.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

/// Identifier-keyed store of [`TaskHandle`]s.
///
/// All mutations go through a single mutex so `register`, `cancel` and
/// `cancel_all` may be called from any thread.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: Mutex<HashMap<TaskId, TaskHandle>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<TaskId, TaskHandle>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a running task. Re-registering an identifier cancels and
    /// replaces the handle previously stored under it.
    pub fn register(&self, handle: TaskHandle) {
        let previous = self.lock().insert(handle.id.clone(), handle);
        if let Some(previous) = previous {
            debug!(task = %previous.id, "superseding registered task");
            previous.cancel();
        }
    }

    /// Spawn and register `work` under `id`.
    pub fn spawn<F, Fut>(&self, id: impl Into<TaskId>, work: F) -> TaskId
    where
        F: FnOnce(CancelToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = TaskHandle::spawn(id, work);
        let id = handle.id.clone();
        self.register(handle);
        id
    }

    /// Spawn and register `work` under a freshly generated identifier.
    pub fn spawn_anonymous<F, Fut>(&self, work: F) -> TaskId
    where
        F: FnOnce(CancelToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.spawn(uuid::Uuid::new_v4().to_string(), work)
    }

    /// Cancel and remove one task. Returns `false` if `id` was not registered.
    pub fn cancel(&self, id: &str) -> bool {
        let removed = self.lock().remove(id);
        match removed {
            Some(handle) => {
                debug!(task = %id, "cancelling task");
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Cancel every task and empty the registry. Returns how many were
    /// cancelled; repeated calls find nothing and return 0.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<TaskHandle> = self.lock().drain().map(|(_, handle)| handle).collect();
        for handle in &drained {
            handle.cancel();
        }
        if !drained.is_empty() {
            debug!(count = drained.len(), "cancelled all tasks");
        }
        drained.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Registered tasks that have not run to completion yet.
    pub fn pending(&self) -> usize {
        self.lock().values().filter(|h| !h.is_finished()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Drop for TaskRegistry {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
