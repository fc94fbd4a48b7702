use std::future::Future;

use tokio::{runtime::Runtime, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Owns the node's runtime and a shutdown token shared by every task it spawns.
pub struct ReamExecutor {
    runtime: Runtime,
    shutdown: CancellationToken,
}

impl ReamExecutor {
    pub fn new() -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .thread_name("ream-worker")
            .enable_all()
            .build()?;
        Ok(Self::with_runtime(runtime))
    }

    /// Creates a new executor with an existing runtime
    pub fn with_runtime(runtime: Runtime) -> Self {
        Self {
            runtime,
            shutdown: CancellationToken::new(),
        }
    }

    /// Spawns ``future``, dropping it at shutdown. Resolves to ``None`` if it was dropped.
    pub fn spawn<F>(&self, future: F) -> JoinHandle<Option<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let shutdown = self.shutdown.clone();
        self.runtime.spawn(async move {
            tokio::select! {
                result = future => Some(result),
                _ = shutdown.cancelled() => {
                    debug!("Task dropped due to shutdown");
                    None
                }
            }
        })
    }

    /// Spawns a task that observes shutdown itself through the token it is given, so it can
    /// finish cleanly.
    pub fn spawn_cancellable<F, Fut, T>(&self, future_fn: F) -> JoinHandle<T>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send,
        T: Send + 'static,
    {
        let shutdown = self.shutdown.child_token();
        self.runtime.spawn(async move { future_fn(shutdown).await })
    }

    /// Runs ``future`` to completion on the runtime, blocking the current thread.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Triggers a shutdown signal to all spawned tasks
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}
