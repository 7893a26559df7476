//! Tokio runtime management

use crate::shutdown::{ShutdownHandle, ShutdownSignal};
use busrpc_core::{RpcConfig, RpcError, RpcResult};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::Notify;

/// Configuration for the async runtime
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Number of worker threads (None = number of CPU cores)
    pub worker_threads: Option<usize>,
    /// Name prefix for worker threads
    pub thread_name: String,
    /// Enable I/O driver
    pub enable_io: bool,
    /// Enable time driver
    pub enable_time: bool,
    /// Maximum blocking threads
    pub max_blocking_threads: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            worker_threads: None,
            thread_name: "busrpc-worker".to_string(),
            enable_io: true,
            enable_time: true,
            max_blocking_threads: 512,
        }
    }
}

impl RuntimeConfig {
    /// Create a new runtime configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of worker threads
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = Some(threads);
        self
    }

    /// Set the thread name prefix
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}

impl From<&RpcConfig> for RuntimeConfig {
    fn from(config: &RpcConfig) -> Self {
        Self {
            worker_threads: config.worker_threads,
            ..Self::default()
        }
    }
}

/// Counts tasks spawned through [`AsyncRuntime::spawn`] that are still running
#[derive(Default)]
struct TaskTracker {
    active: AtomicUsize,
    idle: Notify,
}

impl TaskTracker {
    async fn wait_idle(&self) {
        loop {
            let mut idle = std::pin::pin!(self.idle.notified());
            idle.as_mut().enable();
            if self.active.load(Ordering::Acquire) == 0 {
                return;
            }
            idle.await;
        }
    }
}

struct TaskGuard(Arc<TaskTracker>);

impl Drop for TaskGuard {
    fn drop(&mut self) {
        if self.0.active.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.0.idle.notify_waiters();
        }
    }
}

/// Owns the Tokio runtime that callers and server loops run on
pub struct AsyncRuntime {
    runtime: Runtime,
    shutdown_handle: ShutdownHandle,
    tasks: Arc<TaskTracker>,
    config: RuntimeConfig,
}

impl AsyncRuntime {
    /// Create a new async runtime with the given configuration
    pub fn new(config: RuntimeConfig) -> RpcResult<Self> {
        let mut builder = Builder::new_multi_thread();

        if let Some(threads) = config.worker_threads {
            builder.worker_threads(threads);
        }

        builder
            .thread_name(&config.thread_name)
            .max_blocking_threads(config.max_blocking_threads);

        if config.enable_io {
            builder.enable_io();
        }

        if config.enable_time {
            builder.enable_time();
        }

        let runtime = builder
            .build()
            .map_err(|e| RpcError::RuntimeError(format!("Failed to create runtime: {}", e)))?;

        Ok(Self {
            runtime,
            shutdown_handle: ShutdownHandle::new(),
            tasks: Arc::new(TaskTracker::default()),
            config,
        })
    }

    /// Create a runtime with default configuration
    pub fn with_defaults() -> RpcResult<Self> {
        Self::new(RuntimeConfig::default())
    }

    /// Get the runtime configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Get a handle to the underlying Tokio runtime
    pub fn handle(&self) -> tokio::runtime::Handle {
        self.runtime.handle().clone()
    }

    /// Get the handle that triggers shutdown of this runtime's tasks
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown_handle.clone()
    }

    /// Get a shutdown signal that can be used to detect shutdown
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown_handle.signal()
    }

    /// Block on a future from a sync context
    ///
    /// Panics if called from inside an async context.
    pub fn block_on<F>(&self, future: F) -> F::Output
    where
        F: std::future::Future,
    {
        self.runtime.block_on(future)
    }

    /// Spawn a tracked task; [`shutdown`](Self::shutdown) waits for it to finish
    pub fn spawn<F>(&self, future: F) -> tokio::task::JoinHandle<F::Output>
    where
        F: std::future::Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tasks.active.fetch_add(1, Ordering::AcqRel);
        let guard = TaskGuard(self.tasks.clone());
        self.runtime.spawn(async move {
            let _guard = guard;
            future.await
        })
    }

    /// Spawn a blocking task
    pub fn spawn_blocking<F, R>(&self, func: F) -> tokio::task::JoinHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.runtime.spawn_blocking(func)
    }

    /// Number of tracked tasks still running
    pub fn active_tasks(&self) -> usize {
        self.tasks.active.load(Ordering::Acquire)
    }

    /// Initiate graceful shutdown
    ///
    /// Triggers the shutdown signal, then waits up to `timeout` for tracked
    /// tasks to finish.
    pub fn shutdown(&self, timeout: Duration) -> RpcResult<()> {
        tracing::info!("Initiating runtime shutdown with timeout {:?}", timeout);

        self.shutdown_handle.trigger();

        let tasks = self.tasks.clone();
        let drained = self
            .runtime
            .block_on(async move { tokio::time::timeout(timeout, tasks.wait_idle()).await })
            .is_ok();

        if !drained {
            let remaining = self.active_tasks();
            tracing::warn!(remaining, "Runtime shutdown timed out");
            return Err(RpcError::RuntimeError(format!(
                "{} task(s) still running after {:?}",
                remaining, timeout
            )));
        }

        tracing::info!("Runtime shutdown complete");
        Ok(())
    }

    /// Check if shutdown has been triggered
    pub fn is_shutting_down(&self) -> bool {
        self.shutdown_handle.is_triggered()
    }
}

impl Drop for AsyncRuntime {
    fn drop(&mut self) {
        self.shutdown_handle.trigger();
    }
}
