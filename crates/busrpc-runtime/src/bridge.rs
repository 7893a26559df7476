//! Bridge between synchronous callers and async operations

use crate::{AsyncRuntime, ShutdownSignal};
use busrpc_core::{RpcError, RpcResult};
use std::future::Future;
use std::sync::Arc;

/// Runs async operations to completion from synchronous code
#[derive(Clone)]
pub struct AsyncBridge {
    runtime: Arc<AsyncRuntime>,
}

impl AsyncBridge {
    /// Create a new async bridge
    pub fn new(runtime: Arc<AsyncRuntime>) -> Self {
        Self { runtime }
    }

    /// The runtime this bridge drives
    pub fn runtime(&self) -> &Arc<AsyncRuntime> {
        &self.runtime
    }

    /// Execute an async operation synchronously (blocking)
    pub fn call_sync<F, T>(&self, future: F) -> RpcResult<T>
    where
        F: Future<Output = RpcResult<T>>,
    {
        if self.runtime.is_shutting_down() {
            return Err(RpcError::RuntimeError(
                "Runtime is shutting down".to_string(),
            ));
        }
        self.runtime.block_on(future)
    }

    /// Spawn an async task and return a handle
    pub fn spawn<F, T>(&self, future: F) -> tokio::task::JoinHandle<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        self.runtime.spawn(future)
    }

    /// Get a shutdown signal
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.runtime.shutdown_signal()
    }

    /// Check if the runtime is shutting down
    pub fn is_shutting_down(&self) -> bool {
        self.runtime.is_shutting_down()
    }
}
