//! busrpc-runtime - Tokio runtime management
//!
//! This crate provides:
//! - [`AsyncRuntime`] owning a multi-threaded Tokio runtime with tracked tasks
//! - [`AsyncBridge`] for driving async calls from synchronous code
//! - [`ShutdownHandle`] / [`ShutdownSignal`] for cooperative shutdown of server loops

mod bridge;
mod runtime;
mod shutdown;

pub use bridge::AsyncBridge;
pub use runtime::{AsyncRuntime, RuntimeConfig};
pub use shutdown::{ShutdownHandle, ShutdownSignal};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{AsyncBridge, AsyncRuntime, RuntimeConfig, ShutdownHandle, ShutdownSignal};
}
