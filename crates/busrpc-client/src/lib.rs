//! busrpc-client - Correlated caller
//!
//! [`RpcClient`] turns a publish onto the shared request queue into an
//! awaitable call: each call registers a pending slot keyed by a unique
//! correlation ID before publishing, and a background task drains the
//! client's private reply queue, routing each response to its slot.
//! Any number of calls may be outstanding at once.
//!
//! [`BlockingRpcClient`] wraps the same machinery for synchronous callers.

mod blocking;
mod client;
mod pending;
mod reply;

pub use blocking::BlockingRpcClient;
pub use client::RpcClient;
pub use pending::{PendingCalls, PendingGuard};
pub use reply::RpcReply;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{BlockingRpcClient, RpcClient, RpcReply};
}
