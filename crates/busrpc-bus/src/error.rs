//! Bus error type

use busrpc_core::RpcError;
use thiserror::Error;

/// Errors raised by a [`MessageBus`](crate::MessageBus) implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The connection to the bus is gone
    #[error("connection closed")]
    ConnectionClosed,

    /// Nothing is bound to the publish address
    #[error("no route to address '{0}'")]
    NoRoute(String),

    /// The named queue does not exist
    #[error("queue not found: {0}")]
    QueueNotFound(String),

    /// The delivery tag is not outstanding (already settled or its consumer is gone)
    #[error("unknown delivery tag: {0}")]
    UnknownDeliveryTag(u64),

    /// The broker refused a publish
    #[error("publish to '{address}' failed: {reason}")]
    PublishFailed { address: String, reason: String },
}

impl BusError {
    /// Whether the failure concerns a single publish rather than the connection
    pub fn is_publish_failure(&self) -> bool {
        matches!(self, BusError::NoRoute(_) | BusError::PublishFailed { .. })
    }
}

impl From<BusError> for RpcError {
    fn from(err: BusError) -> Self {
        if err.is_publish_failure() {
            RpcError::PublishError(err.to_string())
        } else {
            RpcError::TransportError(err.to_string())
        }
    }
}

#[cfg(test)]
#[path = "error/error_tests.rs"]
mod error_tests;
