//! Error types for busrpc callers and servers

use thiserror::Error;

/// Result type alias for busrpc operations
pub type RpcResult<T> = Result<T, RpcError>;

/// Error type for busrpc operations
#[derive(Error, Debug)]
pub enum RpcError {
    /// Component is not in a valid state for the requested operation
    #[error("invalid state: expected {expected}, got {actual}")]
    InvalidState { expected: String, actual: String },

    /// Envelope failed to decode or is missing required fields
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// The request handler failed
    #[error("handler error ({status}): {message}")]
    HandlerError { status: u16, message: String },

    /// Response could not be published to the reply address
    #[error("publish failed: {0}")]
    PublishError(String),

    /// No matching response arrived before the deadline
    #[error("request timed out")]
    Timeout,

    /// Underlying bus connectivity failure
    #[error("transport error: {0}")]
    TransportError(String),

    /// Serialization/deserialization error
    #[error("serialization error: {0}")]
    SerializationError(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Async runtime error
    #[error("runtime error: {0}")]
    RuntimeError(String),

    /// Call was abandoned by the caller
    #[error("request cancelled")]
    Cancelled,

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl RpcError {
    /// Shorthand for a handler failure with an explicit status
    pub fn handler(status: u16, message: impl Into<String>) -> Self {
        RpcError::HandlerError {
            status,
            message: message.into(),
        }
    }

    /// Returns a stable numeric error code
    pub fn error_code(&self) -> u32 {
        match self {
            RpcError::InvalidState { .. } => 1,
            RpcError::MalformedEnvelope(_) => 2,
            RpcError::HandlerError { .. } => 3,
            RpcError::PublishError(_) => 4,
            RpcError::Timeout => 5,
            RpcError::TransportError(_) => 6,
            RpcError::SerializationError(_) => 7,
            RpcError::ConfigError(_) => 8,
            RpcError::RuntimeError(_) => 9,
            RpcError::Cancelled => 10,
            RpcError::Internal(_) => 11,
        }
    }

    /// Create an error from an error code and message
    pub fn from_code(code: u32, message: String) -> Self {
        match code {
            1 => RpcError::InvalidState {
                expected: String::new(),
                actual: message,
            },
            2 => RpcError::MalformedEnvelope(message),
            3 => RpcError::HandlerError {
                status: 500,
                message,
            },
            4 => RpcError::PublishError(message),
            5 => RpcError::Timeout,
            6 => RpcError::TransportError(message),
            7 => RpcError::SerializationError(message),
            8 => RpcError::ConfigError(message),
            9 => RpcError::RuntimeError(message),
            10 => RpcError::Cancelled,
            _ => RpcError::Internal(message),
        }
    }

    /// HTTP-equivalent status used when this error becomes a response
    pub fn status(&self) -> u16 {
        match self {
            RpcError::HandlerError { status, .. } => *status,
            RpcError::MalformedEnvelope(_) | RpcError::SerializationError(_) => 400,
            RpcError::Timeout => 504,
            _ => 500,
        }
    }

    /// Transport failures are fatal to the affected caller or loop instance
    pub fn is_fatal(&self) -> bool {
        matches!(self, RpcError::TransportError(_))
    }
}

impl From<serde_json::Error> for RpcError {
    fn from(err: serde_json::Error) -> Self {
        RpcError::SerializationError(err.to_string())
    }
}


#[cfg(test)]
#[path = "error/error_parameterized_tests.rs"]
mod error_parameterized_tests;
