//! Response as seen by the caller

use busrpc_core::{RpcError, RpcResult};
use serde::de::DeserializeOwned;

/// Body and status of a completed call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcReply {
    /// HTTP-equivalent status (200 when the server sent none)
    pub status: u16,
    /// Raw response body
    pub body: Vec<u8>,
}

impl RpcReply {
    /// Check if the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as UTF-8 text
    pub fn text(&self) -> RpcResult<&str> {
        std::str::from_utf8(&self.body)
            .map_err(|e| RpcError::SerializationError(format!("response is not UTF-8: {}", e)))
    }

    /// Parse the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> RpcResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Turn a non-2xx reply into a handler error carrying the body text
    pub fn error_for_status(self) -> RpcResult<Self> {
        if self.is_success() {
            return Ok(self);
        }
        Err(RpcError::HandlerError {
            status: self.status,
            message: String::from_utf8_lossy(&self.body).into_owned(),
        })
    }
}

#[cfg(test)]
#[path = "reply/reply_tests.rs"]
mod reply_tests;
