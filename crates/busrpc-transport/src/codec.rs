//! Message body encoding

use busrpc_core::RpcError;
use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Why a message body could not be produced or understood
#[derive(Error, Debug)]
pub enum CodecError {
    /// Outbound value could not be encoded
    #[error("cannot encode message body: {0}")]
    Serialization(String),

    /// Inbound body is not valid for the expected shape
    #[error("cannot decode message body: {0}")]
    Deserialization(String),

    /// A mandatory envelope field or message property is absent or empty
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid format: {0}")]
    InvalidFormat(String),
}

impl CodecError {
    /// Everything except an encode failure is the peer's fault
    pub fn is_decode_error(&self) -> bool {
        !matches!(self, CodecError::Serialization(_))
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_data() || err.is_syntax() || err.is_eof() {
            CodecError::Deserialization(err.to_string())
        } else {
            CodecError::Serialization(err.to_string())
        }
    }
}

impl From<CodecError> for RpcError {
    fn from(err: CodecError) -> Self {
        if err.is_decode_error() {
            RpcError::MalformedEnvelope(err.to_string())
        } else {
            RpcError::SerializationError(err.to_string())
        }
    }
}

/// Body encoding used by [`EnvelopeCodec`](crate::EnvelopeCodec)
pub trait Codec: Send + Sync {
    /// Serialize a value into a message body
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    /// Parse a message body
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, CodecError>;

    /// Content type stamped on encoded messages
    fn content_type(&self) -> &'static str;
}

/// Compact JSON bodies
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl JsonCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, CodecError> {
        Ok(serde_json::from_slice(data)?)
    }

    fn content_type(&self) -> &'static str {
        busrpc_core::CONTENT_TYPE_JSON
    }
}
