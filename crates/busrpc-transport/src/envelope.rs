//! Call and response envelopes and their wire encoding

use crate::{Codec, CodecError, JsonCodec, WireMessage};
use busrpc_core::Method;
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};

/// Ordered parameter mapping carried by a call
pub type Parameters = serde_json::Map<String, serde_json::Value>;

/// Message header carrying the response status
pub const STATUS_HEADER: &str = "status";

/// Outbound call: method, path, parameters and optional raw content,
/// plus the correlation metadata that travels beside the body
#[derive(Debug, Clone, PartialEq)]
pub struct CallEnvelope {
    /// Request method
    pub method: Method,
    /// Request path
    pub path: String,
    /// Structured parameters
    pub parameters: Parameters,
    /// Explicit raw body (JSON text)
    pub content: Option<String>,
    /// Token pairing this call with its response
    pub correlation_id: String,
    /// Caller's private reply address
    pub reply_to: String,
}

impl CallEnvelope {
    /// Create a call envelope without content or correlation metadata
    pub fn new(method: Method, path: impl Into<String>, parameters: Parameters) -> Self {
        Self {
            method,
            path: path.into(),
            parameters,
            content: None,
            correlation_id: String::new(),
            reply_to: String::new(),
        }
    }

    /// Set the raw content
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Set correlation ID
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = id.into();
        self
    }

    /// Set reply address
    pub fn with_reply_to(mut self, address: impl Into<String>) -> Self {
        self.reply_to = address.into();
        self
    }
}

/// Response to one call, tagged with the originating correlation ID
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseEnvelope {
    /// Correlation ID copied from the call
    pub correlation_id: String,
    /// Raw response body
    pub body: Vec<u8>,
    /// HTTP-equivalent status, if the publisher supplied one
    pub status: Option<u16>,
}

impl ResponseEnvelope {
    /// Create a response envelope
    pub fn new(correlation_id: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            body: body.into(),
            status: None,
        }
    }

    /// Set the status
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

/// JSON body of a call message
#[derive(Serialize, Deserialize)]
struct CallBody {
    method: Method,
    path: String,
    #[serde(default, deserialize_with = "deserialize_parameters")]
    parameters: Parameters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

/// Accepts an object, `null`, or an empty array (some producers encode an
/// empty mapping as `[]`)
fn deserialize_parameters<'de, D>(deserializer: D) -> Result<Parameters, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(Parameters::new()),
        Some(serde_json::Value::Object(map)) => Ok(map),
        Some(serde_json::Value::Array(items)) if items.is_empty() => Ok(Parameters::new()),
        Some(other) => Err(D::Error::custom(format!(
            "parameters must be an object, got {other}"
        ))),
    }
}

fn required<'a>(value: Option<&'a str>, field: &'static str) -> Result<&'a str, CodecError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(CodecError::MissingField(field)),
    }
}

/// Translates envelopes to and from wire messages
#[derive(Debug, Clone, Default)]
pub struct EnvelopeCodec<C = JsonCodec> {
    codec: C,
}

impl EnvelopeCodec<JsonCodec> {
    /// Create an envelope codec using compact JSON
    pub fn new() -> Self {
        Self {
            codec: JsonCodec::new(),
        }
    }
}

impl<C: Codec> EnvelopeCodec<C> {
    /// Create an envelope codec over a specific body codec
    pub fn with_codec(codec: C) -> Self {
        Self { codec }
    }

    /// Encode a call envelope
    pub fn encode_call(&self, call: &CallEnvelope) -> Result<WireMessage, CodecError> {
        let correlation_id = required(Some(call.correlation_id.as_str()), "correlation_id")?;
        let reply_to = required(Some(call.reply_to.as_str()), "reply_to")?;
        let body = CallBody {
            method: call.method,
            path: call.path.clone(),
            parameters: call.parameters.clone(),
            content: call.content.clone(),
        };
        Ok(WireMessage::new(self.codec.encode(&body)?)
            .with_correlation_id(correlation_id)
            .with_reply_to(reply_to)
            .with_content_type(self.codec.content_type()))
    }

    /// Decode a call envelope, validating required fields
    pub fn decode_call(&self, message: &WireMessage) -> Result<CallEnvelope, CodecError> {
        let correlation_id = required(message.correlation_id(), "correlation_id")?;
        let reply_to = required(message.reply_to(), "reply_to")?;
        let value: serde_json::Value = self.codec.decode(&message.body)?;
        let object = value
            .as_object()
            .ok_or_else(|| CodecError::InvalidFormat("call body must be a JSON object".into()))?;
        for field in ["method", "path"] {
            if !object.contains_key(field) {
                return Err(CodecError::MissingField(field));
            }
        }
        let body = CallBody::deserialize(value)?;
        Ok(CallEnvelope {
            method: body.method,
            path: body.path,
            parameters: body.parameters,
            content: body.content,
            correlation_id: correlation_id.to_string(),
            reply_to: reply_to.to_string(),
        })
    }

    /// Encode a response envelope
    pub fn encode_response(&self, response: &ResponseEnvelope) -> Result<WireMessage, CodecError> {
        let correlation_id = required(Some(response.correlation_id.as_str()), "correlation_id")?;
        let mut message = WireMessage::new(response.body.clone()).with_correlation_id(correlation_id);
        if let Some(status) = response.status {
            message = message.with_header(STATUS_HEADER, status.to_string());
        }
        Ok(message)
    }

    /// Decode a response envelope
    pub fn decode_response(&self, message: &WireMessage) -> Result<ResponseEnvelope, CodecError> {
        let correlation_id = required(message.correlation_id(), "correlation_id")?;
        let status = message
            .header(STATUS_HEADER)
            .map(|s| {
                s.parse::<u16>()
                    .map_err(|_| CodecError::InvalidFormat(format!("invalid status header: {s}")))
            })
            .transpose()?;
        Ok(ResponseEnvelope {
            correlation_id: correlation_id.to_string(),
            body: message.body.clone(),
            status,
        })
    }
}

#[cfg(test)]
#[path = "envelope/envelope_tests.rs"]
mod envelope_tests;
