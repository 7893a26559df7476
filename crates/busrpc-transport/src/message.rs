//! Body-plus-metadata unit exchanged with the message bus

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Message metadata carried beside the body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageProperties {
    /// Token pairing a call with its response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,

    /// Address the response must be published to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,

    /// Content type of the body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,

    /// Application headers
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

/// A message as published to or delivered from the bus
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    /// Raw message body
    pub body: Vec<u8>,
    /// Message metadata
    #[serde(default)]
    pub properties: MessageProperties,
}

impl WireMessage {
    /// Create a message with the given body and no metadata
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            properties: MessageProperties::default(),
        }
    }

    /// Set correlation ID
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.properties.correlation_id = Some(id.into());
        self
    }

    /// Set reply address
    pub fn with_reply_to(mut self, address: impl Into<String>) -> Self {
        self.properties.reply_to = Some(address.into());
        self
    }

    /// Set content type
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.properties.content_type = Some(content_type.into());
        self
    }

    /// Add an application header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.headers.insert(name.into(), value.into());
        self
    }

    /// Correlation ID, if present
    pub fn correlation_id(&self) -> Option<&str> {
        self.properties.correlation_id.as_deref()
    }

    /// Reply address, if present
    pub fn reply_to(&self) -> Option<&str> {
        self.properties.reply_to.as_deref()
    }

    /// Application header, if present
    pub fn header(&self, name: &str) -> Option<&str> {
        self.properties.headers.get(name).map(String::as_str)
    }
}
