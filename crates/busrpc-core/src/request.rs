//! Structured request and response types exchanged with the handler pipeline

use crate::{Method, RpcError, RpcResult};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::collections::BTreeMap;

/// Content type understood by the handler pipeline
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Header map with lower-cased names
pub type Headers = BTreeMap<String, String>;

/// Request reconstructed from a call envelope
///
/// `parsed_body` is the canonical structured body. `body` holds the exact bytes
/// for handlers that need raw access; the two agree unless a producer sent
/// explicit `content` that differs from its `parameters`.
#[derive(Debug, Clone, PartialEq)]
pub struct StructuredRequest {
    /// Request method
    pub method: Method,
    /// Request path (always starts with `/`)
    pub path: String,
    /// Query parameters (the envelope's `parameters`)
    pub query: serde_json::Map<String, serde_json::Value>,
    /// URL-encoded form of `query`
    pub query_string: String,
    /// Request headers
    pub headers: Headers,
    /// Raw body bytes
    pub body: Vec<u8>,
    /// Structured body, present for methods that carry one
    pub parsed_body: Option<serde_json::Value>,
}

impl StructuredRequest {
    /// Create an empty request for the given method and path
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: serde_json::Map::new(),
            query_string: String::new(),
            headers: Headers::new(),
            body: Vec::new(),
            parsed_body: None,
        }
    }

    /// Request URI: the path plus `?query` when a query string is present
    pub fn uri(&self) -> String {
        if self.query_string.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query_string)
        }
    }

    /// Look up a header by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Content type of the body, if declared
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Path split into non-empty segments
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').filter(|s| !s.is_empty())
    }

    /// Deserialize the body into a typed value
    ///
    /// Uses the structured body when present and falls back to parsing the raw bytes.
    pub fn json_body<T: DeserializeOwned>(&self) -> RpcResult<T> {
        match &self.parsed_body {
            Some(value) => T::deserialize(value).map_err(Into::into),
            None => serde_json::from_slice(&self.body).map_err(Into::into),
        }
    }
}

/// Response produced by the handler pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredResponse {
    /// HTTP-equivalent status code
    pub status: u16,
    /// Response headers
    pub headers: Headers,
    /// Response body
    pub body: Vec<u8>,
}

impl StructuredResponse {
    /// Create a 200 response with the given body
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            headers: Headers::new(),
            body: body.into(),
        }
    }

    /// Create a JSON response with the given status
    pub fn json<T: Serialize>(status: u16, value: &T) -> RpcResult<Self> {
        ResponseBuilder::new().status(status).json(value).map(ResponseBuilder::build)
    }

    /// Create the generic error response for a failed request
    pub fn from_error(err: &RpcError) -> Self {
        ResponseBuilder::new()
            .error(err.status(), err.error_code(), err.to_string())
            .build()
    }

    /// Check for a 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Look up a header by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

/// Error information serialized into error response bodies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseError {
    /// Error code
    pub code: u32,
    /// Error message
    pub message: String,
    /// Optional detailed information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a ResponseError,
}

/// Builder for constructing responses
#[derive(Debug)]
pub struct ResponseBuilder {
    status: u16,
    headers: Headers,
    data: Option<Vec<u8>>,
    error: Option<ResponseError>,
}

impl ResponseBuilder {
    /// Create a new response builder
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: Headers::new(),
            data: None,
            error: None,
        }
    }

    /// Set the status code
    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Add a header
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Set raw response data
    pub fn data(mut self, data: Vec<u8>) -> Self {
        self.data = Some(data);
        self
    }

    /// Set response data from a serializable value
    pub fn json<T: Serialize>(mut self, value: &T) -> RpcResult<Self> {
        self.data = Some(serde_json::to_vec(value)?);
        Ok(self.header("content-type", CONTENT_TYPE_JSON))
    }

    /// Set error response
    pub fn error(mut self, status: u16, code: u32, message: impl Into<String>) -> Self {
        self.status = status;
        self.error = Some(ResponseError {
            code,
            message: message.into(),
            details: None,
        });
        self
    }

    /// Set error with details
    pub fn error_with_details(
        mut self,
        status: u16,
        code: u32,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        self.status = status;
        self.error = Some(ResponseError {
            code,
            message: message.into(),
            details: Some(details),
        });
        self
    }

    /// Build the response
    pub fn build(self) -> StructuredResponse {
        let mut headers = self.headers;
        let body = match self.error {
            Some(error) => {
                headers.insert("content-type".to_string(), CONTENT_TYPE_JSON.to_string());
                // A struct of strings, numbers and JSON values always serializes.
                serde_json::to_vec(&ErrorBody { error: &error }).unwrap_or_default()
            }
            None => self.data.unwrap_or_default(),
        };
        StructuredResponse {
            status: self.status,
            headers,
            body,
        }
    }
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}
