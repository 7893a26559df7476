//! Call envelope → structured request

use busrpc_core::{CONTENT_TYPE_JSON, Headers, RpcError, RpcResult, StructuredRequest};
use busrpc_transport::{CallEnvelope, Parameters};
use serde_json::Value;

/// Builds the [`StructuredRequest`] handed to the handler pipeline
///
/// Body resolution:
/// - `query` always holds the envelope's `parameters`, and `query_string`
///   their URL-encoded form.
/// - `body` is the envelope's `content` verbatim when present. Otherwise,
///   for methods that carry a body, it is the JSON encoding of `parameters`;
///   for the others it is empty.
/// - `parsed_body` is only set for methods that carry a body. It is
///   `parameters`, unless they are empty and `content` holds valid JSON, in
///   which case it is the parsed `content`.
#[derive(Debug, Clone, Default)]
pub struct RequestTranslator;

impl RequestTranslator {
    pub fn new() -> Self {
        Self
    }

    /// Translate one decoded call
    pub fn translate(&self, call: &CallEnvelope) -> RpcResult<StructuredRequest> {
        let path = if call.path.is_empty() {
            "/".to_string()
        } else {
            call.path.clone()
        };

        let mut request = StructuredRequest::new(call.method, path);
        request.query_string = query_string(&call.parameters)?;
        request.query = call.parameters.clone();

        request.body = match &call.content {
            Some(content) => content.clone().into_bytes(),
            None if call.method.has_body() => serde_json::to_vec(&call.parameters)?,
            None => Vec::new(),
        };

        if call.method.has_body() {
            request.parsed_body = Some(structured_body(call));
        }

        request.headers = headers(request.body.len());
        Ok(request)
    }
}

fn structured_body(call: &CallEnvelope) -> Value {
    if call.parameters.is_empty() {
        if let Some(parsed) = call
            .content
            .as_deref()
            .and_then(|content| serde_json::from_str::<Value>(content).ok())
        {
            return parsed;
        }
    }
    Value::Object(call.parameters.clone())
}

fn headers(content_length: usize) -> Headers {
    let mut headers = Headers::new();
    headers.insert("content-type".to_string(), CONTENT_TYPE_JSON.to_string());
    headers.insert("content-length".to_string(), content_length.to_string());
    headers
}

/// URL-encode parameters in order; nested values are sent as JSON text
fn query_string(parameters: &Parameters) -> RpcResult<String> {
    let pairs: Vec<(&str, String)> = parameters
        .iter()
        .map(|(key, value)| (key.as_str(), scalar_text(value)))
        .collect();
    serde_urlencoded::to_string(&pairs)
        .map_err(|e| RpcError::MalformedEnvelope(format!("Failed to encode query: {e}")))
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}
