#![allow(non_snake_case)]

use super::*;
use serde_json::json;

fn params(value: serde_json::Value) -> Parameters {
    match value {
        serde_json::Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn wire_call(body: &str) -> WireMessage {
    WireMessage::new(body.as_bytes().to_vec())
        .with_correlation_id("corr-1")
        .with_reply_to("amq.gen-reply")
}

// CallEnvelope tests

#[test]
fn CallEnvelope___new___has_no_content_or_metadata() {
    let call = CallEnvelope::new(Method::Get, "/users/1", Parameters::new());

    assert!(call.content.is_none());
    assert!(call.correlation_id.is_empty());
    assert!(call.reply_to.is_empty());
}

#[test]
fn EnvelopeCodec___encode_call___puts_correlation_metadata_in_properties() {
    let codec = EnvelopeCodec::new();
    let call = CallEnvelope::new(Method::Post, "/users", params(json!({"name": "bobby"})))
        .with_correlation_id("corr-42")
        .with_reply_to("amq.gen-abc");

    let message = codec.encode_call(&call).unwrap();

    assert_eq!(message.correlation_id(), Some("corr-42"));
    assert_eq!(message.reply_to(), Some("amq.gen-abc"));
    assert_eq!(
        message.properties.content_type.as_deref(),
        Some("application/json")
    );
    let body: serde_json::Value = serde_json::from_slice(&message.body).unwrap();
    assert_eq!(body["method"], "POST");
    assert_eq!(body["path"], "/users");
    assert_eq!(body["parameters"]["name"], "bobby");
    assert!(body.get("content").is_none());
}

#[test]
fn EnvelopeCodec___call_with_content___roundtrips() {
    let codec = EnvelopeCodec::new();
    let call = CallEnvelope::new(Method::Put, "/users/1", params(json!({"name": "bobby"})))
        .with_content(r#"{"name":"bobby"}"#)
        .with_correlation_id("corr-7")
        .with_reply_to("reply-7");

    let decoded = codec.decode_call(&codec.encode_call(&call).unwrap()).unwrap();

    assert_eq!(decoded, call);
}

#[test]
fn EnvelopeCodec___encode_call_without_reply_to___missing_field() {
    let codec = EnvelopeCodec::new();
    let call = CallEnvelope::new(Method::Get, "/", Parameters::new()).with_correlation_id("c");

    let result = codec.encode_call(&call);

    assert!(matches!(result, Err(CodecError::MissingField("reply_to"))));
}

#[test]
fn EnvelopeCodec___decode_call_missing_method___missing_field() {
    let codec = EnvelopeCodec::new();

    let result = codec.decode_call(&wire_call(r#"{"path": "/users"}"#));

    assert!(matches!(result, Err(CodecError::MissingField("method"))));
}

#[test]
fn EnvelopeCodec___decode_call_missing_path___missing_field() {
    let codec = EnvelopeCodec::new();

    let result = codec.decode_call(&wire_call(r#"{"method": "GET"}"#));

    assert!(matches!(result, Err(CodecError::MissingField("path"))));
}

#[test]
fn EnvelopeCodec___decode_call_not_json___deserialization_error() {
    let codec = EnvelopeCodec::new();

    let result = codec.decode_call(&wire_call("<xml/>"));

    assert!(matches!(result, Err(CodecError::Deserialization(_))));
}

#[test]
fn EnvelopeCodec___decode_call_json_array___invalid_format() {
    let codec = EnvelopeCodec::new();

    let result = codec.decode_call(&wire_call("[1, 2]"));

    assert!(matches!(result, Err(CodecError::InvalidFormat(_))));
}

#[test]
fn EnvelopeCodec___decode_call_unknown_method___deserialization_error() {
    let codec = EnvelopeCodec::new();

    let result = codec.decode_call(&wire_call(r#"{"method": "PATCH", "path": "/"}"#));

    assert!(matches!(result, Err(CodecError::Deserialization(_))));
}

#[test]
fn EnvelopeCodec___decode_call_without_correlation_id___missing_field() {
    let codec = EnvelopeCodec::new();
    let message = WireMessage::new(br#"{"method":"GET","path":"/"}"#.to_vec()).with_reply_to("r");

    let result = codec.decode_call(&message);

    assert!(matches!(result, Err(CodecError::MissingField("correlation_id"))));
}

#[test]
fn EnvelopeCodec___decode_call_empty_array_parameters___treated_as_empty_map() {
    let codec = EnvelopeCodec::new();

    let call = codec
        .decode_call(&wire_call(
            r#"{"method": "GET", "path": "/users/1", "parameters": [], "content": "[]"}"#,
        ))
        .unwrap();

    assert!(call.parameters.is_empty());
    assert_eq!(call.content.as_deref(), Some("[]"));
}

#[test]
fn EnvelopeCodec___decode_call_absent_parameters___empty_map() {
    let codec = EnvelopeCodec::new();

    let call = codec
        .decode_call(&wire_call(r#"{"method": "DELETE", "path": "/users/1"}"#))
        .unwrap();

    assert!(call.parameters.is_empty());
    assert!(call.content.is_none());
}

#[test]
fn EnvelopeCodec___decode_call_scalar_parameters___rejected() {
    let codec = EnvelopeCodec::new();

    let result = codec.decode_call(&wire_call(
        r#"{"method": "GET", "path": "/", "parameters": 5}"#,
    ));

    assert!(result.is_err());
}

#[test]
fn EnvelopeCodec___decode_call___preserves_parameter_order() {
    let codec = EnvelopeCodec::new();

    let call = codec
        .decode_call(&wire_call(
            r#"{"method": "GET", "path": "/", "parameters": {"z": 1, "a": 2, "m": 3}}"#,
        ))
        .unwrap();

    let keys: Vec<&str> = call.parameters.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["z", "a", "m"]);
}

// ResponseEnvelope tests

#[test]
fn EnvelopeCodec___encode_response___body_is_raw_bytes() {
    let codec = EnvelopeCodec::new();
    let response = ResponseEnvelope::new("corr-1", br#"{"id":"1"}"#.to_vec());

    let message = codec.encode_response(&response).unwrap();

    assert_eq!(message.body, br#"{"id":"1"}"#);
    assert_eq!(message.correlation_id(), Some("corr-1"));
    assert!(message.header(STATUS_HEADER).is_none());
}

#[test]
fn EnvelopeCodec___response_with_status___roundtrips() {
    let codec = EnvelopeCodec::new();
    let response = ResponseEnvelope::new("corr-2", b"oops".to_vec()).with_status(500);

    let decoded = codec
        .decode_response(&codec.encode_response(&response).unwrap())
        .unwrap();

    assert_eq!(decoded, response);
}

#[test]
fn EnvelopeCodec___decode_response_without_correlation_id___missing_field() {
    let codec = EnvelopeCodec::new();

    let result = codec.decode_response(&WireMessage::new(b"{}".to_vec()));

    assert!(matches!(result, Err(CodecError::MissingField("correlation_id"))));
}

#[test]
fn EnvelopeCodec___decode_response_bad_status___invalid_format() {
    let codec = EnvelopeCodec::new();
    let message = WireMessage::new(b"{}".to_vec())
        .with_correlation_id("c")
        .with_header(STATUS_HEADER, "teapot");

    let result = codec.decode_response(&message);

    assert!(matches!(result, Err(CodecError::InvalidFormat(_))));
}

#[test]
fn EnvelopeCodec___float_parameters___decode_to_identical_bits() {
    let codec = EnvelopeCodec::new();
    let samples = [
        1.0715660391465826e-75,
        0.1,
        -2.2250738585072014e-308,
        5e-324,
        1.7976931348623157e308,
        std::f64::consts::PI,
        123456.789e-12,
    ];

    for value in samples {
        let call = CallEnvelope::new(Method::Get, "/p", params(json!({ "v": value })))
            .with_correlation_id("corr-f")
            .with_reply_to("amq.gen-f");

        let decoded = codec.decode_call(&codec.encode_call(&call).unwrap()).unwrap();

        assert_eq!(decoded, call);
        assert_eq!(
            decoded.parameters["v"].as_f64().map(f64::to_bits),
            Some(value.to_bits())
        );
    }
}
