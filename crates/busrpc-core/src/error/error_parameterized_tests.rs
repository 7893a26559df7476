#![allow(non_snake_case)]

use super::*;
use test_case::test_case;

// ============================================================================
// Parameterized error code mapping tests
// ============================================================================

#[test_case(RpcError::MalformedEnvelope("x".into()), 2)]
#[test_case(RpcError::handler(418, "x"), 3)]
#[test_case(RpcError::PublishError("x".into()), 4)]
#[test_case(RpcError::Timeout, 5)]
#[test_case(RpcError::TransportError("x".into()), 6)]
#[test_case(RpcError::Cancelled, 10)]
fn RpcError___variant___maps_to_correct_code(error: RpcError, expected_code: u32) {
    assert_eq!(error.error_code(), expected_code);
}

// ============================================================================
// Parameterized from_code roundtrip tests
// ============================================================================

#[test_case(2)]
#[test_case(4)]
#[test_case(5)]
#[test_case(6)]
#[test_case(7)]
#[test_case(8)]
#[test_case(9)]
#[test_case(10)]
#[test_case(11)]
fn RpcError___from_code___preserves_code(code: u32) {
    let err = RpcError::from_code(code, "message".into());

    assert_eq!(err.error_code(), code);
}

// ============================================================================
// Parameterized status mapping tests
// ============================================================================

#[test_case(RpcError::handler(404, "missing"), 404)]
#[test_case(RpcError::handler(422, "invalid"), 422)]
#[test_case(RpcError::MalformedEnvelope("x".into()), 400)]
#[test_case(RpcError::SerializationError("x".into()), 400)]
#[test_case(RpcError::Timeout, 504)]
#[test_case(RpcError::Internal("x".into()), 500)]
#[test_case(RpcError::TransportError("x".into()), 500)]
fn RpcError___status___maps_to_http_equivalent(error: RpcError, expected_status: u16) {
    assert_eq!(error.status(), expected_status);
}
