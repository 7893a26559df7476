#![allow(non_snake_case)]

use super::*;
use test_case::test_case;

fn reply(status: u16, body: &str) -> RpcReply {
    RpcReply {
        status,
        body: body.as_bytes().to_vec(),
    }
}

#[test_case(200, true ; "ok")]
#[test_case(201, true ; "created")]
#[test_case(299, true ; "upper bound")]
#[test_case(404, false ; "not found")]
#[test_case(500, false ; "server error")]
fn RpcReply___is_success(status: u16, expected: bool) {
    assert_eq!(reply(status, "").is_success(), expected);
}

#[test]
fn RpcReply___json___parses_body() {
    let value: serde_json::Value = reply(200, r#"{"id":"1"}"#).json().unwrap();

    assert_eq!(value["id"], "1");
}

#[test]
fn RpcReply___json_invalid___serialization_error() {
    let result = reply(200, "not json").json::<serde_json::Value>();

    assert!(matches!(result, Err(RpcError::SerializationError(_))));
}

#[test]
fn RpcReply___text___returns_utf8() {
    assert_eq!(reply(200, "hello").text().unwrap(), "hello");
}

#[test]
fn RpcReply___error_for_status___keeps_success() {
    let ok = reply(200, "fine").error_for_status().unwrap();

    assert_eq!(ok.body, b"fine");
}

#[test]
fn RpcReply___error_for_status___converts_failure() {
    let result = reply(404, "no such user").error_for_status();

    assert!(matches!(
        result,
        Err(RpcError::HandlerError { status: 404, ref message }) if message == "no such user"
    ));
}
