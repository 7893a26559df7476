#![allow(non_snake_case)]

use super::*;
use test_case::test_case;

#[test_case("GET", Method::Get)]
#[test_case("post", Method::Post)]
#[test_case("Put", Method::Put)]
#[test_case("DELETE", Method::Delete)]
fn Method___from_str___accepts_any_case(input: &str, expected: Method) {
    let method: Method = input.parse().unwrap();

    assert_eq!(method, expected);
}

#[test]
fn Method___from_str_unsupported___returns_malformed_envelope() {
    let result = "PATCH".parse::<Method>();

    assert!(matches!(result, Err(RpcError::MalformedEnvelope(_))));
}

#[test_case(Method::Get, false)]
#[test_case(Method::Post, true)]
#[test_case(Method::Put, true)]
#[test_case(Method::Delete, false)]
fn Method___has_body___only_post_and_put(method: Method, expected: bool) {
    assert_eq!(method.has_body(), expected);
}

#[test]
fn Method___serialize___uses_upper_case_wire_name() {
    let json = serde_json::to_string(&Method::Delete).unwrap();

    assert_eq!(json, r#""DELETE""#);
}

#[test]
fn Method___deserialize_lower_case___rejected() {
    let result = serde_json::from_str::<Method>(r#""get""#);

    assert!(result.is_err());
}

#[test]
fn Method___display___matches_as_str() {
    for method in Method::ALL {
        assert_eq!(method.to_string(), method.as_str());
    }
}
