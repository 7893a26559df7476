#![allow(non_snake_case)]

use super::*;
use serde_json::json;
use test_case::test_case;

#[test]
fn CallLine___method_and_path___empty_parameters() {
    let line: CallLine = "GET /users/1".parse().unwrap();

    assert_eq!(line.method, Method::Get);
    assert_eq!(line.path, "/users/1");
    assert!(line.parameters.is_empty());
}

#[test]
fn CallLine___json_parameters___parsed_in_order() {
    let line: CallLine = r#"  put /users/1   {"name": "bobby", "age": 3} "#.parse().unwrap();

    assert_eq!(line.method, Method::Put);
    let keys: Vec<&str> = line.parameters.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["name", "age"]);
    assert_eq!(line.parameters["name"], json!("bobby"));
}

#[test_case("" ; "empty")]
#[test_case("FETCH /users" ; "unknown method")]
#[test_case("GET users/1" ; "relative path")]
#[test_case("GET" ; "missing path")]
#[test_case("POST /users {name}" ; "invalid json")]
#[test_case("POST /users [1,2]" ; "array parameters")]
fn CallLine___invalid_line___error(text: &str) {
    assert!(text.parse::<CallLine>().is_err());
}

#[test_case("", true ; "empty")]
#[test_case("   ", true ; "whitespace")]
#[test_case("# GET /users/1", true ; "comment")]
#[test_case("GET /users/1", false ; "call")]
fn is_blank___classifies_lines(text: &str, expected: bool) {
    assert_eq!(is_blank(text), expected);
}
