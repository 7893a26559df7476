#![allow(non_snake_case)]

use super::*;
use busrpc_runtime::ShutdownHandle;
use std::time::Duration;

fn config() -> RpcConfig {
    RpcConfig::default().with_call_timeout(Duration::from_secs(5))
}

fn feed(lines: &[&str]) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(lines.len().max(1));
    for line in lines {
        tx.try_send(line.to_string()).unwrap();
    }
    rx
}

#[tokio::test]
async fn answer_lines___calls___one_output_line_each() {
    let shutdown = ShutdownHandle::new();
    let session = LocalSession::start(&config(), shutdown.clone()).await.unwrap();
    let input = feed(&[
        "GET /users/1",
        "",
        "# comment",
        r#"POST /users {"name":"bobby"}"#,
        "FETCH /users",
        "GET /orders/1",
    ]);
    let mut output = Vec::new();

    let answered = answer_lines(&session, input, &mut output, ShutdownHandle::new().signal())
        .await
        .unwrap();

    let text = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(answered, 3);
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[0], r#"200 {"id":"1"}"#);
    assert_eq!(lines[1], r#"200 {"name":"bobby"}"#);
    assert!(lines[2].starts_with("error: "), "{}", lines[2]);
    assert!(lines[3].starts_with("404 "), "{}", lines[3]);
    session.finish().await.unwrap();
}

#[tokio::test]
async fn answer_lines___shutdown___stops_without_waiting_for_input() {
    let shutdown = ShutdownHandle::new();
    let session = LocalSession::start(&config(), shutdown.clone()).await.unwrap();
    let (_tx, input) = mpsc::channel::<String>(1);
    let stop = ShutdownHandle::new();
    stop.trigger();
    let mut output = Vec::new();

    let answered = tokio::time::timeout(
        Duration::from_secs(1),
        answer_lines(&session, input, &mut output, stop.signal()),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(answered, 0);
    assert!(output.is_empty());
    session.finish().await.unwrap();
}

#[tokio::test]
async fn answer_lines___timeout___reported_and_loop_continues() {
    let shutdown = ShutdownHandle::new();
    let config = config()
        .with_instances(2)
        .with_call_timeout(Duration::from_millis(30));
    let session = LocalSession::start(&config, shutdown.clone()).await.unwrap();
    let input = feed(&[r#"GET /sleep {"ms":200}"#, "GET /users/7"]);
    let mut output = Vec::new();

    let answered = answer_lines(&session, input, &mut output, ShutdownHandle::new().signal())
        .await
        .unwrap();

    let text = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "error: request timed out");
    assert_eq!(lines[1], r#"200 {"id":"7"}"#);
    assert_eq!(answered, 1);
    session.finish().await.unwrap();
}
