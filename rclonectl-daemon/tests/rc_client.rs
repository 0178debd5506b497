//! RC client against a fake RC endpoint.
//!
//! The client is blocking, so every call runs on `spawn_blocking` while the
//! mock server lives on the test runtime.

use std::net::TcpListener;

use rclonectl_core::RemoteEndpoint;
use rclonectl_daemon::{RcClient, RcError, RemoteControl};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> RcClient {
    RcClient::new(RemoteEndpoint::new(server.uri(), "u", "p"))
}

async fn send(client: RcClient, command: &'static str, params: Value) -> Result<Value, RcError> {
    tokio::task::spawn_blocking(move || client.send(command, &params))
        .await
        .expect("join")
}

async fn alive(client: RcClient) -> bool {
    tokio::task::spawn_blocking(move || client.check_alive())
        .await
        .expect("join")
}

#[tokio::test]
async fn send_posts_authenticated_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/core/command"))
        .and(header("Authorization", "Basic dTpw"))
        .and(header("Content-Type", "application/json"))
        .and(body_json(json!({"command": "serve", "_async": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"jobid": 7})))
        .expect(1)
        .mount(&server)
        .await;

    let response = send(
        client_for(&server),
        "core/command",
        json!({"command": "serve", "_async": true}),
    )
    .await
    .expect("send");
    assert_eq!(response, json!({"jobid": 7}));
}

#[tokio::test]
async fn error_status_with_json_body_is_returned_as_data() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/core/command"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({"error": "unknown command", "status": 500})),
        )
        .mount(&server)
        .await;

    let response = send(client_for(&server), "core/command", json!({}))
        .await
        .expect("json error body is data");
    assert_eq!(response["error"], "unknown command");
}

#[tokio::test]
async fn error_status_without_json_body_is_a_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let err = send(client_for(&server), "core/command", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, RcError::Status { code: 401, .. }), "got: {err}");
}

#[tokio::test]
async fn malformed_json_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let err = send(client_for(&server), "core/command", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, RcError::Decode { .. }), "got: {err}");
}

#[tokio::test]
async fn check_alive_true_on_echo() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rc/noopauth"))
        .and(body_json(json!({"rclone": "magic"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rclone": "magic"})))
        .expect(1)
        .mount(&server)
        .await;

    assert!(alive(client_for(&server)).await);
}

#[tokio::test]
async fn check_alive_false_on_wrong_echo() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rc/noopauth"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"rclone": "nope"})))
        .mount(&server)
        .await;

    assert!(!alive(client_for(&server)).await);
}

#[tokio::test]
async fn check_alive_false_when_nothing_listens() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        listener.local_addr().expect("addr").port()
    };
    let client = RcClient::new(RemoteEndpoint::from_addr(&format!("127.0.0.1:{port}"), "u", "p"));
    assert!(!alive(client).await);
}
