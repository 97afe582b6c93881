//! End-to-end realtime tests over a real TCP listener and WebSocket.

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use server::{build_app, Config};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Spawn the full app on an ephemeral port; returns HTTP and WS base URLs.
async fn spawn_server() -> (String, String) {
    let (_state, router) = build_app(&Config::default());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}"), format!("ws://{addr}"))
}

async fn login(base: &str, username: &str) -> String {
    let response = reqwest::Client::new()
        .post(format!("{base}/auth/login"))
        .json(&json!({"username": username, "password": "pw123456"}))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let body: Value = response.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

async fn submit_feedback(base: &str, token: &str, name: &str, message: &str, category: &str) {
    let response = reqwest::Client::new()
        .post(format!("{base}/feedback"))
        .bearer_auth(token)
        .json(&json!({"name": name, "message": message, "category": category}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
}

async fn connect(ws_base: &str, token: Option<&str>) -> WsClient {
    let url = match token {
        Some(token) => format!("{ws_base}/ws?token={token}"),
        None => format!("{ws_base}/ws"),
    };
    let (client, _) = connect_async(url).await.unwrap();
    client
}

async fn send_json(ws: &mut WsClient, value: Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .unwrap();
}

/// Next JSON text frame, skipping transport-level ping/pong.
async fn next_json(ws: &mut WsClient) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection closed")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

#[tokio::test]
async fn admin_receives_new_feedback_exactly_once() {
    let (http, ws_base) = spawn_server().await;
    let admin_token = login(&http, "site-admin").await;
    let ada_token = login(&http, "ada").await;

    let mut ws = connect(&ws_base, Some(&admin_token)).await;
    send_json(&mut ws, json!({"type": "join-admin-room"})).await;

    let reply = next_json(&mut ws).await;
    assert_eq!(reply["type"], "join-result");
    assert_eq!(reply["success"], true);
    assert_eq!(reply["message"], "Joined admin room");

    submit_feedback(&http, &ada_token, "Ada", "Lovely product", "compliment").await;

    let event = next_json(&mut ws).await;
    assert_eq!(event["type"], "NEW_FEEDBACK");
    assert_eq!(event["data"]["name"], "Ada");
    assert_eq!(event["data"]["message"], "Lovely product");
    assert_eq!(event["data"]["category"], "compliment");
    assert_eq!(event["data"]["username"], "ada");
    assert_eq!(event["data"]["user"]["isAdmin"], false);
    assert!(event["timestamp"].as_str().is_some());

    // Exactly once: the next frame is the pong, not a duplicate event.
    send_json(&mut ws, json!({"type": "ping"})).await;
    let reply = next_json(&mut ws).await;
    assert_eq!(reply["type"], "pong");
}

#[tokio::test]
async fn non_admin_join_is_denied_and_sees_no_events() {
    let (http, ws_base) = spawn_server().await;
    let bob_token = login(&http, "bob").await;
    let admin_token = login(&http, "site-admin").await;

    let mut ws = connect(&ws_base, Some(&bob_token)).await;
    send_json(&mut ws, json!({"type": "join-admin-room"})).await;

    let reply = next_json(&mut ws).await;
    assert_eq!(reply["type"], "join-result");
    assert_eq!(reply["success"], false);
    assert_eq!(reply["message"], "Access denied");

    submit_feedback(&http, &admin_token, "Someone", "hello", "other").await;

    // The connection is still usable and the event never arrives.
    send_json(&mut ws, json!({"type": "ping"})).await;
    let reply = next_json(&mut ws).await;
    assert_eq!(reply["type"], "pong");
}

#[tokio::test]
async fn invalid_token_connects_anonymously_but_cannot_join() {
    let (_http, ws_base) = spawn_server().await;

    let mut ws = connect(&ws_base, Some("not-a-jwt")).await;
    send_json(&mut ws, json!({"type": "join-admin-room"})).await;

    let reply = next_json(&mut ws).await;
    assert_eq!(reply["success"], false);
    assert_eq!(reply["message"], "Access denied");
}

#[tokio::test]
async fn anonymous_connection_answers_the_echo_diagnostic() {
    let (_http, ws_base) = spawn_server().await;

    let mut ws = connect(&ws_base, None).await;
    send_json(&mut ws, json!({"type": "message", "payload": {"hello": 1}})).await;

    let reply = next_json(&mut ws).await;
    assert_eq!(reply["type"], "message");
    assert_eq!(reply["message"], "Hello world!");
}

#[tokio::test]
async fn malformed_frames_get_an_error_and_keep_the_connection_open() {
    let (_http, ws_base) = spawn_server().await;

    let mut ws = connect(&ws_base, None).await;
    ws.send(Message::Text("not json".to_string().into()))
        .await
        .unwrap();

    let reply = next_json(&mut ws).await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["code"], "PROCESSING_ERROR");

    send_json(&mut ws, json!({"type": "ping"})).await;
    assert_eq!(next_json(&mut ws).await["type"], "pong");
}
