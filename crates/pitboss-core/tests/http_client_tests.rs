use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use pitboss_core::chat::Message;
use pitboss_core::constants::completion::EMPTY_RESPONSE;
use pitboss_core::llm::{CompletionClient, CompletionRequest, HttpCompletionClient, ProfileHint};
use pitboss_core::PitbossError;
use serde_json::{json, Value};
use std::time::Duration;

/// Fake completion proxy on an ephemeral port. Returns its base URL.
async fn spawn_endpoint() -> String {
    let app = Router::new()
        .route(
            "/echo",
            post(|Json(body): Json<Value>| async move {
                let last = body["messages"]
                    .as_array()
                    .and_then(|m| m.last())
                    .and_then(|m| m["content"].as_str())
                    .unwrap_or_default()
                    .to_string();
                let who = body["profile"]["displayName"]
                    .as_str()
                    .unwrap_or("stranger")
                    .to_string();
                Json(json!({ "content": format!("{who} said: {last}") }))
            }),
        )
        .route("/empty", post(|| async { Json(json!({})) }))
        .route(
            "/broken",
            post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
        )
        .route("/garbage", post(|| async { "not json" }))
        .route(
            "/slow",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({ "content": "finally" }))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn request(text: &str) -> CompletionRequest {
    CompletionRequest::from_history(&[Message::user(text)], None)
}

#[tokio::test]
async fn test_returns_content_field() {
    let base = spawn_endpoint().await;
    let client = HttpCompletionClient::new(format!("{base}/echo"));

    let hint = ProfileHint {
        name: None,
        display_name: Some("Sam".into()),
    };
    let req = CompletionRequest::from_history(&[Message::user("gm")], Some(&hint));
    let reply = client.complete(&req).await.unwrap();
    assert_eq!(reply, "Sam said: gm");
}

#[tokio::test]
async fn test_missing_content_uses_apology() {
    let base = spawn_endpoint().await;
    let client = HttpCompletionClient::new(format!("{base}/empty"));

    let reply = client.complete(&request("hello")).await.unwrap();
    assert_eq!(reply, EMPTY_RESPONSE);
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let base = spawn_endpoint().await;
    let client = HttpCompletionClient::new(format!("{base}/broken"));

    match client.complete(&request("hello")).await {
        Err(PitbossError::CompletionStatus { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unparseable_body_is_an_error() {
    let base = spawn_endpoint().await;
    let client = HttpCompletionClient::new(format!("{base}/garbage"));

    assert!(matches!(
        client.complete(&request("hello")).await,
        Err(PitbossError::Completion(_))
    ));
}

#[tokio::test]
async fn test_timeout_applies() {
    let base = spawn_endpoint().await;
    let client = HttpCompletionClient::new(format!("{base}/slow"))
        .with_timeout(Duration::from_millis(100))
        .unwrap();

    assert!(matches!(
        client.complete(&request("hello")).await,
        Err(PitbossError::Http(_))
    ));
}

#[tokio::test]
async fn test_unreachable_endpoint_is_an_error() {
    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpCompletionClient::new(format!("http://{addr}/api/pitboss"));
    assert!(client.complete(&request("hello")).await.is_err());
}
