// tests/exchange_test.rs - Integration test: OllamaClient against local mock backends

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use localchat::provider::ollama::OllamaClient;
use localchat::provider::{ExchangeClient, Message, Role};
use localchat::relay::{build_router, RelayState};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

type Captured = Arc<Mutex<Vec<Value>>>;

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// Backend that records request bodies and answers with `reply`.
async fn backend_replying(reply: &'static str) -> (String, Captured) {
    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let router = Router::new()
        .route(
            "/api/chat",
            post(
                move |State(seen): State<Captured>, Json(body): Json<Value>| async move {
                    seen.lock().unwrap().push(body);
                    Json(json!({
                        "model": "deepseek-r1:14b",
                        "message": {"role": "assistant", "content": reply},
                        "done": true,
                    }))
                },
            ),
        )
        .with_state(captured.clone());
    (serve(router).await, captured)
}

fn client(base: &str) -> OllamaClient {
    OllamaClient::new(base, "deepseek-r1:14b", Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_reply_with_thinking_is_split() {
    let (base, _) = backend_replying("<think>reasoning</think>answer").await;
    let reply = client(&base).exchange(&[Message::user("hi")]).await.unwrap();
    assert_eq!(reply.role, Role::Assistant);
    assert_eq!(reply.content, "answer");
    assert_eq!(reply.thinking.as_deref(), Some("reasoning"));
}

#[tokio::test]
async fn test_plain_reply_verbatim() {
    let (base, _) = backend_replying("plain answer").await;
    let reply = client(&base).exchange(&[Message::user("hi")]).await.unwrap();
    assert_eq!(reply.content, "plain answer");
    assert!(reply.thinking.is_none());
}

#[tokio::test]
async fn test_unclosed_think_left_in_content() {
    let (base, _) = backend_replying("<think>unclosed answer").await;
    let reply = client(&base).exchange(&[Message::user("hi")]).await.unwrap();
    assert_eq!(reply.content, "<think>unclosed answer");
    assert!(reply.thinking.is_none());
}

#[tokio::test]
async fn test_request_shape_excludes_thinking() {
    let (base, captured) = backend_replying("ok").await;
    let mut earlier = Message::assistant("four");
    earlier.thinking = Some("2+2".into());
    let history = vec![Message::user("2+2?"), earlier, Message::user("and 3+3?")];

    client(&base).exchange(&history).await.unwrap();

    let bodies = captured.lock().unwrap().clone();
    assert_eq!(bodies.len(), 1);
    assert_eq!(
        bodies[0],
        json!({
            "model": "deepseek-r1:14b",
            "messages": [
                {"role": "user", "content": "2+2?"},
                {"role": "assistant", "content": "four"},
                {"role": "user", "content": "and 3+3?"},
            ],
            "stream": false,
        })
    );
}

#[tokio::test]
async fn test_non_success_status_is_error() {
    let router = Router::new().route(
        "/api/chat",
        post(|| async { (StatusCode::NOT_FOUND, "model not found") }),
    );
    let base = serve(router).await;
    let err = client(&base).exchange(&[Message::user("hi")]).await.unwrap_err();
    assert!(err.reason.contains("404"));
}

#[tokio::test]
async fn test_malformed_success_body_is_error() {
    let router = Router::new().route(
        "/api/chat",
        post(|| async { Json(json!({"unexpected": true})) }),
    );
    let base = serve(router).await;
    let err = client(&base).exchange(&[Message::user("hi")]).await.unwrap_err();
    assert!(err.reason.starts_with("Failed to parse response"));
}

#[tokio::test]
async fn test_timeout_is_error() {
    let router = Router::new().route(
        "/api/chat",
        post(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Json(json!({"message": {"role": "assistant", "content": "late"}}))
        }),
    );
    let base = serve(router).await;
    let slow = OllamaClient::new(&base, "m", Duration::from_millis(200)).unwrap();
    assert!(slow.exchange(&[Message::user("hi")]).await.is_err());
}

#[tokio::test]
async fn test_exchange_through_relay() {
    let (upstream, captured) = backend_replying("<think>via relay</think>relayed").await;
    let relay = serve(build_router(RelayState::new(&upstream))).await;

    let c = client(&relay);
    c.probe().await.unwrap();
    let reply = c.exchange(&[Message::user("hello")]).await.unwrap();
    assert_eq!(reply.content, "relayed");
    assert_eq!(reply.thinking.as_deref(), Some("via relay"));
    assert_eq!(captured.lock().unwrap()[0]["messages"][0]["content"], "hello");
}

#[tokio::test]
async fn test_relay_upstream_failure_is_error() {
    let router = Router::new().route(
        "/api/chat",
        post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    );
    let upstream = serve(router).await;
    let relay = serve(build_router(RelayState::new(&upstream))).await;

    let err = client(&relay).exchange(&[Message::user("hi")]).await.unwrap_err();
    assert!(err.reason.contains("500"));
    assert!(err.reason.contains("Proxy Error"));
}
