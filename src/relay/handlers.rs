// src/relay/handlers.rs

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::TryStreamExt;

use crate::relay::types::{ErrorResponse, HealthResponse};
use crate::relay::RelayState;

/// POST /api/chat: pass the body through untouched and stream the reply back.
pub async fn forward_chat(
    State(state): State<RelayState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let url = format!("{}/api/chat", state.upstream);
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/json"));

    let upstream = match state
        .client
        .post(&url)
        .header(header::CONTENT_TYPE, content_type)
        .body(body)
        .send()
        .await
    {
        Ok(resp) => resp,
        Err(e) => {
            tracing::error!("Error: {}", e);
            return proxy_error(e.to_string());
        }
    };

    let status = upstream.status();
    if !status.is_success() {
        tracing::error!("Upstream {} answered {}", url, status);
        return proxy_error(format!(
            "Request failed with status code {}",
            status.as_u16()
        ));
    }

    let upstream_type = upstream.headers().get(header::CONTENT_TYPE).cloned();
    let stream = upstream
        .bytes_stream()
        .inspect_err(|e| tracing::warn!("Upstream stream broke: {}", e));

    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = status;
    if let Some(value) = upstream_type {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    response
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}

pub async fn not_found(req: Request) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "Not Found".into(),
            message: format!("No route for {} {}", req.method(), req.uri().path()),
        }),
    )
}

/// Logs every incoming request.
pub async fn log_requests(req: Request, next: Next) -> Response {
    tracing::info!("Incoming request: {} {}", req.method(), req.uri());
    next.run(req).await
}

fn proxy_error(message: String) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::proxy(message)),
    )
        .into_response()
}
