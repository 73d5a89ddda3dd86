// src/relay/mod.rs - CORS relay in front of the model backend
//
// Browsers cannot call the backend directly across origins; this server
// forwards /api/chat unchanged and adds permissive CORS headers.

pub mod handlers;
pub mod types;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::infra::config::RelayConfig;

/// Shared state for relay handlers.
#[derive(Clone)]
pub struct RelayState {
    /// Backend base URL, without a trailing slash.
    pub upstream: String,
    pub client: reqwest::Client,
}

impl RelayState {
    pub fn new(upstream: impl Into<String>) -> Self {
        Self {
            upstream: upstream.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

/// Build the axum router with the relay routes.
pub fn build_router(state: RelayState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat", post(handlers::forward_chat))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(axum::middleware::from_fn(handlers::log_requests))
        .layer(cors)
        .with_state(state)
}

/// Serve until Ctrl+C.
pub async fn start_server(config: &RelayConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let router = build_router(RelayState::new(&config.upstream));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Relay running at http://{addr} -> {}", config.upstream);
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Relay shutting down");
        })
        .await?;
    Ok(())
}
