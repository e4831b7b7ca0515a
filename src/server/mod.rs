//! Server Module
//!
//! axum application exposing the failover router over HTTP.

pub mod handlers;

pub use handlers::AppState;

use crate::error::{LaqueusError, Result};
use axum::{
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN,
        },
        HeaderValue,
    },
    routing::{get, post},
    Router,
};
use handlers::{fallback, health, preflight, route_message};
use tokio::net::TcpListener;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

const ALLOWED_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type, Authorization, X-Client-Info, Apikey";

/// Build the application router.
///
/// The completion endpoint is mounted at `/`, `/chat` and `/openrouter-proxy`.
/// Every response, errors included, carries permissive CORS headers.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", post(route_message).options(preflight))
        .route("/chat", post(route_message).options(preflight))
        .route("/openrouter-proxy", post(route_message).options(preflight))
        .route("/health", get(health).options(preflight))
        .fallback(fallback)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ))
}

/// Serve until `state.shutdown` fires, then drain in-flight requests
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| LaqueusError::Config(format!("Failed to bind {}: {}", addr, e)))?;
    tracing::info!(addr = %addr, "listening");

    let shutdown = state.shutdown.clone();
    axum::serve(listener, build_app(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| LaqueusError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("server stopped");
    Ok(())
}
