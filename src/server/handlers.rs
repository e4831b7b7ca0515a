//! Request Handlers
//!
//! The inbound completion endpoint, the liveness probe, CORS preflight and
//! the mapping from engine errors to HTTP responses.

use crate::error::LaqueusError;
use crate::router::FailoverRouter;
use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub router: FailoverRouter,
    /// Fires on server shutdown; in-flight dispatches abandon remaining pairs
    pub shutdown: CancellationToken,
}

/// JSON error body
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_error: Option<String>,
}

impl ErrorBody {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            last_error: None,
        }
    }
}

impl IntoResponse for LaqueusError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            LaqueusError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, ErrorBody::new(msg)),
            LaqueusError::NoCredentialsConfigured | LaqueusError::NoModelsConfigured => {
                (StatusCode::SERVICE_UNAVAILABLE, ErrorBody::new(self.to_string()))
            }
            LaqueusError::AllAttemptsFailed { last_error } => (
                StatusCode::BAD_GATEWAY,
                ErrorBody {
                    error: "All API keys and models failed".to_string(),
                    last_error: Some(last_error),
                },
            ),
            LaqueusError::StoreUnavailable(detail) => {
                tracing::error!(error = %detail, "registry read failed");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorBody::new("Registry unavailable"),
                )
            }
            LaqueusError::Cancelled => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody::new(self.to_string()),
            ),
            LaqueusError::NotFound(_) => (StatusCode::NOT_FOUND, ErrorBody::new(self.to_string())),
            LaqueusError::Config(_) | LaqueusError::Internal(_) => {
                tracing::error!(error = %self, "unclassified failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody::new(self.to_string()),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Pull a non-blank `message` string out of the request body
fn parse_message(body: &[u8]) -> Result<String, LaqueusError> {
    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| LaqueusError::InvalidRequest(format!("Invalid JSON body: {}", e)))?;

    value
        .get("message")
        .and_then(serde_json::Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
        .ok_or_else(|| LaqueusError::InvalidRequest("Message is required".to_string()))
}

/// Route one message through the failover router.
///
/// # Endpoint
/// `POST /` with body `{ "message": string }`
pub async fn route_message(State(state): State<AppState>, body: Bytes) -> Response {
    let message = match parse_message(&body) {
        Ok(message) => message,
        Err(e) => return e.into_response(),
    };

    match state
        .router
        .route_with_cancellation(&message, &state.shutdown)
        .await
    {
        Ok(success) => (StatusCode::OK, Json(success)).into_response(),
        Err(e) => e.into_response(),
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Liveness probe.
///
/// # Endpoint
/// `GET /health`
pub async fn health() -> Response {
    (StatusCode::OK, Json(HealthResponse { status: "ok" })).into_response()
}

/// CORS preflight: 200 with no body
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Unknown paths; preflight is still answered so browsers see the CORS headers
pub async fn fallback(method: Method) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    (StatusCode::NOT_FOUND, Json(ErrorBody::new("Not found"))).into_response()
}
