//! Client Module
//!
//! Outbound completion transport and per-pair failure classification.

pub mod http;

pub use http::HttpTransport;

use crate::registry::{Credential, ModelSpec};
use async_trait::async_trait;
use thiserror::Error;

/// A validated upstream completion
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Text of the first choice
    pub content: String,

    /// Usage object exactly as the provider returned it
    pub usage: Option<serde_json::Value>,
}

/// Why a single (key, model) attempt failed.
///
/// These never reach the caller directly; the router folds them into the
/// last-error string and moves on to the next pair.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Provider answered with a non-2xx status; `body` is the raw response text
    #[error("HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Provider answered 2xx but the body carried no usable completion
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Request did not complete in time
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// Connection or protocol failure before a response was read
    #[error("Request failed: {0}")]
    Transport(String),

    /// The stored secret cannot be sent as a header
    #[error("API key '{0}' is not a valid header value")]
    InvalidCredential(String),
}

impl UpstreamError {
    /// Whether a retry of the same pair could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, UpstreamError::Timeout(_) | UpstreamError::Transport(_))
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            UpstreamError::Timeout(err.to_string())
        } else if err.is_connect() {
            UpstreamError::Transport(format!("Connection failed: {}", err))
        } else if err.is_decode() {
            UpstreamError::Malformed(format!("Failed to decode response: {}", err))
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }
}

/// One outbound completion call per dispatch pair.
#[async_trait]
pub trait UpstreamTransport: Send + Sync {
    async fn complete(
        &self,
        credential: &Credential,
        model: &ModelSpec,
        message: &str,
    ) -> Result<Completion, UpstreamError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_detail_carries_status_and_raw_body() {
        let err = UpstreamError::Rejected {
            status: 401,
            body: r#"{"error":{"message":"User not found."}}"#.to_string(),
        };
        assert_eq!(err.to_string(), r#"HTTP 401: {"error":{"message":"User not found."}}"#);
        assert!(!err.is_transient());
    }

    #[test]
    fn test_transient_classification() {
        assert!(UpstreamError::Timeout("slow".into()).is_transient());
        assert!(UpstreamError::Transport("reset".into()).is_transient());
        assert!(!UpstreamError::Malformed("empty".into()).is_transient());
        assert!(!UpstreamError::InvalidCredential("broken".into()).is_transient());
    }
}
