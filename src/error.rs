//! Laqueus Error Types
//!
//! Error handling for the routing engine, the registry and the HTTP surface.

use thiserror::Error;

/// Main error type for Laqueus operations
#[derive(Debug, Error)]
pub enum LaqueusError {
    /// Caller input was rejected before any registry read or outbound call
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The registry holds no active API keys
    #[error("No API keys configured")]
    NoCredentialsConfigured,

    /// The registry holds no active models
    #[error("No models configured")]
    NoModelsConfigured,

    /// Every (key, model) pair was tried and none succeeded
    #[error("All API keys and models failed: {last_error}")]
    AllAttemptsFailed { last_error: String },

    /// The backing store could not be reached or returned unreadable rows
    #[error("Registry unavailable: {0}")]
    StoreUnavailable(String),

    /// No registry record with the given id
    #[error("Record '{0}' not found")]
    NotFound(String),

    /// The inbound request was abandoned before a pair succeeded
    #[error("Request cancelled")]
    Cancelled,

    /// Configuration errors (invalid JSON, bad env values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for LaqueusError {
    fn from(err: serde_json::Error) -> Self {
        LaqueusError::Internal(format!("JSON error: {}", err))
    }
}

impl From<std::io::Error> for LaqueusError {
    fn from(err: std::io::Error) -> Self {
        LaqueusError::Config(format!("IO error: {}", err))
    }
}

/// Result type alias for Laqueus operations
pub type Result<T> = std::result::Result<T, LaqueusError>;
