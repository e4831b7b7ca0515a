//! Failover Router
//!
//! Walks every (key, model) pair in priority order and returns the first
//! completion that succeeds.

use crate::client::UpstreamTransport;
use crate::error::{LaqueusError, Result};
use crate::registry::RegistryReader;
use crate::router::plan::dispatch_plan;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Body returned to the caller when a pair succeeds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingSuccess {
    /// Completion text
    pub response: String,

    /// Upstream model identifier that answered
    pub model_used: String,

    pub model_display_name: String,

    /// Label of the key that answered
    pub key_used: String,

    /// Provider usage object, or null
    pub usage: Option<serde_json::Value>,
}

/// Priority failover across API keys and models.
///
/// Holds no mutable state; clone it freely or share it behind an `Arc`.
#[derive(Clone)]
pub struct FailoverRouter {
    registry: Arc<dyn RegistryReader>,
    transport: Arc<dyn UpstreamTransport>,
}

impl FailoverRouter {
    /// Create a router over a registry and an upstream transport
    pub fn new(registry: Arc<dyn RegistryReader>, transport: Arc<dyn UpstreamTransport>) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Route one message.
    ///
    /// Re-reads the registry, then tries pairs one at a time until one
    /// succeeds. Only the most recent failure is kept for the error.
    pub async fn route(&self, message: &str) -> Result<RoutingSuccess> {
        if message.trim().is_empty() {
            return Err(LaqueusError::InvalidRequest("Message is required".to_string()));
        }

        let credentials = self.registry.list_active_credentials().await?;
        if credentials.is_empty() {
            tracing::warn!("no active api keys");
            return Err(LaqueusError::NoCredentialsConfigured);
        }

        let models = self.registry.list_active_models().await?;
        if models.is_empty() {
            tracing::warn!("no active models");
            return Err(LaqueusError::NoModelsConfigured);
        }

        let mut last_error = None;

        for attempt in dispatch_plan(&credentials, &models) {
            let key = &attempt.credential.key_name;
            let model = &attempt.model.model_name;

            match self
                .transport
                .complete(attempt.credential, attempt.model, message)
                .await
            {
                Ok(completion) => {
                    tracing::info!(
                        attempt = attempt.ordinal + 1,
                        model = %model,
                        key = %key,
                        "completion succeeded"
                    );
                    return Ok(RoutingSuccess {
                        response: completion.content,
                        model_used: model.clone(),
                        model_display_name: attempt.model.display_name.clone(),
                        key_used: key.clone(),
                        usage: completion.usage,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt.ordinal + 1,
                        model = %model,
                        key = %key,
                        error = %e,
                        "pair failed, trying next"
                    );
                    last_error = Some(format!("{} ({}): {}", model, key, e));
                }
            }
        }

        Err(LaqueusError::AllAttemptsFailed {
            last_error: last_error.unwrap_or_default(),
        })
    }

    /// Route one message, abandoning the in-flight call and all remaining
    /// pairs as soon as `cancel` fires.
    pub async fn route_with_cancellation(
        &self,
        message: &str,
        cancel: &CancellationToken,
    ) -> Result<RoutingSuccess> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("dispatch abandoned");
                Err(LaqueusError::Cancelled)
            }
            outcome = self.route(message) => outcome,
        }
    }
}
