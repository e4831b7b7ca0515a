//! HTTP Transport
//!
//! Issues one chat completion call for a (key, model) pair and classifies
//! the result. Only transport failures are ever retried, and only when
//! `transport_retries` is non-zero.

use crate::api::{CompletionRequest, CompletionResponse};
use crate::client::{Completion, UpstreamError, UpstreamTransport};
use crate::config::UpstreamConfig;
use crate::error::{LaqueusError, Result};
use crate::registry::{Credential, ModelSpec};
use async_trait::async_trait;
use backoff::ExponentialBackoff;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use std::time::Duration;

/// Longest slice of an unparsable body kept in the error detail
const BODY_EXCERPT_LEN: usize = 500;

/// reqwest-backed transport to an OpenAI-compatible `/chat/completions`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Inner reqwest client
    client: Client,

    /// Full completions URL
    endpoint: String,

    /// Extra tries of the same pair on transport failure
    transport_retries: u32,
}

impl HttpTransport {
    /// Create a new transport from upstream settings
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(referer) = &config.referer {
            headers.insert(
                HeaderName::from_static("http-referer"),
                HeaderValue::from_str(referer)
                    .map_err(|e| LaqueusError::Config(format!("Invalid referer: {}", e)))?,
            );
        }
        if !config.title.is_empty() {
            headers.insert(
                HeaderName::from_static("x-title"),
                HeaderValue::from_str(&config.title)
                    .map_err(|e| LaqueusError::Config(format!("Invalid title: {}", e)))?,
            );
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| LaqueusError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            transport_retries: config.transport_retries,
        })
    }

    /// The completions URL this transport posts to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send_once(
        &self,
        credential: &Credential,
        model: &ModelSpec,
        message: &str,
    ) -> std::result::Result<Completion, UpstreamError> {
        let bearer = HeaderValue::from_str(&format!("Bearer {}", credential.api_key))
            .map_err(|_| UpstreamError::InvalidCredential(credential.key_name.clone()))?;

        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, bearer)
            .json(&CompletionRequest::single_turn(&model.model_name, message))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(UpstreamError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: CompletionResponse = serde_json::from_str(&body).map_err(|e| {
            UpstreamError::Malformed(format!(
                "failed to parse response: {}. Body: {}",
                e,
                excerpt(&body)
            ))
        })?;

        let content = parsed
            .content()
            .ok_or_else(|| UpstreamError::Malformed(format!("no completion content. Body: {}", excerpt(&body))))?;

        Ok(Completion {
            content,
            usage: parsed.usage,
        })
    }
}

fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[async_trait]
impl UpstreamTransport for HttpTransport {
    async fn complete(
        &self,
        credential: &Credential,
        model: &ModelSpec,
        message: &str,
    ) -> std::result::Result<Completion, UpstreamError> {
        if self.transport_retries == 0 {
            return self.send_once(credential, model, message).await;
        }

        let policy = ExponentialBackoff {
            initial_interval: Duration::from_millis(250),
            max_interval: Duration::from_secs(5),
            max_elapsed_time: None,
            ..Default::default()
        };

        let mut tries = 0u32;
        backoff::future::retry(policy, || {
            tries += 1;
            let attempt = tries;
            async move {
                match self.send_once(credential, model, message).await {
                    Ok(completion) => Ok(completion),
                    Err(e) if e.is_transient() && attempt <= self.transport_retries => {
                        tracing::debug!(
                            model = %model.model_name,
                            key = %credential.key_name,
                            attempt,
                            error = %e,
                            "transport failure, retrying same pair"
                        );
                        Err(backoff::Error::transient(e))
                    }
                    Err(e) => Err(backoff::Error::permanent(e)),
                }
            }
        })
        .await
    }
}
