//! Router Test Utilities
//!
//! Scripted transport and registry doubles for exercising the dispatch loop
//! without network access.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::client::{Completion, UpstreamError, UpstreamTransport};
use crate::error::{LaqueusError, Result};
use crate::registry::{Credential, ModelSpec, RegistryReader};

/// How a scripted pair answers
#[derive(Debug, Clone)]
pub enum Scripted {
    Succeed(&'static str),
    Reject(u16, &'static str),
    Malformed,
    Timeout,
}

/// Transport whose answer per (key_name, model_name) is fixed up front.
///
/// Unscripted pairs are rejected with a 500. Every call is recorded.
pub struct ScriptedTransport {
    script: HashMap<(String, String), Scripted>,
    calls: Mutex<Vec<(String, String)>>,
    delay: Option<Duration>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            script: HashMap::new(),
            calls: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub fn on(mut self, key_name: &str, model_name: &str, answer: Scripted) -> Self {
        self.script
            .insert((key_name.to_string(), model_name.to_string()), answer);
        self
    }

    /// Sleep before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl UpstreamTransport for ScriptedTransport {
    async fn complete(
        &self,
        credential: &Credential,
        model: &ModelSpec,
        _message: &str,
    ) -> std::result::Result<Completion, UpstreamError> {
        let pair = (credential.key_name.clone(), model.model_name.clone());
        self.calls.lock().push(pair.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.script.get(&pair) {
            Some(Scripted::Succeed(text)) => Ok(Completion {
                content: text.to_string(),
                usage: Some(serde_json::json!({ "total_tokens": 7 })),
            }),
            Some(Scripted::Reject(status, body)) => Err(UpstreamError::Rejected {
                status: *status,
                body: body.to_string(),
            }),
            Some(Scripted::Malformed) => {
                Err(UpstreamError::Malformed("no completion choices".to_string()))
            }
            Some(Scripted::Timeout) => {
                Err(UpstreamError::Timeout("operation timed out".to_string()))
            }
            None => Err(UpstreamError::Rejected {
                status: 500,
                body: format!("unscripted {}", pair.1),
            }),
        }
    }
}

/// Registry that counts reads and can be made unreachable
pub struct CountingRegistry {
    credentials: Vec<Credential>,
    models: Vec<ModelSpec>,
    unavailable: bool,
    reads: AtomicUsize,
}

impl CountingRegistry {
    pub fn new(credentials: Vec<Credential>, models: Vec<ModelSpec>) -> Self {
        Self {
            credentials,
            models,
            unavailable: false,
            reads: AtomicUsize::new(0),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::new(vec![], vec![])
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn read<T: Clone>(&self, rows: &[T]) -> Result<Vec<T>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(LaqueusError::StoreUnavailable("connection refused".to_string()));
        }
        Ok(rows.to_vec())
    }
}

#[async_trait]
impl RegistryReader for CountingRegistry {
    async fn list_active_credentials(&self) -> Result<Vec<Credential>> {
        self.read(&self.credentials)
    }

    async fn list_active_models(&self) -> Result<Vec<ModelSpec>> {
        self.read(&self.models)
    }
}

/// The primary/backup x fast/cheap registry used across router tests
pub fn two_by_two() -> (Vec<Credential>, Vec<ModelSpec>) {
    (
        vec![
            Credential::new("k1", "primary", "sk-primary", 0),
            Credential::new("k2", "backup", "sk-backup", 1),
        ],
        vec![
            ModelSpec::new("m1", "fast", "Fast Model", 0),
            ModelSpec::new("m2", "cheap", "Cheap Model", 1),
        ],
    )
}
