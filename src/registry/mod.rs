//! Registry Module
//!
//! Read contract over the API key and model tables, plus the administrative
//! operations the console performs against the same store.

pub mod memory;
pub mod postgrest;
pub mod records;

pub use memory::InMemoryRegistry;
pub use postgrest::PostgrestRegistry;
pub use records::{next_priority, Credential, ModelSpec, Prioritized};

use crate::config::RegistryConfig;
use crate::error::{LaqueusError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Read-only view used by the router on every dispatch.
///
/// Implementations return active records in ascending priority, with a
/// deterministic tie order, and an empty vector when nothing is active.
/// A store that cannot be reached yields `StoreUnavailable`.
#[async_trait]
pub trait RegistryReader: Send + Sync {
    async fn list_active_credentials(&self) -> Result<Vec<Credential>>;

    async fn list_active_models(&self) -> Result<Vec<ModelSpec>>;
}

/// Create/list/delete operations backing the administrative console.
#[async_trait]
pub trait RegistryAdmin: Send + Sync {
    /// Insert an active key at the next free priority
    async fn create_credential(&self, key_name: &str, api_key: &str) -> Result<Credential>;

    /// Insert an active model at the next free priority
    async fn create_model(&self, model_name: &str, display_name: &str) -> Result<ModelSpec>;

    /// All keys, active or not, in ascending priority
    async fn list_credentials(&self) -> Result<Vec<Credential>>;

    /// All models, active or not, in ascending priority
    async fn list_models(&self) -> Result<Vec<ModelSpec>>;

    async fn delete_credential(&self, id: &str) -> Result<()>;

    async fn delete_model(&self, id: &str) -> Result<()>;

    async fn set_credential_active(&self, id: &str, is_active: bool) -> Result<()>;

    async fn set_model_active(&self, id: &str, is_active: bool) -> Result<()>;
}

/// Build the registry described by `config`.
///
/// A configured URL selects the PostgREST store; otherwise an in-memory
/// registry is created and seeded from the configured keys and models, each
/// at the next free priority.
pub async fn build_registry(config: &RegistryConfig) -> Result<Arc<dyn RegistryReader>> {
    if let Some(url) = &config.url {
        let api_key = config.api_key.as_deref().ok_or_else(|| {
            LaqueusError::Config("registry.url is set but registry.api_key is missing".into())
        })?;
        if !config.keys.is_empty() || !config.models.is_empty() {
            tracing::warn!("registry seed records are ignored when a remote store is configured");
        }
        tracing::info!(url = %url, "using postgrest registry");
        let registry = PostgrestRegistry::new(url, api_key, Duration::from_secs(config.timeout_secs))?;
        return Ok(Arc::new(registry));
    }

    let registry = InMemoryRegistry::new();
    for key in &config.keys {
        registry.create_credential(&key.key_name, &key.api_key).await?;
    }
    for model in &config.models {
        registry
            .create_model(&model.model_name, &model.display_name)
            .await?;
    }
    tracing::info!(
        keys = config.keys.len(),
        models = config.models.len(),
        "using in-memory registry"
    );
    Ok(Arc::new(registry))
}
