//! In-Memory Registry
//!
//! Process-local registry used when no remote store is configured.

use crate::error::{LaqueusError, Result};
use crate::registry::records::{active_in_priority_order, next_priority, Prioritized};
use crate::registry::{Credential, ModelSpec, RegistryAdmin, RegistryReader};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

/// Registry kept in memory; records live in insertion order
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    credentials: RwLock<Vec<Credential>>,
    models: RwLock<Vec<ModelSpec>>,
    next_id: AtomicU64,
}

impl InMemoryRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the registry with existing records.
    ///
    /// Generated ids continue past any seeded `key-N` / `model-N` id.
    pub fn with_records(credentials: Vec<Credential>, models: Vec<ModelSpec>) -> Self {
        let high_water = credentials
            .iter()
            .map(|c| c.id.as_str())
            .chain(models.iter().map(|m| m.id.as_str()))
            .filter_map(generated_suffix)
            .max()
            .unwrap_or(0);

        Self {
            credentials: RwLock::new(credentials),
            models: RwLock::new(models),
            next_id: AtomicU64::new(high_water),
        }
    }

    fn allocate_id(&self, prefix: &str) -> String {
        let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}-{}", prefix, n)
    }
}

/// Numeric suffix of an id in the `key-N` / `model-N` form
fn generated_suffix(id: &str) -> Option<u64> {
    let (prefix, n) = id.rsplit_once('-')?;
    match prefix {
        "key" | "model" => n.parse().ok(),
        _ => None,
    }
}

fn sorted_all<T: Prioritized + Clone>(records: &[T]) -> Vec<T> {
    let mut all = records.to_vec();
    all.sort_by_key(Prioritized::priority);
    all
}

fn remove_by_id<T: Prioritized>(records: &mut Vec<T>, id: &str) -> Result<()> {
    let before = records.len();
    records.retain(|r| r.id() != id);
    if records.len() == before {
        return Err(LaqueusError::NotFound(id.to_string()));
    }
    Ok(())
}

#[async_trait]
impl RegistryReader for InMemoryRegistry {
    async fn list_active_credentials(&self) -> Result<Vec<Credential>> {
        Ok(active_in_priority_order(&self.credentials.read()[..]))
    }

    async fn list_active_models(&self) -> Result<Vec<ModelSpec>> {
        Ok(active_in_priority_order(&self.models.read()[..]))
    }
}

#[async_trait]
impl RegistryAdmin for InMemoryRegistry {
    async fn create_credential(&self, key_name: &str, api_key: &str) -> Result<Credential> {
        let mut credentials = self.credentials.write();
        let mut credential = Credential::new(
            self.allocate_id("key"),
            key_name,
            api_key,
            next_priority(&credentials[..]),
        );
        credential.created_at = Some(Utc::now());
        credentials.push(credential.clone());

        tracing::info!(key_name, priority = credential.priority, "api key added");
        Ok(credential)
    }

    async fn create_model(&self, model_name: &str, display_name: &str) -> Result<ModelSpec> {
        let mut models = self.models.write();
        let mut model = ModelSpec::new(
            self.allocate_id("model"),
            model_name,
            display_name,
            next_priority(&models[..]),
        );
        model.created_at = Some(Utc::now());
        models.push(model.clone());

        tracing::info!(model_name, priority = model.priority, "model added");
        Ok(model)
    }

    async fn list_credentials(&self) -> Result<Vec<Credential>> {
        Ok(sorted_all(&self.credentials.read()[..]))
    }

    async fn list_models(&self) -> Result<Vec<ModelSpec>> {
        Ok(sorted_all(&self.models.read()[..]))
    }

    async fn delete_credential(&self, id: &str) -> Result<()> {
        remove_by_id(&mut *self.credentials.write(), id)
    }

    async fn delete_model(&self, id: &str) -> Result<()> {
        remove_by_id(&mut *self.models.write(), id)
    }

    async fn set_credential_active(&self, id: &str, is_active: bool) -> Result<()> {
        let mut credentials = self.credentials.write();
        let credential = credentials
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| LaqueusError::NotFound(id.to_string()))?;
        credential.is_active = is_active;
        Ok(())
    }

    async fn set_model_active(&self, id: &str, is_active: bool) -> Result<()> {
        let mut models = self.models.write();
        let model = models
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| LaqueusError::NotFound(id.to_string()))?;
        model.is_active = is_active;
        Ok(())
    }
}
