//! PostgREST Registry
//!
//! Reads and administers the `api_keys` and `models` tables through the
//! PostgREST interface of a hosted Postgres store.

use crate::error::{LaqueusError, Result};
use crate::registry::records::next_priority;
use crate::registry::{Credential, ModelSpec, Prioritized, RegistryAdmin, RegistryReader};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const CREDENTIALS_TABLE: &str = "api_keys";
const MODELS_TABLE: &str = "models";

/// Registry backed by a PostgREST endpoint
#[derive(Debug, Clone)]
pub struct PostgrestRegistry {
    client: Client,
    rest_url: String,
}

#[derive(Deserialize)]
struct PriorityRow {
    priority: i32,
}

impl Prioritized for PriorityRow {
    fn id(&self) -> &str {
        ""
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn is_active(&self) -> bool {
        true
    }
}

#[derive(Serialize)]
struct NewCredential<'a> {
    key_name: &'a str,
    api_key: &'a str,
    priority: i32,
    is_active: bool,
}

#[derive(Serialize)]
struct NewModel<'a> {
    model_name: &'a str,
    display_name: &'a str,
    priority: i32,
    is_active: bool,
}

#[derive(Serialize)]
struct ActiveFlag {
    is_active: bool,
}

impl PostgrestRegistry {
    /// Create a registry for the project at `url`, authenticated with `api_key`
    pub fn new(url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| LaqueusError::Config(format!("Invalid registry key format: {}", e)))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|e| LaqueusError::Config(format!("Invalid registry key format: {}", e)))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| LaqueusError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            rest_url: format!("{}/rest/v1", url.trim_end_matches('/')),
        })
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.rest_url, table))
    }

    /// Send a request and decode the returned rows
    async fn rows<T: DeserializeOwned>(&self, builder: RequestBuilder, table: &str) -> Result<Vec<T>> {
        let response = builder
            .send()
            .await
            .map_err(|e| LaqueusError::StoreUnavailable(format!("{}: {}", table, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LaqueusError::StoreUnavailable(format!(
                "{}: status {}: {}",
                table, status, body
            )));
        }

        response
            .json::<Vec<T>>()
            .await
            .map_err(|e| LaqueusError::StoreUnavailable(format!("{}: unreadable rows: {}", table, e)))
    }

    async fn select<T: DeserializeOwned>(&self, table: &str, active_only: bool) -> Result<Vec<T>> {
        let mut query = vec![("select", "*"), ("order", "priority.asc,id.asc")];
        if active_only {
            query.push(("is_active", "eq.true"));
        }

        self.rows(self.request(Method::GET, table).query(&query), table)
            .await
    }

    async fn next_priority_for(&self, table: &str) -> Result<i32> {
        let top: Vec<PriorityRow> = self
            .rows(
                self.request(Method::GET, table).query(&[
                    ("select", "priority"),
                    ("order", "priority.desc"),
                    ("limit", "1"),
                ]),
                table,
            )
            .await?;
        Ok(next_priority(&top))
    }

    async fn insert<B: Serialize + Sync, T: DeserializeOwned>(&self, table: &str, body: &B) -> Result<T> {
        let created: Vec<T> = self
            .rows(
                self.request(Method::POST, table)
                    .header("Prefer", "return=representation")
                    .json(body),
                table,
            )
            .await?;

        created.into_iter().next().ok_or_else(|| {
            LaqueusError::StoreUnavailable(format!("{}: insert returned no row", table))
        })
    }

    /// Apply `method` to the row with `id`; an empty representation means no such row
    async fn mutate_by_id(&self, method: Method, table: &str, id: &str, body: Option<&ActiveFlag>) -> Result<()> {
        let filter = format!("eq.{}", id);
        let mut builder = self
            .request(method, table)
            .query(&[("id", filter.as_str())])
            .header("Prefer", "return=representation");
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let affected: Vec<serde_json::Value> = self.rows(builder, table).await?;
        if affected.is_empty() {
            return Err(LaqueusError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RegistryReader for PostgrestRegistry {
    async fn list_active_credentials(&self) -> Result<Vec<Credential>> {
        self.select(CREDENTIALS_TABLE, true).await
    }

    async fn list_active_models(&self) -> Result<Vec<ModelSpec>> {
        self.select(MODELS_TABLE, true).await
    }
}

#[async_trait]
impl RegistryAdmin for PostgrestRegistry {
    async fn create_credential(&self, key_name: &str, api_key: &str) -> Result<Credential> {
        let priority = self.next_priority_for(CREDENTIALS_TABLE).await?;
        let row = NewCredential {
            key_name,
            api_key,
            priority,
            is_active: true,
        };
        let credential: Credential = self.insert(CREDENTIALS_TABLE, &row).await?;

        tracing::info!(key_name, priority, "api key added");
        Ok(credential)
    }

    async fn create_model(&self, model_name: &str, display_name: &str) -> Result<ModelSpec> {
        let priority = self.next_priority_for(MODELS_TABLE).await?;
        let row = NewModel {
            model_name,
            display_name,
            priority,
            is_active: true,
        };
        let model: ModelSpec = self.insert(MODELS_TABLE, &row).await?;

        tracing::info!(model_name, priority, "model added");
        Ok(model)
    }

    async fn list_credentials(&self) -> Result<Vec<Credential>> {
        self.select(CREDENTIALS_TABLE, false).await
    }

    async fn list_models(&self) -> Result<Vec<ModelSpec>> {
        self.select(MODELS_TABLE, false).await
    }

    async fn delete_credential(&self, id: &str) -> Result<()> {
        self.mutate_by_id(Method::DELETE, CREDENTIALS_TABLE, id, None)
            .await
    }

    async fn delete_model(&self, id: &str) -> Result<()> {
        self.mutate_by_id(Method::DELETE, MODELS_TABLE, id, None).await
    }

    async fn set_credential_active(&self, id: &str, is_active: bool) -> Result<()> {
        self.mutate_by_id(Method::PATCH, CREDENTIALS_TABLE, id, Some(&ActiveFlag { is_active }))
            .await
    }

    async fn set_model_active(&self, id: &str, is_active: bool) -> Result<()> {
        self.mutate_by_id(Method::PATCH, MODELS_TABLE, id, Some(&ActiveFlag { is_active }))
            .await
    }
}
