//! Laqueus - priority failover router for chat completions
//!
//! A single message is sent to an OpenAI-compatible provider by trying every
//! registered API key against every registered model, keys as the outer
//! loop, both in ascending priority. The first pair that yields a valid
//! completion wins; if none does, the caller gets the last pair's error.

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod registry;
pub mod router;
pub mod server;

pub use client::{Completion, HttpTransport, UpstreamError, UpstreamTransport};
pub use config::{ConfigLoader, EngineConfig};
pub use error::{LaqueusError, Result};
pub use registry::{
    build_registry, Credential, InMemoryRegistry, ModelSpec, PostgrestRegistry, RegistryAdmin,
    RegistryReader,
};
pub use router::{FailoverRouter, RoutingSuccess};

use std::sync::Arc;

/// Wire the registry and upstream transport described by `config` into a router
pub async fn build_router(config: &EngineConfig) -> Result<FailoverRouter> {
    let registry = build_registry(&config.registry).await?;
    let transport = HttpTransport::new(&config.upstream)?;

    tracing::info!(
        upstream = %transport.endpoint(),
        transport_retries = config.upstream.transport_retries,
        "failover router ready"
    );

    Ok(FailoverRouter::new(registry, Arc::new(transport)))
}
