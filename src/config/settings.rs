//! Engine Settings
//!
//! Configuration schema for the server, the upstream provider, the registry
//! store and logging. Every field has a default so a partial file is valid.

use crate::error::{LaqueusError, Result};
use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub registry: RegistryConfig,
    pub log: LogConfig,
}

/// Inbound HTTP listener
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (default: 0.0.0.0)
    pub host: String,

    /// Bind port (default: 8080)
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Upstream completion provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL; `/chat/completions` is appended
    pub base_url: String,

    /// Whole-request timeout for one attempt
    pub timeout_secs: u64,

    pub connect_timeout_secs: u64,

    /// Sent as `HTTP-Referer` when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,

    /// Sent as `X-Title`; empty disables the header
    pub title: String,

    /// Extra tries of the same pair after a transport failure (0 = advance immediately)
    pub transport_retries: u32,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            timeout_secs: 60,
            connect_timeout_secs: 10,
            referer: None,
            title: "Laqueus Engine".to_string(),
            transport_retries: 0,
        }
    }
}

/// Registry store; without a URL the in-memory registry is used
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    pub timeout_secs: u64,

    /// Keys loaded into the in-memory registry, in priority order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<SeedKey>,

    /// Models loaded into the in-memory registry, in priority order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub models: Vec<SeedModel>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            timeout_secs: 10,
            keys: Vec::new(),
            models: Vec::new(),
        }
    }
}

/// An API key declared in the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedKey {
    pub key_name: String,
    pub api_key: String,
}

/// A model declared in the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedModel {
    pub model_name: String,
    pub display_name: String,
}

/// Logging output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,

    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log line format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = LaqueusError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(LaqueusError::Config(format!(
                "Unknown log format '{}'. Expected 'pretty' or 'json'",
                other
            ))),
        }
    }
}

impl EngineConfig {
    /// Reject settings the engine cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.upstream.base_url.trim().is_empty() {
            return Err(LaqueusError::Config("upstream.base_url must not be empty".into()));
        }
        if self.upstream.timeout_secs == 0 {
            return Err(LaqueusError::Config("upstream.timeout_secs must be positive".into()));
        }
        if self.registry.url.is_some() && self.registry.api_key.is_none() {
            return Err(LaqueusError::Config(
                "registry.url is set but registry.api_key is missing".into(),
            ));
        }
        Ok(())
    }

    /// `host:port` for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let json = r#"{
            "upstream": { "referer": "https://laqueus.example", "transport_retries": 2 },
            "log": { "format": "json" }
        }"#;

        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.upstream.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.upstream.referer.as_deref(), Some("https://laqueus.example"));
        assert_eq!(config.upstream.transport_retries, 2);
        assert_eq!(config.log.format, LogFormat::Json);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn test_seed_records() {
        let json = r#"{
            "registry": {
                "keys": [{ "key_name": "primary", "api_key": "sk-1" }],
                "models": [{ "model_name": "openai/gpt-4o-mini", "display_name": "Fast" }]
            }
        }"#;

        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert!(config.registry.url.is_none());
        assert_eq!(config.registry.keys[0].key_name, "primary");
        assert_eq!(config.registry.models[0].display_name, "Fast");
    }

    #[test]
    fn test_validate_registry_needs_key() {
        let mut config = EngineConfig::default();
        assert!(config.validate().is_ok());

        config.registry.url = Some("https://project.supabase.co".to_string());
        assert!(matches!(config.validate(), Err(LaqueusError::Config(_))));

        config.registry.api_key = Some("anon".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("xml".parse::<LogFormat>().is_err());
    }
}
