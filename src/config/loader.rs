//! Configuration Loader
//!
//! Builds the engine configuration from defaults, an optional JSON file and
//! environment overrides, in that order.

use crate::config::settings::{EngineConfig, LogFormat};
use crate::error::{LaqueusError, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Configuration loader with support for multiple sources
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Load from the first config file found in the default locations, then the environment
    pub fn new() -> Result<Self> {
        let mut loader = Self {
            config: EngineConfig::default(),
        };

        if let Some(path) = Self::get_config_paths().into_iter().find(|p| p.exists()) {
            loader.load_from_file(&path)?;
        }
        loader.apply_env(|name| std::env::var(name).ok())?;
        loader.config.validate()?;

        Ok(loader)
    }

    /// Load from a specific config file, then the environment
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut loader = Self {
            config: EngineConfig::default(),
        };

        loader.load_from_file(path)?;
        loader.apply_env(|name| std::env::var(name).ok())?;
        loader.config.validate()?;

        Ok(loader)
    }

    /// Get list of config paths to check
    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        // 1. Environment variable
        if let Ok(custom_path) = std::env::var("LAQUEUS_CONFIG_PATH") {
            paths.push(PathBuf::from(custom_path));
        }

        // 2. Current directory
        paths.push(PathBuf::from("laqueus.json"));

        // 3. User config directory
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("laqueus").join("config.json"));
        }

        paths
    }

    /// Load configuration from a specific file
    fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LaqueusError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        self.config = serde_json::from_str(&content).map_err(|e| {
            LaqueusError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(())
    }

    /// Apply environment overrides; `lookup` resolves a variable name
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let config = &mut self.config;

        if let Some(url) = lookup("SUPABASE_URL") {
            // The store URL doubles as the referer, as the hosted proxy did
            if config.upstream.referer.is_none() {
                config.upstream.referer = Some(url.clone());
            }
            config.registry.url = Some(url);
        }
        if let Some(key) = lookup("SUPABASE_ANON_KEY") {
            config.registry.api_key = Some(key);
        }
        if let Some(host) = lookup("LAQUEUS_HOST") {
            config.server.host = host;
        }
        if let Some(port) = lookup("LAQUEUS_PORT") {
            config.server.port = parse_var("LAQUEUS_PORT", &port)?;
        }
        if let Some(url) = lookup("UPSTREAM_BASE_URL") {
            config.upstream.base_url = url;
        }
        if let Some(secs) = lookup("UPSTREAM_TIMEOUT_SECS") {
            config.upstream.timeout_secs = parse_var("UPSTREAM_TIMEOUT_SECS", &secs)?;
        }
        if let Some(referer) = lookup("UPSTREAM_REFERER") {
            config.upstream.referer = Some(referer);
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            config.log.level = level;
        }
        if let Some(format) = lookup("LOG_FORMAT") {
            config.log.format = LogFormat::from_str(&format)?;
        }

        Ok(())
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Take ownership of the configuration
    pub fn into_config(self) -> EngineConfig {
        self.config
    }
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| LaqueusError::Config(format!("Invalid {} '{}': {}", name, value, e)))
}
