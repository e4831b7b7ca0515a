//! Configuration Module
//!
//! Handles engine configuration loading and validation.

pub mod loader;
pub mod settings;

pub use loader::ConfigLoader;
pub use settings::{
    EngineConfig, LogConfig, LogFormat, RegistryConfig, SeedKey, SeedModel, ServerConfig,
    UpstreamConfig,
};
