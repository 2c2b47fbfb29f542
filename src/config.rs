//! Gateway configuration.
//!
//! Loaded from an optional JSON file; every section and field has a default
//! so a partial file (or none at all) is fine. Secrets stay out of the file
//! when possible — the engine API key falls back to `OPENAI_API_KEY`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ParrotError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub cache: CacheConfig,
    pub engine: EngineConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub bind: String,
    /// Listen port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// Response cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Entry lifetime in seconds, applied at write time.
    pub ttl_secs: u64,
    /// Capacity of the in-memory store before LRU eviction.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 600,
            max_entries: 1024,
        }
    }
}

/// Generation provider configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Base URL of an OpenAI-compatible API.
    pub base_url: String,
    /// API key. Prefer leaving this unset and using `OPENAI_API_KEY`.
    pub api_key: Option<String>,
    /// Model identifier passed through to the provider.
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4.1-nano".to_string(),
            max_tokens: 500,
            temperature: 0.7,
        }
    }
}

impl std::fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl Config {
    /// Load from a JSON file, or return defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load_from_path(p),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            ParrotError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&data)
            .map_err(|e| ParrotError::Config(format!("cannot parse {}: {e}", path.display())))
    }
}
