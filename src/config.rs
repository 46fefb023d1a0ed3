//! # Store Configuration
//!
//! [`StoreConfig`] describes where the blog server lives and how the store
//! behaves. Every field has a default, so a config file only needs the keys it
//! changes:
//!
//! ```toml
//! base_url = "http://blog.internal:8080"
//! reconnect_delay_ms = 5000
//! environment = "interactive"
//! ```

use crate::store::Environment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Origin of the blog server.
    pub base_url: String,
    pub posts_path: String,
    pub reload_path: String,
    /// Event payload that triggers a refetch.
    pub reload_token: String,
    /// Reconnect the reload stream after it drops.
    pub reconnect: bool,
    /// Delay before reconnecting, unless the server sends `retry:`.
    pub reconnect_delay_ms: u64,
    /// Per-request timeout for `/api/posts`. Unset means none.
    pub request_timeout_ms: Option<u64>,
    /// Capacity of the store's request queue.
    pub channel_capacity: usize,
    pub environment: Environment,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            posts_path: "/api/posts".to_string(),
            reload_path: "/api/reload".to_string(),
            reload_token: crate::reload::RELOAD_TOKEN.to_string(),
            reconnect: true,
            reconnect_delay_ms: 3000,
            request_timeout_ms: None,
            channel_capacity: 32,
            environment: Environment::Auto,
        }
    }
}

impl StoreConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    pub fn posts_url(&self) -> Result<String, ConfigError> {
        self.endpoint(&self.posts_path)
    }

    pub fn reload_url(&self) -> Result<String, ConfigError> {
        self.endpoint(&self.reload_path)
    }

    /// `None` when reconnection is disabled.
    pub fn reconnect_delay(&self) -> Option<Duration> {
        self.reconnect
            .then(|| Duration::from_millis(self.reconnect_delay_ms))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    fn endpoint(&self, path: &str) -> Result<String, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidUrl {
            url: self.base_url.clone(),
            reason,
        };
        let base = reqwest::Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", base.scheme())));
        }
        let url = base.join(path).map_err(|e| invalid(e.to_string()))?;
        Ok(url.to_string())
    }
}
