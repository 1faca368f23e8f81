//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the dev server.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the dev server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct DevConfig {
    /// File polling settings.
    pub watch: WatchConfig,

    /// Listen address discovery settings.
    pub bind: BindConfig,

    /// Entry page, asset and data serving settings.
    pub serve: ServeConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// File polling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Interval between two metadata reads of a watched file, in milliseconds.
    pub poll_interval_ms: u64,

    /// Files watched on every reload cycle, in addition to the mapped files.
    pub always: Vec<PathBuf>,
}

impl WatchConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            always: vec![PathBuf::from(".env"), PathBuf::from("Procfile")],
        }
    }
}

/// Listen address discovery configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BindConfig {
    /// Address used when no environment probe applies (e.g., ":3080").
    pub fallback_address: String,

    /// Public host name paired with the fallback address.
    pub fallback_host: String,

    /// How long the fallback probe waits before answering, in milliseconds.
    pub fallback_delay_ms: u64,

    /// Container discovery endpoint; the container hostname is appended.
    pub discovery_endpoint: String,
}

impl BindConfig {
    pub fn fallback_delay(&self) -> Duration {
        Duration::from_millis(self.fallback_delay_ms)
    }
}

impl Default for BindConfig {
    fn default() -> Self {
        Self {
            fallback_address: ":3080".to_string(),
            fallback_host: "localhost:3080".to_string(),
            fallback_delay_ms: 2000,
            discovery_endpoint: "http://dnsdock.docker/services/".to_string(),
        }
    }
}

/// Entry page and static content configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Directory served under `/asset/{app}/{hash}/`.
    pub assets_dir: PathBuf,

    /// Directory backing the `/data/` JSON endpoint.
    pub data_dir: PathBuf,

    /// Application name, used as the `repo` bootstrap field and asset path segment.
    pub app_name: String,

    /// Name of the global variable holding the injected bootstrap metadata.
    pub bootstrap_global: String,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("assets"),
            data_dir: PathBuf::from("data"),
            app_name: "fhdevd".to_string(),
            bootstrap_global: "Featherhead".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
