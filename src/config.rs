//! Configuration management for admission control.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::{AdmissionError, Result};
use crate::identity::DEFAULT_UNKNOWN_CLIENT;
use crate::ratelimit::LimitRules;

/// Main configuration for an admission gate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Limiter storage configuration
    #[serde(default)]
    pub limiter: LimiterSettings,

    /// Client identification configuration
    #[serde(default)]
    pub identity: IdentitySettings,

    /// Per-route rate limits
    #[serde(default)]
    pub rules: LimitRules,
}

/// Limiter storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimiterSettings {
    /// Number of independently locked shards
    #[serde(default = "default_shards")]
    pub shards: usize,

    /// Upper bound on tracked keys; unbounded when absent
    #[serde(default)]
    pub max_keys: Option<usize>,

    /// Interval between background sweeps in milliseconds
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_ms: u64,
}

impl Default for LimiterSettings {
    fn default() -> Self {
        Self {
            shards: default_shards(),
            max_keys: None,
            sweep_interval_ms: default_sweep_interval(),
        }
    }
}

fn default_shards() -> usize {
    16
}

fn default_sweep_interval() -> u64 {
    60_000
}

/// Client identification configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySettings {
    /// Identity reported when no client header is present
    #[serde(default = "default_unknown_client")]
    pub unknown_client: String,
}

impl Default for IdentitySettings {
    fn default() -> Self {
        Self {
            unknown_client: default_unknown_client(),
        }
    }
}

fn default_unknown_client() -> String {
    DEFAULT_UNKNOWN_CLIENT.to_string()
}

impl AdmissionConfig {
    /// Load configuration from a file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading admission configuration");

        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: AdmissionConfig =
            serde_yaml::from_str(yaml).map_err(|e| AdmissionError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check structural settings and every configured rule.
    pub fn validate(&self) -> Result<()> {
        if self.limiter.shards == 0 {
            return Err(AdmissionError::Config(
                "limiter.shards must be greater than zero".to_string(),
            ));
        }
        if self.limiter.max_keys == Some(0) {
            return Err(AdmissionError::Config(
                "limiter.max_keys must be greater than zero".to_string(),
            ));
        }
        if self.limiter.sweep_interval_ms == 0 {
            return Err(AdmissionError::Config(
                "limiter.sweep_interval_ms must be greater than zero".to_string(),
            ));
        }
        self.rules.validate()
    }
}
