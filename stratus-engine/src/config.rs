//! Engine configuration
//!
//! Supports loading from TOML files with per-field defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use stratus_core::error::{Result, StratusError};
use stratus_core::{DEFAULT_CHUNK_SIZE, DEFAULT_REPLICAS, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};

/// What to do when a chunk lands on fewer providers than configured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicationPolicy {
    /// Fail the upload with `UnderReplicated`
    #[default]
    Strict,
    /// Log a warning and keep the bindings that landed
    BestEffort,
}

/// Filesystem engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsConfig {
    /// Maximum chunk size in bytes
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Number of distinct providers each chunk is written to
    #[serde(default = "default_replicas")]
    pub replicas: usize,

    /// Under-replication handling
    #[serde(default)]
    pub policy: ReplicationPolicy,

    /// Per-call provider timeout in seconds
    #[serde(default = "default_provider_timeout")]
    pub provider_timeout_secs: u64,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            replicas: DEFAULT_REPLICAS,
            policy: ReplicationPolicy::default(),
            provider_timeout_secs: default_provider_timeout(),
        }
    }
}

impl FsConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: FsConfig = toml::from_str(&content)
            .map_err(|e| StratusError::Configuration(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size < MIN_CHUNK_SIZE || self.chunk_size > MAX_CHUNK_SIZE {
            return Err(StratusError::Configuration(format!(
                "chunk_size must be between {MIN_CHUNK_SIZE} and {MAX_CHUNK_SIZE}, got {}",
                self.chunk_size
            )));
        }
        if self.replicas == 0 {
            return Err(StratusError::Configuration(
                "replicas must be at least 1".to_string(),
            ));
        }
        if self.provider_timeout_secs == 0 {
            return Err(StratusError::Configuration(
                "provider_timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Per-call provider timeout
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_secs(self.provider_timeout_secs)
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_replicas(mut self, replicas: usize) -> Self {
        self.replicas = replicas;
        self
    }

    pub fn with_policy(mut self, policy: ReplicationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_provider_timeout(mut self, secs: u64) -> Self {
        self.provider_timeout_secs = secs;
        self
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_replicas() -> usize {
    DEFAULT_REPLICAS
}

fn default_provider_timeout() -> u64 {
    30
}
