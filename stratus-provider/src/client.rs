//! Provider client capability contract
//!
//! A provider is one authorized remote storage backend usable as a
//! replica target. The engine depends only on this contract; request
//! shaping (headers, path templating, token refresh) stays inside each
//! adapter and never leaks into the engine.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use stratus_core::chunk::{ChunkKey, ProviderId};
use stratus_core::error::Result;

/// Backend variant tag
///
/// A closed set resolved once at startup via the [`crate::ProviderRegistry`],
/// never searched per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Dropbox,
    OneDrive,
    Box,
    GoogleDrive,
    /// Self-hosted storage array
    Array,
    /// In-memory reference backend (tests and development)
    Memory,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dropbox => write!(f, "dropbox"),
            Self::OneDrive => write!(f, "onedrive"),
            Self::Box => write!(f, "box"),
            Self::GoogleDrive => write!(f, "googledrive"),
            Self::Array => write!(f, "array"),
            Self::Memory => write!(f, "memory"),
        }
    }
}

/// Capability contract implemented per backend
///
/// Each call is one network round trip against the remote backend; the
/// client retains no chunk bytes. Errors surface as
/// [`stratus_core::StratusError::Transport`] (recoverable via failover)
/// or [`stratus_core::StratusError::ChunkMissing`].
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Identity of the authorized account backing this client
    fn id(&self) -> ProviderId;

    /// Backend variant
    fn kind(&self) -> ProviderKind;

    /// Human-readable name for logs
    fn name(&self) -> &str;

    /// Store chunk bytes under `key`
    ///
    /// Returns provider-assigned location attributes to persist in the
    /// chunk's replica binding (may be `Value::Null` for path-addressed
    /// backends).
    async fn upload(&self, key: &ChunkKey, data: Bytes) -> Result<serde_json::Value>;

    /// Retrieve chunk bytes previously stored under `key`
    async fn download(&self, key: &ChunkKey, attrs: &serde_json::Value) -> Result<Bytes>;

    /// Delete the chunk stored under `key`
    ///
    /// Deleting a missing object returns `ChunkMissing`; callers treat
    /// that as success (idempotent delete).
    async fn delete(&self, key: &ChunkKey, attrs: &serde_json::Value) -> Result<()>;
}
