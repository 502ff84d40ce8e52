//! Chunk types and metadata
//!
//! Chunks are the fundamental unit of storage in Stratus. Every upload
//! mints a fresh chunk identity, even for identical bytes, so deleting
//! one file can never touch another file's remote objects. Integrity is
//! carried separately: each chunk record keeps the Blake3 hash of its
//! bytes, verified on every read.

use crate::error::{Result, StratusError};
use crate::hash::{ContentHash, FileDigest};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique chunk identifier
///
/// 32 random bytes minted at upload time, displayed base58-encoded,
/// e.g. `2DrjgbN3Y5AHN4inRXnff2MrzqXJC1JYopNtXmMTBCry`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkId([u8; 32]);

impl ChunkId {
    /// Mint a fresh chunk identity
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Create a ChunkId from raw bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to base58 string (for remote names and display)
    pub fn to_base58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    /// Parse from base58 string
    pub fn from_base58(s: &str) -> Result<Self> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| StratusError::InvalidChunkId(e.to_string()))?;

        if bytes.len() != 32 {
            return Err(StratusError::InvalidChunkId(format!(
                "Invalid length: expected 32, got {}",
                bytes.len()
            )));
        }

        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChunkId({})", &self.to_base58()[..8])
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base58())
    }
}

/// Identity of an authorized provider account in the replica pool
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderId(Uuid);

impl ProviderId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ProviderId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProviderId({})", self.0)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Remote object name for a chunk, collision-free across users
///
/// Providers store chunk bytes under `{namespace}/{chunk_id}`; the
/// namespace partitions users, the freshly minted id partitions chunks
/// within a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChunkKey {
    pub namespace: String,
    pub id: ChunkId,
}

impl ChunkKey {
    pub fn new(namespace: impl Into<String>, id: ChunkId) -> Self {
        Self {
            namespace: namespace.into(),
            id,
        }
    }

    /// The name the chunk is stored under at a provider
    pub fn remote_name(&self) -> String {
        format!("{}/{}", self.namespace, self.id.to_base58())
    }
}

impl fmt::Display for ChunkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.remote_name())
    }
}

/// One stored copy of a chunk at one specific provider
///
/// Created at upload time, deleted with the chunk, never mutated. `attrs`
/// holds provider-assigned location attributes (e.g. a backend file id)
/// as an opaque JSON value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicaBinding {
    /// Which provider holds this copy
    pub provider: ProviderId,

    /// Provider-specific location attributes
    #[serde(default)]
    pub attrs: serde_json::Value,
}

impl ReplicaBinding {
    pub fn new(provider: ProviderId, attrs: serde_json::Value) -> Self {
        Self { provider, attrs }
    }
}

/// An element of a file's ordered chunk sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// Unique identifier, minted when the chunk was written
    pub id: ChunkId,

    /// Size of the chunk data in bytes
    pub size: u32,

    /// Blake3 hash of the chunk bytes, checked on read
    pub hash: ContentHash,

    /// Where the replicas of this chunk live (1..R bindings)
    pub replicas: Vec<ReplicaBinding>,
}

impl ChunkRecord {
    pub fn new(id: ChunkId, size: u32, hash: ContentHash, replicas: Vec<ReplicaBinding>) -> Self {
        Self {
            id,
            size,
            hash,
            replicas,
        }
    }

    /// True if `data` is exactly the bytes this record was written with
    pub fn verify(&self, data: &[u8]) -> bool {
        data.len() == self.size as usize && self.hash.verify(data)
    }

    /// Providers holding a replica of this chunk
    pub fn providers(&self) -> impl Iterator<Item = ProviderId> + '_ {
        self.replicas.iter().map(|r| r.provider)
    }
}

/// Result of a completed write session
///
/// The ordered chunk sequence reconstructs the byte stream; the digests
/// cover the whole file and are finalized at writer close. Committed to
/// the metadata store in a single transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileManifest {
    /// Whole-file size and digests
    pub digest: FileDigest,

    /// Ordered chunk sequence (serial order is byte order)
    pub chunks: Vec<ChunkRecord>,
}

impl FileManifest {
    pub fn new(digest: FileDigest, chunks: Vec<ChunkRecord>) -> Self {
        Self { digest, chunks }
    }

    pub fn size(&self) -> u64 {
        self.digest.size
    }
}
