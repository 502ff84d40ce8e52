//! Content hashing for Stratus
//!
//! Provides:
//! - Blake3 content hashing for chunk and whole-file integrity
//! - `StreamingDigest`, the incremental whole-file digest state kept by
//!   the chunk writer (legacy md5 plus Blake3, fed by every byte written)

use crate::error::{Result, StratusError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Blake3 hash wrapper for integrity checks
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(blake3::Hash);

impl ContentHash {
    /// Compute Blake3 hash of data
    pub fn compute(data: &[u8]) -> Self {
        Self(blake3::hash(data))
    }

    /// Create from raw hash bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(blake3::Hash::from_bytes(bytes))
    }

    /// Get the raw hash bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_bytes()
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        self.0.to_hex().to_string()
    }

    /// Parse from hex string
    pub fn from_hex(hex: &str) -> Result<Self> {
        let hash = blake3::Hash::from_hex(hex)
            .map_err(|e| StratusError::InvalidChunkId(e.to_string()))?;
        Ok(Self(hash))
    }

    /// Verify that data matches this hash
    pub fn verify(&self, data: &[u8]) -> bool {
        let computed = Self::compute(data);
        self == &computed
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", &self.to_hex()[..16])
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for ContentHash {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentHash {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let hex: String = Deserialize::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

/// Finalized whole-file digests
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDigest {
    /// Total bytes written
    pub size: u64,

    /// Legacy md5 digest (hex)
    pub md5: String,

    /// Blake3 digest of the whole file
    pub content_hash: ContentHash,
}

/// Incremental digest state for a write session
///
/// Both digests are updated over every byte written, in original order,
/// regardless of how the stream is later chunked.
pub struct StreamingDigest {
    md5: md5::Context,
    blake3: blake3::Hasher,
    size: u64,
}

impl StreamingDigest {
    pub fn new() -> Self {
        Self {
            md5: md5::Context::new(),
            blake3: blake3::Hasher::new(),
            size: 0,
        }
    }

    /// Feed bytes into both digests
    pub fn update(&mut self, data: &[u8]) {
        self.md5.consume(data);
        self.blake3.update(data);
        self.size += data.len() as u64;
    }

    /// Bytes consumed so far
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Finalize both digests
    pub fn finalize(self) -> FileDigest {
        FileDigest {
            size: self.size,
            md5: format!("{:x}", self.md5.compute()),
            content_hash: ContentHash(self.blake3.finalize()),
        }
    }
}

impl Default for StreamingDigest {
    fn default() -> Self {
        Self::new()
    }
}
