//! Stratus Core Library
//!
//! Core abstractions for the Stratus multi-cloud replicated chunk store.
//! This crate provides:
//! - Chunk identifiers, integrity hashes and replica bindings
//! - Whole-file digests (legacy md5 + Blake3) computed incrementally
//! - The chunker that splits byte streams into bounded-size chunks
//! - The virtual path type and common error handling

pub mod chunk;
pub mod chunker;
pub mod error;
pub mod hash;
pub mod path;

pub use chunk::{ChunkId, ChunkKey, ChunkRecord, FileManifest, ProviderId, ReplicaBinding};
pub use chunker::Chunker;
pub use error::{Result, StratusError};
pub use hash::{ContentHash, FileDigest, StreamingDigest};
pub use path::VirtualPath;

/// Chunk size constants
pub const MIN_CHUNK_SIZE: usize = 1;
pub const DEFAULT_CHUNK_SIZE: usize = 128 * 1024; // 128 KB
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024; // 64 MB

/// Default number of distinct providers each chunk is written to
pub const DEFAULT_REPLICAS: usize = 2;
