//! Stratus Engine
//!
//! The replicated chunk engine and filesystem facade:
//! - `FsConfig` / `ReplicationPolicy` engine configuration
//! - `ReplicaSelector` choosing upload targets from the provider pool
//! - `ChunkWriter` / `ChunkReader` streaming write and read sessions
//! - `MulticloudFs` path-addressed facade over all of it

pub mod config;
pub mod fs;
pub mod reader;
pub mod selector;
pub mod writer;

pub use config::{FsConfig, ReplicationPolicy};
pub use fs::MulticloudFs;
pub use reader::ChunkReader;
pub use selector::ReplicaSelector;
pub use writer::ChunkWriter;
