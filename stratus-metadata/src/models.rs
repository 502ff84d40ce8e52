//! Metadata models for Stratus
//!
//! Path-addressable entries: files own an ordered chunk sequence plus
//! whole-file digests; directories form a tree rooted at `/`. No two
//! siblings share a name, and a path is either a file or a directory,
//! never both.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stratus_core::chunk::{ChunkRecord, FileManifest};
use stratus_core::hash::ContentHash;
use stratus_core::path::VirtualPath;
use uuid::Uuid;

/// File metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: Uuid,
    pub path: VirtualPath,

    // Whole-file integrity
    pub size: u64,
    pub md5: String,
    pub content_hash: ContentHash,

    /// Ordered chunk sequence (serial order is byte order)
    pub chunks: Vec<ChunkRecord>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FileRecord {
    /// Create a record from a completed write session
    pub fn from_manifest(path: VirtualPath, manifest: FileManifest) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            path,
            size: manifest.digest.size,
            md5: manifest.digest.md5,
            content_hash: manifest.digest.content_hash,
            chunks: manifest.chunks,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn name(&self) -> &str {
        self.path.name().unwrap_or("/")
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

/// Directory metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirRecord {
    pub id: Uuid,
    pub path: VirtualPath,
    pub created_at: DateTime<Utc>,
}

impl DirRecord {
    pub fn new(path: VirtualPath) -> Self {
        Self {
            id: Uuid::new_v4(),
            path,
            created_at: Utc::now(),
        }
    }

    pub fn name(&self) -> &str {
        self.path.name().unwrap_or("/")
    }
}

/// A resolved path entry
#[derive(Debug, Clone)]
pub enum Entry {
    File(FileRecord),
    Directory(DirRecord),
}

impl Entry {
    pub fn path(&self) -> &VirtualPath {
        match self {
            Self::File(f) => &f.path,
            Self::Directory(d) => &d.path,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Self::Directory(_))
    }
}

/// Immediate children of a directory, split by kind
#[derive(Debug, Clone, Default)]
pub struct DirectoryListing {
    pub dirs: Vec<DirRecord>,
    pub files: Vec<FileRecord>,
}

impl DirectoryListing {
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty() && self.files.is_empty()
    }

    /// Child names in sorted order (directories and files interleaved)
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .dirs
            .iter()
            .map(|d| d.name().to_string())
            .chain(self.files.iter().map(|f| f.name().to_string()))
            .collect();
        names.sort();
        names
    }
}
