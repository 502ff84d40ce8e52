//! Metadata store contract
//!
//! Every filesystem operation resolves through this trait. Implementations
//! must keep each operation atomic: either the whole mutation lands (entry
//! plus any implicitly created parent directories) or nothing does.

use crate::models::{DirRecord, DirectoryListing, Entry, FileRecord};
use async_trait::async_trait;
use stratus_core::chunk::FileManifest;
use stratus_core::error::Result;
use stratus_core::path::VirtualPath;

/// Path-tree and chunk-sequence persistence
///
/// All operations are scoped to a `namespace` (one user's tree). The root
/// directory `/` always exists and cannot be deleted or moved.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Look up the entry at `path`, if any
    async fn resolve(&self, namespace: &str, path: &VirtualPath) -> Result<Option<Entry>>;

    /// Commit a completed write session as the file at `path`
    ///
    /// Creates missing parent directories. An existing file at `path` is
    /// replaced (last writer wins, original creation time kept). Fails with
    /// `FileConflict` if `path` names a directory or a parent component is
    /// a file.
    async fn create_file(
        &self,
        namespace: &str,
        path: &VirtualPath,
        manifest: FileManifest,
    ) -> Result<FileRecord>;

    /// Create a directory, including missing intermediates
    ///
    /// Idempotent: an existing directory at `path` is returned as-is.
    /// Fails with `FileConflict` if `path` or any component is a file.
    async fn create_dir(&self, namespace: &str, path: &VirtualPath) -> Result<DirRecord>;

    /// Remove the entry at `path` and return it
    ///
    /// The returned record lets the caller release the chunks a deleted
    /// file owned. Directories must be empty; the root is not deletable.
    async fn delete_entry(&self, namespace: &str, path: &VirtualPath) -> Result<Entry>;

    /// Move the entry at `src` to `dst`
    ///
    /// If `dst` is an existing directory the source keeps its name beneath
    /// it. Missing parents of the destination are created. Chunk records
    /// are untouched: a move is pure metadata.
    async fn move_entry(
        &self,
        namespace: &str,
        src: &VirtualPath,
        dst: &VirtualPath,
    ) -> Result<Entry>;

    /// Copy the entry at `src` to `dst`
    ///
    /// Destination resolution matches `move_entry`. File copies share the
    /// source's chunk records and replica bindings; no chunk data moves.
    /// Directory copies are recursive.
    async fn copy_entry(
        &self,
        namespace: &str,
        src: &VirtualPath,
        dst: &VirtualPath,
    ) -> Result<Entry>;

    /// Immediate children of the directory at `path`
    async fn list_children(&self, namespace: &str, path: &VirtualPath)
        -> Result<DirectoryListing>;
}
