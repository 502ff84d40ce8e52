//! Multicloud filesystem facade
//!
//! Per-namespace handle tying the metadata store, the provider pool and
//! the engine configuration together. Uploads commit their manifest in a
//! single metadata call, so a concurrent reader can never observe a
//! partially written chunk sequence; cancellation before the commit
//! leaves no file visible.

use crate::config::FsConfig;
use crate::reader::ChunkReader;
use crate::selector::ReplicaSelector;
use crate::writer::ChunkWriter;
use bytes::Bytes;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use stratus_core::chunk::{ChunkKey, ChunkRecord, ProviderId};
use stratus_core::error::{Result, StratusError};
use stratus_core::path::VirtualPath;
use stratus_core::Chunker;
use stratus_metadata::{DirRecord, DirectoryListing, Entry, FileRecord, MetadataStore};
use stratus_provider::ProviderClient;
use tokio::io::AsyncRead;
use tracing::{debug, info, warn};

/// Filesystem over replicated multi-cloud chunk storage
pub struct MulticloudFs {
    namespace: String,
    metadata: Arc<dyn MetadataStore>,
    providers: Vec<Arc<dyn ProviderClient>>,
    config: FsConfig,
}

impl MulticloudFs {
    pub fn new(
        namespace: impl Into<String>,
        metadata: Arc<dyn MetadataStore>,
        providers: Vec<Arc<dyn ProviderClient>>,
        config: FsConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            namespace: namespace.into(),
            metadata,
            providers,
            config,
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn config(&self) -> &FsConfig {
        &self.config
    }

    /// Upload a byte stream as the file at `path`
    ///
    /// Replaces an existing file; the replaced file's chunks are released
    /// after the new manifest is committed.
    pub async fn upload<R: AsyncRead + Unpin>(
        &self,
        path: &VirtualPath,
        source: R,
    ) -> Result<FileRecord> {
        let previous = match self.metadata.resolve(&self.namespace, path).await? {
            Some(Entry::Directory(_)) => {
                return Err(StratusError::FileConflict(path.as_str().to_string()))
            }
            Some(Entry::File(file)) => Some(file),
            None => None,
        };

        // Pool check happens before any provider I/O
        let selector = ReplicaSelector::new(self.providers.clone(), self.config.replicas)?;
        let mut writer = ChunkWriter::new(self.namespace.clone(), selector, &self.config);

        let mut chunker = Chunker::new(source, self.config.chunk_size);
        while let Some(chunk) = chunker.next_chunk().await? {
            writer.write(&chunk).await?;
        }
        let manifest = writer.close().await?;
        let written = manifest.chunks.clone();

        let record = match self.metadata.create_file(&self.namespace, path, manifest).await {
            Ok(record) => record,
            Err(error) => {
                // Commit refused (e.g. a parent is a file); the chunks it
                // would have owned must not leak at the providers.
                self.release_chunks(&written).await;
                return Err(error);
            }
        };

        if let Some(previous) = previous {
            self.release_chunks(&previous.chunks).await;
        }

        info!(
            namespace = %self.namespace,
            path = %path,
            size = record.size,
            chunks = record.chunk_count(),
            "File uploaded"
        );
        Ok(record)
    }

    /// Upload an in-memory payload
    pub async fn upload_bytes(&self, path: &VirtualPath, data: &[u8]) -> Result<FileRecord> {
        self.upload(path, data).await
    }

    /// Open a read session for the file at `path`
    pub async fn download(&self, path: &VirtualPath) -> Result<ChunkReader> {
        let file = self.file_at(path).await?;
        Ok(ChunkReader::new(
            self.namespace.clone(),
            file.chunks,
            self.provider_map(),
            self.config.provider_timeout(),
        ))
    }

    /// Read the whole file at `path` into memory
    pub async fn read_file(&self, path: &VirtualPath) -> Result<Bytes> {
        self.download(path).await?.read_to_end().await
    }

    /// Delete the entry at `path`
    ///
    /// Files release every replica of every chunk best-effort after the
    /// metadata removal; a replica failure is logged, never surfaced.
    /// Directories must be empty.
    pub async fn delete(&self, path: &VirtualPath) -> Result<()> {
        let entry = self.metadata.delete_entry(&self.namespace, path).await?;
        if let Entry::File(file) = entry {
            self.release_chunks(&file.chunks).await;
            info!(namespace = %self.namespace, path = %path, "File deleted");
        } else {
            info!(namespace = %self.namespace, path = %path, "Directory deleted");
        }
        Ok(())
    }

    /// Create a directory (and missing intermediates)
    pub async fn mkdir(&self, path: &VirtualPath) -> Result<DirRecord> {
        self.metadata.create_dir(&self.namespace, path).await
    }

    /// Remove an empty directory
    pub async fn rmdir(&self, path: &VirtualPath) -> Result<()> {
        match self.metadata.resolve(&self.namespace, path).await? {
            Some(Entry::Directory(_)) => {
                self.metadata.delete_entry(&self.namespace, path).await?;
                Ok(())
            }
            _ => Err(StratusError::DirectoryNotFound(path.as_str().to_string())),
        }
    }

    /// Move a file or directory; chunk data never moves
    pub async fn mv(&self, src: &VirtualPath, dst: &VirtualPath) -> Result<Entry> {
        self.metadata.move_entry(&self.namespace, src, dst).await
    }

    /// Copy a file or directory
    ///
    /// Pure metadata: the copy shares the source's chunk records and no
    /// provider call is made.
    pub async fn copy(&self, src: &VirtualPath, dst: &VirtualPath) -> Result<Entry> {
        self.metadata.copy_entry(&self.namespace, src, dst).await
    }

    /// List the immediate children of a directory
    pub async fn listdir(&self, path: &VirtualPath) -> Result<DirectoryListing> {
        self.metadata.list_children(&self.namespace, path).await
    }

    /// Metadata of the file at `path`
    pub async fn info(&self, path: &VirtualPath) -> Result<FileRecord> {
        self.file_at(path).await
    }

    pub async fn exists(&self, path: &VirtualPath) -> Result<bool> {
        Ok(self.metadata.resolve(&self.namespace, path).await?.is_some())
    }

    pub async fn is_file(&self, path: &VirtualPath) -> Result<bool> {
        Ok(matches!(
            self.metadata.resolve(&self.namespace, path).await?,
            Some(Entry::File(_))
        ))
    }

    pub async fn is_dir(&self, path: &VirtualPath) -> Result<bool> {
        Ok(matches!(
            self.metadata.resolve(&self.namespace, path).await?,
            Some(Entry::Directory(_))
        ))
    }

    async fn file_at(&self, path: &VirtualPath) -> Result<FileRecord> {
        match self.metadata.resolve(&self.namespace, path).await? {
            Some(Entry::File(file)) => Ok(file),
            _ => Err(StratusError::FileNotFound(path.as_str().to_string())),
        }
    }

    fn provider_map(&self) -> HashMap<ProviderId, Arc<dyn ProviderClient>> {
        self.providers.iter().map(|p| (p.id(), p.clone())).collect()
    }

    /// Best-effort concurrent release of every replica of every chunk
    ///
    /// A missing remote object counts as success (the delete is
    /// idempotent); any other failure is logged and skipped.
    async fn release_chunks(&self, chunks: &[ChunkRecord]) {
        let providers = self.provider_map();
        let timeout = self.config.provider_timeout();

        let mut deletions = Vec::new();
        for chunk in chunks {
            let key = ChunkKey::new(self.namespace.clone(), chunk.id);
            for binding in &chunk.replicas {
                let key = key.clone();
                let provider = providers.get(&binding.provider).cloned();
                let attrs = binding.attrs.clone();
                let chunk_id = chunk.id;
                deletions.push(async move {
                    let provider = match provider {
                        Some(provider) => provider,
                        None => {
                            warn!(chunk = %chunk_id, "No client for bound provider, replica leaked");
                            return;
                        }
                    };
                    match tokio::time::timeout(timeout, provider.delete(&key, &attrs)).await {
                        Ok(Ok(())) => {
                            debug!(chunk = %chunk_id, provider = provider.name(), "Replica deleted")
                        }
                        Ok(Err(StratusError::ChunkMissing { .. })) => {
                            debug!(chunk = %chunk_id, provider = provider.name(), "Replica already gone")
                        }
                        Ok(Err(error)) => {
                            warn!(chunk = %chunk_id, provider = provider.name(), %error, "Replica delete failed")
                        }
                        Err(_) => {
                            warn!(chunk = %chunk_id, provider = provider.name(), "Replica delete timed out")
                        }
                    }
                });
            }
        }

        join_all(deletions).await;
    }
}
