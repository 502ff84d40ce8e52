//! Replicated chunk writer
//!
//! Write-through session for one file upload. Bytes accumulate in a
//! buffer; every time a full chunk is available it is flushed to R
//! distinct providers before `write` returns. Whole-file digests are fed
//! incrementally, so closing never has to re-read anything.

use crate::config::{FsConfig, ReplicationPolicy};
use crate::selector::ReplicaSelector;
use bytes::{Bytes, BytesMut};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use stratus_core::chunk::{ChunkId, ChunkKey, ChunkRecord, FileManifest, ReplicaBinding};
use stratus_core::error::{Result, StratusError};
use stratus_core::hash::{ContentHash, StreamingDigest};
use stratus_provider::ProviderClient;
use tracing::{debug, warn};

/// Streaming writer replicating each chunk across providers
pub struct ChunkWriter {
    namespace: String,
    chunk_size: usize,
    policy: ReplicationPolicy,
    timeout: Duration,
    selector: ReplicaSelector,

    buffer: BytesMut,
    digest: StreamingDigest,
    chunks: Vec<ChunkRecord>,
    closed: bool,
}

impl ChunkWriter {
    pub fn new(namespace: impl Into<String>, selector: ReplicaSelector, config: &FsConfig) -> Self {
        Self {
            namespace: namespace.into(),
            chunk_size: config.chunk_size,
            policy: config.policy,
            timeout: config.provider_timeout(),
            selector,
            buffer: BytesMut::new(),
            digest: StreamingDigest::new(),
            chunks: Vec::new(),
            closed: false,
        }
    }

    /// Bytes accepted so far
    pub fn bytes_written(&self) -> u64 {
        self.digest.size()
    }

    /// Accept bytes, flushing every completed chunk before returning
    pub async fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.closed {
            return Err(StratusError::StreamClosed);
        }

        self.digest.update(data);
        self.buffer.extend_from_slice(data);

        while self.buffer.len() >= self.chunk_size {
            let chunk = self.buffer.split_to(self.chunk_size).freeze();
            self.store_chunk(chunk).await?;
        }
        Ok(())
    }

    /// Flush the trailing partial chunk and finalize the manifest
    ///
    /// An empty session (nothing ever written) produces an empty chunk
    /// sequence. A second close fails with `StreamClosed`.
    pub async fn close(&mut self) -> Result<FileManifest> {
        if self.closed {
            return Err(StratusError::StreamClosed);
        }

        if !self.buffer.is_empty() {
            let chunk = self.buffer.split().freeze();
            self.store_chunk(chunk).await?;
        }
        self.closed = true;

        let digest = std::mem::take(&mut self.digest).finalize();
        Ok(FileManifest::new(digest, std::mem::take(&mut self.chunks)))
    }

    /// Replicate one chunk to R distinct providers
    ///
    /// The first R candidates are tried concurrently; failed slots are
    /// refilled from the failover tail until R bindings exist or the
    /// pool is exhausted. The shortfall outcome is decided by the
    /// replication policy; zero bindings is an error under either.
    async fn store_chunk(&mut self, data: Bytes) -> Result<()> {
        let id = ChunkId::generate();
        let hash = ContentHash::compute(&data);
        let key = ChunkKey::new(self.namespace.clone(), id);
        let required = self.selector.replicas();

        let mut remaining = self.selector.candidates().into_iter();
        let mut bindings: Vec<ReplicaBinding> = Vec::with_capacity(required);

        loop {
            let wave: Vec<Arc<dyn ProviderClient>> = remaining
                .by_ref()
                .take(required - bindings.len())
                .collect();
            if wave.is_empty() {
                break;
            }

            let uploads = wave.into_iter().map(|provider| {
                let key = key.clone();
                let data = data.clone();
                let timeout = self.timeout;
                async move {
                    let outcome = match tokio::time::timeout(timeout, provider.upload(&key, data))
                        .await
                    {
                        Ok(result) => result,
                        Err(_) => Err(StratusError::Timeout {
                            provider: provider.name().to_string(),
                            seconds: timeout.as_secs(),
                        }),
                    };
                    (provider, outcome)
                }
            });

            for (provider, outcome) in join_all(uploads).await {
                match outcome {
                    Ok(attrs) => bindings.push(ReplicaBinding::new(provider.id(), attrs)),
                    Err(error) => {
                        warn!(chunk = %id, provider = provider.name(), %error, "Replica upload failed")
                    }
                }
            }

            if bindings.len() >= required {
                break;
            }
        }

        if bindings.is_empty() {
            return Err(StratusError::UnderReplicated {
                achieved: 0,
                required,
            });
        }
        if bindings.len() < required {
            match self.policy {
                ReplicationPolicy::Strict => {
                    return Err(StratusError::UnderReplicated {
                        achieved: bindings.len(),
                        required,
                    });
                }
                ReplicationPolicy::BestEffort => {
                    warn!(
                        chunk = %id,
                        achieved = bindings.len(),
                        required,
                        "Chunk under-replicated, keeping partial bindings"
                    );
                }
            }
        }

        debug!(chunk = %id, size = data.len(), replicas = bindings.len(), "Chunk stored");
        self.chunks
            .push(ChunkRecord::new(id, data.len() as u32, hash, bindings));
        Ok(())
    }
}
