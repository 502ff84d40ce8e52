//! Replicated chunk reader
//!
//! Read session for one file. Chunks are fetched in serial order, each
//! from whichever replica answers first in a fresh random order, and
//! verified against the chunk's integrity hash before any byte is
//! surfaced. A replica failure is never visible to the caller unless
//! every binding fails.

use bytes::{Bytes, BytesMut};
use rand::seq::SliceRandom;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use stratus_core::chunk::{ChunkKey, ChunkRecord, ProviderId};
use stratus_core::error::{Result, StratusError};
use stratus_provider::ProviderClient;
use tracing::warn;

/// Streaming reader reassembling a file from its chunk sequence
pub struct ChunkReader {
    namespace: String,
    timeout: Duration,
    providers: HashMap<ProviderId, Arc<dyn ProviderClient>>,

    pending: VecDeque<ChunkRecord>,
    buffer: BytesMut,
    closed: bool,
}

impl ChunkReader {
    pub fn new(
        namespace: impl Into<String>,
        chunks: Vec<ChunkRecord>,
        providers: HashMap<ProviderId, Arc<dyn ProviderClient>>,
        timeout: Duration,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            timeout,
            providers,
            pending: chunks.into(),
            buffer: BytesMut::new(),
            closed: false,
        }
    }

    /// Read from the stream
    ///
    /// `None` returns the next whole chunk (or the buffered remainder of
    /// one); `Some(n)` returns exactly `n` bytes, fewer only at end of
    /// stream. End of stream is an empty `Bytes`, not an error.
    pub async fn read(&mut self, count: Option<usize>) -> Result<Bytes> {
        if self.closed {
            return Err(StratusError::StreamClosed);
        }

        match count {
            None => {
                if !self.buffer.is_empty() {
                    return Ok(self.buffer.split().freeze());
                }
                Ok(self.fetch_next().await?.unwrap_or_else(Bytes::new))
            }
            Some(n) => {
                while self.buffer.len() < n {
                    match self.fetch_next().await? {
                        Some(chunk) => self.buffer.extend_from_slice(&chunk),
                        None => break,
                    }
                }
                let take = n.min(self.buffer.len());
                Ok(self.buffer.split_to(take).freeze())
            }
        }
    }

    /// Drain the whole remaining stream
    pub async fn read_to_end(&mut self) -> Result<Bytes> {
        let mut out = BytesMut::new();
        loop {
            let piece = self.read(None).await?;
            if piece.is_empty() {
                return Ok(out.freeze());
            }
            out.extend_from_slice(&piece);
        }
    }

    /// Close the session; subsequent reads fail with `StreamClosed`
    pub fn close(&mut self) {
        self.closed = true;
        self.pending.clear();
        self.buffer.clear();
    }

    /// Fetch the next chunk from any live replica
    ///
    /// Bindings are tried sequentially in fresh random order; one success
    /// is enough. A corrupt download counts as a failed attempt. Only
    /// when every binding fails does the error surface.
    async fn fetch_next(&mut self) -> Result<Option<Bytes>> {
        let record = match self.pending.pop_front() {
            Some(record) => record,
            None => return Ok(None),
        };
        let key = ChunkKey::new(self.namespace.clone(), record.id);

        let mut bindings = record.replicas.clone();
        bindings.shuffle(&mut rand::thread_rng());

        for binding in &bindings {
            let provider = match self.providers.get(&binding.provider) {
                Some(provider) => provider,
                None => {
                    warn!(chunk = %record.id, provider = %binding.provider, "No client for bound provider");
                    continue;
                }
            };

            let outcome =
                match tokio::time::timeout(self.timeout, provider.download(&key, &binding.attrs))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(StratusError::Timeout {
                        provider: provider.name().to_string(),
                        seconds: self.timeout.as_secs(),
                    }),
                };

            match outcome {
                Ok(data) if record.verify(&data) => return Ok(Some(data)),
                Ok(_) => {
                    warn!(chunk = %record.id, provider = provider.name(), "Replica corrupt, trying next")
                }
                Err(error) => {
                    warn!(chunk = %record.id, provider = provider.name(), %error, "Replica fetch failed")
                }
            }
        }

        Err(StratusError::ChunkUnavailable {
            chunk: record.id.to_string(),
        })
    }
}
