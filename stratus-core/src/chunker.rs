//! Chunker: splits a byte stream into bounded-size chunks
//!
//! Produces a lazy, finite, non-restartable sequence of byte groups of
//! length <= the configured chunk size; the last group may be shorter.
//! Never yields an empty group.

use crate::error::Result;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Splits an async byte source into chunks of at most `chunk_size` bytes
pub struct Chunker<R> {
    reader: R,
    chunk_size: usize,
    done: bool,
}

impl<R: AsyncRead + Unpin> Chunker<R> {
    /// Create a chunker over `reader`
    ///
    /// Panics if `chunk_size` is zero (fatal precondition, not a
    /// recoverable error).
    pub fn new(reader: R, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk size must be positive");
        Self {
            reader,
            chunk_size,
            done: false,
        }
    }

    /// Read the next chunk, or `None` at end of stream
    pub async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        if self.done {
            return Ok(None);
        }

        let mut buf = BytesMut::with_capacity(self.chunk_size);
        while buf.len() < self.chunk_size {
            let n = (&mut self.reader)
                .take((self.chunk_size - buf.len()) as u64)
                .read_buf(&mut buf)
                .await?;
            if n == 0 {
                self.done = true;
                break;
            }
        }

        if buf.is_empty() {
            return Ok(None);
        }
        assert!(buf.len() <= self.chunk_size, "chunk exceeds chunk size");
        Ok(Some(buf.freeze()))
    }
}
