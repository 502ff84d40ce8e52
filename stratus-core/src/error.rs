//! Error types for Stratus
//!
//! Provides a unified error type for all Stratus operations.

use thiserror::Error;

/// Result type alias for Stratus operations
pub type Result<T> = std::result::Result<T, StratusError>;

/// Unified error type for Stratus
#[derive(Error, Debug)]
pub enum StratusError {
    // ===== Path Errors =====
    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    // ===== Conflict Errors =====
    #[error("Path already exists as a file: {0}")]
    FileConflict(String),

    #[error("Path already exists as a directory: {0}")]
    DirectoryConflict(String),

    #[error("Directory not empty: {0}")]
    DirectoryNotEmpty(String),

    // ===== Transport / Backend Errors =====
    #[error("Transport error from provider {provider}: {message}")]
    Transport { provider: String, message: String },

    #[error("Chunk {key} missing at provider {provider}")]
    ChunkMissing { provider: String, key: String },

    #[error("Provider {provider} timed out after {seconds}s")]
    Timeout { provider: String, seconds: u64 },

    #[error("Chunk unavailable on all replicas: {chunk}")]
    ChunkUnavailable { chunk: String },

    #[error("Chunk corrupted: digest mismatch for {chunk}")]
    ChunkCorrupted { chunk: String },

    #[error("Under-replicated chunk: {achieved} of {required} replicas written")]
    UnderReplicated { achieved: usize, required: usize },

    // ===== Configuration Errors =====
    #[error("Insufficient providers: have {available}, need {required}")]
    InsufficientProviders { available: usize, required: usize },

    #[error("Configuration error: {0}")]
    Configuration(String),

    // ===== Closed-Resource Errors =====
    #[error("I/O operation on closed stream")]
    StreamClosed,

    // ===== Chunk Errors =====
    #[error("Chunk too large: {size} bytes (max: {max})")]
    ChunkTooLarge { size: usize, max: usize },

    #[error("Invalid chunk ID: {0}")]
    InvalidChunkId(String),

    // ===== I/O Errors =====
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ===== Serialization Errors =====
    #[error("Serialization error: {0}")]
    Serialization(String),

    // ===== Generic Errors =====
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for StratusError {
    fn from(err: serde_json::Error) -> Self {
        StratusError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StratusError::InsufficientProviders {
            available: 1,
            required: 2,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient providers: have 1, need 2"
        );
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: StratusError = io_err.into();
        assert!(matches!(err, StratusError::Io(_)));
    }
}
