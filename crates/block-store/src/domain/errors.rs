//! # Domain Errors
//!
//! Error types for the block store.
//!
//! ## Design Principles
//!
//! - Every failure carries the key or operation it happened on
//! - No retries or silent recovery at this layer
//! - A `None` block is a no-op, never an error

use shared_types::{ChainId, Hash, Height};
use thiserror::Error;

/// Errors surfaced by block store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// Block could not be encoded. Nothing was staged.
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Stored bytes could not be decoded.
    #[error("Deserialization error at key {}: {message}", hex::encode(.key))]
    Deserialization { key: Vec<u8>, message: String },

    /// The engine rejected the batch. None of the staged keys took effect.
    #[error("Store write failed: {message}")]
    StoreWrite { message: String },

    /// The engine failed a point read or iteration.
    #[error("Store read failed at key {}: {message}", hex::encode(.key))]
    StoreRead { key: Vec<u8>, message: String },

    /// No height index entry for this chain and height.
    #[error("No block at height {height} on chain {}", hex::encode(.chain_id))]
    NotFound { chain_id: ChainId, height: Height },

    /// Height slot already holds a different block.
    #[error(
        "Height {height} on chain {} already holds {}, refusing {}",
        hex::encode(.chain_id),
        hex::encode(.existing),
        hex::encode(.attempted)
    )]
    Conflict {
        chain_id: ChainId,
        height: Height,
        existing: Hash,
        attempted: Hash,
    },

    /// Encoded block exceeds the configured limit.
    #[error("Block too large: {size} bytes, max {max_size} bytes")]
    BlockTooLarge { size: usize, max_size: usize },

    /// Stored record does not match its key.
    #[error("Data corruption at key {}: {message}", hex::encode(.key))]
    Corruption { key: Vec<u8>, message: String },

    /// Configuration rejected by `StorageConfig::validate`.
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Another process holds the data directory.
    #[error("Database locked: {message}")]
    DatabaseLocked { message: String },

    /// The engine could not be opened.
    #[error("Failed to open store at {path}: {message}")]
    Open { path: String, message: String },
}

impl StorageError {
    /// Wrap an engine read failure with the key being read.
    pub fn read(key: &[u8], err: KVStoreError) -> Self {
        StorageError::StoreRead {
            key: key.to_vec(),
            message: err.to_string(),
        }
    }

    /// Wrap an engine batch failure.
    pub fn write(err: KVStoreError) -> Self {
        StorageError::StoreWrite {
            message: err.to_string(),
        }
    }

    /// Wrap an engine open failure with the location being opened.
    ///
    /// A held directory lock becomes `DatabaseLocked`.
    pub fn open(path: impl AsRef<std::path::Path>, err: KVStoreError) -> Self {
        match err {
            KVStoreError::Locked { message } => StorageError::DatabaseLocked { message },
            other => StorageError::Open {
                path: path.as_ref().display().to_string(),
                message: other.to_string(),
            },
        }
    }

    /// Wrap a decode failure with the key whose value failed.
    pub fn deserialization(key: &[u8], err: SerializationError) -> Self {
        StorageError::Deserialization {
            key: key.to_vec(),
            message: err.message,
        }
    }
}

/// Key-value engine errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KVStoreError {
    /// I/O error during read/write.
    #[error("KV store I/O error: {message}")]
    Io { message: String },
    /// The engine detected corruption in its own files.
    #[error("KV store corruption: {message}")]
    Corruption { message: String },
    /// The data directory is held by another process.
    #[error("KV store locked: {message}")]
    Locked { message: String },
}

/// Block codec errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Serialization error: {message}")]
pub struct SerializationError {
    pub message: String,
}

impl From<SerializationError> for StorageError {
    fn from(err: SerializationError) -> Self {
        StorageError::Serialization {
            message: err.message,
        }
    }
}
