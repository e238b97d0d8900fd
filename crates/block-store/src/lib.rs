//! # Block Store
//!
//! Persistence layer for the ledger: every block is stored once under its
//! content hash, with a per-chain height index and a chain head pointer
//! derived from it.
//!
//! ## Key Space
//!
//! One flat, ordered key space holds three tables:
//!
//! ```text
//! 0x01 ++ hash                     → serialized block   (primary)
//! 0x02 ++ chain_id ++ be_u32(h)    → hash               (height index)
//! 0x03 ++ chain_id                 → hash               (chain head)
//! ```
//!
//! A commit writes all three in a single engine batch: either the block is
//! reachable by hash, by height and as the head, or not at all.
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - Key schema, pending batch, config, errors
//! - `ports/` - Port traits (inbound API, outbound SPI)
//! - `adapters/` - Engines (memory, file, RocksDB), codec, directory lock
//! - `service/` - `BlockStore` handle implementing the API
//!
//! ## Usage
//!
//! ```ignore
//! use block_store::{BlockReaderApi, BlockStore, BlockWriterApi, StorageConfig};
//!
//! let store = BlockStore::new_in_memory(StorageConfig::default())?;
//!
//! let hash = store.process_block(Some(&block))?;
//! let same = store.get_by_height(&block.chain_id(), block.height())?;
//!
//! // Several blocks, one atomic commit
//! let mut session = store.begin_write();
//! session.stage(Some(&a))?;
//! session.stage(Some(&b))?;
//! session.commit()?;
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export key types for convenience
pub use adapters::{BincodeBlockSerializer, FileBackedKVStore, InMemoryKVStore};
#[cfg(feature = "locking")]
pub use adapters::{DatabaseLock, LockError};
#[cfg(feature = "rocksdb")]
pub use adapters::{RocksDbConfig, RocksDbStore};
pub use domain::config::{HeightConflictPolicy, StorageConfig};
pub use domain::errors::{KVStoreError, SerializationError, StorageError};
pub use domain::keys::{KeyRange, TableTag};
pub use ports::inbound::{BlockReaderApi, BlockWriterApi};
pub use ports::outbound::{BatchOperation, BlockSerializer, KeyValueStore};
pub use service::{BlockStore, BlockStoreDependencies, WriteSession};
