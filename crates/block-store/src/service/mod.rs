//! # Block Store Service
//!
//! The handle implementing the block store API.
//!
//! ## Architecture
//!
//! `BlockStore` owns a single `RwLock` over the engine and the in-flight
//! batch:
//! 1. Writers hold the exclusive lock from first stage to commit
//!    (`WriteSession`)
//! 2. Readers share the lock; scans hold it for the whole traversal
//! 3. Engine and codec are injected through the outbound ports

mod reader;
mod writer;

pub use writer::WriteSession;

use parking_lot::RwLock;
use shared_types::{Block, Hash};

use crate::adapters::{BincodeBlockSerializer, InMemoryKVStore};
use crate::domain::batch::PendingBatch;
use crate::domain::config::StorageConfig;
use crate::domain::errors::StorageError;
use crate::domain::keys::{self, HASH_LEN};
use crate::ports::outbound::{BlockSerializer, KeyValueStore};

#[cfg(feature = "locking")]
use crate::adapters::lock::DEFAULT_LOCK_TIMEOUT;
#[cfg(feature = "locking")]
use crate::adapters::FileBackedKVStore;
#[cfg(feature = "locking")]
use std::path::Path;
#[cfg(feature = "locking")]
use std::time::Duration;
#[cfg(feature = "rocksdb")]
use crate::adapters::{RocksDbConfig, RocksDbStore};

/// Engine plus the batch staged by the current writer, guarded together.
pub(crate) struct StoreState<KV> {
    pub(crate) kv_store: KV,
    /// `Some` only while a `WriteSession` has staged writes.
    pub(crate) pending: Option<PendingBatch>,
}

/// The block store.
///
/// `Send + Sync`: share it across threads behind an `Arc`.
pub struct BlockStore<KV, BS>
where
    KV: KeyValueStore,
    BS: BlockSerializer,
{
    pub(crate) state: RwLock<StoreState<KV>>,
    pub(crate) serializer: BS,
    pub(crate) config: StorageConfig,
}

/// Dependencies for `BlockStore`
pub struct BlockStoreDependencies<KV, BS> {
    pub kv_store: KV,
    pub serializer: BS,
}

impl<KV, BS> BlockStore<KV, BS>
where
    KV: KeyValueStore,
    BS: BlockSerializer,
{
    /// Create a block store over the given engine and codec.
    ///
    /// Fails with `InvalidConfig` if `config` does not validate.
    pub fn new(deps: BlockStoreDependencies<KV, BS>, config: StorageConfig) -> Result<Self, StorageError> {
        config.validate()?;

        #[cfg(feature = "tracing-log")]
        tracing::info!(
            "[block-store] 🚀 Block store ready (max_block_size={}, conflict={:?}, verify_scan_hashes={})",
            config.max_block_size,
            config.height_conflict,
            config.verify_scan_hashes
        );

        Ok(Self {
            state: RwLock::new(StoreState {
                kv_store: deps.kv_store,
                pending: None,
            }),
            serializer: deps.serializer,
            config,
        })
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Content hash the store would assign to `block`.
    pub fn block_hash(&self, block: &Block) -> Result<Hash, StorageError> {
        Ok(self.serializer.content_hash(block)?)
    }

    /// Read and decode a block from the primary table under an existing guard.
    pub(crate) fn load_block(&self, kv: &KV, hash: &Hash) -> Result<Option<Block>, StorageError> {
        let key = keys::primary_key(hash);
        let Some(bytes) = kv.get(&key).map_err(|e| StorageError::read(&key, e))? else {
            return Ok(None);
        };
        self.serializer
            .deserialize(&bytes)
            .map(Some)
            .map_err(|e| StorageError::deserialization(&key, e))
    }
}

impl BlockStore<InMemoryKVStore, BincodeBlockSerializer> {
    /// Block store over a fresh in-memory engine.
    pub fn new_in_memory(config: StorageConfig) -> Result<Self, StorageError> {
        Self::new(
            BlockStoreDependencies {
                kv_store: InMemoryKVStore::new(),
                serializer: BincodeBlockSerializer,
            },
            config,
        )
    }
}

#[cfg(feature = "locking")]
impl BlockStore<FileBackedKVStore, BincodeBlockSerializer> {
    /// Open a file-backed block store in `data_dir`, locking the directory.
    ///
    /// Fails with `DatabaseLocked` if another handle still holds the
    /// directory after `DEFAULT_LOCK_TIMEOUT`.
    pub fn open_dir<P: AsRef<Path>>(data_dir: P, config: StorageConfig) -> Result<Self, StorageError> {
        Self::open_dir_with_timeout(data_dir, config, DEFAULT_LOCK_TIMEOUT)
    }

    /// Like `open_dir`, giving up on a held lock after `lock_timeout`.
    pub fn open_dir_with_timeout<P: AsRef<Path>>(
        data_dir: P,
        config: StorageConfig,
        lock_timeout: Duration,
    ) -> Result<Self, StorageError> {
        let data_dir = data_dir.as_ref();
        let kv_store = FileBackedKVStore::open_in_dir_with_timeout(data_dir, lock_timeout)
            .map_err(|e| StorageError::open(data_dir, e))?;
        Self::new(
            BlockStoreDependencies {
                kv_store,
                serializer: BincodeBlockSerializer,
            },
            config,
        )
    }
}

#[cfg(feature = "rocksdb")]
impl BlockStore<RocksDbStore, BincodeBlockSerializer> {
    /// Open a RocksDB-backed block store.
    pub fn open_rocksdb(rocks_config: RocksDbConfig, config: StorageConfig) -> Result<Self, StorageError> {
        let path = rocks_config.path.clone();
        let kv_store = RocksDbStore::open(rocks_config).map_err(|e| StorageError::open(&path, e))?;
        Self::new(
            BlockStoreDependencies {
                kv_store,
                serializer: BincodeBlockSerializer,
            },
            config,
        )
    }
}

/// Decode a hash stored as an index or head value.
pub(crate) fn decode_hash(key: &[u8], value: &[u8]) -> Result<Hash, StorageError> {
    value.try_into().map_err(|_| StorageError::Deserialization {
        key: key.to_vec(),
        message: format!("expected {} byte hash, found {} bytes", HASH_LEN, value.len()),
    })
}
