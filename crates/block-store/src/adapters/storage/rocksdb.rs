//! # RocksDB Storage Adapter
//!
//! Production `KeyValueStore` on RocksDB.
//!
//! All tables share the default column family; the one-byte table tag at
//! the front of every key keeps them apart and ordered.
//!
//! ## Configuration
//!
//! - Snappy compression
//! - Bloom filters (10 bits per key)
//! - fsync on write unless `sync_writes` is off

use rocksdb::{BlockBasedOptions, Cache, DBCompressionType, Direction, IteratorMode, Options, WriteBatch, WriteOptions, DB};
use std::path::Path;

use crate::domain::errors::KVStoreError;
use crate::domain::keys::KeyRange;
use crate::ports::outbound::{BatchOperation, KeyValueStore, KvIter};

/// RocksDB configuration.
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Path to the database directory
    pub path: String,
    /// Block cache size in bytes (default: 256MB)
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 64MB)
    pub write_buffer_size: usize,
    /// Maximum number of write buffers (default: 3)
    pub max_write_buffer_number: i32,
    /// Enable fsync after each write (default: true)
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: "./data/blocks".to_string(),
            block_cache_size: 256 * 1024 * 1024, // 256MB
            write_buffer_size: 64 * 1024 * 1024, // 64MB
            max_write_buffer_number: 3,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Create config for testing (smaller buffers, no sync)
    pub fn for_testing(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 8 * 1024 * 1024,  // 8MB
            write_buffer_size: 4 * 1024 * 1024, // 4MB
            max_write_buffer_number: 2,
            sync_writes: false,
        }
    }
}

/// RocksDB-backed key-value store.
///
/// RocksDB takes its own directory lock, so a second `open` on the same
/// path fails instead of corrupting the database.
pub struct RocksDbStore {
    db: DB,
    config: RocksDbConfig,
}

impl RocksDbStore {
    /// Open or create a RocksDB database
    pub fn open(config: RocksDbConfig) -> Result<Self, KVStoreError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);

        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_max_write_buffer_number(config.max_write_buffer_number);
        opts.set_compression_type(DBCompressionType::Snappy);

        let mut block_opts = BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let db = DB::open(&opts, &config.path).map_err(|e| {
            let message = format!("Failed to open RocksDB at {}: {}", config.path, e);
            if e.to_string().contains("lock") {
                KVStoreError::Locked { message }
            } else {
                KVStoreError::Io { message }
            }
        })?;

        #[cfg(feature = "tracing-log")]
        tracing::info!("[block-store] 🗄️ Opened RocksDB at {}", config.path);

        Ok(Self { db, config })
    }

    /// Open with default tuning at `path`.
    pub fn open_default(path: impl AsRef<Path>) -> Result<Self, KVStoreError> {
        let config = RocksDbConfig {
            path: path.as_ref().to_string_lossy().to_string(),
            ..Default::default()
        };
        Self::open(config)
    }

    fn write_options(&self) -> WriteOptions {
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        write_opts
    }
}

fn rocks_error(op: &str, e: rocksdb::Error) -> KVStoreError {
    let message = format!("RocksDB {} failed: {}", op, e);
    match e.kind() {
        rocksdb::ErrorKind::Corruption => KVStoreError::Corruption { message },
        _ => KVStoreError::Io { message },
    }
}

impl KeyValueStore for RocksDbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        self.db.get(key).map_err(|e| rocks_error("get", e))
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        self.db
            .get_pinned(key)
            .map(|v| v.is_some())
            .map_err(|e| rocks_error("exists check", e))
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let mut batch = WriteBatch::default();
        for op in operations {
            batch.put(&op.key, &op.value);
        }

        self.db
            .write_opt(batch, &self.write_options())
            .map_err(|e| rocks_error("batch write", e))
    }

    fn range_scan(&self, range: &KeyRange) -> Result<KvIter<'_>, KVStoreError> {
        let end = range.end.clone();
        let iter = self
            .db
            .iterator(IteratorMode::From(&range.start, Direction::Forward))
            .map_while(move |item| match item {
                Ok((key, value)) => {
                    if end.as_deref().is_some_and(|end| &*key >= end) {
                        return None;
                    }
                    Some(Ok((key.to_vec(), value.to_vec())))
                }
                Err(e) => Some(Err(rocks_error("scan", e))),
            });
        Ok(Box::new(iter))
    }
}
