//! # Outbound Ports (Driven Ports)
//!
//! Dependencies required by the block store.
//!
//! These are the interfaces the host application (or the in-tree adapters)
//! must implement: an ordered key-value engine and a block codec.

use shared_types::{Block, Hash};

use crate::domain::errors::{KVStoreError, SerializationError};
use crate::domain::keys::KeyRange;

/// A key/value pair as returned by range scans.
pub type KvPair = (Vec<u8>, Vec<u8>);

/// Ordered iterator over a key range.
///
/// Dropping the iterator releases the engine-side iterator and any
/// snapshot it pins.
pub type KvIter<'a> = Box<dyn Iterator<Item = Result<KvPair, KVStoreError>> + 'a>;

/// Abstract interface for an ordered, byte-keyed storage engine.
///
/// Production: `RocksDbStore` (feature `rocksdb`)
/// Testing: `InMemoryKVStore`
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError>;

    /// Check if a key exists.
    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        Ok(self.get(key)?.is_some())
    }

    /// Execute an atomic batch write.
    ///
    /// Either ALL operations in the batch are applied, or NONE are.
    /// Operations on the same key apply in order; the last one wins.
    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError>;

    /// Iterate over `range` in ascending byte order.
    fn range_scan(&self, range: &KeyRange) -> Result<KvIter<'_>, KVStoreError>;
}

/// A put staged for an atomic batch write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOperation {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
}

impl BatchOperation {
    /// Create a Put operation.
    pub fn put(key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        BatchOperation {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Abstract interface for block encoding and identity.
///
/// All methods must be deterministic, and `deserialize(serialize(b))` must
/// equal `b`.
pub trait BlockSerializer: Send + Sync {
    /// Serialize a Block to bytes.
    fn serialize(&self, block: &Block) -> Result<Vec<u8>, SerializationError>;

    /// Deserialize bytes to a Block.
    fn deserialize(&self, data: &[u8]) -> Result<Block, SerializationError>;

    /// Content hash of already-serialized block bytes.
    fn hash_encoded(&self, encoded: &[u8]) -> Hash;

    /// Content hash of a block.
    fn content_hash(&self, block: &Block) -> Result<Hash, SerializationError> {
        let encoded = self.serialize(block)?;
        Ok(self.hash_encoded(&encoded))
    }
}
