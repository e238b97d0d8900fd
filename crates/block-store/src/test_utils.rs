//! Builders and fault-injecting adapters for tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use shared_types::{Block, BlockEntry, BlockHeader, ChainId, Hash, Height, ADMIN_CHAIN_ID, ZERO_HASH};

use crate::adapters::{BincodeBlockSerializer, InMemoryKVStore};
use crate::domain::errors::{KVStoreError, SerializationError};
use crate::domain::keys::KeyRange;
use crate::ports::outbound::{BatchOperation, BlockSerializer, KeyValueStore, KvIter};

/// A block on `chain_id` with one entry that makes it unique per height.
pub fn make_test_block(chain_id: ChainId, height: Height, prev_hash: Hash) -> Block {
    Block::new(
        BlockHeader::new(chain_id, height, prev_hash, 1_700_000_000 + u64::from(height)),
        vec![BlockEntry::new(1, format!("entry-{}", height).into_bytes())],
    )
}

/// A block on the admin chain.
pub fn make_admin_block(height: Height, prev_hash: Hash) -> Block {
    make_test_block(ADMIN_CHAIN_ID, height, prev_hash)
}

/// `count` blocks from height 0, each linked to the previous one's hash.
pub fn make_chain(chain_id: ChainId, count: u32) -> Vec<Block> {
    let serializer = BincodeBlockSerializer;
    let mut prev = ZERO_HASH;
    let mut blocks = Vec::with_capacity(count as usize);
    for height in 0..count {
        let block = make_test_block(chain_id, height, prev);
        prev = serializer
            .content_hash(&block)
            .unwrap_or_else(|e| panic!("test block failed to encode: {e}"));
        blocks.push(block);
    }
    blocks
}

/// Content hash under the default serializer.
pub fn hash_of(block: &Block) -> Hash {
    BincodeBlockSerializer
        .content_hash(block)
        .unwrap_or_else(|e| panic!("test block failed to encode: {e}"))
}

/// Bincode codec that refuses to encode blocks on one chain.
///
/// Decoding and hashing behave like `BincodeBlockSerializer`.
#[derive(Debug, Clone, Copy)]
pub struct RejectingSerializer {
    rejected_chain: ChainId,
}

impl RejectingSerializer {
    pub fn rejecting(rejected_chain: ChainId) -> Self {
        Self { rejected_chain }
    }
}

impl BlockSerializer for RejectingSerializer {
    fn serialize(&self, block: &Block) -> Result<Vec<u8>, SerializationError> {
        if block.chain_id() == self.rejected_chain {
            return Err(SerializationError {
                message: format!("refusing to encode block at height {}", block.height()),
            });
        }
        BincodeBlockSerializer.serialize(block)
    }

    fn deserialize(&self, data: &[u8]) -> Result<Block, SerializationError> {
        BincodeBlockSerializer.deserialize(data)
    }

    fn hash_encoded(&self, encoded: &[u8]) -> Hash {
        BincodeBlockSerializer.hash_encoded(encoded)
    }
}

/// Switches shared between a test and a `FaultyKVStore` it handed away.
#[derive(Debug, Default)]
pub struct FaultSwitch {
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl FaultSwitch {
    pub fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }

    pub fn fail_reads(&self, on: bool) {
        self.fail_reads.store(on, Ordering::SeqCst);
    }
}

/// In-memory store whose writes or reads can be made to fail on demand.
///
/// A failing batch applies nothing.
pub struct FaultyKVStore {
    inner: InMemoryKVStore,
    switch: Arc<FaultSwitch>,
}

impl FaultyKVStore {
    /// A healthy store plus the switch that breaks it.
    pub fn with_switch() -> (Self, Arc<FaultSwitch>) {
        let switch = Arc::new(FaultSwitch::default());
        let store = Self {
            inner: InMemoryKVStore::new(),
            switch: Arc::clone(&switch),
        };
        (store, switch)
    }

    fn check_read(&self) -> Result<(), KVStoreError> {
        if self.switch.fail_reads.load(Ordering::SeqCst) {
            return Err(KVStoreError::Io {
                message: "injected read failure".to_string(),
            });
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), KVStoreError> {
        if self.switch.fail_writes.load(Ordering::SeqCst) {
            return Err(KVStoreError::Io {
                message: "injected write failure".to_string(),
            });
        }
        Ok(())
    }
}

impl KeyValueStore for FaultyKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        self.check_read()?;
        self.inner.get(key)
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        self.check_write()?;
        self.inner.atomic_batch_write(operations)
    }

    fn range_scan(&self, range: &KeyRange) -> Result<KvIter<'_>, KVStoreError> {
        self.check_read()?;
        self.inner.range_scan(range)
    }
}
