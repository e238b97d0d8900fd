//! # Inbound Ports (Driving Ports)
//!
//! The public API of the block store.
//!
//! Writers and readers are split into two traits. Both take `&self`: the
//! implementation serializes writers and lets readers share access.

use std::ops::ControlFlow;

use shared_types::{Block, ChainId, Hash, Height};

use crate::domain::errors::StorageError;

/// Write side: commit blocks with all their derived index entries.
pub trait BlockWriterApi {
    /// Commit one block atomically.
    ///
    /// Writes the primary record, the height index entry and the chain head
    /// pointer in one batch. `None` is a no-op and returns `Ok(None)`.
    ///
    /// ## Errors
    ///
    /// - `Serialization`: block could not be encoded, nothing written
    /// - `BlockTooLarge`: encoded block exceeds `max_block_size`
    /// - `Conflict`: height slot holds a different block (policy `Reject`)
    /// - `StoreWrite`: engine rejected the batch, nothing written
    fn process_block(&self, block: Option<&Block>) -> Result<Option<Hash>, StorageError>;

    /// Commit several blocks in a single atomic batch.
    ///
    /// Blocks are staged in slice order, so the head pointer of each chain
    /// ends on the last block staged for it. Any staging failure discards
    /// the whole batch.
    fn process_blocks(&self, blocks: &[Block]) -> Result<Vec<Hash>, StorageError>;
}

/// Read side: resolve blocks by identity or position.
pub trait BlockReaderApi {
    /// Read a block by its content hash. Absent is `Ok(None)`.
    ///
    /// ## Errors
    ///
    /// - `Deserialization`: stored bytes are not a valid block
    /// - `StoreRead`: engine read failed
    fn get_by_hash(&self, hash: &Hash) -> Result<Option<Block>, StorageError>;

    /// Read a block by chain and height through the height index.
    ///
    /// ## Errors
    ///
    /// - `NotFound`: no height index entry
    /// - `Deserialization`: index value or block bytes malformed
    fn get_by_height(&self, chain_id: &ChainId, height: Height)
        -> Result<Option<Block>, StorageError>;

    /// Every stored block in ascending hash order.
    ///
    /// Runs as a consistent snapshot: writers wait until the scan ends.
    fn scan_all(&self) -> Result<Vec<Block>, StorageError>;

    /// Streaming form of `scan_all`. Returns the number of blocks visited.
    fn scan_blocks<F>(&self, visitor: F) -> Result<usize, StorageError>
    where
        F: FnMut(Hash, Block) -> ControlFlow<()>;

    /// Hash of the last committed block of a chain.
    fn chain_head(&self, chain_id: &ChainId) -> Result<Option<Hash>, StorageError>;

    /// The last committed block of a chain.
    fn head_block(&self, chain_id: &ChainId) -> Result<Option<Block>, StorageError>;

    /// Whether a primary record exists for `hash`.
    fn block_exists(&self, hash: &Hash) -> Result<bool, StorageError>;

    /// Every block of a chain in ascending height order.
    fn chain_blocks(&self, chain_id: &ChainId) -> Result<Vec<Block>, StorageError>;
}
