//! # Pending Batch
//!
//! The in-flight set of derived writes for one or more blocks, applied to
//! the engine as a single atomic batch on commit.
//!
//! Each staged block contributes exactly three puts, in this order:
//! primary record, height index entry, chain head pointer.

use std::collections::HashMap;

use shared_types::{ChainId, Hash, Height};

use crate::domain::keys;
use crate::ports::outbound::BatchOperation;

/// Writes staged since the last commit or reset.
#[derive(Debug, Default)]
pub struct PendingBatch {
    operations: Vec<BatchOperation>,
    /// Height slots claimed by staged blocks, for occupancy checks.
    staged_heights: HashMap<(ChainId, Height), Hash>,
    staged_blocks: usize,
}

impl PendingBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage the three derived writes of one block.
    pub fn stage_block(&mut self, hash: Hash, chain_id: ChainId, height: Height, encoded: Vec<u8>) {
        self.operations
            .push(BatchOperation::put(keys::primary_key(&hash), encoded));
        self.operations
            .push(BatchOperation::put(keys::height_key(&chain_id, height), hash));
        self.operations
            .push(BatchOperation::put(keys::head_key(&chain_id), hash));
        self.staged_heights.insert((chain_id, height), hash);
        self.staged_blocks += 1;
    }

    /// Hash staged for `(chain_id, height)` in this batch, if any.
    pub fn staged_hash_at(&self, chain_id: &ChainId, height: Height) -> Option<Hash> {
        self.staged_heights.get(&(*chain_id, height)).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Number of blocks staged.
    pub fn block_count(&self) -> usize {
        self.staged_blocks
    }

    /// Number of key/value puts staged.
    pub fn operation_count(&self) -> usize {
        self.operations.len()
    }

    pub fn into_operations(self) -> Vec<BatchOperation> {
        self.operations
    }
}
