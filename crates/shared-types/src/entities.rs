//! # Core Ledger Entities
//!
//! Defines the block record persisted by the block store.
//!
//! ## Clusters
//!
//! - **Identity**: `Hash`, `ChainId`, `Height`
//! - **Chain**: `Block`, `BlockHeader`, `BlockEntry`

use serde::{Deserialize, Serialize};

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// A 32-byte content hash (SHA-256 of the serialized block).
pub type Hash = [u8; 32];

/// A fixed-width 32-byte chain identifier.
pub type ChainId = [u8; 32];

/// Sequence height of a block within its chain.
pub type Height = u32;

/// The all-zero hash, used as `prev_hash` of the first block of a chain.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Identifier of the administrative chain.
pub const ADMIN_CHAIN_ID: ChainId = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, //
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x0a,
];

// =============================================================================
// CLUSTER B: THE CHAIN
// =============================================================================

/// Header of a block: where it sits and what it follows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockHeader {
    /// Chain this block belongs to.
    pub chain_id: ChainId,
    /// Sequence height, assigned by the producer.
    pub height: Height,
    /// Content hash of the previous block (`ZERO_HASH` at height 0).
    pub prev_hash: Hash,
    /// Unix timestamp (seconds) set by the producer.
    pub timestamp: u64,
}

impl BlockHeader {
    pub fn new(chain_id: ChainId, height: Height, prev_hash: Hash, timestamp: u64) -> Self {
        Self {
            chain_id,
            height,
            prev_hash,
            timestamp,
        }
    }
}

/// A single body entry: a one-byte type tag and an opaque payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockEntry {
    pub entry_type: u8,
    pub payload: Vec<u8>,
}

impl BlockEntry {
    pub fn new(entry_type: u8, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            entry_type,
            payload: payload.into(),
        }
    }
}

/// An immutable ledger record.
///
/// Identity is the content hash of its serialized form, computed by the
/// block store's serializer rather than stored in the block itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Block {
    pub header: BlockHeader,
    pub entries: Vec<BlockEntry>,
}

impl Block {
    pub fn new(header: BlockHeader, entries: Vec<BlockEntry>) -> Self {
        Self { header, entries }
    }

    /// Chain this block belongs to.
    pub fn chain_id(&self) -> ChainId {
        self.header.chain_id
    }

    /// Sequence height of this block.
    pub fn height(&self) -> Height {
        self.header.height
    }

    /// Content hash of the previous block.
    pub fn prev_hash(&self) -> Hash {
        self.header.prev_hash
    }

    /// Total payload bytes carried by the body.
    pub fn payload_len(&self) -> usize {
        self.entries.iter().map(|e| e.payload.len()).sum()
    }
}
