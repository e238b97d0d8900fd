//! # Key Schema
//!
//! Maps logical addresses to byte-string keys in the flat, ordered key space.
//!
//! ## Layout
//!
//! | Table | Key | Value |
//! |-------|-----|-------|
//! | Primary | `0x01 ++ hash` | serialized block |
//! | Height index | `0x02 ++ chain_id ++ be_u32(height)` | block hash |
//! | Chain head | `0x03 ++ chain_id` | block hash |
//!
//! The one-byte tag keeps record kinds apart regardless of payload, and the
//! big-endian height makes byte order equal numeric order inside a chain.

use shared_types::{ChainId, Hash, Height};

/// Length of a content hash in bytes.
pub const HASH_LEN: usize = 32;

/// Length of a chain identifier in bytes.
pub const CHAIN_ID_LEN: usize = 32;

/// Length of an encoded height in bytes.
pub const HEIGHT_LEN: usize = 4;

/// One-byte table tag prefixed to every key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum TableTag {
    /// Block data: `0x01 ++ hash` -> serialized block
    Primary = 0x01,
    /// Height to hash index: `0x02 ++ chain_id ++ height` -> hash
    HeightIndex = 0x02,
    /// Chain head pointer: `0x03 ++ chain_id` -> hash
    ChainHead = 0x03,
}

impl TableTag {
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(TableTag::Primary),
            0x02 => Some(TableTag::HeightIndex),
            0x03 => Some(TableTag::ChainHead),
            _ => None,
        }
    }

    /// Build a full key with the given suffix parts.
    pub fn key(self, parts: &[&[u8]]) -> Vec<u8> {
        let len = 1 + parts.iter().map(|p| p.len()).sum::<usize>();
        let mut key = Vec::with_capacity(len);
        key.push(self.as_byte());
        for part in parts {
            key.extend_from_slice(part);
        }
        key
    }

    /// Half-open range covering every key of this table.
    pub fn range(self) -> KeyRange {
        KeyRange::prefix(vec![self.as_byte()])
    }
}

/// Half-open byte range `[start, end)`; `end == None` means unbounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    pub start: Vec<u8>,
    pub end: Option<Vec<u8>>,
}

impl KeyRange {
    pub fn new(start: Vec<u8>, end: Option<Vec<u8>>) -> Self {
        Self { start, end }
    }

    /// Range of all keys beginning with `prefix`.
    pub fn prefix(prefix: Vec<u8>) -> Self {
        let end = prefix_successor(&prefix);
        Self { start: prefix, end }
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        key >= self.start.as_slice() && self.end.as_deref().map_or(true, |end| key < end)
    }
}

/// Smallest key greater than every key starting with `prefix`.
///
/// `None` when the prefix is empty or all `0xFF`.
pub fn prefix_successor(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

/// Primary record key for a block hash.
pub fn primary_key(hash: &Hash) -> Vec<u8> {
    TableTag::Primary.key(&[hash])
}

/// Height index key for `(chain_id, height)`.
pub fn height_key(chain_id: &ChainId, height: Height) -> Vec<u8> {
    TableTag::HeightIndex.key(&[chain_id, &height.to_be_bytes()])
}

/// Chain head pointer key.
pub fn head_key(chain_id: &ChainId) -> Vec<u8> {
    TableTag::ChainHead.key(&[chain_id])
}

/// Range of all primary records: `[[0x01], [0x02])`.
pub fn primary_range() -> KeyRange {
    TableTag::Primary.range()
}

/// Range of one chain's height index, ascending by height.
pub fn height_range(chain_id: &ChainId) -> KeyRange {
    KeyRange::prefix(TableTag::HeightIndex.key(&[chain_id]))
}

/// Recover the hash from a primary key.
pub fn parse_primary_key(key: &[u8]) -> Option<Hash> {
    match key.split_first() {
        Some((&tag, rest)) if tag == TableTag::Primary.as_byte() => rest.try_into().ok(),
        _ => None,
    }
}

/// Recover `(chain_id, height)` from a height index key.
pub fn parse_height_key(key: &[u8]) -> Option<(ChainId, Height)> {
    let (&tag, rest) = key.split_first()?;
    if tag != TableTag::HeightIndex.as_byte() || rest.len() != CHAIN_ID_LEN + HEIGHT_LEN {
        return None;
    }
    let (chain, height) = rest.split_at(CHAIN_ID_LEN);
    let chain_id: ChainId = chain.try_into().ok()?;
    let height = Height::from_be_bytes(height.try_into().ok()?);
    Some((chain_id, height))
}
