//! # Read Path
//!
//! Implements `BlockReaderApi`. Every operation runs under one shared
//! guard, so multi-step lookups never observe a half-applied commit.

use std::ops::ControlFlow;

use shared_types::{Block, ChainId, Hash, Height};

use super::{decode_hash, BlockStore};
use crate::domain::errors::StorageError;
use crate::domain::keys;
use crate::ports::inbound::BlockReaderApi;
use crate::ports::outbound::{BlockSerializer, KeyValueStore};

impl<KV, BS> BlockReaderApi for BlockStore<KV, BS>
where
    KV: KeyValueStore,
    BS: BlockSerializer,
{
    fn get_by_hash(&self, hash: &Hash) -> Result<Option<Block>, StorageError> {
        let state = self.state.read();
        self.load_block(&state.kv_store, hash)
    }

    fn get_by_height(&self, chain_id: &ChainId, height: Height) -> Result<Option<Block>, StorageError> {
        let state = self.state.read();

        let key = keys::height_key(chain_id, height);
        let Some(value) = state
            .kv_store
            .get(&key)
            .map_err(|e| StorageError::read(&key, e))?
        else {
            return Err(StorageError::NotFound {
                chain_id: *chain_id,
                height,
            });
        };

        let hash = decode_hash(&key, &value)?;
        self.load_block(&state.kv_store, &hash)
    }

    fn scan_all(&self) -> Result<Vec<Block>, StorageError> {
        let mut blocks = Vec::new();
        self.scan_blocks(|_, block| {
            blocks.push(block);
            ControlFlow::Continue(())
        })?;
        Ok(blocks)
    }

    /// The visitor runs with the shared lock held and must not call back
    /// into this store.
    fn scan_blocks<F>(&self, mut visitor: F) -> Result<usize, StorageError>
    where
        F: FnMut(Hash, Block) -> ControlFlow<()>,
    {
        let state = self.state.read();
        let range = keys::primary_range();
        let iter = state
            .kv_store
            .range_scan(&range)
            .map_err(|e| StorageError::read(&range.start, e))?;

        let mut visited = 0;
        let mut last_key = range.start.clone();
        for item in iter {
            let (key, value) = item.map_err(|e| StorageError::read(&last_key, e))?;

            let hash = keys::parse_primary_key(&key).ok_or_else(|| StorageError::Corruption {
                key: key.clone(),
                message: "malformed primary key".to_string(),
            })?;

            let block = self
                .serializer
                .deserialize(&value)
                .map_err(|e| StorageError::deserialization(&key, e))?;

            if self.config.verify_scan_hashes {
                let computed = self.serializer.hash_encoded(&value);
                if computed != hash {
                    #[cfg(feature = "tracing-log")]
                    tracing::warn!(
                        "[block-store] ⚠️ Primary record {} hashes to {}",
                        hex::encode(hash),
                        hex::encode(computed)
                    );
                    return Err(StorageError::Corruption {
                        key,
                        message: format!("content hash is {}", hex::encode(computed)),
                    });
                }
            }

            visited += 1;
            if visitor(hash, block).is_break() {
                break;
            }
            last_key = key;
        }

        #[cfg(feature = "tracing-log")]
        tracing::debug!("[block-store] Scan visited {} blocks", visited);

        Ok(visited)
    }

    fn chain_head(&self, chain_id: &ChainId) -> Result<Option<Hash>, StorageError> {
        let state = self.state.read();
        let key = keys::head_key(chain_id);
        match state
            .kv_store
            .get(&key)
            .map_err(|e| StorageError::read(&key, e))?
        {
            Some(value) => decode_hash(&key, &value).map(Some),
            None => Ok(None),
        }
    }

    fn head_block(&self, chain_id: &ChainId) -> Result<Option<Block>, StorageError> {
        let state = self.state.read();
        let key = keys::head_key(chain_id);
        let Some(value) = state
            .kv_store
            .get(&key)
            .map_err(|e| StorageError::read(&key, e))?
        else {
            return Ok(None);
        };

        let hash = decode_hash(&key, &value)?;
        self.load_block(&state.kv_store, &hash)
    }

    fn block_exists(&self, hash: &Hash) -> Result<bool, StorageError> {
        let state = self.state.read();
        let key = keys::primary_key(hash);
        state
            .kv_store
            .exists(&key)
            .map_err(|e| StorageError::read(&key, e))
    }

    fn chain_blocks(&self, chain_id: &ChainId) -> Result<Vec<Block>, StorageError> {
        let state = self.state.read();
        let range = keys::height_range(chain_id);
        let iter = state
            .kv_store
            .range_scan(&range)
            .map_err(|e| StorageError::read(&range.start, e))?;

        let mut blocks = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| StorageError::read(&range.start, e))?;
            let hash = decode_hash(&key, &value)?;

            // An index entry without its primary record breaks the replay
            let Some(block) = self.load_block(&state.kv_store, &hash)? else {
                return Err(StorageError::Corruption {
                    key,
                    message: format!("height entry points at missing block {}", hex::encode(hash)),
                });
            };
            blocks.push(block);
        }

        Ok(blocks)
    }
}
