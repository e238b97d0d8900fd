//! # Write Path
//!
//! `WriteSession` and the `BlockWriterApi` implementation.

use parking_lot::RwLockWriteGuard;
use shared_types::{Block, ChainId, Hash, Height};

use super::{decode_hash, BlockStore, StoreState};
use crate::domain::batch::PendingBatch;
use crate::domain::config::{HeightConflictPolicy, StorageConfig};
use crate::domain::errors::StorageError;
use crate::domain::keys;
use crate::ports::inbound::BlockWriterApi;
use crate::ports::outbound::{BlockSerializer, KeyValueStore};

/// Exclusive write access to a `BlockStore`.
///
/// Holds the write lock for its whole lifetime. Blocks staged with
/// [`stage`](Self::stage) become visible together on
/// [`commit`](Self::commit); dropping the session discards anything
/// staged since the last commit.
pub struct WriteSession<'a, KV, BS>
where
    KV: KeyValueStore,
    BS: BlockSerializer,
{
    state: RwLockWriteGuard<'a, StoreState<KV>>,
    serializer: &'a BS,
    config: &'a StorageConfig,
}

impl<KV, BS> WriteSession<'_, KV, BS>
where
    KV: KeyValueStore,
    BS: BlockSerializer,
{
    /// Stage the primary record, height index entry and head pointer of
    /// `block`. Nothing reaches the engine until `commit`.
    ///
    /// `None` is a no-op and returns `Ok(None)`. On error nothing is staged
    /// for this block; earlier stages in the session are kept.
    pub fn stage(&mut self, block: Option<&Block>) -> Result<Option<Hash>, StorageError> {
        match block {
            Some(block) => self.stage_block(block).map(Some),
            None => {
                #[cfg(feature = "tracing-log")]
                tracing::debug!("[block-store] Ignoring empty stage request");
                Ok(None)
            }
        }
    }

    fn stage_block(&mut self, block: &Block) -> Result<Hash, StorageError> {
        let encoded = self.serializer.serialize(block)?;
        if encoded.len() > self.config.max_block_size {
            return Err(StorageError::BlockTooLarge {
                size: encoded.len(),
                max_size: self.config.max_block_size,
            });
        }

        let hash = self.serializer.hash_encoded(&encoded);
        let chain_id = block.chain_id();
        let height = block.height();

        if self.config.height_conflict == HeightConflictPolicy::Reject {
            if let Some(existing) = self.occupant(&chain_id, height)? {
                if existing != hash {
                    #[cfg(feature = "tracing-log")]
                    tracing::warn!(
                        "[block-store] ⚠️ Height {} on chain {} already holds {}, rejecting {}",
                        height,
                        hex::encode(chain_id),
                        hex::encode(existing),
                        hex::encode(hash)
                    );
                    return Err(StorageError::Conflict {
                        chain_id,
                        height,
                        existing,
                        attempted: hash,
                    });
                }
            }
        }

        #[cfg(feature = "tracing-log")]
        tracing::debug!(
            "[block-store] Staged block {} at height {} ({} bytes)",
            hex::encode(hash),
            height,
            encoded.len()
        );

        self.state
            .pending
            .get_or_insert_with(PendingBatch::new)
            .stage_block(hash, chain_id, height, encoded);

        Ok(hash)
    }

    /// Hash holding a height slot, staged first, then committed.
    fn occupant(&self, chain_id: &ChainId, height: Height) -> Result<Option<Hash>, StorageError> {
        if let Some(staged) = self
            .state
            .pending
            .as_ref()
            .and_then(|batch| batch.staged_hash_at(chain_id, height))
        {
            return Ok(Some(staged));
        }

        let key = keys::height_key(chain_id, height);
        match self
            .state
            .kv_store
            .get(&key)
            .map_err(|e| StorageError::read(&key, e))?
        {
            Some(value) => decode_hash(&key, &value).map(Some),
            None => Ok(None),
        }
    }

    /// Apply every staged write as one atomic engine batch.
    ///
    /// Returns the number of blocks committed. The staged batch is cleared
    /// whether or not the engine accepts it, so a retry starts clean.
    pub fn commit(&mut self) -> Result<usize, StorageError> {
        let Some(batch) = self.state.pending.take() else {
            return Ok(0);
        };
        if batch.is_empty() {
            return Ok(0);
        }

        let blocks = batch.block_count();
        let operations = batch.operation_count();

        if let Err(e) = self.state.kv_store.atomic_batch_write(batch.into_operations()) {
            #[cfg(feature = "tracing-log")]
            tracing::error!("[block-store] ❌ Commit of {} blocks failed: {}", blocks, e);
            return Err(StorageError::write(e));
        }

        #[cfg(feature = "tracing-log")]
        tracing::info!(
            "[block-store] ✅ Committed {} blocks ({} keys)",
            blocks,
            operations
        );
        #[cfg(not(feature = "tracing-log"))]
        let _ = operations;

        Ok(blocks)
    }

    /// Number of blocks staged since the last commit.
    pub fn staged_count(&self) -> usize {
        self.state
            .pending
            .as_ref()
            .map_or(0, PendingBatch::block_count)
    }
}

impl<KV, BS> Drop for WriteSession<'_, KV, BS>
where
    KV: KeyValueStore,
    BS: BlockSerializer,
{
    fn drop(&mut self) {
        let discarded = self
            .state
            .pending
            .take()
            .map_or(0, |batch| batch.block_count());

        #[cfg(feature = "tracing-log")]
        {
            if discarded > 0 {
                tracing::warn!("[block-store] Discarding {} uncommitted blocks", discarded);
            }
        }
        #[cfg(not(feature = "tracing-log"))]
        let _ = discarded;
    }
}

impl<KV, BS> BlockStore<KV, BS>
where
    KV: KeyValueStore,
    BS: BlockSerializer,
{
    /// Take the write lock and start a session.
    ///
    /// Blocks until other writers and all readers release the store.
    pub fn begin_write(&self) -> WriteSession<'_, KV, BS> {
        let mut state = self.state.write();
        state.pending = None;
        WriteSession {
            state,
            serializer: &self.serializer,
            config: &self.config,
        }
    }
}

impl<KV, BS> BlockWriterApi for BlockStore<KV, BS>
where
    KV: KeyValueStore,
    BS: BlockSerializer,
{
    fn process_block(&self, block: Option<&Block>) -> Result<Option<Hash>, StorageError> {
        let Some(block) = block else {
            return Ok(None);
        };

        let mut session = self.begin_write();
        let hash = session.stage_block(block)?;
        session.commit()?;
        Ok(Some(hash))
    }

    fn process_blocks(&self, blocks: &[Block]) -> Result<Vec<Hash>, StorageError> {
        if blocks.is_empty() {
            return Ok(Vec::new());
        }

        let mut session = self.begin_write();
        let hashes = blocks
            .iter()
            .map(|block| session.stage_block(block))
            .collect::<Result<Vec<_>, _>>()?;
        session.commit()?;
        Ok(hashes)
    }
}
