//! # Ledger Flows
//!
//! Tests that a producer appending blocks to several chains and a consumer
//! reading them back by hash, by height and by replay see the same ledger.
//!
//! ## Flows Tested:
//!
//! 1. **Append**: one block per commit, head tracks the latest
//! 2. **Group commit**: several blocks in one `WriteSession`
//! 3. **Replay**: `chain_blocks` returns the chain in height order
//! 4. **Fork attempt**: a second block at an occupied height is refused

#[cfg(test)]
mod tests {
    use std::ops::ControlFlow;

    use block_store::test_utils::{hash_of, make_chain, make_test_block};
    use block_store::{
        BlockReaderApi, BlockStore, BlockWriterApi, HeightConflictPolicy, StorageConfig,
        StorageError,
    };
    use shared_types::{Block, BlockEntry, BlockHeader, ChainId, ADMIN_CHAIN_ID, ZERO_HASH};

    use crate::init_tracing;

    const PAYMENTS_CHAIN: ChainId = [0x50; 32];

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// An admin-chain block carrying a permission grant.
    fn grant_block(height: u32, prev_hash: [u8; 32], grantee: &str) -> Block {
        Block::new(
            BlockHeader::new(ADMIN_CHAIN_ID, height, prev_hash, 1_700_000_000 + u64::from(height)),
            vec![
                BlockEntry::new(0x01, format!("grant:{}", grantee).into_bytes()),
                BlockEntry::new(0x02, b"scope:write".to_vec()),
            ],
        )
    }

    // =============================================================================
    // APPEND
    // =============================================================================

    #[test]
    fn test_append_and_read_back_admin_chain() {
        init_tracing();
        let store = BlockStore::new_in_memory(StorageConfig::default()).unwrap();

        let mut prev = ZERO_HASH;
        let mut written = Vec::new();
        for (height, grantee) in ["alice", "bob", "carol"].iter().enumerate() {
            let block = grant_block(height as u32, prev, grantee);
            prev = store.process_block(Some(&block)).unwrap().unwrap();
            assert_eq!(store.chain_head(&ADMIN_CHAIN_ID).unwrap(), Some(prev));
            written.push(block);
        }
        tracing::info!("appended {} admin blocks", written.len());

        for (height, block) in written.iter().enumerate() {
            assert_eq!(
                store.get_by_height(&ADMIN_CHAIN_ID, height as u32).unwrap().as_ref(),
                Some(block)
            );
        }

        // Each block links to its predecessor's stored hash
        let replay = store.chain_blocks(&ADMIN_CHAIN_ID).unwrap();
        for pair in replay.windows(2) {
            assert_eq!(pair[1].prev_hash(), hash_of(&pair[0]));
        }
        assert_eq!(store.head_block(&ADMIN_CHAIN_ID).unwrap(), written.last().cloned());
    }

    #[test]
    fn test_absent_height_above_head_is_not_found() {
        let store = BlockStore::new_in_memory(StorageConfig::default()).unwrap();
        store.process_blocks(&make_chain(ADMIN_CHAIN_ID, 2)).unwrap();

        assert!(matches!(
            store.get_by_height(&ADMIN_CHAIN_ID, 5),
            Err(StorageError::NotFound { height: 5, .. })
        ));
        assert!(matches!(
            store.get_by_height(&PAYMENTS_CHAIN, 0),
            Err(StorageError::NotFound { .. })
        ));
    }

    // =============================================================================
    // GROUP COMMIT
    // =============================================================================

    #[test]
    fn test_group_commit_across_chains() {
        init_tracing();
        let store = BlockStore::new_in_memory(StorageConfig::default()).unwrap();
        let admin = make_chain(ADMIN_CHAIN_ID, 3);
        let payments = make_chain(PAYMENTS_CHAIN, 2);

        {
            let mut session = store.begin_write();
            for block in admin.iter().chain(payments.iter()) {
                session.stage(Some(block)).unwrap();
            }
            assert_eq!(session.commit().unwrap(), 5);
        }

        assert_eq!(store.chain_blocks(&ADMIN_CHAIN_ID).unwrap(), admin);
        assert_eq!(store.chain_blocks(&PAYMENTS_CHAIN).unwrap(), payments);
        assert_eq!(store.chain_head(&PAYMENTS_CHAIN).unwrap(), Some(hash_of(&payments[1])));
        assert_eq!(store.scan_all().unwrap().len(), 5);
    }

    #[test]
    fn test_scan_can_stop_early() {
        let store = BlockStore::new_in_memory(StorageConfig::default()).unwrap();
        store.process_blocks(&make_chain(ADMIN_CHAIN_ID, 10)).unwrap();

        let mut seen = 0;
        let visited = store
            .scan_blocks(|_, _| {
                seen += 1;
                if seen == 4 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap();
        assert_eq!(visited, 4);
    }

    // =============================================================================
    // FORK ATTEMPTS
    // =============================================================================

    #[test]
    fn test_fork_at_occupied_height_is_refused() {
        init_tracing();
        let store = BlockStore::new_in_memory(StorageConfig::default()).unwrap();
        let genesis = grant_block(0, ZERO_HASH, "alice");
        let genesis_hash = store.process_block(Some(&genesis)).unwrap().unwrap();

        let rival = grant_block(0, ZERO_HASH, "mallory");
        match store.process_block(Some(&rival)) {
            Err(StorageError::Conflict { existing, .. }) => assert_eq!(existing, genesis_hash),
            other => panic!("expected Conflict, got {:?}", other),
        }

        assert_eq!(store.get_by_height(&ADMIN_CHAIN_ID, 0).unwrap(), Some(genesis));
        assert_eq!(store.chain_head(&ADMIN_CHAIN_ID).unwrap(), Some(genesis_hash));
        assert_eq!(store.get_by_hash(&hash_of(&rival)).unwrap(), None);
    }

    #[test]
    fn test_overwrite_policy_moves_height_and_head() {
        let config = StorageConfig::new().with_height_conflict(HeightConflictPolicy::Overwrite);
        let store = BlockStore::new_in_memory(config).unwrap();

        let first = make_test_block(PAYMENTS_CHAIN, 7, ZERO_HASH);
        let second = make_test_block(PAYMENTS_CHAIN, 7, [0x01; 32]);
        store.process_block(Some(&first)).unwrap();
        let second_hash = store.process_block(Some(&second)).unwrap().unwrap();

        assert_eq!(store.get_by_height(&PAYMENTS_CHAIN, 7).unwrap(), Some(second));
        assert_eq!(store.chain_head(&PAYMENTS_CHAIN).unwrap(), Some(second_hash));
        assert!(store.block_exists(&hash_of(&first)).unwrap());
    }
}
