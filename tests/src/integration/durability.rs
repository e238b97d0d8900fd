//! # Durability
//!
//! File-backed stores across process-like lifecycles: close and reopen,
//! exclusive directory locking, damaged bytes on disk and engine failures.

#[cfg(test)]
mod tests {
    use std::fs::OpenOptions;
    use std::time::{Duration, SystemTime};

    use block_store::adapters::storage::DATA_FILE;
    use block_store::domain::keys;
    use block_store::test_utils::{hash_of, make_chain, FaultyKVStore};
    use block_store::{
        BincodeBlockSerializer, BlockReaderApi, BlockSerializer, BlockStore,
        BlockStoreDependencies, BlockWriterApi, FileBackedKVStore, KVStoreError, KeyValueStore,
        StorageConfig, StorageError,
    };
    use block_store::ports::outbound::BatchOperation;
    use shared_types::{ChainId, ADMIN_CHAIN_ID};
    use tempfile::TempDir;

    use crate::init_tracing;

    const AUDIT_CHAIN: ChainId = [0xA0; 32];

    #[test]
    fn test_committed_blocks_survive_reopen() {
        init_tracing();
        let dir = TempDir::new().unwrap();
        let chain = make_chain(ADMIN_CHAIN_ID, 5);

        {
            let store = BlockStore::open_dir(dir.path(), StorageConfig::default()).unwrap();
            store.process_blocks(&chain[..3]).unwrap();
            store.process_block(Some(&chain[3])).unwrap();
            store.process_block(Some(&chain[4])).unwrap();
        }

        let store = BlockStore::open_dir(dir.path(), StorageConfig::default()).unwrap();
        assert_eq!(store.chain_blocks(&ADMIN_CHAIN_ID).unwrap(), chain);
        assert_eq!(store.chain_head(&ADMIN_CHAIN_ID).unwrap(), Some(hash_of(&chain[4])));
        assert_eq!(store.scan_all().unwrap().len(), 5);
    }

    #[test]
    fn test_uncommitted_session_is_not_persisted() {
        let dir = TempDir::new().unwrap();
        let chain = make_chain(AUDIT_CHAIN, 2);

        {
            let store = BlockStore::open_dir(dir.path(), StorageConfig::default()).unwrap();
            store.process_block(Some(&chain[0])).unwrap();
            let mut session = store.begin_write();
            session.stage(Some(&chain[1])).unwrap();
            // dropped without commit
        }

        let store = BlockStore::open_dir(dir.path(), StorageConfig::default()).unwrap();
        assert_eq!(store.chain_blocks(&AUDIT_CHAIN).unwrap(), vec![chain[0].clone()]);
    }

    #[test]
    fn test_second_handle_on_same_directory_is_locked_out() {
        let dir = TempDir::new().unwrap();
        let _first = BlockStore::open_dir(dir.path(), StorageConfig::default()).unwrap();

        let second = FileBackedKVStore::open_in_dir_with_timeout(dir.path(), Duration::from_millis(100));
        assert!(matches!(second, Err(KVStoreError::Locked { .. })));
    }

    #[test]
    fn test_old_lock_file_does_not_let_second_handle_in() {
        init_tracing();
        let dir = TempDir::new().unwrap();
        let first = BlockStore::open_dir(dir.path(), StorageConfig::default()).unwrap();

        let lock_file = OpenOptions::new().write(true).open(dir.path().join("LOCK")).unwrap();
        lock_file
            .set_modified(SystemTime::now() - Duration::from_secs(25 * 3600))
            .unwrap();

        let second = BlockStore::open_dir_with_timeout(
            dir.path(),
            StorageConfig::default(),
            Duration::from_millis(100),
        );
        assert!(matches!(second, Err(StorageError::DatabaseLocked { .. })));

        // The first handle is still the only writer
        let chain = make_chain(AUDIT_CHAIN, 2);
        first.process_blocks(&chain).unwrap();
        drop(first);

        let reopened = BlockStore::open_dir(dir.path(), StorageConfig::default()).unwrap();
        assert_eq!(reopened.chain_blocks(&AUDIT_CHAIN).unwrap(), chain);
    }

    #[test]
    fn test_open_dir_on_a_file_names_the_path() {
        let dir = TempDir::new().unwrap();
        let not_a_dir = dir.path().join("ledger");
        std::fs::write(&not_a_dir, b"plain file").unwrap();

        match BlockStore::open_dir(&not_a_dir, StorageConfig::default()) {
            Err(err @ StorageError::Open { .. }) => {
                assert!(err.to_string().contains(&not_a_dir.display().to_string()));
            }
            Err(other) => panic!("expected Open, got {other:?}"),
            Ok(_) => panic!("opened a store over a plain file"),
        }
    }

    #[test]
    fn test_lock_is_released_when_store_drops() {
        let dir = TempDir::new().unwrap();
        drop(BlockStore::open_dir(dir.path(), StorageConfig::default()).unwrap());

        let reopened = FileBackedKVStore::open_in_dir_with_timeout(dir.path(), Duration::from_millis(100));
        assert!(reopened.is_ok());
    }

    #[test]
    fn test_tampered_record_on_disk_is_detected() {
        init_tracing();
        let dir = TempDir::new().unwrap();
        let chain = make_chain(ADMIN_CHAIN_ID, 2);

        {
            let store = BlockStore::open_dir(dir.path(), StorageConfig::default()).unwrap();
            store.process_blocks(&chain).unwrap();
        }

        // Swap block 0's bytes for block 1's under block 0's key
        {
            let mut raw = FileBackedKVStore::open(dir.path().join(DATA_FILE)).unwrap();
            let encoded = BincodeBlockSerializer.serialize(&chain[1]).unwrap();
            raw.atomic_batch_write(vec![BatchOperation::put(
                keys::primary_key(&hash_of(&chain[0])),
                encoded,
            )])
            .unwrap();
        }

        let store = BlockStore::open_dir(dir.path(), StorageConfig::default()).unwrap();
        assert!(matches!(store.scan_all(), Err(StorageError::Corruption { .. })));
    }

    #[test]
    fn test_garbage_record_on_disk_is_deserialization_error() {
        let dir = TempDir::new().unwrap();
        let bogus = [0x0F; 32];
        {
            let mut raw = FileBackedKVStore::open(dir.path().join(DATA_FILE)).unwrap();
            raw.atomic_batch_write(vec![BatchOperation::put(
                keys::primary_key(&bogus),
                b"not a block".to_vec(),
            )])
            .unwrap();
        }

        let store = BlockStore::open_dir(dir.path(), StorageConfig::default()).unwrap();
        assert!(matches!(
            store.get_by_hash(&bogus),
            Err(StorageError::Deserialization { .. })
        ));
    }

    #[test]
    fn test_failed_engine_write_leaves_store_consistent() {
        init_tracing();
        let (kv_store, switch) = FaultyKVStore::with_switch();
        let store = BlockStore::new(
            BlockStoreDependencies {
                kv_store,
                serializer: BincodeBlockSerializer,
            },
            StorageConfig::default(),
        )
        .unwrap();
        let chain = make_chain(ADMIN_CHAIN_ID, 3);

        store.process_block(Some(&chain[0])).unwrap();
        switch.fail_writes(true);
        assert!(matches!(
            store.process_blocks(&chain[1..]),
            Err(StorageError::StoreWrite { .. })
        ));
        switch.fail_writes(false);

        assert_eq!(store.chain_blocks(&ADMIN_CHAIN_ID).unwrap(), vec![chain[0].clone()]);
        assert_eq!(store.chain_head(&ADMIN_CHAIN_ID).unwrap(), Some(hash_of(&chain[0])));

        // Retrying the same blocks succeeds from a clean slate
        store.process_blocks(&chain[1..]).unwrap();
        assert_eq!(store.chain_blocks(&ADMIN_CHAIN_ID).unwrap(), chain);
    }
}
