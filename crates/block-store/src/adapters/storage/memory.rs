use crate::domain::errors::KVStoreError;
use crate::domain::keys::KeyRange;
use crate::ports::outbound::{BatchOperation, KeyValueStore, KvIter};
use std::collections::BTreeMap;
use std::ops::Bound;

/// In-memory ordered key-value store for unit tests and embedding.
///
/// Batches are applied under `&mut self`, so no reader can observe one
/// half-applied.
#[derive(Default)]
pub struct InMemoryKVStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl InMemoryKVStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Translate a `KeyRange` into `BTreeMap` range bounds.
pub(crate) fn btree_bounds(range: &KeyRange) -> (Bound<Vec<u8>>, Bound<Vec<u8>>) {
    let end = match &range.end {
        Some(end) => Bound::Excluded(end.clone()),
        None => Bound::Unbounded,
    };
    (Bound::Included(range.start.clone()), end)
}

impl KeyValueStore for InMemoryKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        Ok(self.data.contains_key(key))
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        for op in operations {
            self.data.insert(op.key, op.value);
        }
        Ok(())
    }

    fn range_scan(&self, range: &KeyRange) -> Result<KvIter<'_>, KVStoreError> {
        // BTreeMap::range panics on inverted bounds
        if range.end.as_ref().is_some_and(|end| *end <= range.start) {
            return Ok(Box::new(std::iter::empty()));
        }
        let iter = self
            .data
            .range(btree_bounds(range))
            .map(|(k, v)| Ok((k.clone(), v.clone())));
        Ok(Box::new(iter))
    }
}
