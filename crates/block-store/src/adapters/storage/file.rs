use crate::adapters::storage::memory::btree_bounds;
use crate::domain::errors::KVStoreError;
use crate::domain::keys::KeyRange;
use crate::ports::outbound::{BatchOperation, KeyValueStore, KvIter};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(feature = "locking")]
use crate::adapters::lock::{DatabaseLock, LockError, DEFAULT_LOCK_TIMEOUT};
#[cfg(feature = "locking")]
use std::time::Duration;

/// File name used by `FileBackedKVStore::open_in_dir`.
pub const DATA_FILE: &str = "blocks.db";

/// File-backed ordered key-value store for deployments without RocksDB.
///
/// The whole map lives in memory and is rewritten to disk on every write
/// via temp file + rename, so a batch is either fully on disk or not at all.
///
/// File format: repeated `[key_len: u32 LE][key][value_len: u32 LE][value]`.
pub struct FileBackedKVStore {
    data: BTreeMap<Vec<u8>, Vec<u8>>,
    path: PathBuf,
    #[cfg(feature = "locking")]
    _lock: Option<DatabaseLock>,
}

impl FileBackedKVStore {
    /// Open (or create) a store backed by the file at `path`.
    ///
    /// No process lock is taken; use `open_in_dir` for that.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, KVStoreError> {
        let path = path.as_ref().to_path_buf();
        let data = Self::load_from_file(&path)?;

        Ok(Self {
            data,
            path,
            #[cfg(feature = "locking")]
            _lock: None,
        })
    }

    /// Open the store inside `data_dir`, holding an exclusive process lock
    /// on the directory for the lifetime of the store.
    #[cfg(feature = "locking")]
    pub fn open_in_dir<P: AsRef<Path>>(data_dir: P) -> Result<Self, KVStoreError> {
        Self::open_in_dir_with_timeout(data_dir, DEFAULT_LOCK_TIMEOUT)
    }

    /// Like `open_in_dir`, giving up on a held lock after `timeout`.
    #[cfg(feature = "locking")]
    pub fn open_in_dir_with_timeout<P: AsRef<Path>>(
        data_dir: P,
        timeout: Duration,
    ) -> Result<Self, KVStoreError> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir).map_err(io_error)?;

        let lock = DatabaseLock::acquire_with_timeout(data_dir, timeout).map_err(|e| match e {
            LockError::AlreadyLocked { .. } => KVStoreError::Locked {
                message: e.to_string(),
            },
            other => KVStoreError::Io {
                message: other.to_string(),
            },
        })?;

        let mut store = Self::open(data_dir.join(DATA_FILE))?;
        store._lock = Some(lock);
        Ok(store)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn load_from_file(path: &Path) -> Result<BTreeMap<Vec<u8>, Vec<u8>>, KVStoreError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                #[cfg(feature = "tracing-log")]
                tracing::info!("[block-store] 📁 No existing storage file at {}", path.display());
                return Ok(BTreeMap::new());
            }
            Err(e) => return Err(io_error(e)),
        };

        let (data, complete) = decode_records(&bytes);

        #[cfg(feature = "tracing-log")]
        {
            tracing::info!(
                "[block-store] 💾 Loaded {} keys from {} ({} bytes)",
                data.len(),
                path.display(),
                bytes.len()
            );
            if !complete {
                tracing::warn!(
                    "[block-store] Ignoring truncated trailing record in {}",
                    path.display()
                );
            }
        }
        #[cfg(not(feature = "tracing-log"))]
        let _ = complete;

        Ok(data)
    }

    fn save_to_file(&self, data: &BTreeMap<Vec<u8>, Vec<u8>>) -> Result<(), KVStoreError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }

        let bytes = encode_records(data);

        // Replace atomically via temp file
        let temp_path = self.path.with_extension("tmp");
        let mut file = std::fs::File::create(&temp_path).map_err(io_error)?;
        file.write_all(&bytes).map_err(io_error)?;
        file.sync_all().map_err(io_error)?;

        std::fs::rename(&temp_path, &self.path).map_err(io_error)?;

        Ok(())
    }

    /// Persist `next` and only then make it the live map.
    fn commit_map(&mut self, next: BTreeMap<Vec<u8>, Vec<u8>>) -> Result<(), KVStoreError> {
        self.save_to_file(&next)?;
        self.data = next;
        Ok(())
    }
}

fn io_error(e: std::io::Error) -> KVStoreError {
    KVStoreError::Io {
        message: e.to_string(),
    }
}

fn encode_records(data: &BTreeMap<Vec<u8>, Vec<u8>>) -> Vec<u8> {
    let size: usize = data.iter().map(|(k, v)| 8 + k.len() + v.len()).sum();
    let mut bytes = Vec::with_capacity(size);
    for (key, value) in data {
        bytes.extend_from_slice(&(key.len() as u32).to_le_bytes());
        bytes.extend_from_slice(key);
        bytes.extend_from_slice(&(value.len() as u32).to_le_bytes());
        bytes.extend_from_slice(value);
    }
    bytes
}

/// Decode records; the flag is false when a truncated tail was dropped.
fn decode_records(bytes: &[u8]) -> (BTreeMap<Vec<u8>, Vec<u8>>, bool) {
    let mut data = BTreeMap::new();
    let mut cursor = 0;

    while cursor < bytes.len() {
        let Some((key, next)) = read_field(bytes, cursor) else {
            return (data, false);
        };
        let Some((value, next)) = read_field(bytes, next) else {
            return (data, false);
        };
        data.insert(key.to_vec(), value.to_vec());
        cursor = next;
    }

    (data, true)
}

/// Read one length-prefixed field at `cursor`, returning it and the next offset.
fn read_field(bytes: &[u8], cursor: usize) -> Option<(&[u8], usize)> {
    let len_end = cursor.checked_add(4)?;
    let len_bytes: [u8; 4] = bytes.get(cursor..len_end)?.try_into().ok()?;
    let len = u32::from_le_bytes(len_bytes) as usize;
    let end = len_end.checked_add(len)?;
    Some((bytes.get(len_end..end)?, end))
}

impl KeyValueStore for FileBackedKVStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, KVStoreError> {
        Ok(self.data.get(key).cloned())
    }

    fn exists(&self, key: &[u8]) -> Result<bool, KVStoreError> {
        Ok(self.data.contains_key(key))
    }

    fn atomic_batch_write(&mut self, operations: Vec<BatchOperation>) -> Result<(), KVStoreError> {
        let mut next = self.data.clone();
        for op in operations {
            next.insert(op.key, op.value);
        }
        self.commit_map(next)
    }

    fn range_scan(&self, range: &KeyRange) -> Result<KvIter<'_>, KVStoreError> {
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
