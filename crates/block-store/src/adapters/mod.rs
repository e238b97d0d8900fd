//! # Adapters Module
//!
//! Concrete implementations of the outbound ports.
//!
//! ## Modules
//!
//! - `storage`: `KeyValueStore` engines
//! - `serializer`: `BlockSerializer` codecs
//! - `lock`: data directory locking (feature `locking`)

#[cfg(feature = "locking")]
pub mod lock;
pub mod serializer;
pub mod storage;

#[cfg(feature = "locking")]
pub use lock::{DatabaseLock, LockError};
pub use serializer::BincodeBlockSerializer;
pub use storage::{FileBackedKVStore, InMemoryKVStore};
#[cfg(feature = "rocksdb")]
pub use storage::{RocksDbConfig, RocksDbStore};
