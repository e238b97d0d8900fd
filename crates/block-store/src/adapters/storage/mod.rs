//! Storage Adapters
//!
//! Implementations of the `KeyValueStore` trait.
//!
//! - `InMemoryKVStore`: tests and embedding
//! - `FileBackedKVStore`: single-file persistence without native deps
//! - `RocksDbStore`: production engine (feature `rocksdb`)

mod file;
mod memory;
#[cfg(feature = "rocksdb")]
mod rocksdb;

pub use file::{FileBackedKVStore, DATA_FILE};
pub use memory::InMemoryKVStore;
#[cfg(feature = "rocksdb")]
pub use self::rocksdb::{RocksDbConfig, RocksDbStore};
