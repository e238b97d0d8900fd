//! # Data Directory Locking
//!
//! Keeps two processes from opening the same file-backed block store.
//!
//! ## Modules
//!
//! - `flock`: `DatabaseLock` built on fs2 advisory locks
//! - `security`: acquisition timeout, lock path validation

mod flock;
mod security;

pub use flock::{DatabaseLock, LockError};
pub use security::DEFAULT_LOCK_TIMEOUT;
