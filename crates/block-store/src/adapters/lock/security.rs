//! # Lock Security
//!
//! Timeouts and sanity checks used while acquiring a `DatabaseLock`.
//!
//! - Acquisition never blocks indefinitely
//! - The lock file must resolve inside the data directory

use std::path::Path;
use std::time::Duration;

/// How long `DatabaseLock::acquire` waits for a held lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Whether `lock_path` resolves to a location inside `data_dir`.
///
/// Rejects lock files that are symlinks pointing elsewhere.
pub fn validate_lock_path(data_dir: &Path, lock_path: &Path) -> bool {
    lock_path
        .canonicalize()
        .ok()
        .and_then(|canonical| {
            data_dir
                .canonicalize()
                .ok()
                .map(|data_canonical| canonical.starts_with(&data_canonical))
        })
        .unwrap_or(false)
}
