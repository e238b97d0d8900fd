//! # File Lock Implementation
//!
//! Uses `fs2` for cross-platform file locking (flock on Unix, LockFile on Windows).

use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;
use thiserror::Error;

use super::security::{validate_lock_path, DEFAULT_LOCK_TIMEOUT};

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors from database locking
#[derive(Debug, Error)]
pub enum LockError {
    /// Lock file could not be created
    #[error("Failed to create lock file: {0}")]
    CreateFailed(#[source] io::Error),
    /// Data directory is already locked by another holder
    #[error("Database already in use{} ({})", holder_suffix(.pid), .path.display())]
    AlreadyLocked { pid: Option<u32>, path: PathBuf },
    /// Failed to write PID to lock file
    #[error("Failed to write PID to lock file: {0}")]
    WriteFailed(#[source] io::Error),
}

fn holder_suffix(pid: &Option<u32>) -> String {
    pid.map(|p| format!(" by process {}", p)).unwrap_or_default()
}

// =============================================================================
// DATABASE LOCK
// =============================================================================

/// Exclusive lock on a data directory.
///
/// Acquired when a file-backed store is opened, released on drop (RAII).
///
/// # Example
///
/// ```ignore
/// let lock = DatabaseLock::acquire(Path::new("/data/ledger"))?;
/// // Lock is held until `lock` goes out of scope
/// ```
#[derive(Debug)]
pub struct DatabaseLock {
    /// The lock file handle (kept open to maintain lock)
    file: File,
    /// Path to the lock file
    path: PathBuf,
    /// PID of this process
    pid: u32,
}

impl DatabaseLock {
    /// Lock file name
    const LOCK_FILE: &'static str = "LOCK";

    /// Acquire an exclusive lock, waiting up to `DEFAULT_LOCK_TIMEOUT`.
    pub fn acquire(data_dir: &Path) -> Result<Self, LockError> {
        Self::acquire_with_timeout(data_dir, DEFAULT_LOCK_TIMEOUT)
    }

    /// Acquire an exclusive lock on the data directory.
    ///
    /// Retries with exponential backoff until `timeout` expires. Only the
    /// flock decides ownership: the kernel drops it when the holder exits,
    /// so a LOCK file left by a crashed process is simply locked again.
    /// The file is never removed, whatever its age or recorded PID.
    ///
    /// # Errors
    ///
    /// Returns `LockError::AlreadyLocked` if the lock is still held when the
    /// timeout expires.
    pub fn acquire_with_timeout(data_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let deadline = Instant::now() + timeout;
        let lock_path = data_dir.join(Self::LOCK_FILE);
        let mut retry_delay = Duration::from_millis(50);

        loop {
            if lock_path.exists() && !validate_lock_path(data_dir, &lock_path) {
                return Err(LockError::CreateFailed(io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "Lock path escapes data directory",
                )));
            }

            // Not truncated here: the current holder's PID must stay readable.
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .read(true)
                .write(true)
                .open(&lock_path)
                .map_err(LockError::CreateFailed)?;

            match file.try_lock_exclusive() {
                Ok(()) => {
                    let pid = std::process::id();
                    let mut locked_file = file;
                    Self::write_pid(&mut locked_file, pid).map_err(LockError::WriteFailed)?;

                    return Ok(Self {
                        file: locked_file,
                        path: lock_path,
                        pid,
                    });
                }
                Err(_) => {
                    if Instant::now() >= deadline {
                        return Err(LockError::AlreadyLocked {
                            pid: Self::read_existing_pid(&lock_path),
                            path: lock_path,
                        });
                    }

                    // Exponential backoff, capped at 500ms
                    drop(file);
                    std::thread::sleep(retry_delay);
                    retry_delay = (retry_delay * 2).min(Duration::from_millis(500));
                }
            }
        }
    }

    fn write_pid(file: &mut File, pid: u32) -> io::Result<()> {
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        writeln!(file, "{}", pid)?;
        file.sync_all()
    }

    /// Get the PID of the process holding the lock
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Get the path to the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read PID from existing lock file (for error messages)
    fn read_existing_pid(path: &Path) -> Option<u32> {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
    }
}

impl Drop for DatabaseLock {
    fn drop(&mut self) {
        // The file stays: a waiter may already hold a handle to this inode.
        let _ = FileExt::unlock(&self.file);
    }
}
