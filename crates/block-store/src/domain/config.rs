//! # Storage Configuration
//!
//! Builder-style configuration for the block store. All values have
//! defaults suitable for production use.

use crate::domain::errors::StorageError;

/// Upper bound accepted for `max_block_size` (256 MB).
pub const MAX_BLOCK_SIZE_LIMIT: usize = 256 * 1024 * 1024;

/// What to do when a height slot already maps to a different block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeightConflictPolicy {
    /// Fail the stage with `StorageError::Conflict` (default).
    #[default]
    Reject,
    /// Blindly overwrite the height index entry. The earlier block stays
    /// reachable by hash but is no longer reachable by height.
    Overwrite,
}

/// Configuration for the block store.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Maximum encoded block size in bytes (default: 10MB).
    pub max_block_size: usize,

    /// Height index occupancy policy (default: `Reject`).
    pub height_conflict: HeightConflictPolicy,

    /// Recompute each block's content hash during scans and compare it
    /// with the key suffix (default: true).
    pub verify_scan_hashes: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_block_size: 10 * 1024 * 1024, // 10 MB
            height_conflict: HeightConflictPolicy::Reject,
            verify_scan_hashes: true,
        }
    }
}

impl StorageConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum encoded block size.
    pub fn with_max_block_size(mut self, size: usize) -> Self {
        self.max_block_size = size;
        self
    }

    /// Set the height occupancy policy.
    pub fn with_height_conflict(mut self, policy: HeightConflictPolicy) -> Self {
        self.height_conflict = policy;
        self
    }

    /// Enable or disable hash verification during scans.
    pub fn with_verify_scan_hashes(mut self, verify: bool) -> Self {
        self.verify_scan_hashes = verify;
        self
    }

    /// Validate all configuration parameters.
    pub fn validate(&self) -> Result<(), StorageError> {
        if self.max_block_size == 0 || self.max_block_size > MAX_BLOCK_SIZE_LIMIT {
            return Err(StorageError::InvalidConfig {
                reason: format!(
                    "max_block_size must be in [1, {}], got {}",
                    MAX_BLOCK_SIZE_LIMIT, self.max_block_size
                ),
            });
        }
        Ok(())
    }
}
