//! # Domain Layer
//!
//! Pure domain logic for the block store. No engine or codec specifics.
//!
//! ## Modules
//!
//! - `keys` - Key schema: table tags, key builders, scan ranges
//! - `batch` - In-flight batch of derived writes
//! - `config` - Storage configuration
//! - `errors` - Domain error types

pub mod batch;
pub mod config;
pub mod errors;
pub mod keys;
