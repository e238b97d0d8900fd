//! # Shared Types Crate
//!
//! Value types shared between the block store and the code that produces
//! and consumes blocks.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Block` and its identifiers are defined here.
//! - **No Persistence Logic**: key layout, hashing and encoding belong to
//!   `block-store`; this crate only carries data.

pub mod entities;

pub use entities::*;
