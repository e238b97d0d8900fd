//! # Ports Layer
//!
//! Defines the port traits for the block store.
//!
//! ## Hexagonal Architecture
//!
//! - `inbound.rs` - Driving ports (API exposed to callers)
//! - `outbound.rs` - Driven ports (engine and codec the store depends on)

pub mod inbound;
pub mod outbound;
