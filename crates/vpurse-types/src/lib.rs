//! VPurse Types - Canonical types for the controller <-> bank bridge
//!
//! This crate contains the foundational types shared by the ledger interface,
//! the protocol core and the host service, with zero dependencies on other
//! vpurse crates:
//!
//! - Identity types (AccountAddress, ModuleName, Denom)
//! - Coin and multi-denomination Coins with decimal-string amounts
//! - Wire message shapes exchanged with the controller
//! - The error taxonomy surfaced to the controller
//!
//! # Wire invariants
//!
//! 1. Field names on the wire are fixed and exact
//! 2. Amounts travel as decimal strings, never as JSON numbers
//! 3. Identifiers are opaque and compared by exact string match

pub mod identity;
pub mod coin;
pub mod message;
pub mod error;

pub use identity::*;
pub use coin::*;
pub use message::*;
pub use error::*;

/// Version of the VPurse wire schema
pub const WIRE_VERSION: &str = "0.1.0";
