//! VPurse Bridge - Message bridge between the VM controller and the bank
//!
//! The controller sends typed JSON requests; the bridge validates them,
//! drives the bank through [`vpurse_ledger::BankKeeper`] and answers with
//! either a direct value or a `VPURSE_BALANCE_UPDATE` notification.
//!
//! ```text
//! ControllerChannel -> PortHandler -> Keeper -> BankKeeper
//!                                        \-> marshal_balance_update -> response
//! ```
//!
//! # Invariants
//!
//! 1. Validation happens before any ledger call: discriminator, then fields
//! 2. The first failing ledger call aborts the sequence; nothing is rolled back here
//! 3. Every emitted balance update carries a fresh, strictly larger nonce
//! 4. No state survives a call except the process-wide nonce counter

pub mod controller;
pub mod encoder;
pub mod handler;
pub mod keeper;
pub mod nonce;
pub mod request;

pub use controller::{ControllerChannel, NoopController};
pub use encoder::marshal_balance_update;
pub use handler::PortHandler;
pub use keeper::{Keeper, DEFAULT_FEE_COLLECTOR, DEFAULT_MODULE_ACCOUNT};
pub use nonce::current_nonce;
pub use request::Request;

pub use vpurse_types::{Result, VpurseError};
