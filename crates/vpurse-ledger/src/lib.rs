//! VPurse Ledger - Bank operations consumed by the bridge
//!
//! The bridge never does its own accounting. It talks to the bank through the
//! narrow [`BankKeeper`] interface:
//!
//! - Mint / burn against a module account
//! - Transfers account -> module, module -> account, module -> module
//! - Single-denomination and all-denomination balance lookups
//!
//! # Invariants
//!
//! 1. Each call is atomic: it either applies completely or not at all
//! 2. No negative balances
//! 3. A balance lookup for an unknown account or denom is zero, not an error
//!
//! [`InMemoryBank`] is the reference implementation used by the host service
//! and by end-to-end tests.

pub mod memory;

pub use memory::InMemoryBank;

use thiserror::Error;
use vpurse_types::{AccountAddress, Coin, Coins, Denom, ModuleName};

/// Errors that can occur in bank operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Insufficient balance in {holder}: have {available}{denom}, need {required}{denom}")]
    InsufficientBalance {
        holder: String,
        denom: String,
        available: u128,
        required: u128,
    },

    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("Bank unavailable: {message}")]
    Unavailable { message: String },
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// The bank operations the bridge depends on
///
/// Implementations must be atomic per call. The bridge performs no retries
/// and no compensation when a call fails.
pub trait BankKeeper: Send + Sync {
    /// Create `amt` in the module account
    fn mint_coins(&self, module: &ModuleName, amt: &Coins) -> Result<()>;

    /// Destroy `amt` held by the module account; fails if insufficient
    fn burn_coins(&self, module: &ModuleName, amt: &Coins) -> Result<()>;

    fn send_coins_from_account_to_module(
        &self,
        sender: &AccountAddress,
        recipient_module: &ModuleName,
        amt: &Coins,
    ) -> Result<()>;

    fn send_coins_from_module_to_account(
        &self,
        sender_module: &ModuleName,
        recipient: &AccountAddress,
        amt: &Coins,
    ) -> Result<()>;

    fn send_coins_from_module_to_module(
        &self,
        sender_module: &ModuleName,
        recipient_module: &ModuleName,
        amt: &Coins,
    ) -> Result<()>;

    /// Current balance of one denom (zero if none)
    fn get_balance(&self, addr: &AccountAddress, denom: &Denom) -> Result<Coin>;

    /// Every non-zero balance held by the account
    fn get_all_balances(&self, addr: &AccountAddress) -> Result<Coins>;
}
