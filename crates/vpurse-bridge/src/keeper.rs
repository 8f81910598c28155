//! Keeper - orchestrates bank calls on behalf of the controller
//!
//! Every multi-step operation runs its steps in a fixed order and stops at
//! the first failing call. Steps that already succeeded stay applied: the
//! bank owns atomicity and rollback, the keeper only reports which step broke.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, info};
use vpurse_ledger::{BankKeeper, LedgerError};
use vpurse_types::{AccountAddress, Coin, Coins, Denom, ModuleName, Result, VpurseError};

use crate::controller::{ControllerChannel, NoopController};
use crate::encoder::marshal_balance_update;

/// Holding account used to stage mint-then-credit and debit-then-burn
pub const DEFAULT_MODULE_ACCOUNT: &str = "vpurse";
/// Module account receiving fee payments
pub const DEFAULT_FEE_COLLECTOR: &str = "fee_collector";

fn ledger_failed(operation: &'static str) -> impl FnOnce(LedgerError) -> VpurseError {
    move |err| VpurseError::ledger(operation, err)
}

/// Bridge-side view of the bank
#[derive(Clone)]
pub struct Keeper {
    bank: Arc<dyn BankKeeper>,
    module_account: ModuleName,
    fee_collector: ModuleName,
    controller: Arc<dyn ControllerChannel>,
}

impl Keeper {
    /// Create a keeper with the default module accounts and no controller
    pub fn new(bank: Arc<dyn BankKeeper>) -> Self {
        Self {
            bank,
            module_account: ModuleName::from(DEFAULT_MODULE_ACCOUNT),
            fee_collector: ModuleName::from(DEFAULT_FEE_COLLECTOR),
            controller: Arc::new(NoopController),
        }
    }

    /// Override the holding account
    pub fn with_module_account(mut self, module_account: ModuleName) -> Self {
        self.module_account = module_account;
        self
    }

    /// Override the fee collector account
    pub fn with_fee_collector(mut self, fee_collector: ModuleName) -> Self {
        self.fee_collector = fee_collector;
        self
    }

    /// Route outbound notifications through `controller`
    pub fn with_controller(mut self, controller: Arc<dyn ControllerChannel>) -> Self {
        self.controller = controller;
        self
    }

    pub fn module_account(&self) -> &ModuleName {
        &self.module_account
    }

    pub fn fee_collector(&self) -> &ModuleName {
        &self.fee_collector
    }

    pub fn get_balance(&self, addr: &AccountAddress, denom: &Denom) -> Result<Coin> {
        self.bank
            .get_balance(addr, denom)
            .map_err(ledger_failed("GetBalance"))
    }

    pub fn get_all_balances(&self, addr: &AccountAddress) -> Result<Coins> {
        self.bank
            .get_all_balances(addr)
            .map_err(ledger_failed("GetAllBalances"))
    }

    /// Mint `coin` into the holding account and credit it to `recipient`
    ///
    /// Returns the recipient's resulting balance of that denom.
    pub fn give(&self, recipient: &AccountAddress, coin: &Coin) -> Result<Coin> {
        let amt = Coins::single(coin.clone());
        self.bank
            .mint_coins(&self.module_account, &amt)
            .map_err(ledger_failed("MintCoins"))?;
        self.bank
            .send_coins_from_module_to_account(&self.module_account, recipient, &amt)
            .map_err(ledger_failed("SendCoinsFromModuleToAccount"))?;
        debug!(recipient = %recipient, amount = %coin, "gave");
        self.get_balance(recipient, &coin.denom)
    }

    /// Debit `coin` from `sender` into the holding account and burn it
    ///
    /// Returns the sender's resulting balance of that denom.
    pub fn grab(&self, sender: &AccountAddress, coin: &Coin) -> Result<Coin> {
        let amt = Coins::single(coin.clone());
        self.bank
            .send_coins_from_account_to_module(sender, &self.module_account, &amt)
            .map_err(ledger_failed("SendCoinsFromAccountToModule"))?;
        self.bank
            .burn_coins(&self.module_account, &amt)
            .map_err(ledger_failed("BurnCoins"))?;
        debug!(sender = %sender, amount = %coin, "grabbed");
        self.get_balance(sender, &coin.denom)
    }

    /// Mint `coin` into the holding account and move it to the fee collector
    pub fn give_to_fee_collector(&self, coin: &Coin) -> Result<()> {
        let amt = Coins::single(coin.clone());
        self.bank
            .mint_coins(&self.module_account, &amt)
            .map_err(ledger_failed("MintCoins"))?;
        self.bank
            .send_coins_from_module_to_module(&self.module_account, &self.fee_collector, &amt)
            .map_err(ledger_failed("SendCoinsFromModuleToModule"))?;
        debug!(fee_collector = %self.fee_collector, amount = %coin, "paid fee collector");
        Ok(())
    }

    /// Broadcast the current balance of each changed `(account, denom)` pair
    ///
    /// Balances are re-read so that pairs which dropped to zero are reported
    /// explicitly. Returns `false` when there was nothing to send.
    pub fn push_balance_updates<I>(&self, changes: I) -> Result<bool>
    where
        I: IntoIterator<Item = (AccountAddress, Denom)>,
    {
        let changes: BTreeSet<_> = changes.into_iter().collect();

        let mut address_to_balance: BTreeMap<AccountAddress, Coins> = BTreeMap::new();
        for (address, denom) in changes {
            let balance = self.get_balance(&address, &denom)?;
            address_to_balance.entry(address).or_default().insert(balance);
        }

        let Some(payload) = marshal_balance_update(&address_to_balance)? else {
            return Ok(false);
        };
        self.controller.call(&payload)?;
        info!(accounts = address_to_balance.len(), "pushed balance update");
        Ok(true)
    }
}
