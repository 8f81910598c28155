//! Shared test doubles

#![allow(dead_code)]

use parking_lot::Mutex;
use vpurse_ledger::{BankKeeper, LedgerError, Result};
use vpurse_types::{AccountAddress, Coin, Coins, Denom, ModuleName};

pub const ADDR1: &str = "agoric1qqqsyqcyq5rqwzqfpg9scrgwpugpzysn7j8mle";

/// Bank stub that records every call and answers queries with fixed values
#[derive(Default)]
pub struct RecordingBank {
    pub calls: Mutex<Vec<String>>,
    pub balance: Option<Coin>,
    pub all_balances: Coins,
    /// Operation name that should fail instead of succeeding
    pub fail_on: Option<&'static str>,
}

impl RecordingBank {
    pub fn with_balance(denom: &str, amount: u128) -> Self {
        Self {
            balance: Some(Coin::new(denom, amount)),
            ..Default::default()
        }
    }

    pub fn failing_on(mut self, operation: &'static str) -> Self {
        self.fail_on = Some(operation);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, operation: &'static str, detail: String) -> Result<()> {
        self.calls.lock().push(format!("{} {}", operation, detail));
        if self.fail_on == Some(operation) {
            return Err(LedgerError::Unavailable {
                message: format!("{} refused", operation),
            });
        }
        Ok(())
    }
}

impl BankKeeper for RecordingBank {
    fn mint_coins(&self, module: &ModuleName, amt: &Coins) -> Result<()> {
        self.record("MintCoins", format!("{} {}", module, amt))
    }

    fn burn_coins(&self, module: &ModuleName, amt: &Coins) -> Result<()> {
        self.record("BurnCoins", format!("{} {}", module, amt))
    }

    fn send_coins_from_account_to_module(
        &self,
        sender: &AccountAddress,
        recipient_module: &ModuleName,
        amt: &Coins,
    ) -> Result<()> {
        self.record(
            "SendCoinsFromAccountToModule",
            format!("{} {} {}", sender, recipient_module, amt),
        )
    }

    fn send_coins_from_module_to_account(
        &self,
        sender_module: &ModuleName,
        recipient: &AccountAddress,
        amt: &Coins,
    ) -> Result<()> {
        self.record(
            "SendCoinsFromModuleToAccount",
            format!("{} {} {}", sender_module, recipient, amt),
        )
    }

    fn send_coins_from_module_to_module(
        &self,
        sender_module: &ModuleName,
        recipient_module: &ModuleName,
        amt: &Coins,
    ) -> Result<()> {
        self.record(
            "SendCoinsFromModuleToModule",
            format!("{} {} {}", sender_module, recipient_module, amt),
        )
    }

    fn get_balance(&self, addr: &AccountAddress, denom: &Denom) -> Result<Coin> {
        self.record("GetBalance", format!("{} {}", addr, denom))?;
        Ok(self
            .balance
            .clone()
            .unwrap_or_else(|| Coin::zero(denom.clone())))
    }

    fn get_all_balances(&self, addr: &AccountAddress) -> Result<Coins> {
        self.record("GetAllBalances", addr.to_string())?;
        Ok(self.all_balances.clone())
    }
}
