//! In-memory bank
//!
//! Balances are keyed by holder (user account or module account) and denom.
//! All state sits behind a single lock so every [`BankKeeper`] call is atomic.
//! Multi-coin operations validate every coin before applying any of them.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;
use vpurse_types::{AccountAddress, Coin, Coins, Denom, ModuleName};

use crate::{BankKeeper, LedgerError, Result};

/// Owner of a balance
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Holder {
    Account(AccountAddress),
    Module(ModuleName),
}

impl fmt::Display for Holder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Holder::Account(addr) => write!(f, "{}", addr),
            Holder::Module(name) => write!(f, "module {}", name),
        }
    }
}

#[derive(Default)]
struct BankState {
    balances: HashMap<Holder, HashMap<Denom, u128>>,
    /// Account balances changed since the last drain
    dirty: BTreeSet<(AccountAddress, Denom)>,
}

impl BankState {
    fn balance(&self, holder: &Holder, denom: &Denom) -> u128 {
        self.balances
            .get(holder)
            .and_then(|b| b.get(denom))
            .copied()
            .unwrap_or(0)
    }

    /// Check that every coin can move out of `from` and into `to`
    fn check(&self, from: Option<&Holder>, to: Option<&Holder>, amt: &Coins) -> Result<()> {
        for coin in amt.iter() {
            if coin.is_zero() {
                return Err(LedgerError::InvalidAmount {
                    message: format!("zero amount of {}", coin.denom),
                });
            }
            if let Some(from) = from {
                let available = self.balance(from, &coin.denom);
                if available < coin.amount {
                    return Err(LedgerError::InsufficientBalance {
                        holder: from.to_string(),
                        denom: coin.denom.to_string(),
                        available,
                        required: coin.amount,
                    });
                }
            }
            if let Some(to) = to {
                self.balance(to, &coin.denom)
                    .checked_add(coin.amount)
                    .ok_or_else(|| LedgerError::InvalidAmount {
                        message: format!("balance overflow for {} in {}", coin.denom, to),
                    })?;
            }
        }
        Ok(())
    }

    /// Store a new balance, marking user accounts dirty
    fn set(&mut self, holder: &Holder, denom: &Denom, amount: u128) {
        self.balances
            .entry(holder.clone())
            .or_default()
            .insert(denom.clone(), amount);

        if let Holder::Account(addr) = holder {
            self.dirty.insert((addr.clone(), denom.clone()));
        }
    }

    /// Move `amt` from `from` to `to`; `None` on either side means mint or burn
    fn apply(&mut self, from: Option<&Holder>, to: Option<&Holder>, amt: &Coins) -> Result<()> {
        self.check(from, to, amt)?;
        // check() ruled out underflow and overflow for every coin
        for coin in amt.iter() {
            if let Some(from) = from {
                let current = self.balance(from, &coin.denom);
                self.set(from, &coin.denom, current - coin.amount);
            }
            if let Some(to) = to {
                let current = self.balance(to, &coin.denom);
                self.set(to, &coin.denom, current + coin.amount);
            }
        }
        Ok(())
    }
}

/// Thread-safe in-memory bank
#[derive(Clone, Default)]
pub struct InMemoryBank {
    state: Arc<RwLock<BankState>>,
}

impl InMemoryBank {
    /// Create an empty bank
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an account balance at startup
    pub fn genesis(&self, addr: &AccountAddress, coin: Coin) -> Result<()> {
        let holder = Holder::Account(addr.clone());
        self.state
            .write()
            .apply(None, Some(&holder), &Coins::single(coin))
    }

    /// Balance held by a module account
    pub fn module_balance(&self, module: &ModuleName, denom: &Denom) -> u128 {
        self.state
            .read()
            .balance(&Holder::Module(module.clone()), denom)
    }

    /// Drain the `(account, denom)` pairs whose balance changed since the last call
    pub fn take_dirty_balances(&self) -> Vec<(AccountAddress, Denom)> {
        let mut state = self.state.write();
        std::mem::take(&mut state.dirty).into_iter().collect()
    }

    /// Total amount of `denom` across every holder
    pub fn supply(&self, denom: &Denom) -> u128 {
        self.state
            .read()
            .balances
            .values()
            .filter_map(|b| b.get(denom))
            .sum()
    }
}

impl BankKeeper for InMemoryBank {
    fn mint_coins(&self, module: &ModuleName, amt: &Coins) -> Result<()> {
        debug!(module = %module, amount = %amt, "mint");
        self.state
            .write()
            .apply(None, Some(&Holder::Module(module.clone())), amt)
    }

    fn burn_coins(&self, module: &ModuleName, amt: &Coins) -> Result<()> {
        debug!(module = %module, amount = %amt, "burn");
        self.state
            .write()
            .apply(Some(&Holder::Module(module.clone())), None, amt)
    }

    fn send_coins_from_account_to_module(
        &self,
        sender: &AccountAddress,
        recipient_module: &ModuleName,
        amt: &Coins,
    ) -> Result<()> {
        self.state.write().apply(
            Some(&Holder::Account(sender.clone())),
            Some(&Holder::Module(recipient_module.clone())),
            amt,
        )
    }

    fn send_coins_from_module_to_account(
        &self,
        sender_module: &ModuleName,
        recipient: &AccountAddress,
        amt: &Coins,
    ) -> Result<()> {
        self.state.write().apply(
            Some(&Holder::Module(sender_module.clone())),
            Some(&Holder::Account(recipient.clone())),
            amt,
        )
    }

    fn send_coins_from_module_to_module(
        &self,
        sender_module: &ModuleName,
        recipient_module: &ModuleName,
        amt: &Coins,
    ) -> Result<()> {
        self.state.write().apply(
            Some(&Holder::Module(sender_module.clone())),
            Some(&Holder::Module(recipient_module.clone())),
            amt,
        )
    }

    fn get_balance(&self, addr: &AccountAddress, denom: &Denom) -> Result<Coin> {
        let amount = self
            .state
            .read()
            .balance(&Holder::Account(addr.clone()), denom);
        Ok(Coin::new(denom.clone(), amount))
    }

    fn get_all_balances(&self, addr: &AccountAddress) -> Result<Coins> {
        let state = self.state.read();
        let coins = state
            .balances
            .get(&Holder::Account(addr.clone()))
            .map(|balances| {
                balances
                    .iter()
                    .filter(|(_, amount)| **amount > 0)
                    .map(|(denom, amount)| Coin::new(denom.clone(), *amount))
                    .collect()
            })
            .unwrap_or_default();
        Ok(coins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vpurse() -> ModuleName {
        ModuleName::from("vpurse")
    }

    fn urun(amount: u128) -> Coins {
        Coins::single(Coin::new("urun", amount))
    }

    #[test]
    fn test_mint_and_send() {
        let bank = InMemoryBank::new();
        let alice = AccountAddress::from("alice");

        bank.mint_coins(&vpurse(), &urun(1000)).unwrap();
        assert_eq!(bank.module_balance(&vpurse(), &Denom::from("urun")), 1000);

        bank.send_coins_from_module_to_account(&vpurse(), &alice, &urun(400))
            .unwrap();
        assert_eq!(bank.get_balance(&alice, &Denom::from("urun")).unwrap().amount, 400);
        assert_eq!(bank.module_balance(&vpurse(), &Denom::from("urun")), 600);
        assert_eq!(bank.supply(&Denom::from("urun")), 1000);
    }

    #[test]
    fn test_no_negative_balance() {
        let bank = InMemoryBank::new();
        let alice = AccountAddress::from("alice");
        bank.genesis(&alice, Coin::new("urun", 100)).unwrap();

        let result = bank.send_coins_from_account_to_module(&alice, &vpurse(), &urun(200));
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientBalance { available: 100, required: 200, .. })
        ));
        assert_eq!(bank.get_balance(&alice, &Denom::from("urun")).unwrap().amount, 100);
    }

    #[test]
    fn test_burn_requires_funds() {
        let bank = InMemoryBank::new();
        assert!(bank.burn_coins(&vpurse(), &urun(1)).is_err());
        assert_eq!(bank.supply(&Denom::from("urun")), 0);
        assert!(bank.take_dirty_balances().is_empty());
    }

    #[test]
    fn test_zero_amount_rejected() {
        let bank = InMemoryBank::new();
        assert!(matches!(
            bank.mint_coins(&vpurse(), &urun(0)),
            Err(LedgerError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_multi_coin_is_all_or_nothing() {
        let bank = InMemoryBank::new();
        let alice = AccountAddress::from("alice");
        bank.genesis(&alice, Coin::new("urun", 100)).unwrap();

        let amt: Coins = vec![Coin::new("urun", 50), Coin::new("ubld", 10)]
            .into_iter()
            .collect();
        assert!(bank
            .send_coins_from_account_to_module(&alice, &vpurse(), &amt)
            .is_err());
        assert_eq!(bank.get_balance(&alice, &Denom::from("urun")).unwrap().amount, 100);
        assert_eq!(bank.module_balance(&vpurse(), &Denom::from("urun")), 0);
    }

    #[test]
    fn test_get_all_balances_omits_zero() {
        let bank = InMemoryBank::new();
        let alice = AccountAddress::from("alice");
        bank.genesis(&alice, Coin::new("urun", 100)).unwrap();
        bank.genesis(&alice, Coin::new("ubld", 5)).unwrap();
        bank.send_coins_from_account_to_module(&alice, &vpurse(), &urun(100))
            .unwrap();

        let all = bank.get_all_balances(&alice).unwrap();
        assert_eq!(all, Coins::single(Coin::new("ubld", 5)));
        assert!(bank
            .get_all_balances(&AccountAddress::from("nobody"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_dirty_tracking_skips_modules() {
        let bank = InMemoryBank::new();
        let alice = AccountAddress::from("alice");
        bank.mint_coins(&vpurse(), &urun(10)).unwrap();
        assert!(bank.take_dirty_balances().is_empty());

        bank.send_coins_from_module_to_account(&vpurse(), &alice, &urun(10))
            .unwrap();
        assert_eq!(
            bank.take_dirty_balances(),
            vec![(alice.clone(), Denom::from("urun"))]
        );
        assert!(bank.take_dirty_balances().is_empty());
    }

    #[test]
    fn test_genesis_credits_account() {
        let bank = InMemoryBank::new();
        let alice = AccountAddress::from("alice");
        bank.genesis(&alice, Coin::new("urun", 10)).unwrap();
        bank.genesis(&alice, Coin::new("urun", 5)).unwrap();

        assert_eq!(bank.get_balance(&alice, &Denom::from("urun")).unwrap().amount, 15);
        assert_eq!(
            bank.take_dirty_balances(),
            vec![(alice, Denom::from("urun"))]
        );
        assert!(bank.genesis(&AccountAddress::from("bob"), Coin::zero("urun")).is_err());
    }
}
