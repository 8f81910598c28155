//! Balance-update encoder
//!
//! Flattens an account -> coins mapping into one `VPURSE_BALANCE_UPDATE`
//! message. An empty mapping produces no message at all, which callers must
//! keep distinct from a message with zero entries.

use std::collections::BTreeMap;

use vpurse_types::{AccountAddress, BalanceUpdate, Coins, Result, SingleBalanceUpdate, VpurseError};

use crate::nonce::next_nonce;

/// Build the balance update for `address_to_balance` without claiming a nonce
pub fn balance_update_entries(
    address_to_balance: &BTreeMap<AccountAddress, Coins>,
) -> Vec<SingleBalanceUpdate> {
    address_to_balance
        .iter()
        .flat_map(|(address, coins)| {
            coins.iter().map(move |coin| SingleBalanceUpdate {
                address: address.to_string(),
                denom: coin.denom.to_string(),
                amount: coin.amount.to_string(),
            })
        })
        .collect()
}

/// Serialize a balance update for the given accounts
///
/// Returns `Ok(None)` for an empty mapping; no nonce is consumed in that case.
/// Entries follow map order (accounts, then denoms, ascending) so the bytes
/// are reproducible for a fixed input and nonce.
pub fn marshal_balance_update(
    address_to_balance: &BTreeMap<AccountAddress, Coins>,
) -> Result<Option<String>> {
    if address_to_balance.is_empty() {
        return Ok(None);
    }

    let updated = balance_update_entries(address_to_balance);
    let event = BalanceUpdate::new(next_nonce(), updated);
    let encoded = serde_json::to_string(&event).map_err(VpurseError::encoding)?;
    Ok(Some(encoded))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vpurse_types::{Coin, NormalizedBalanceUpdate};

    fn normalized(triples: &[(&str, &str, &str)]) -> NormalizedBalanceUpdate {
        let mut accounts = NormalizedBalanceUpdate::new();
        for (address, denom, amount) in triples {
            accounts
                .entry(address.to_string())
                .or_default()
                .insert(denom.to_string(), amount.to_string());
        }
        accounts
    }

    fn roundtrip(input: BTreeMap<AccountAddress, Coins>) -> Option<NormalizedBalanceUpdate> {
        let _guard = crate::nonce::test_guard();
        marshal_balance_update(&input)
            .unwrap()
            .map(|encoded| BalanceUpdate::decode(&encoded).unwrap().normalize())
    }

    #[test]
    fn test_marshal_empty() {
        assert_eq!(roundtrip(BTreeMap::new()), None);
    }

    #[test]
    fn test_marshal_simple() {
        let input = BTreeMap::from([(
            AccountAddress::from("acct1"),
            Coins::single(Coin::new("foocoin", 123)),
        )]);
        assert_eq!(
            roundtrip(input),
            Some(normalized(&[("acct1", "foocoin", "123")]))
        );
    }

    #[test]
    fn test_marshal_multi_denom() {
        let input = BTreeMap::from([(
            AccountAddress::from("acct1"),
            vec![Coin::new("foocoin", 123), Coin::new("barcoin", 456)]
                .into_iter()
                .collect(),
        )]);
        assert_eq!(
            roundtrip(input),
            Some(normalized(&[
                ("acct1", "foocoin", "123"),
                ("acct1", "barcoin", "456"),
            ]))
        );
    }

    #[test]
    fn test_marshal_multi_acct() {
        let input = BTreeMap::from([
            (
                AccountAddress::from("acct1"),
                Coins::single(Coin::new("foocoin", 123)),
            ),
            (
                AccountAddress::from("acct2"),
                Coins::single(Coin::new("barcoin", 456)),
            ),
        ]);
        assert_eq!(
            roundtrip(input),
            Some(normalized(&[
                ("acct1", "foocoin", "123"),
                ("acct2", "barcoin", "456"),
            ]))
        );
    }

    #[test]
    fn test_explicit_zero_is_reported() {
        let input = BTreeMap::from([(
            AccountAddress::from("acct1"),
            Coins::single(Coin::zero("ubld")),
        )]);
        assert_eq!(
            roundtrip(input),
            Some(normalized(&[("acct1", "ubld", "0")]))
        );
    }

    #[test]
    fn test_each_emission_takes_the_next_nonce() {
        let _guard = crate::nonce::test_guard();
        let input = BTreeMap::from([(
            AccountAddress::from("acct1"),
            Coins::single(Coin::new("foocoin", 1)),
        )]);
        let nonce_of = |encoded: String| {
            BalanceUpdate::decode(&encoded)
                .unwrap()
                .nonce_value()
                .unwrap()
        };

        let first = nonce_of(marshal_balance_update(&input).unwrap().unwrap());
        assert_eq!(crate::nonce::current_nonce(), first);

        // An empty mapping claims nothing.
        assert!(marshal_balance_update(&BTreeMap::new()).unwrap().is_none());

        let second = nonce_of(marshal_balance_update(&input).unwrap().unwrap());
        let third = nonce_of(marshal_balance_update(&input).unwrap().unwrap());
        assert_eq!(second, first + 1);
        assert_eq!(third, second + 1);
    }

    #[test]
    fn test_entries_are_deterministic() {
        let input = BTreeMap::from([
            (
                AccountAddress::from("acct2"),
                Coins::single(Coin::new("barcoin", 456)),
            ),
            (
                AccountAddress::from("acct1"),
                vec![Coin::new("foocoin", 1), Coin::new("barcoin", 2)]
                    .into_iter()
                    .collect(),
            ),
        ]);
        let entries = balance_update_entries(&input);
        let order: Vec<_> = entries
            .iter()
            .map(|e| (e.address.as_str(), e.denom.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![("acct1", "barcoin"), ("acct1", "foocoin"), ("acct2", "barcoin")]
        );
        assert_eq!(entries, balance_update_entries(&input));
    }
}
