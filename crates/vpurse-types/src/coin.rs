//! Coin and Coins types
//!
//! Amounts are non-negative integers in the smallest unit of a denomination.
//! On the wire they always travel as decimal strings, so values larger than
//! 2^53 survive a round trip through a JavaScript controller.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{Denom, Result, VpurseError};

/// Parse a wire amount: ASCII digits only, no sign, no whitespace, no exponent
pub fn parse_amount(value: &str) -> Result<u128> {
    if value.is_empty() {
        return Err(VpurseError::invalid_field("amount", "must not be empty"));
    }
    if !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VpurseError::invalid_field(
            "amount",
            format!("{:?} is not a non-negative decimal integer", value),
        ));
    }
    value
        .parse::<u128>()
        .map_err(|_| VpurseError::invalid_field("amount", format!("{} is out of range", value)))
}

/// Serde adapter that carries a `u128` as a decimal string
pub mod amount_string {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(amount)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_amount(&raw).map_err(de::Error::custom)
    }
}

/// A single-denomination amount
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coin {
    pub denom: Denom,
    #[serde(with = "amount_string")]
    pub amount: u128,
}

impl Coin {
    /// Create a new coin
    pub fn new(denom: impl Into<Denom>, amount: u128) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// Create a zero coin of the given denomination
    pub fn zero(denom: impl Into<Denom>) -> Self {
        Self::new(denom, 0)
    }

    /// Check if the amount is zero
    pub fn is_zero(&self) -> bool {
        self.amount == 0
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// A set of coins with at most one entry per denomination, sorted by denom
///
/// Zero amounts are kept when explicitly inserted: a balance query that
/// reports zero is meaningful to the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Coins {
    amounts: BTreeMap<Denom, u128>,
}

impl Coins {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set holding one coin
    pub fn single(coin: Coin) -> Self {
        let mut coins = Self::new();
        coins.insert(coin);
        coins
    }

    /// Insert a coin, replacing any previous amount of the same denom
    pub fn insert(&mut self, coin: Coin) {
        self.amounts.insert(coin.denom, coin.amount);
    }

    /// Amount held of `denom` (zero when absent)
    pub fn amount_of(&self, denom: &Denom) -> u128 {
        self.amounts.get(denom).copied().unwrap_or(0)
    }

    /// Iterate coins in denom order
    pub fn iter(&self) -> impl Iterator<Item = Coin> + '_ {
        self.amounts
            .iter()
            .map(|(denom, amount)| Coin::new(denom.clone(), *amount))
    }

    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }
}

impl FromIterator<Coin> for Coins {
    fn from_iter<I: IntoIterator<Item = Coin>>(iter: I) -> Self {
        let mut coins = Self::new();
        for coin in iter {
            coins.insert(coin);
        }
        coins
    }
}

impl From<Coin> for Coins {
    fn from(coin: Coin) -> Self {
        Self::single(coin)
    }
}

impl fmt::Display for Coins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, coin) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", coin)?;
        }
        Ok(())
    }
}

impl Serialize for Coins {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for Coins {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let coins = Vec::<Coin>::deserialize(deserializer)?;
        Ok(coins.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("0").unwrap(), 0);
        assert_eq!(parse_amount("1000").unwrap(), 1000);
        assert_eq!(
            parse_amount("340282366920938463463374607431768211455").unwrap(),
            u128::MAX
        );

        for bad in ["", "-1", "+1", "1.5", "1e3", " 12", "0x10"] {
            assert!(parse_amount(bad).is_err(), "{bad:?} should be rejected");
        }
        assert!(parse_amount("340282366920938463463374607431768211456").is_err());
    }

    #[test]
    fn test_coin_display() {
        assert_eq!(Coin::new("urun", 1000).to_string(), "1000urun");
        let coins: Coins = vec![Coin::new("foocoin", 123), Coin::new("barcoin", 456)]
            .into_iter()
            .collect();
        assert_eq!(coins.to_string(), "456barcoin,123foocoin");
    }

    #[test]
    fn test_coin_wire_shape() {
        let json = serde_json::to_value(Coin::new("ubld", 500)).unwrap();
        assert_eq!(json, serde_json::json!({"denom": "ubld", "amount": "500"}));

        let numeric =
            serde_json::from_value::<Coin>(serde_json::json!({"denom": "ubld", "amount": 500}));
        assert!(numeric.is_err());
    }

    #[test]
    fn test_coins_keep_explicit_zero() {
        let coins = Coins::single(Coin::zero("urun"));
        assert_eq!(coins.len(), 1);
        assert_eq!(coins.amount_of(&Denom::from("urun")), 0);
        assert_eq!(coins.amount_of(&Denom::from("ubld")), 0);
    }
}
