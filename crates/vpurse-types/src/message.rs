//! Wire messages exchanged with the controller
//!
//! Field names are fixed by the controller protocol and must not be renamed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Result, VpurseError};

/// Inbound: single-denomination balance query
pub const VPURSE_GET_BALANCE: &str = "VPURSE_GET_BALANCE";
/// Inbound: all-denomination balance query
pub const VPURSE_GET_ALL_BALANCES: &str = "VPURSE_GET_ALL_BALANCES";
/// Inbound: mint into the holding account, then credit a recipient
pub const VPURSE_GIVE: &str = "VPURSE_GIVE";
/// Inbound: debit a sender into the holding account, then burn
pub const VPURSE_GRAB: &str = "VPURSE_GRAB";
/// Inbound: mint into the holding account, then move to the fee collector
pub const VPURSE_GIVE_TO_FEE_COLLECTOR: &str = "VPURSE_GIVE_TO_FEE_COLLECTOR";
/// Outbound: balance notification
pub const VPURSE_BALANCE_UPDATE: &str = "VPURSE_BALANCE_UPDATE";

/// One resulting balance inside a [`BalanceUpdate`]
///
/// `amount` is the post-operation balance of the pair, not a differential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleBalanceUpdate {
    pub address: String,
    pub denom: String,
    pub amount: String,
}

/// Outbound balance notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceUpdate {
    #[serde(rename = "type")]
    pub kind: String,
    pub nonce: String,
    pub updated: Vec<SingleBalanceUpdate>,
}

impl BalanceUpdate {
    /// Create a balance update carrying the given nonce
    pub fn new(nonce: u64, updated: Vec<SingleBalanceUpdate>) -> Self {
        Self {
            kind: VPURSE_BALANCE_UPDATE.to_string(),
            nonce: nonce.to_string(),
            updated,
        }
    }

    /// Decode a serialized balance update, checking its type tag
    pub fn decode(raw: &str) -> Result<Self> {
        let update: Self = serde_json::from_str(raw)
            .map_err(|e| VpurseError::malformed(format!("balance update: {}", e)))?;
        if update.kind != VPURSE_BALANCE_UPDATE {
            return Err(VpurseError::malformed(format!(
                "bad balance update type: {}",
                update.kind
            )));
        }
        Ok(update)
    }

    /// Nonce as an integer
    pub fn nonce_value(&self) -> Result<u64> {
        self.nonce
            .parse()
            .map_err(|_| VpurseError::invalid_field("nonce", &self.nonce))
    }

    /// Order-insensitive view of the update
    pub fn normalize(&self) -> NormalizedBalanceUpdate {
        let mut accounts = NormalizedBalanceUpdate::new();
        for update in &self.updated {
            accounts
                .entry(update.address.clone())
                .or_default()
                .insert(update.denom.clone(), update.amount.clone());
        }
        accounts
    }
}

/// Address -> Denomination -> Amount
///
/// Consumers compare balance updates through this view: the order of
/// `updated` carries no meaning.
pub type NormalizedBalanceUpdate = BTreeMap<String, BTreeMap<String, String>>;
