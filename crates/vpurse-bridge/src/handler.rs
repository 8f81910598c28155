//! Port handler - the request dispatcher
//!
//! One inbound message is fully processed, including every bank call it
//! needs, before `receive` returns. The handler holds no state of its own.

use std::collections::BTreeMap;

use tracing::{info_span, warn};
use vpurse_types::{AccountAddress, Coin, Coins, Result, VpurseError};

use crate::encoder::marshal_balance_update;
use crate::keeper::Keeper;
use crate::request::Request;

/// Dispatches controller messages to the keeper
#[derive(Clone)]
pub struct PortHandler {
    keeper: Keeper,
}

impl PortHandler {
    pub fn new(keeper: Keeper) -> Self {
        Self { keeper }
    }

    pub fn keeper(&self) -> &Keeper {
        &self.keeper
    }

    /// Handle one raw controller message and produce the raw response
    pub fn receive(&self, raw: &str) -> Result<String> {
        let request = match Request::decode(raw) {
            Ok(request) => request,
            Err(err) => {
                warn!(code = err.error_code(), error = %err, "rejected controller message");
                return Err(err);
            }
        };

        let span = info_span!(
            "vpurse_request",
            kind = request.kind(),
            mutating = request.is_mutating()
        );
        let _enter = span.enter();

        let result = self.dispatch(request);
        if let Err(err) = &result {
            warn!(code = err.error_code(), error = %err, "request failed");
        }
        result
    }

    fn dispatch(&self, request: Request) -> Result<String> {
        match request {
            Request::GetBalance { address, denom } => {
                let coin = self.keeper.get_balance(&address, &denom)?;
                encode_json(&coin.amount.to_string())
            }
            Request::GetAllBalances { address } => {
                let coins = self.keeper.get_all_balances(&address)?;
                encode_json(&coins)
            }
            Request::Give { recipient, coin } => {
                let balance = self.keeper.give(&recipient, &coin)?;
                single_balance_update(recipient, balance)
            }
            Request::Grab { sender, coin } => {
                let balance = self.keeper.grab(&sender, &coin)?;
                single_balance_update(sender, balance)
            }
            Request::GiveToFeeCollector { coin } => {
                self.keeper.give_to_fee_collector(&coin)?;
                encode_json(&true)
            }
        }
    }
}

fn encode_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(VpurseError::encoding)
}

fn single_balance_update(address: AccountAddress, balance: Coin) -> Result<String> {
    let address_to_balance = BTreeMap::from([(address, Coins::single(balance))]);
    marshal_balance_update(&address_to_balance)?
        .ok_or_else(|| VpurseError::encoding("balance update unexpectedly empty"))
}
