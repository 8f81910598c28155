//! Inbound request decoding
//!
//! Decoding maps the `type` tag to a closed set of variants. Checks run in a
//! fixed order and the first failure wins:
//!
//! 1. payload is a JSON object
//! 2. `type` is present and recognized
//! 3. every required field is present with the right JSON type
//! 4. identifiers and amounts are well-formed
//!
//! Extra fields are ignored.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use vpurse_types::{
    parse_amount, AccountAddress, Coin, Denom, Result, VpurseError, VPURSE_GET_ALL_BALANCES,
    VPURSE_GET_BALANCE, VPURSE_GIVE, VPURSE_GIVE_TO_FEE_COLLECTOR, VPURSE_GRAB,
};

/// A validated controller request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    GetBalance {
        address: AccountAddress,
        denom: Denom,
    },
    GetAllBalances {
        address: AccountAddress,
    },
    /// Mint into the holding account, then credit `recipient`
    Give {
        recipient: AccountAddress,
        coin: Coin,
    },
    /// Debit `sender` into the holding account, then burn
    Grab {
        sender: AccountAddress,
        coin: Coin,
    },
    /// Mint into the holding account, then move to the fee collector module
    GiveToFeeCollector {
        coin: Coin,
    },
}

#[derive(Deserialize)]
struct GetBalanceFields {
    address: String,
    denom: String,
}

#[derive(Deserialize)]
struct GetAllBalancesFields {
    address: String,
}

#[derive(Deserialize)]
struct GiveFields {
    recipient: String,
    amount: String,
    denom: String,
}

#[derive(Deserialize)]
struct GrabFields {
    sender: String,
    amount: String,
    denom: String,
}

#[derive(Deserialize)]
struct FeeFields {
    amount: String,
    denom: String,
}

fn fields<T: DeserializeOwned>(kind: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| VpurseError::malformed(format!("{}: {}", kind, e)))
}

fn coin(amount: &str, denom: &str) -> Result<Coin> {
    let amount = parse_amount(amount)?;
    Ok(Coin::new(Denom::parse(denom)?, amount))
}

impl Request {
    /// Decode and validate a raw controller message
    pub fn decode(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| VpurseError::malformed(format!("undecodable payload: {}", e)))?;

        let kind = match value.as_object().map(|object| object.get("type")) {
            None => return Err(VpurseError::malformed("payload is not a JSON object")),
            Some(None) => return Err(VpurseError::malformed("missing type")),
            Some(Some(Value::String(kind))) => kind.clone(),
            Some(Some(other)) => {
                return Err(VpurseError::malformed(format!(
                    "type must be a string, got {}",
                    other
                )))
            }
        };

        match kind.as_str() {
            VPURSE_GET_BALANCE => {
                let f: GetBalanceFields = fields(&kind, value)?;
                Ok(Self::GetBalance {
                    address: AccountAddress::parse(&f.address)?,
                    denom: Denom::parse(&f.denom)?,
                })
            }
            VPURSE_GET_ALL_BALANCES => {
                let f: GetAllBalancesFields = fields(&kind, value)?;
                Ok(Self::GetAllBalances {
                    address: AccountAddress::parse(&f.address)?,
                })
            }
            VPURSE_GIVE => {
                let f: GiveFields = fields(&kind, value)?;
                Ok(Self::Give {
                    recipient: AccountAddress::parse(&f.recipient)?,
                    coin: coin(&f.amount, &f.denom)?,
                })
            }
            VPURSE_GRAB => {
                let f: GrabFields = fields(&kind, value)?;
                Ok(Self::Grab {
                    sender: AccountAddress::parse(&f.sender)?,
                    coin: coin(&f.amount, &f.denom)?,
                })
            }
            VPURSE_GIVE_TO_FEE_COLLECTOR => {
                let f: FeeFields = fields(&kind, value)?;
                Ok(Self::GiveToFeeCollector {
                    coin: coin(&f.amount, &f.denom)?,
                })
            }
            other => Err(VpurseError::malformed(format!(
                "unrecognized type {:?}",
                other
            ))),
        }
    }

    /// Wire tag of this request
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GetBalance { .. } => VPURSE_GET_BALANCE,
            Self::GetAllBalances { .. } => VPURSE_GET_ALL_BALANCES,
            Self::Give { .. } => VPURSE_GIVE,
            Self::Grab { .. } => VPURSE_GRAB,
            Self::GiveToFeeCollector { .. } => VPURSE_GIVE_TO_FEE_COLLECTOR,
        }
    }

    /// Whether handling this request changes ledger state
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Self::GetBalance { .. } | Self::GetAllBalances { .. })
    }
}
