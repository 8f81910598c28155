//! Identity types for VPurse
//!
//! Accounts, module accounts and denominations are opaque strings. They are
//! wrapped in distinct types so a module name can never be passed where an
//! account address is expected. No normalization (case, whitespace) is ever
//! applied: equality is exact string match.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Result, VpurseError};

/// Maximum length of a denomination
pub const MAX_DENOM_LEN: usize = 128;

/// Macro to generate string identifier types with common implementations
macro_rules! define_name_type {
    ($name:ident, $field:literal, $validate:path, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap a string without validation
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Parse and validate a wire value
            pub fn parse(value: &str) -> Result<Self> {
                $validate(value).map_err(|reason| VpurseError::invalid_field($field, reason))?;
                Ok(Self(value.to_string()))
            }

            /// Borrow the raw string
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_name_type!(
    AccountAddress,
    "address",
    validate_address,
    "Address of a user account held in the bank"
);
define_name_type!(
    ModuleName,
    "module",
    validate_module,
    "Name of a module account (holding account, fee collector, ...)"
);
define_name_type!(Denom, "denom", validate_denom, "Token denomination");

fn validate_address(value: &str) -> std::result::Result<(), String> {
    if value.is_empty() {
        return Err("must not be empty".to_string());
    }
    if value.chars().any(char::is_whitespace) {
        return Err(format!("{:?} contains whitespace", value));
    }
    Ok(())
}

fn validate_module(value: &str) -> std::result::Result<(), String> {
    if value.is_empty() {
        return Err("must not be empty".to_string());
    }
    Ok(())
}

fn validate_denom(value: &str) -> std::result::Result<(), String> {
    let mut chars = value.chars();
    match chars.next() {
        None => return Err("must not be empty".to_string()),
        Some(first) if !first.is_ascii_alphabetic() => {
            return Err(format!("{:?} must start with a letter", value));
        }
        Some(_) => {}
    }
    if value.len() > MAX_DENOM_LEN {
        return Err(format!("longer than {} characters", MAX_DENOM_LEN));
    }
    if let Some(bad) = chars.find(|c| !(c.is_ascii_alphanumeric() || "/:._-".contains(*c))) {
        return Err(format!("{:?} contains invalid character {:?}", value, bad));
    }
    Ok(())
}
