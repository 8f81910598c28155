//! Server Configuration
//!
//! Configuration management for the VPurse bridge host.
//! Supports environment variables, config files, and CLI arguments.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use vpurse_bridge::{DEFAULT_FEE_COLLECTOR, DEFAULT_MODULE_ACCOUNT};
use vpurse_types::{parse_amount, AccountAddress, Coin, Denom, ModuleName};

/// Server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bridge settings
    #[serde(default)]
    pub bridge: BridgeSettings,

    /// Balances seeded into the in-memory bank at startup
    #[serde(default)]
    pub genesis: Vec<GenesisBalance>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Bridge settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeSettings {
    /// Holding module account for mint/burn staging
    #[serde(default = "default_module_account")]
    pub module_account: String,

    /// Module account receiving fee payments
    #[serde(default = "default_fee_collector")]
    pub fee_collector: String,

    /// How often changed balances are broadcast, in milliseconds
    #[serde(default = "default_flush_interval")]
    pub flush_interval_ms: u64,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            module_account: default_module_account(),
            fee_collector: default_fee_collector(),
            flush_interval_ms: default_flush_interval(),
        }
    }
}

impl BridgeSettings {
    pub fn module_account(&self) -> anyhow::Result<ModuleName> {
        Ok(ModuleName::parse(&self.module_account)?)
    }

    pub fn fee_collector(&self) -> anyhow::Result<ModuleName> {
        Ok(ModuleName::parse(&self.fee_collector)?)
    }

    /// Get the broadcast interval duration
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms)
    }
}

/// One seeded balance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisBalance {
    pub address: String,
    pub denom: String,
    /// Decimal string, as on the wire
    pub amount: String,
}

impl GenesisBalance {
    /// Validate into an account and coin
    pub fn parse(&self) -> anyhow::Result<(AccountAddress, Coin)> {
        let address = AccountAddress::parse(&self.address)?;
        let coin = Coin::new(Denom::parse(&self.denom)?, parse_amount(&self.amount)?);
        Ok((address, coin))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// =============================================================================
// Default Functions
// =============================================================================

fn default_module_account() -> String {
    DEFAULT_MODULE_ACCOUNT.to_string()
}

fn default_fee_collector() -> String {
    DEFAULT_FEE_COLLECTOR.to_string()
}

fn default_flush_interval() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

// =============================================================================
// Configuration Loading
// =============================================================================

impl ServerConfig {
    /// Load configuration from environment and optional config file
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();

        let mut builder = config::Config::builder();

        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        builder = builder
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false));

        // Environment variables with VPURSE_ prefix, e.g. VPURSE__BRIDGE__FLUSH_INTERVAL_MS
        builder = builder.add_source(
            config::Environment::with_prefix("VPURSE")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Reject settings the host cannot run with
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bridge.flush_interval_ms == 0 {
            anyhow::bail!("bridge.flush_interval_ms must be greater than zero");
        }
        let module_account = self.bridge.module_account()?;
        let fee_collector = self.bridge.fee_collector()?;
        if module_account == fee_collector {
            anyhow::bail!(
                "holding account and fee collector must differ (both are {})",
                module_account
            );
        }
        for balance in &self.genesis {
            balance.parse()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bridge.module_account, "vpurse");
        assert_eq!(config.bridge.fee_collector, "fee_collector");
        assert_eq!(config.bridge.flush_interval(), Duration::from_secs(1));
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ServerConfig = serde_json::from_value(serde_json::json!({
            "bridge": {"flush_interval_ms": 250},
            "genesis": [{"address": "alice", "denom": "urun", "amount": "1000"}],
        }))
        .unwrap();
        assert_eq!(config.bridge.module_account, "vpurse");
        assert_eq!(config.bridge.flush_interval_ms, 250);

        let (address, coin) = config.genesis[0].parse().unwrap();
        assert_eq!(address, AccountAddress::from("alice"));
        assert_eq!(coin, Coin::new("urun", 1000));
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut config = ServerConfig::default();
        config.bridge.flush_interval_ms = 0;
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.bridge.fee_collector = "vpurse".to_string();
        assert!(config.validate().is_err());

        let mut config = ServerConfig::default();
        config.genesis.push(GenesisBalance {
            address: "alice".to_string(),
            denom: "urun".to_string(),
            amount: "-3".to_string(),
        });
        assert!(config.validate().is_err());
    }
}
