//! Deployment configuration.
//!
//! [`Config`] can be deserialized (every field has a default) or read
//! from `ROOMLEDGER_*` environment variables with [`Config::from_env`].

use std::str::FromStr;
use std::time::Duration;

use roomledger_ledger::{Fee, LedgerClient, PrivateKey, TransactionBuilder};
use roomledger_protocol::PlaintextCodec;
use roomledger_retry::RetryPolicy;
use roomledger_room::{RoomManager, RoomManagerConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const ENV_NETWORK_URL: &str = "ROOMLEDGER_NETWORK_URL";
pub const ENV_NETWORK: &str = "ROOMLEDGER_NETWORK";
pub const ENV_MASTER_PRIVATE_KEY: &str = "ROOMLEDGER_MASTER_PRIVATE_KEY";
pub const ENV_DEFAULT_FEE: &str = "ROOMLEDGER_DEFAULT_FEE";
pub const ENV_PRIVATE_FEE: &str = "ROOMLEDGER_PRIVATE_FEE";
pub const ENV_FUNDING_AMOUNT: &str = "ROOMLEDGER_FUNDING_AMOUNT";

/// A configuration value that could not be parsed.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}={value:?} is invalid: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Fee settings applied to every room transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxConfig {
    /// Fee per transaction, in credits.
    pub fee: f64,
    /// Pay fees from a private record.
    pub private_fee: bool,
}

impl Default for TxConfig {
    fn default() -> Self {
        Self {
            fee: 0.02,
            private_fee: false,
        }
    }
}

impl TxConfig {
    pub fn fee(&self) -> Fee {
        Fee {
            credits: self.fee,
            private: self.private_fee,
        }
    }
}

/// Default parameters for new rooms and players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameDefaults {
    pub big_blind: u64,
    pub small_blind: u64,
    pub min_stack: u64,
    pub seats: u8,
    /// Bet used when creating or joining a room.
    pub bet: u64,
    /// Credits given to each freshly generated player.
    pub funding_amount: u64,
}

impl Default for GameDefaults {
    fn default() -> Self {
        Self {
            big_blind: 100,
            small_blind: 50,
            min_stack: 1000,
            seats: 4,
            bet: 200,
            funding_amount: 1000,
        }
    }
}

/// A [`RetryPolicy`] in serializable form. Delays are in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_factor: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(&RetryPolicy::default())
    }
}

impl From<&RetryPolicy> for RetryConfig {
    fn from(policy: &RetryPolicy) -> Self {
        Self {
            max_attempts: policy.max_attempts,
            initial_delay_ms: policy.initial_delay.as_millis() as u64,
            max_delay_ms: policy.max_delay.as_millis() as u64,
            backoff_factor: policy.backoff_factor,
            jitter: policy.jitter,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            backoff_factor: self.backoff_factor,
            jitter: self.jitter,
        }
        .validated()
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Everything needed to talk to a ledger node and run rooms on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the ledger node.
    pub network_url: String,
    /// Network path segment (`testnet`, `mainnet`, ...).
    pub network: String,
    /// Key that funds generated accounts. Never serialized.
    #[serde(skip_serializing)]
    pub master_private_key: Option<PrivateKey>,
    pub tx: TxConfig,
    pub game: GameDefaults,
    /// Polling schedule while waiting for a transaction to confirm.
    pub confirmation: RetryConfig,
    /// Retry schedule for `rooms` mapping reads.
    pub lookup: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network_url: "http://localhost:3030".into(),
            network: "testnet".into(),
            master_private_key: None,
            tx: TxConfig::default(),
            game: GameDefaults::default(),
            confirmation: RetryConfig::default(),
            lookup: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Reads the defaults, overridden by any `ROOMLEDGER_*` variables
    /// that are set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through
    /// `lookup` instead of the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(url) = lookup(ENV_NETWORK_URL) {
            config.network_url = url;
        }
        if let Some(network) = lookup(ENV_NETWORK) {
            config.network = network;
        }
        if let Some(key) = lookup(ENV_MASTER_PRIVATE_KEY).filter(|k| !k.is_empty()) {
            config.master_private_key = Some(PrivateKey::new(key));
        }
        if let Some(fee) = parse(&lookup, ENV_DEFAULT_FEE)? {
            config.tx.fee = fee;
        }
        if let Some(private) = parse(&lookup, ENV_PRIVATE_FEE)? {
            config.tx.private_fee = private;
        }
        if let Some(amount) = parse(&lookup, ENV_FUNDING_AMOUNT)? {
            config.game.funding_amount = amount;
        }
        config.check()?;
        debug!(
            network_url = %config.network_url,
            network = %config.network,
            fee = config.tx.fee,
            has_master_key = config.master_private_key.is_some(),
            "configuration loaded"
        );
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if !self.tx.fee.is_finite() || self.tx.fee < 0.0 {
            return Err(ConfigError::Invalid {
                var: ENV_DEFAULT_FEE,
                value: self.tx.fee.to_string(),
                reason: "fee must be a non-negative number".into(),
            });
        }
        Ok(())
    }

    /// Orchestrator settings derived from this configuration.
    pub fn room_manager_config(&self) -> RoomManagerConfig {
        RoomManagerConfig {
            confirmation_policy: self.confirmation.to_policy(),
            lookup_policy: self.lookup.to_policy(),
            ..RoomManagerConfig::default()
        }
    }

    /// Builds a [`RoomManager`] using the plaintext codec.
    pub fn room_manager<L, B>(&self, ledger: L, builder: B) -> RoomManager<L, B>
    where
        L: LedgerClient,
        B: TransactionBuilder,
    {
        RoomManager::new(ledger, builder, PlaintextCodec, self.room_manager_config())
    }

    /// An HTTP client for the configured node.
    #[cfg(feature = "http")]
    pub fn http_client(
        &self,
    ) -> Result<roomledger_ledger::HttpLedgerClient, roomledger_ledger::LedgerError> {
        roomledger_ledger::HttpLedgerClient::new(&self.network_url, &self.network)
    }
}

fn parse<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    let parsed = value.trim().parse::<T>();
    parsed.map(Some).map_err(|e| ConfigError::Invalid {
        var,
        reason: e.to_string(),
        value,
    })
}
