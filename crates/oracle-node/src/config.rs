//! # Node Configuration
//!
//! Unified configuration for the oracle node, loaded from a TOML file and
//! overridden by `ORACLE_*` environment variables.
//!
//! ## Config File Format
//!
//! ```toml
//! [oracle]
//! controllers = ["0x1111111111111111111111111111111111111111"]
//! api_secret_key = "<64 hex chars>"
//! query_kind = "URL"
//! decimals = 18
//! failed_proof_policy = "retain"
//!
//! [data_fetch]
//! dispatch_address = "0xd15fa7c4000000000000000000000000000000d1"
//! query_price = 1000
//! gas_limit = 200000
//!
//! [schedule]
//! tick_interval_secs = 60
//! initial_deposit = 1000000000000000000
//!
//! [[tokens]]
//! address = "0xdd974d5c2e2928dea5f71b9825b8b646686bd200"
//! symbol = "KNC"
//! decimals = 18
//! quote = "0.001234"
//! ```
//!
//! ## Security Requirements
//!
//! - At least one controller must be configured
//! - A configured public key must match the configured secret key

use price_oracle::{ApiPublicKey, FailedProofPolicy, LocalApiSigner, OracleConfig, U256};
use serde::Deserialize;
use shared_types::{parse_address, Address, ZERO_ADDRESS};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// File I/O error.
    #[error("Failed to read config file {path}: {error}")]
    Io { path: String, error: String },

    /// TOML syntax or type error.
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// No controller may administer the oracle.
    #[error("At least one controller address must be configured")]
    NoControllers,

    /// An address field does not hold 20 hex bytes.
    #[error("Invalid address in {field}: '{value}'")]
    InvalidAddress { field: String, value: String },

    /// A key field does not decode.
    #[error("Invalid key in {field}: {reason}")]
    InvalidKey { field: String, reason: String },

    /// `api_public_key` is not the public half of `api_secret_key`.
    #[error("api_public_key does not match api_secret_key")]
    KeyMismatch,

    /// A token entry is unusable.
    #[error("Invalid token '{symbol}': {reason}")]
    InvalidToken { symbol: String, reason: String },

    /// A scalar field is out of range.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Complete node configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NodeConfig {
    /// Oracle service configuration.
    pub oracle: OracleSection,
    /// Data-fetch service configuration.
    pub data_fetch: DataFetchSection,
    /// Update schedule and funding.
    pub schedule: ScheduleSection,
    /// Tokens registered at startup.
    pub tokens: Vec<TokenEntry>,
}

/// Oracle service configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OracleSection {
    /// Addresses allowed to administer the oracle (hex).
    pub controllers: Vec<String>,
    /// Secret key of the simulated pricing API (32 bytes hex). When absent
    /// the node signs with a fresh random key.
    pub api_secret_key: Option<String>,
    /// Trusted key (64 bytes hex, or 65 with `04`). Defaults to the public
    /// half of the signing key.
    pub api_public_key: Option<String>,
    /// Query kind passed to the data-fetch service.
    pub query_kind: String,
    /// Query string template; `{symbol}` is replaced by the token symbol.
    pub api_url_template: String,
    /// Fractional digits of the base currency.
    pub decimals: u32,
    /// Fate of the correlation after a rejected proof.
    pub failed_proof_policy: FailedProofPolicy,
}

impl Default for OracleSection {
    fn default() -> Self {
        let oracle = OracleConfig::default();
        Self {
            controllers: Vec::new(),
            api_secret_key: None,
            api_public_key: None,
            query_kind: oracle.query_kind,
            api_url_template: oracle.api_url_template,
            decimals: oracle.decimals,
            failed_proof_policy: oracle.failed_proof_policy,
        }
    }
}

/// Data-fetch service configuration.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DataFetchSection {
    /// Identity the service delivers callbacks from (hex).
    pub dispatch_address: String,
    /// Cost of one query in the base currency's smallest unit.
    pub query_price: u64,
    /// Gas limit attached to every update request.
    pub gas_limit: u64,
    /// Custom gas price forwarded to the service at startup.
    pub gas_price: Option<u64>,
}

impl Default for DataFetchSection {
    fn default() -> Self {
        Self {
            dispatch_address: "0xd15fa7c4000000000000000000000000000000d1".to_string(),
            query_price: 1_000_000_000_000_000, // 0.001 base unit
            gas_limit: 200_000,
            gas_price: None,
        }
    }
}

/// Update schedule and funding.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScheduleSection {
    /// Seconds between batch update requests.
    pub tick_interval_secs: u64,
    /// Funds deposited at startup.
    pub initial_deposit: u64,
    /// Stop after this many ticks; run until interrupted when absent.
    pub max_ticks: Option<u64>,
}

impl Default for ScheduleSection {
    fn default() -> Self {
        Self {
            tick_interval_secs: 60,
            initial_deposit: 1_000_000_000_000_000_000, // 1 whole base unit
            max_ticks: None,
        }
    }
}

/// A token registered at startup.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TokenEntry {
    /// Token identity (hex).
    pub address: String,
    pub symbol: String,
    /// Decimals of the token; magnitude is `10^decimals`.
    pub decimals: u32,
    /// Price the simulated pricing API answers with, as decimal text.
    pub quote: Option<String>,
}

/// Largest `decimals` whose `10^decimals` fits in 256 bits.
const MAX_DECIMALS: u32 = 77;

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `ORACLE_*` overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `ORACLE_*` overrides from `lookup`.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `ORACLE_CONTROLLERS` | `oracle.controllers` (comma separated) |
    /// | `ORACLE_API_SECRET_KEY` | `oracle.api_secret_key` |
    /// | `ORACLE_API_PUBLIC_KEY` | `oracle.api_public_key` |
    /// | `ORACLE_FAILED_PROOF_POLICY` | `oracle.failed_proof_policy` |
    /// | `ORACLE_DISPATCH_ADDRESS` | `data_fetch.dispatch_address` |
    /// | `ORACLE_GAS_LIMIT` | `data_fetch.gas_limit` |
    /// | `ORACLE_TICK_INTERVAL_SECS` | `schedule.tick_interval_secs` |
    /// | `ORACLE_MAX_TICKS` | `schedule.max_ticks` |
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(list) = lookup("ORACLE_CONTROLLERS") {
            self.oracle.controllers = list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(secret) = lookup("ORACLE_API_SECRET_KEY") {
            self.oracle.api_secret_key = Some(secret);
        }
        if let Some(public) = lookup("ORACLE_API_PUBLIC_KEY") {
            self.oracle.api_public_key = Some(public);
        }
        if let Some(policy) = lookup("ORACLE_FAILED_PROOF_POLICY") {
            self.oracle.failed_proof_policy = match policy.trim().to_lowercase().as_str() {
                "retain" => FailedProofPolicy::Retain,
                "discard" => FailedProofPolicy::Discard,
                other => {
                    return Err(invalid_value(
                        "ORACLE_FAILED_PROOF_POLICY",
                        format!("unknown policy '{other}'"),
                    ))
                }
            };
        }
        if let Some(dispatch) = lookup("ORACLE_DISPATCH_ADDRESS") {
            self.data_fetch.dispatch_address = dispatch;
        }
        if let Some(value) = lookup("ORACLE_GAS_LIMIT") {
            self.data_fetch.gas_limit = parse_number("ORACLE_GAS_LIMIT", &value)?;
        }
        if let Some(value) = lookup("ORACLE_TICK_INTERVAL_SECS") {
            self.schedule.tick_interval_secs = parse_number("ORACLE_TICK_INTERVAL_SECS", &value)?;
        }
        if let Some(value) = lookup("ORACLE_MAX_TICKS") {
            self.schedule.max_ticks = Some(parse_number("ORACLE_MAX_TICKS", &value)?);
        }
        Ok(())
    }

    /// Check every field the node needs at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.controllers()?.is_empty() {
            return Err(ConfigError::NoControllers);
        }
        self.dispatch_address()?;
        self.trusted_key()?;
        self.tokens()?;

        if self.schedule.tick_interval_secs == 0 {
            return Err(invalid_value("schedule.tick_interval_secs", "must be positive"));
        }
        if self.data_fetch.gas_limit == 0 {
            return Err(invalid_value("data_fetch.gas_limit", "must be positive"));
        }
        if self.oracle.query_kind.is_empty() {
            return Err(invalid_value("oracle.query_kind", "must not be empty"));
        }
        if !self.oracle.api_url_template.contains("{symbol}") {
            return Err(invalid_value(
                "oracle.api_url_template",
                "missing {symbol} placeholder",
            ));
        }
        Ok(())
    }

    /// Parsed controller addresses.
    pub fn controllers(&self) -> Result<Vec<Address>, ConfigError> {
        self.oracle
            .controllers
            .iter()
            .map(|c| address_field("oracle.controllers", c))
            .collect()
    }

    /// Parsed dispatch address.
    pub fn dispatch_address(&self) -> Result<Address, ConfigError> {
        address_field("data_fetch.dispatch_address", &self.data_fetch.dispatch_address)
    }

    /// Configured signing key, if any.
    pub fn signer(&self) -> Result<Option<LocalApiSigner>, ConfigError> {
        let Some(secret) = &self.oracle.api_secret_key else {
            return Ok(None);
        };
        let bytes = shared_types::decode_hex(secret).map_err(|e| ConfigError::InvalidKey {
            field: "oracle.api_secret_key".to_string(),
            reason: e.to_string(),
        })?;
        LocalApiSigner::from_secret(&bytes)
            .map(Some)
            .map_err(|e| ConfigError::InvalidKey {
                field: "oracle.api_secret_key".to_string(),
                reason: e.to_string(),
            })
    }

    /// Explicitly configured trusted key, checked against the signing key.
    pub fn trusted_key(&self) -> Result<Option<ApiPublicKey>, ConfigError> {
        let signer = self.signer()?;
        let Some(public) = &self.oracle.api_public_key else {
            return Ok(signer.map(|s| s.public_key()));
        };

        let key = ApiPublicKey::from_hex(public).map_err(|e| ConfigError::InvalidKey {
            field: "oracle.api_public_key".to_string(),
            reason: e.to_string(),
        })?;
        match signer {
            Some(signer) if signer.public_key() != key => Err(ConfigError::KeyMismatch),
            _ => Ok(Some(key)),
        }
    }

    /// Parsed startup tokens: identity, symbol, magnitude, quote.
    pub fn tokens(&self) -> Result<Vec<(Address, String, U256, Option<String>)>, ConfigError> {
        self.tokens
            .iter()
            .map(|entry| {
                let address = parse_address(&entry.address).map_err(|_| {
                    invalid_token(&entry.symbol, format!("bad address '{}'", entry.address))
                })?;
                if address == ZERO_ADDRESS {
                    return Err(invalid_token(&entry.symbol, "zero address"));
                }
                if entry.symbol.is_empty() {
                    return Err(invalid_token(&entry.symbol, "empty symbol"));
                }
                if entry.decimals > MAX_DECIMALS {
                    return Err(invalid_token(
                        &entry.symbol,
                        format!("decimals above {MAX_DECIMALS}"),
                    ));
                }
                Ok((
                    address,
                    entry.symbol.clone(),
                    U256::exp10(entry.decimals as usize),
                    entry.quote.clone(),
                ))
            })
            .collect()
    }

    /// Oracle service configuration for a given trusted key.
    pub fn oracle_config(&self, api_public_key: ApiPublicKey) -> OracleConfig {
        OracleConfig {
            query_kind: self.oracle.query_kind.clone(),
            api_url_template: self.oracle.api_url_template.clone(),
            decimals: self.oracle.decimals,
            failed_proof_policy: self.oracle.failed_proof_policy,
            api_public_key,
        }
    }
}

fn address_field(field: &str, value: &str) -> Result<Address, ConfigError> {
    parse_address(value).map_err(|_| ConfigError::InvalidAddress {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn parse_number(field: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|e| invalid_value(field, format!("'{value}': {e}")))
}

fn invalid_value(field: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn invalid_token(symbol: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidToken {
        symbol: symbol.to_string(),
        reason: reason.into(),
    }
}
