//! # Inbound Ports (Driving Ports / API)
//!
//! Traits that define the public API of the oracle.
//!
//! Every entry point is atomic: it either completes or leaves the oracle
//! unchanged. Implementations must be thread-safe (`Send + Sync`).

use crate::domain::entities::{
    Address, ApiPublicKey, BatchOutcome, CallbackOutcome, QueryId, Token, U256,
};
use crate::domain::errors::OracleError;

/// Primary oracle API.
///
/// Controller-only operations take the caller identity and fail with
/// `OracleError::Unauthorized` when the capability check refuses it.
pub trait PriceOracleApi: Send + Sync {
    // =========================================================================
    // Administration (controller only)
    // =========================================================================

    /// Replace the trusted API signer key (64 bytes, or 65 with `0x04`).
    fn update_api_public_key(&self, caller: Address, public_key: &[u8])
        -> Result<(), OracleError>;

    /// Set the gas price the data-fetch service uses for callbacks.
    fn set_custom_gas_price(&self, caller: Address, gas_price: U256) -> Result<(), OracleError>;

    /// Register tokens from parallel lists. All or nothing.
    fn add_tokens(
        &self,
        caller: Address,
        tokens: &[Address],
        symbols: &[String],
        magnitudes: &[U256],
        as_of: u64,
    ) -> Result<(), OracleError>;

    /// Remove tokens. All or nothing; a duplicate fails with `NotFound`.
    fn remove_tokens(&self, caller: Address, tokens: &[Address]) -> Result<(), OracleError>;

    /// Manually overwrite a rate, bypassing proof verification.
    fn update_token_rate(
        &self,
        caller: Address,
        token: Address,
        rate: U256,
        as_of: u64,
    ) -> Result<(), OracleError>;

    /// Request a fresh rate for every registered token.
    ///
    /// An empty registry or an unaffordable batch is reported as
    /// `BatchOutcome::Skipped`, not as an error.
    fn update_token_rates(&self, caller: Address, gas_limit: u64)
        -> Result<BatchOutcome, OracleError>;

    /// Request fresh rates for an explicit subset of registered tokens.
    fn update_token_rates_list(
        &self,
        caller: Address,
        gas_limit: u64,
        tokens: &[Address],
    ) -> Result<BatchOutcome, OracleError>;

    /// Move funds out of the oracle balance.
    fn withdraw(&self, caller: Address, to: Address, amount: U256) -> Result<(), OracleError>;

    // =========================================================================
    // Open entry points
    // =========================================================================

    /// Add funds to the oracle balance. Returns the new balance.
    fn deposit(&self, from: Address, amount: U256) -> Result<U256, OracleError>;

    /// Deliver a data-fetch result with its proof.
    ///
    /// Only the data-fetch dispatcher may call this. Structural failures
    /// abort; verification failures are absorbed and reported as
    /// `CallbackOutcome::Rejected`.
    fn callback(
        &self,
        caller: Address,
        query_id: QueryId,
        result: &str,
        proof: &[u8],
    ) -> Result<CallbackOutcome, OracleError>;

    // =========================================================================
    // Queries
    // =========================================================================

    fn token(&self, token: &Address) -> Option<Token>;

    /// Registered identities in iteration order.
    fn token_addresses(&self) -> Vec<Address>;

    fn api_public_key(&self) -> ApiPublicKey;

    fn balance(&self) -> U256;

    fn pending_queries(&self) -> Vec<(QueryId, Address)>;
}

/// Read-only pricing interface for consumers.
pub trait RateConverter: Send + Sync {
    /// `amount * rate / magnitude`; `NotFound` for unknown or unpriced tokens.
    fn convert(&self, token: &Address, amount: U256) -> Result<U256, OracleError>;
}
