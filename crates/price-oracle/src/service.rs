//! # Price Oracle Service
//!
//! Application service layer that implements `PriceOracleApi` and
//! `RateConverter`.
//!
//! ## Architecture
//!
//! This is the hexagonal "application service" that:
//! - Implements the inbound ports
//! - Uses the outbound ports (`DataFetchGateway`, `AuthorizationGateway`) and
//!   the shared bus `EventPublisher`
//! - Delegates parsing and verification to the domain layer
//!
//! ## Rate update pipeline
//!
//! `Requested -> Verifying -> {Committed | Rejected}`. A callback is checked
//! for caller, correlation and token, its proof is split, then the date,
//! payload digest and signature are verified in that order. Only when all
//! pass, and the payload yields a rate, is the registry written.
//!
//! All oracle state sits behind one mutex, so each entry point is atomic and
//! serialised with respect to every other. Batch mutations run on a scratch
//! copy that replaces the live state only on success.

use crate::domain::correlator::QueryCorrelator;
use crate::domain::date::validate_date;
use crate::domain::entities::{
    Address, ApiPublicKey, BatchOutcome, BatchShortfall, CallbackOutcome, FailedProofPolicy,
    ParsedProof, QueryId, Token, U256,
};
use crate::domain::errors::{OracleError, ProofError};
use crate::domain::proof;
use crate::domain::rate::{parse_rate, DEFAULT_DECIMALS};
use crate::domain::registry::TokenRegistry;
use crate::domain::signature::{sha256, verify_signature};
use crate::ports::inbound::{PriceOracleApi, RateConverter};
use crate::ports::outbound::{AuthorizationGateway, DataFetchGateway};
use parking_lot::Mutex;
use shared_bus::{EventPublisher, OracleEvent};
use shared_types::format_address;
use tracing::{debug, info, warn};

/// Query kind understood by the data-fetch service.
pub const DEFAULT_QUERY_KIND: &str = "URL";

/// Pricing endpoint; `{symbol}` is replaced per token.
pub const DEFAULT_API_URL_TEMPLATE: &str =
    "json(https://min-api.cryptocompare.com/data/price?fsym={symbol}&tsyms=ETH&sign=true).ETH";

/// Oracle service configuration.
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Query kind passed to the data-fetch service.
    pub query_kind: String,
    /// Query string template; `{symbol}` is replaced by the token symbol.
    pub api_url_template: String,
    /// Fractional digits of the base currency.
    pub decimals: u32,
    /// Fate of the correlation after a rejected proof.
    pub failed_proof_policy: FailedProofPolicy,
    /// Initially trusted API signer key.
    pub api_public_key: ApiPublicKey,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            query_kind: DEFAULT_QUERY_KIND.to_string(),
            api_url_template: DEFAULT_API_URL_TEMPLATE.to_string(),
            decimals: DEFAULT_DECIMALS,
            failed_proof_policy: FailedProofPolicy::default(),
            api_public_key: ApiPublicKey::default(),
        }
    }
}

impl OracleConfig {
    /// Query string for one token.
    pub fn query_for(&self, symbol: &str) -> String {
        self.api_url_template.replace("{symbol}", symbol)
    }
}

/// Everything an entry point may mutate.
#[derive(Debug, Clone)]
struct OracleState {
    registry: TokenRegistry,
    correlator: QueryCorrelator,
    api_public_key: ApiPublicKey,
    gas_price: U256,
    balance: U256,
}

/// Run the verification stages over a structurally valid proof.
///
/// Returns the proof's freshness timestamp and the parsed rate.
pub fn verify_proof(
    parsed: &ParsedProof<'_>,
    result: &str,
    last_update: u64,
    key: &ApiPublicKey,
    decimals: u32,
) -> Result<(u64, U256), ProofError> {
    let date = proof::extract_date(parsed.headers)
        .map_err(|e| ProofError::InvalidDate(e.to_string()))?;
    let timestamp = validate_date(date, last_update)?;
    debug!(timestamp, "Proof date accepted");

    let expected = proof::extract_digest(parsed.headers)?;
    if expected.as_slice() != sha256(result.as_bytes()).as_slice() {
        return Err(ProofError::DigestMismatch);
    }
    debug!("Proof digest matches payload");

    if !verify_signature(parsed.headers, parsed.signature, key) {
        return Err(ProofError::SignatureMismatch);
    }
    debug!("Proof signed by trusted key");

    let rate = parse_rate(result, decimals)?;
    Ok((timestamp, rate))
}

/// Price Oracle Service.
///
/// Generic over its collaborators so tests and the node can plug in their
/// own gateways and publisher.
pub struct PriceOracleService<Q, A, P>
where
    Q: DataFetchGateway,
    A: AuthorizationGateway,
    P: EventPublisher,
{
    data_fetch: Q,
    authorization: A,
    publisher: P,
    config: OracleConfig,
    state: Mutex<OracleState>,
}

impl<Q, A, P> PriceOracleService<Q, A, P>
where
    Q: DataFetchGateway,
    A: AuthorizationGateway,
    P: EventPublisher,
{
    /// Create a new oracle with an empty registry and zero balance.
    pub fn new(data_fetch: Q, authorization: A, publisher: P, config: OracleConfig) -> Self {
        let state = OracleState {
            registry: TokenRegistry::new(),
            correlator: QueryCorrelator::new(),
            api_public_key: config.api_public_key,
            gas_price: U256::zero(),
            balance: U256::zero(),
        };
        Self {
            data_fetch,
            authorization,
            publisher,
            config,
            state: Mutex::new(state),
        }
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    pub fn data_fetch(&self) -> &Q {
        &self.data_fetch
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    /// Gas price last set by a controller.
    pub fn gas_price(&self) -> U256 {
        self.state.lock().gas_price
    }

    fn ensure_authorized(&self, caller: &Address) -> Result<(), OracleError> {
        if self.authorization.is_authorized(caller) {
            Ok(())
        } else {
            warn!(caller = %format_address(caller), "Unauthorized controller call");
            Err(OracleError::Unauthorized(*caller))
        }
    }

    fn publish_all(&self, events: Vec<OracleEvent>) {
        for event in events {
            self.publisher.publish(event);
        }
    }

    /// Issue one query per token against a scratch copy of the state.
    fn issue_batch(
        &self,
        state: &mut OracleState,
        tokens: &[Address],
        gas_limit: u64,
    ) -> Result<BatchOutcome, OracleError> {
        if tokens.is_empty() {
            let shortfall = BatchShortfall::EmptyRegistry;
            warn!(reason = %shortfall, "Batch update skipped");
            self.publisher.publish(OracleEvent::UpdateRequestFailed {
                reason: shortfall.to_string(),
            });
            return Ok(BatchOutcome::Skipped(shortfall));
        }

        let price = self.data_fetch.price(&self.config.query_kind);
        let affordable = price
            .checked_mul(U256::from(tokens.len()))
            .filter(|required| *required <= state.balance);
        if affordable.is_none() {
            let shortfall = BatchShortfall::InsufficientFunds {
                required: price.saturating_mul(U256::from(tokens.len())),
                available: state.balance,
            };
            warn!(reason = %shortfall, "Batch update skipped");
            self.publisher.publish(OracleEvent::UpdateRequestFailed {
                reason: shortfall.to_string(),
            });
            return Ok(BatchOutcome::Skipped(shortfall));
        }

        let mut scratch = state.clone();
        let mut issued = Vec::with_capacity(tokens.len());
        let mut events = Vec::with_capacity(tokens.len());

        for token in tokens {
            let symbol = scratch
                .registry
                .get(token)
                .map(|t| t.symbol.clone())
                .ok_or(OracleError::NotFound(*token))?;
            let query = self.config.query_for(&symbol);

            let query_id = self
                .data_fetch
                .query(&self.config.query_kind, &query, gas_limit)
                .map_err(|e| {
                    warn!(symbol = %symbol, error = %e, "Data-fetch request failed");
                    OracleError::QueryFailed(e.to_string())
                })?;
            debug!(symbol = %symbol, query_id = %hex::encode(query_id), "Update requested");

            scratch.correlator.open(query_id, *token);
            scratch.balance -= price;
            issued.push((*token, query_id));
            events.push(OracleEvent::UpdateRequested { symbol, query_id });
        }

        *state = scratch;
        self.publish_all(events);
        info!(count = issued.len(), "Rate updates requested");
        Ok(BatchOutcome::Requested(issued))
    }
}

impl<Q, A, P> PriceOracleApi for PriceOracleService<Q, A, P>
where
    Q: DataFetchGateway,
    A: AuthorizationGateway,
    P: EventPublisher,
{
    fn update_api_public_key(
        &self,
        caller: Address,
        public_key: &[u8],
    ) -> Result<(), OracleError> {
        self.ensure_authorized(&caller)?;
        let key = ApiPublicKey::from_bytes(public_key)?;

        self.state.lock().api_public_key = key;
        info!(key = %key.to_hex(), "API public key replaced");
        self.publisher.publish(OracleEvent::ApiPublicKeySet {
            sender: caller,
            public_key: key.as_bytes().to_vec(),
        });
        Ok(())
    }

    fn set_custom_gas_price(&self, caller: Address, gas_price: U256) -> Result<(), OracleError> {
        self.ensure_authorized(&caller)?;

        let mut state = self.state.lock();
        self.data_fetch.set_custom_gas_price(gas_price);
        state.gas_price = gas_price;
        info!(%gas_price, "Custom gas price set");
        self.publisher.publish(OracleEvent::GasPriceSet {
            sender: caller,
            gas_price,
        });
        Ok(())
    }

    fn add_tokens(
        &self,
        caller: Address,
        tokens: &[Address],
        symbols: &[String],
        magnitudes: &[U256],
        as_of: u64,
    ) -> Result<(), OracleError> {
        self.ensure_authorized(&caller)?;
        if tokens.len() != symbols.len() || tokens.len() != magnitudes.len() {
            return Err(OracleError::BatchLengthMismatch {
                tokens: tokens.len(),
                symbols: symbols.len(),
                magnitudes: magnitudes.len(),
            });
        }

        let mut state = self.state.lock();
        let mut registry = state.registry.clone();
        let entries = tokens
            .iter()
            .zip(symbols)
            .zip(magnitudes)
            .map(|((t, s), m)| (*t, s.as_str(), *m));
        registry.add_batch(entries, as_of)?;
        state.registry = registry;

        for ((token, symbol), magnitude) in tokens.iter().zip(symbols).zip(magnitudes) {
            info!(token = %format_address(token), symbol = %symbol, "Token added");
            self.publisher.publish(OracleEvent::TokenAdded {
                token: *token,
                symbol: symbol.clone(),
                magnitude: *magnitude,
            });
        }
        Ok(())
    }

    fn remove_tokens(&self, caller: Address, tokens: &[Address]) -> Result<(), OracleError> {
        self.ensure_authorized(&caller)?;

        let mut state = self.state.lock();
        let mut registry = state.registry.clone();
        registry.remove_batch(tokens)?;
        state.registry = registry;

        for token in tokens {
            let closed = state.correlator.close_token(token);
            info!(token = %format_address(token), closed, "Token removed");
            self.publisher
                .publish(OracleEvent::TokenRemoved { token: *token });
        }
        Ok(())
    }

    fn update_token_rate(
        &self,
        caller: Address,
        token: Address,
        rate: U256,
        as_of: u64,
    ) -> Result<(), OracleError> {
        self.ensure_authorized(&caller)?;

        self.state.lock().registry.set_rate(&token, rate, as_of)?;
        info!(token = %format_address(&token), %rate, "Token rate set manually");
        self.publisher.publish(OracleEvent::TokenRateUpdated {
            sender: caller,
            token,
            rate,
        });
        Ok(())
    }

    fn update_token_rates(
        &self,
        caller: Address,
        gas_limit: u64,
    ) -> Result<BatchOutcome, OracleError> {
        self.ensure_authorized(&caller)?;

        let mut state = self.state.lock();
        let tokens = state.registry.addresses().to_vec();
        self.issue_batch(&mut state, &tokens, gas_limit)
    }

    fn update_token_rates_list(
        &self,
        caller: Address,
        gas_limit: u64,
        tokens: &[Address],
    ) -> Result<BatchOutcome, OracleError> {
        self.ensure_authorized(&caller)?;

        let mut state = self.state.lock();
        if let Some(missing) = tokens.iter().find(|t| !state.registry.contains(t)) {
            return Err(OracleError::NotFound(*missing));
        }
        self.issue_batch(&mut state, tokens, gas_limit)
    }

    fn withdraw(&self, caller: Address, to: Address, amount: U256) -> Result<(), OracleError> {
        self.ensure_authorized(&caller)?;

        let mut state = self.state.lock();
        if amount > state.balance {
            return Err(OracleError::InsufficientFunds {
                required: amount,
                available: state.balance,
            });
        }
        state.balance -= amount;
        info!(to = %format_address(&to), %amount, "Funds withdrawn");
        self.publisher.publish(OracleEvent::Withdrawn { to, amount });
        Ok(())
    }

    fn deposit(&self, from: Address, amount: U256) -> Result<U256, OracleError> {
        let mut state = self.state.lock();
        state.balance = state
            .balance
            .checked_add(amount)
            .ok_or(OracleError::Overflow)?;
        debug!(from = %format_address(&from), %amount, "Funds deposited");
        self.publisher.publish(OracleEvent::Deposited { from, amount });
        Ok(state.balance)
    }

    fn callback(
        &self,
        caller: Address,
        query_id: QueryId,
        result: &str,
        proof_blob: &[u8],
    ) -> Result<CallbackOutcome, OracleError> {
        let dispatcher = self.data_fetch.dispatch_address();
        if caller != dispatcher {
            warn!(caller = %format_address(&caller), "Callback from unknown dispatcher");
            return Err(OracleError::Unauthorized(caller));
        }

        let mut state = self.state.lock();
        let token = state.correlator.resolve(&query_id)?;
        let last_update = state
            .registry
            .get(&token)
            .map(|t| t.last_update)
            .ok_or(OracleError::NotFound(token))?;
        let parsed = proof::extract(proof_blob)?;
        debug!(
            query_id = %hex::encode(query_id),
            token = %format_address(&token),
            "Verifying callback proof"
        );

        let key = state.api_public_key;
        match verify_proof(&parsed, result, last_update, &key, self.config.decimals) {
            Ok((timestamp, rate)) => {
                state.registry.set_rate(&token, rate, timestamp)?;
                state.correlator.close(&query_id);
                info!(
                    token = %format_address(&token),
                    %rate,
                    timestamp,
                    "Proof verified, rate committed"
                );

                self.publisher.publish(OracleEvent::ProofVerified {
                    public_key: key.as_bytes().to_vec(),
                    result: result.to_string(),
                });
                self.publisher.publish(OracleEvent::TokenRateUpdated {
                    sender: dispatcher,
                    token,
                    rate,
                });
                Ok(CallbackOutcome::Committed {
                    token,
                    rate,
                    timestamp,
                })
            }
            Err(error) => {
                let stage = error.stage();
                warn!(
                    token = %format_address(&token),
                    stage = %stage,
                    error = %error,
                    "Proof rejected"
                );
                if self.config.failed_proof_policy == FailedProofPolicy::Discard {
                    state.correlator.close(&query_id);
                }

                self.publisher.publish(OracleEvent::ProofVerificationFailed {
                    public_key: key.as_bytes().to_vec(),
                    result: result.to_string(),
                    reason: stage.as_str().to_string(),
                });
                Ok(CallbackOutcome::Rejected { token, error })
            }
        }
    }

    fn token(&self, token: &Address) -> Option<Token> {
        self.state.lock().registry.get(token).cloned()
    }

    fn token_addresses(&self) -> Vec<Address> {
        self.state.lock().registry.addresses().to_vec()
    }

    fn api_public_key(&self) -> ApiPublicKey {
        self.state.lock().api_public_key
    }

    fn balance(&self) -> U256 {
        self.state.lock().balance
    }

    fn pending_queries(&self) -> Vec<(QueryId, Address)> {
        self.state.lock().correlator.pending()
    }
}

impl<Q, A, P> RateConverter for PriceOracleService<Q, A, P>
where
    Q: DataFetchGateway,
    A: AuthorizationGateway,
    P: EventPublisher,
{
    fn convert(&self, token: &Address, amount: U256) -> Result<U256, OracleError> {
        self.state.lock().registry.convert(token, amount)
    }
}

// =============================================================================
// TESTS
// =============================================================================
