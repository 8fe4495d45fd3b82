//! # Simulated Data-Fetch Service
//!
//! In-process stand-in for the external query service. It charges a fixed
//! price per query kind, mints sequential correlation ids and queues each
//! request until the harness drains it and delivers the callback.

use crate::domain::entities::{Address, QueryId, U256};
use crate::domain::signature::keccak256;
use crate::ports::outbound::{DataFetchGateway, QueryError};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use tracing::debug;

/// A request accepted by the simulated service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedQuery {
    pub query_id: QueryId,
    pub kind: String,
    pub query: String,
    pub gas_limit: u64,
}

#[derive(Debug, Default)]
struct Ledger {
    next_nonce: u64,
    queue: VecDeque<IssuedQuery>,
    gas_price: U256,
}

/// Data-fetch service simulation.
#[derive(Debug)]
pub struct SimulatedQueryService {
    dispatch_address: Address,
    prices: HashMap<String, U256>,
    ledger: Mutex<Ledger>,
}

impl SimulatedQueryService {
    /// A service offering one query kind at a fixed price.
    pub fn new(dispatch_address: Address, kind: &str, price: U256) -> Self {
        Self {
            dispatch_address,
            prices: HashMap::from([(kind.to_string(), price)]),
            ledger: Mutex::new(Ledger::default()),
        }
    }

    /// Offer another query kind.
    pub fn with_kind(mut self, kind: &str, price: U256) -> Self {
        self.prices.insert(kind.to_string(), price);
        self
    }

    /// Remove and return every request awaiting a callback, oldest first.
    pub fn take_pending(&self) -> Vec<IssuedQuery> {
        self.ledger.lock().queue.drain(..).collect()
    }

    /// Number of requests awaiting a callback.
    pub fn pending_count(&self) -> usize {
        self.ledger.lock().queue.len()
    }

    /// Total requests accepted so far.
    pub fn issued_count(&self) -> u64 {
        self.ledger.lock().next_nonce
    }

    /// Gas price last set through the gateway.
    pub fn gas_price(&self) -> U256 {
        self.ledger.lock().gas_price
    }
}

impl DataFetchGateway for SimulatedQueryService {
    fn query(&self, kind: &str, query: &str, gas_limit: u64) -> Result<QueryId, QueryError> {
        if !self.prices.contains_key(kind) {
            return Err(QueryError::UnsupportedKind(kind.to_string()));
        }

        let mut ledger = self.ledger.lock();
        let nonce = ledger.next_nonce;
        ledger.next_nonce += 1;

        let mut seed = Vec::with_capacity(28);
        seed.extend_from_slice(&self.dispatch_address);
        seed.extend_from_slice(&nonce.to_be_bytes());
        let query_id = keccak256(&seed);

        debug!(nonce, query = %query, "Simulated query accepted");
        ledger.queue.push_back(IssuedQuery {
            query_id,
            kind: kind.to_string(),
            query: query.to_string(),
            gas_limit,
        });
        Ok(query_id)
    }

    fn price(&self, kind: &str) -> U256 {
        self.prices.get(kind).copied().unwrap_or_default()
    }

    fn set_custom_gas_price(&self, gas_price: U256) {
        self.ledger.lock().gas_price = gas_price;
    }

    fn dispatch_address(&self) -> Address {
        self.dispatch_address
    }
}
