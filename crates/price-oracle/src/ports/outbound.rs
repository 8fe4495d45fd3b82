//! # Outbound Ports (Driven Ports / SPI)
//!
//! Collaborators the oracle depends on but does not own.

use crate::domain::entities::{Address, QueryId, U256};
use thiserror::Error;

/// Error from the data-fetch service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// The query kind is not offered by the service.
    #[error("Unsupported query kind: {0}")]
    UnsupportedKind(String),

    /// The request was refused.
    #[error("Query rejected: {reason}")]
    Rejected { reason: String },

    /// Communication error
    #[error("Communication error: {0}")]
    CommunicationError(String),
}

/// Gateway to the external data-fetch service.
///
/// The service accepts a request, charges `price(kind)` for it and later
/// delivers the result through `PriceOracleApi::callback`, calling from
/// `dispatch_address()`.
///
/// Calls are synchronous: issuing a request only enqueues it.
pub trait DataFetchGateway: Send + Sync {
    /// Issue a request and return its correlation id.
    ///
    /// # Errors
    /// * `QueryError::UnsupportedKind` - The service does not handle `kind`
    /// * `QueryError::Rejected` - The service refused the request
    fn query(&self, kind: &str, query: &str, gas_limit: u64) -> Result<QueryId, QueryError>;

    /// Cost of one request of `kind`.
    fn price(&self, kind: &str) -> U256;

    /// Gas price to use for future callbacks.
    fn set_custom_gas_price(&self, gas_price: U256);

    /// Identity the service uses when delivering callbacks.
    fn dispatch_address(&self) -> Address;
}

/// Capability check for controller-only operations.
pub trait AuthorizationGateway: Send + Sync {
    /// Whether `caller` may administer the oracle.
    fn is_authorized(&self, caller: &Address) -> bool;
}

impl<T: DataFetchGateway + ?Sized> DataFetchGateway for std::sync::Arc<T> {
    fn query(&self, kind: &str, query: &str, gas_limit: u64) -> Result<QueryId, QueryError> {
        (**self).query(kind, query, gas_limit)
    }

    fn price(&self, kind: &str) -> U256 {
        (**self).price(kind)
    }

    fn set_custom_gas_price(&self, gas_price: U256) {
        (**self).set_custom_gas_price(gas_price)
    }

    fn dispatch_address(&self) -> Address {
        (**self).dispatch_address()
    }
}

impl<T: AuthorizationGateway + ?Sized> AuthorizationGateway for std::sync::Arc<T> {
    fn is_authorized(&self, caller: &Address) -> bool {
        (**self).is_authorized(caller)
    }
}
