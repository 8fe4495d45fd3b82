//! # Oracle Events
//!
//! Defines all audit events that flow through the shared bus.
//! Events are emitted for observability only; no oracle behaviour depends on
//! whether anyone is listening.

use serde::{Deserialize, Serialize};
use shared_types::entities::{Address, QueryId, U256};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OracleEvent {
    // =========================================================================
    // TOKEN REGISTRY
    // =========================================================================
    /// A token was registered.
    TokenAdded {
        /// Token identity.
        token: Address,
        /// Human-readable symbol.
        symbol: String,
        /// 10^decimals of the token.
        magnitude: U256,
    },

    /// A token was removed from the registry.
    TokenRemoved {
        /// Token identity.
        token: Address,
    },

    // =========================================================================
    // RATES
    // =========================================================================
    /// A token rate was overwritten, either manually or by a verified proof.
    TokenRateUpdated {
        /// Controller (manual path) or data-fetch dispatcher (proof path).
        sender: Address,
        /// Token identity.
        token: Address,
        /// New rate in the base currency's smallest unit.
        rate: U256,
    },

    // =========================================================================
    // DATA-FETCH QUERIES
    // =========================================================================
    /// A rate update was requested for one token.
    UpdateRequested {
        /// Symbol used in the query string.
        symbol: String,
        /// Correlation id assigned by the data-fetch service.
        query_id: QueryId,
    },

    /// A batch update request was not issued.
    UpdateRequestFailed {
        /// Why the batch was skipped.
        reason: String,
    },

    /// The custom gas price forwarded to the data-fetch service changed.
    GasPriceSet {
        /// Controller that changed it.
        sender: Address,
        /// New gas price.
        gas_price: U256,
    },

    // =========================================================================
    // PROOF VERIFICATION
    // =========================================================================
    /// A callback proof passed every verification stage.
    ProofVerified {
        /// Trusted key used for the verification.
        public_key: Vec<u8>,
        /// Raw result payload.
        result: String,
    },

    /// A callback proof failed one verification stage.
    ProofVerificationFailed {
        /// Trusted key used for the verification.
        public_key: Vec<u8>,
        /// Raw result payload.
        result: String,
        /// Failing stage: "date", "hash", "signature" or "rate".
        reason: String,
    },

    /// The trusted API public key was replaced.
    ApiPublicKeySet {
        /// Controller that replaced it.
        sender: Address,
        /// New key (64 bytes).
        public_key: Vec<u8>,
    },

    // =========================================================================
    // FUNDS
    // =========================================================================
    /// Funds were added to the oracle balance.
    Deposited {
        /// Depositor.
        from: Address,
        /// Amount added.
        amount: U256,
    },

    /// Funds were withdrawn from the oracle balance.
    Withdrawn {
        /// Recipient.
        to: Address,
        /// Amount removed.
        amount: U256,
    },
}

impl OracleEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::TokenAdded { .. } | Self::TokenRemoved { .. } => EventTopic::Registry,
            Self::TokenRateUpdated { .. } => EventTopic::Rates,
            Self::UpdateRequested { .. }
            | Self::UpdateRequestFailed { .. }
            | Self::GasPriceSet { .. } => EventTopic::Queries,
            Self::ProofVerified { .. }
            | Self::ProofVerificationFailed { .. }
            | Self::ApiPublicKeySet { .. } => EventTopic::Proofs,
            Self::Deposited { .. } | Self::Withdrawn { .. } => EventTopic::Funds,
        }
    }

    /// Get the token this event concerns, if any.
    #[must_use]
    pub fn token(&self) -> Option<Address> {
        match self {
            Self::TokenAdded { token, .. }
            | Self::TokenRemoved { token }
            | Self::TokenRateUpdated { token, .. } => Some(*token),
            _ => None,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Token additions and removals.
    Registry,
    /// Rate updates.
    Rates,
    /// Data-fetch requests and gas price changes.
    Queries,
    /// Proof verification outcomes and key rotation.
    Proofs,
    /// Deposits and withdrawals.
    Funds,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Tokens to include. Empty means all tokens; events without a token
    /// never match a non-empty token list.
    pub tokens: Vec<Address>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            tokens: Vec::new(),
        }
    }

    /// Create a filter for events concerning specific tokens.
    #[must_use]
    pub fn for_tokens(tokens: Vec<Address>) -> Self {
        Self {
            topics: Vec::new(),
            tokens,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &OracleEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let token_match = self.tokens.is_empty()
            || event.token().is_some_and(|t| self.tokens.contains(&t));

        topic_match && token_match
    }
}
