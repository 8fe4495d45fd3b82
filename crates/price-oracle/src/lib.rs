//! # Price Oracle
//!
//! Token exchange-rate registry whose rates are updated only by proofs
//! signed by a trusted pricing API.
//!
//! ## Architecture
//!
//! This crate follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): registry, correlator, proof parser, date
//!   and rate parsing, signature recovery. Pure, no I/O
//! - **Ports Layer** (`ports/`): the oracle API and the collaborators it needs
//! - **Service Layer** (`service.rs`): the rate update pipeline
//! - **Adapters** (`adapters/`): in-process collaborators for the node and tests
//!
//! ## Security Notes
//!
//! - **Bounds-checked proofs**: declared lengths never read past the blob
//! - **Freshness**: a proof must be dated strictly after the token's last update
//! - **Standard Recovery**: high-S signatures recover like ecrecover
//! - **Single trusted key**: rotating it affects future callbacks only

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::{
    IssuedQuery, LocalApiSigner, RecordingPublisher, SimulatedQueryService, StaticAuthorization,
};
pub use domain::correlator::QueryCorrelator;
pub use domain::date::{parse_date, validate_date, HeaderDate};
pub use domain::entities::{
    ApiPublicKey, BatchOutcome, BatchShortfall, CallbackOutcome, FailedProofPolicy, ParsedProof,
    Token, VerificationStage, API_PUBLIC_KEY_LENGTH, DEFAULT_API_PUBLIC_KEY,
};
pub use domain::entities::{Address, Hash, QueryId, U256};
pub use domain::errors::{OracleError, ProofError, SignatureError};
pub use domain::rate::{parse_rate, DEFAULT_DECIMALS};
pub use domain::registry::TokenRegistry;
pub use domain::signature::{keccak256, recover_signer, sha256, verify_signature};
pub use ports::inbound::{PriceOracleApi, RateConverter};
pub use ports::outbound::{AuthorizationGateway, DataFetchGateway, QueryError};
pub use service::{
    verify_proof, OracleConfig, PriceOracleService, DEFAULT_API_URL_TEMPLATE, DEFAULT_QUERY_KIND,
};
