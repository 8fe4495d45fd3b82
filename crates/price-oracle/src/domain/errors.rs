//! # Oracle Errors
//!
//! Two families of failure:
//!
//! - [`OracleError`] aborts the whole call and leaves every store unchanged
//!   (structural, authorization and accounting failures).
//! - [`ProofError`] is an expected outcome of a noisy or adversarial data
//!   source. The pipeline absorbs it: the callback succeeds, the rate update is
//!   skipped and the failing stage is reported through an audit event.

use super::entities::VerificationStage;
use shared_types::{format_address, format_hash, Address, QueryId, U256};
use thiserror::Error;

/// Errors that abort an oracle entry point.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OracleError {
    /// The token is not registered, or has no rate yet (`convert`).
    #[error("Token not found: {}", format_address(.0))]
    NotFound(Address),

    /// The token is already registered.
    #[error("Token already exists: {}", format_address(.0))]
    AlreadyExists(Address),

    /// The caller failed the capability check.
    #[error("Unauthorized caller: {}", format_address(.0))]
    Unauthorized(Address),

    /// The proof blob is structurally invalid.
    #[error("Malformed proof: {0}")]
    MalformedProof(String),

    /// No pending query matches this correlation id.
    #[error("Unknown query: {}", format_hash(.0))]
    UnknownQuery(QueryId),

    /// The oracle balance cannot cover the requested amount.
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: U256, available: U256 },

    /// An arithmetic result does not fit in 256 bits.
    #[error("Arithmetic overflow")]
    Overflow,

    /// A token registration violates the entry invariants.
    #[error("Invalid token {}: {reason}", format_address(.token))]
    InvalidToken { token: Address, reason: String },

    /// The supplied API public key has the wrong shape.
    #[error("Invalid public key: expected 64 bytes (or 65 with 0x04 prefix), got {0}")]
    InvalidPublicKey(usize),

    /// Parallel batch arguments have different lengths.
    #[error("Batch length mismatch: {tokens} tokens, {symbols} symbols, {magnitudes} magnitudes")]
    BatchLengthMismatch {
        tokens: usize,
        symbols: usize,
        magnitudes: usize,
    },

    /// The data-fetch service refused a request.
    #[error("Query failed: {0}")]
    QueryFailed(String),
}

/// Verification failures absorbed by the rate-update pipeline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProofError {
    /// The date header could not be parsed or a component is out of range.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// The date is not strictly newer than the token's last update.
    #[error("Stale date: {timestamp} is not newer than {last_update}")]
    StaleDate { timestamp: u64, last_update: u64 },

    /// The payload digest does not match the digest header.
    #[error("Digest mismatch")]
    DigestMismatch,

    /// The recovered signer is not the trusted API key.
    #[error("Signature mismatch")]
    SignatureMismatch,

    /// The verified payload is not a decimal rate.
    #[error("Invalid rate: {0}")]
    InvalidRate(String),
}

impl ProofError {
    /// The pipeline stage this failure belongs to.
    #[must_use]
    pub fn stage(&self) -> VerificationStage {
        match self {
            Self::InvalidDate(_) | Self::StaleDate { .. } => VerificationStage::Date,
            Self::DigestMismatch => VerificationStage::Hash,
            Self::SignatureMismatch => VerificationStage::Signature,
            Self::InvalidRate(_) => VerificationStage::Rate,
        }
    }
}

/// Errors from signature recovery.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    /// Wrong length or scalar out of range.
    #[error("Invalid signature format")]
    InvalidFormat,

    /// Invalid recovery ID (v must be 0, 1, 27, or 28).
    #[error("Invalid recovery ID: {0}")]
    InvalidRecoveryId(u8),

    /// Failed to recover public key from signature.
    #[error("Failed to recover public key")]
    RecoveryFailed,
}
