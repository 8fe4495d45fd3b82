//! # Domain Entities
//!
//! Core data structures for the token registry and the proof pipeline.

use super::errors::{OracleError, ProofError};
use super::signature::address_from_public_key;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::fmt;

pub use shared_types::{Address, Hash, QueryId, U256};

/// Length of a raw (unprefixed) uncompressed secp256k1 public key: x || y.
pub const API_PUBLIC_KEY_LENGTH: usize = 64;

/// SEC1 tag byte of an uncompressed point.
const UNCOMPRESSED_TAG: u8 = 0x04;

/// Public key of the pricing API signer the oracle trusts out of the box.
pub const DEFAULT_API_PUBLIC_KEY: [u8; API_PUBLIC_KEY_LENGTH] = [
    0xc2, 0x8b, 0x89, 0x6c, 0x1c, 0xfb, 0xe6, 0x8a, 0x0e, 0xfe, 0xd7, 0x78, 0x6e, 0xcc, 0x54, 0x3e,
    0x83, 0xe5, 0x09, 0x31, 0x93, 0xab, 0x68, 0x6d, 0xd0, 0x22, 0xda, 0x9f, 0x7f, 0x4b, 0xb5, 0x27,
    0xed, 0xbe, 0xc6, 0x31, 0x05, 0x3f, 0x46, 0x4d, 0xf8, 0x90, 0x1c, 0xee, 0xf7, 0xae, 0x1f, 0x35,
    0x6c, 0x3e, 0x74, 0x03, 0x68, 0xfc, 0x92, 0x4b, 0xba, 0x29, 0xd6, 0x4e, 0x42, 0x12, 0xc5, 0x10,
];

// =============================================================================
// Registry Types
// =============================================================================

/// A registered asset and its current exchange rate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Short human-readable identifier, used in query strings.
    pub symbol: String,
    /// 10^decimals of the token.
    pub magnitude: U256,
    /// Base-currency smallest unit per whole token. Zero means "unknown".
    pub rate: U256,
    /// Freshness marker composed as `YYYYMMDDHHMMSS`. Not epoch time.
    pub last_update: u64,
    /// Tombstone flag. A default (absent) token has `exists = false`.
    pub exists: bool,
}

impl Token {
    /// A freshly registered token with no rate yet.
    pub fn new(symbol: impl Into<String>, magnitude: U256, as_of: u64) -> Self {
        Self {
            symbol: symbol.into(),
            magnitude,
            rate: U256::zero(),
            last_update: as_of,
            exists: true,
        }
    }

    /// Whether a rate has been established.
    pub fn has_rate(&self) -> bool {
        !self.rate.is_zero()
    }
}

// =============================================================================
// Trusted Key
// =============================================================================

/// The trusted API signer key: 64 raw bytes (x || y of an uncompressed point).
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiPublicKey(#[serde_as(as = "Bytes")] [u8; API_PUBLIC_KEY_LENGTH]);

impl ApiPublicKey {
    /// Wrap raw key bytes.
    pub const fn from_raw(bytes: [u8; API_PUBLIC_KEY_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Accepts 64 raw bytes, or the 65-byte SEC1 form with a `0x04` prefix.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, OracleError> {
        let raw = match bytes {
            [UNCOMPRESSED_TAG, rest @ ..] if rest.len() == API_PUBLIC_KEY_LENGTH => rest,
            _ if bytes.len() == API_PUBLIC_KEY_LENGTH => bytes,
            _ => return Err(OracleError::InvalidPublicKey(bytes.len())),
        };

        let mut key = [0u8; API_PUBLIC_KEY_LENGTH];
        key.copy_from_slice(raw);
        Ok(Self(key))
    }

    /// Parse from hex text (with or without `0x`).
    pub fn from_hex(input: &str) -> Result<Self, OracleError> {
        let bytes = shared_types::decode_hex(input)
            .map_err(|_| OracleError::InvalidPublicKey(input.len() / 2))?;
        Self::from_bytes(&bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; API_PUBLIC_KEY_LENGTH] {
        &self.0
    }

    /// Signer address: last 20 bytes of keccak-256 over the raw key.
    pub fn address(&self) -> Address {
        address_from_public_key(&self.0)
    }

    /// `0x`-prefixed lowercase hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl Default for ApiPublicKey {
    fn default() -> Self {
        Self(DEFAULT_API_PUBLIC_KEY)
    }
}

impl fmt::Debug for ApiPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiPublicKey").field(&self.to_hex()).finish()
    }
}

// =============================================================================
// Proof Pipeline Types
// =============================================================================

/// Signature and header bytes borrowed from a proof blob.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ParsedProof<'a> {
    /// Signature bytes (65 bytes `r || s || v` for a well-formed proof).
    pub signature: &'a [u8],
    /// Signed HTTP-style header block.
    pub headers: &'a [u8],
}

/// Verification stage named in audit events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStage {
    /// Date parse, range check and freshness.
    Date,
    /// Payload digest comparison.
    Hash,
    /// Signer recovery against the trusted key.
    Signature,
    /// Rate extraction from the verified payload.
    Rate,
}

impl VerificationStage {
    /// Reason string carried by `ProofVerificationFailed`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Hash => "hash",
            Self::Signature => "signature",
            Self::Rate => "rate",
        }
    }
}

impl fmt::Display for VerificationStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happens to the pending correlation after a rejected proof.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailedProofPolicy {
    /// Keep the correlation so a corrected proof for the same id can commit.
    ///
    /// Records that are never retried stay pending until their token is
    /// removed.
    #[default]
    Retain,
    /// Close the correlation; later callbacks for the id fail `UnknownQuery`.
    Discard,
}

/// Terminal state of a callback that passed structural checks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Every stage passed and the new rate was written.
    Committed {
        token: Address,
        rate: U256,
        timestamp: u64,
    },
    /// A verification stage failed; the registry is unchanged.
    Rejected { token: Address, error: ProofError },
}

impl CallbackOutcome {
    /// Whether the rate was committed.
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed { .. })
    }

    /// Failing stage of a rejected callback.
    pub fn rejected_stage(&self) -> Option<VerificationStage> {
        match self {
            Self::Committed { .. } => None,
            Self::Rejected { error, .. } => Some(error.stage()),
        }
    }
}

/// Why a batch update request was not issued.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BatchShortfall {
    /// No tokens are registered.
    #[error("no tokens registered")]
    EmptyRegistry,
    /// The batch costs more than the oracle balance.
    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: U256, available: U256 },
}

/// Result of a batch update request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BatchOutcome {
    /// One query per token, in issuance order.
    Requested(Vec<(Address, QueryId)>),
    /// Nothing was issued.
    Skipped(BatchShortfall),
}

impl BatchOutcome {
    /// Number of queries issued.
    pub fn issued(&self) -> usize {
        match self {
            Self::Requested(queries) => queries.len(),
            Self::Skipped(_) => 0,
        }
    }
}
