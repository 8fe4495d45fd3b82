//! # Local API Signer
//!
//! Off-chain side of the proof protocol: hashes a result payload, builds the
//! `date` / `digest` header block, signs SHA-256 of it and packs the blob the
//! oracle's callback expects.

use crate::domain::entities::{Address, ApiPublicKey};
use crate::domain::errors::{OracleError, SignatureError};
use crate::domain::proof;
use crate::domain::signature::{
    address_from_verifying_key, raw_public_key, sha256, sign_prehash, SIGNATURE_LENGTH,
};
use k256::ecdsa::SigningKey;

/// Signs pricing results with a local secp256k1 key.
#[derive(Clone)]
pub struct LocalApiSigner {
    signing_key: SigningKey,
}

impl LocalApiSigner {
    pub fn new(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }

    /// Fresh random key.
    pub fn random() -> Self {
        Self::new(SigningKey::random(&mut rand::thread_rng()))
    }

    /// Key from a 32-byte secret scalar.
    pub fn from_secret(secret: &[u8]) -> Result<Self, SignatureError> {
        SigningKey::from_slice(secret)
            .map(Self::new)
            .map_err(|_| SignatureError::InvalidFormat)
    }

    /// Public key to configure as the oracle's trusted key.
    pub fn public_key(&self) -> ApiPublicKey {
        ApiPublicKey::from_raw(raw_public_key(self.signing_key.verifying_key()))
    }

    pub fn address(&self) -> Address {
        address_from_verifying_key(self.signing_key.verifying_key())
    }

    /// Sign a header block.
    pub fn sign_headers(&self, headers: &[u8]) -> Result<[u8; SIGNATURE_LENGTH], SignatureError> {
        sign_prehash(&self.signing_key, &sha256(headers))
    }

    /// Build a proof blob for `result` dated `date` (`"Wed, 12 Sep 2018 15:18:14 GMT"`).
    pub fn sign_result(&self, result: &str, date: &str) -> Result<Vec<u8>, OracleError> {
        let headers = proof::format_headers(date, &sha256(result.as_bytes()));
        let signature = self
            .sign_headers(&headers)
            .map_err(|e| OracleError::MalformedProof(e.to_string()))?;
        proof::encode(&signature, &headers)
    }
}
