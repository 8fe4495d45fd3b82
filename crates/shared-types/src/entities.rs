//! # Core Primitive Entities
//!
//! Fixed-width identifiers shared by the registry, the correlator and the
//! event bus.
//!
//! ## Clusters
//!
//! - **Identity**: `Address`, `ZERO_ADDRESS`
//! - **Hashing**: `Hash`, `QueryId`
//! - **Amounts**: `U256`, `U512` (widened intermediate for multiply-then-divide)

use crate::errors::HexParseError;

// Re-export the wide integers from primitive-types for use across all crates
pub use primitive_types::{U256, U512};

/// A 32-byte hash (keccak-256 or SHA-256 digest).
pub type Hash = [u8; 32];

/// A 20-byte Ethereum-style address.
///
/// Token identities, controllers and the data-fetch dispatcher all use this width.
pub type Address = [u8; 20];

/// Opaque correlation identifier linking an issued data request to its callback.
pub type QueryId = Hash;

/// The "absent" identity. No token may be registered under it.
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Render an address as `0x`-prefixed lowercase hex.
pub fn format_address(address: &Address) -> String {
    format!("0x{}", hex::encode(address))
}

/// Render a hash or query id as `0x`-prefixed lowercase hex.
pub fn format_hash(hash: &Hash) -> String {
    format!("0x{}", hex::encode(hash))
}

/// Parse a hex string (with or without `0x`) into raw bytes.
pub fn decode_hex(input: &str) -> Result<Vec<u8>, HexParseError> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    hex::decode(digits).map_err(|e| HexParseError::InvalidHex(e.to_string()))
}

/// Parse a hex string into a 20-byte address.
pub fn parse_address(input: &str) -> Result<Address, HexParseError> {
    let bytes = decode_hex(input)?;
    <Address>::try_from(bytes.as_slice()).map_err(|_| HexParseError::InvalidLength {
        expected: 20,
        actual: bytes.len(),
    })
}

/// Parse a hex string into a 32-byte hash.
pub fn parse_hash(input: &str) -> Result<Hash, HexParseError> {
    let bytes = decode_hex(input)?;
    <Hash>::try_from(bytes.as_slice()).map_err(|_| HexParseError::InvalidLength {
        expected: 32,
        actual: bytes.len(),
    })
}
